//! Immutable parse result.
//!
//! An [`Arguments`] value is built once per `parse()` call and never mutated
//! afterwards: the resolved command, a defensive copy of the raw argv, the
//! observed flag set, the option map (keyed by name, alias, and positional
//! index), and the ordered positional list.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::registry::CommandMethod;
use crate::value::Value;

/// Key into the options map: option name/alias, or zero-based positional index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Name(String),
    Index(usize),
}

impl From<&str> for OptionKey {
    fn from(name: &str) -> Self {
        OptionKey::Name(name.to_string())
    }
}

impl From<String> for OptionKey {
    fn from(name: String) -> Self {
        OptionKey::Name(name)
    }
}

impl From<usize> for OptionKey {
    fn from(index: usize) -> Self {
        OptionKey::Index(index)
    }
}

/// Structured snapshot of one parsed invocation.
#[derive(Debug, Clone)]
pub struct Arguments<'r> {
    command: &'r CommandMethod,
    argv: Vec<String>,
    flags: BTreeSet<char>,
    options: HashMap<OptionKey, Value>,
    positionals: Vec<Value>,
}

impl<'r> Arguments<'r> {
    /// Assemble a result. `argv` is copied; the collections are taken as-is
    /// (the parser hands over its finished state).
    pub fn new(
        command: &'r CommandMethod,
        argv: &[String],
        flags: BTreeSet<char>,
        options: HashMap<OptionKey, Value>,
        positionals: Vec<Value>,
    ) -> Self {
        Arguments {
            command,
            argv: argv.to_vec(),
            flags,
            options,
            positionals,
        }
    }

    /// The resolved command method; the invoker dispatches through it.
    pub fn command(&self) -> &'r CommandMethod {
        self.command
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn flags(&self) -> &BTreeSet<char> {
        &self.flags
    }

    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(&flag)
    }

    pub fn options(&self) -> &HashMap<OptionKey, Value> {
        &self.options
    }

    /// Look up an option value by name, alias, or positional index.
    pub fn option(&self, key: impl Into<OptionKey>) -> Option<&Value> {
        self.options.get(&key.into())
    }

    pub fn positionals(&self) -> &[Value] {
        &self.positionals
    }

    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.positionals.get(index)
    }

    /// Deterministic JSON snapshot (sorted keys) for structured output.
    pub fn to_json(&self) -> serde_json::Value {
        let options: BTreeMap<String, serde_json::Value> = self
            .options
            .iter()
            .map(|(k, v)| {
                let key = match k {
                    OptionKey::Name(name) => name.clone(),
                    OptionKey::Index(i) => i.to_string(),
                };
                (key, v.to_json())
            })
            .collect();

        serde_json::json!({
            "command": self.command.command().describe(),
            "argv": self.argv,
            "flags": self.flags.iter().collect::<Vec<_>>(),
            "options": options,
            "positionals": self.positionals.iter().map(Value::to_json).collect::<Vec<_>>(),
        })
    }
}
