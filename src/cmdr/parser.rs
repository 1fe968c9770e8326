//! The argv state machine.
//!
//! A parse walks four conceptual states: resolve the command from the leading
//! token, pre-scan and expand all single-dash flag groups, then loop over the
//! remaining tokens (args collector, `--option`, or positional) until the
//! working set is empty. Fully synchronous; operates on a private working
//! copy and never mutates the caller's argv.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::arguments::{Arguments, OptionKey};
use crate::error::{CmdrError, Result};
use crate::registry::{CommandMethod, CommandRegistry};
use crate::types::{is_command_name, TypeMask};
use crate::value::{coerce, Value};

/// Literal token that hands the remaining argv to an args collector.
pub const ARG_SEPARATOR: &str = "--";

/// One-shot parser over a resolved command's option schema.
pub struct ArgumentsParser<'r> {
    registry: &'r CommandRegistry,
    args: Vec<String>,
    argv: Vec<String>,
    command: Option<&'r CommandMethod>,
    flags: BTreeSet<char>,
    options: HashMap<OptionKey, Value>,
    positionals: Vec<Value>,
    seen: HashSet<usize>,
}

impl<'r> ArgumentsParser<'r> {
    pub fn new(registry: &'r CommandRegistry, argv: &[String]) -> Self {
        ArgumentsParser {
            registry,
            args: argv.to_vec(),
            argv: argv.to_vec(),
            command: None,
            flags: BTreeSet::new(),
            options: HashMap::new(),
            positionals: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Consume the parser, producing the immutable result or the first error.
    pub fn parse(mut self) -> Result<Arguments<'r>> {
        self.resolve_command()?;
        self.scan_flags()?;
        while !self.args.is_empty() {
            self.step()?;
        }

        let command = self
            .command
            .ok_or_else(|| CmdrError::Internal("command not resolved".to_string()))?;
        Ok(Arguments::new(
            command,
            &self.argv,
            self.flags,
            self.options,
            self.positionals,
        ))
    }

    fn command(&self) -> Result<&'r CommandMethod> {
        self.command
            .ok_or_else(|| CmdrError::Internal("command not resolved".to_string()))
    }

    /// A leading token matching the command-name grammar selects a route;
    /// anything else (including no tokens at all) selects the global default.
    fn resolve_command(&mut self) -> Result<()> {
        match self.args.first() {
            Some(token) if is_command_name(token) => {
                let command = self
                    .registry
                    .resolve_command(token)
                    .ok_or_else(|| CmdrError::UnknownCommand(token.clone()))?;
                self.args.remove(0);
                self.command = Some(command);
            }
            _ => {
                // a leading flag/option token belongs to the default command
                let command = self
                    .registry
                    .resolve_command("")
                    .ok_or(CmdrError::NoDefaultCommand)?;
                self.command = Some(command);
            }
        }
        Ok(())
    }

    /// Remove every single-dash token before a literal `--` and expand each
    /// group character against the command's flag-bearing options.
    fn scan_flags(&mut self) -> Result<()> {
        let command = self.command()?;

        let mut groups = Vec::new();
        let mut i = 0;
        while i < self.args.len() {
            let token = &self.args[i];
            if token == ARG_SEPARATOR {
                break;
            }
            if is_flag_token(token) {
                groups.push(self.args.remove(i));
            } else {
                i += 1;
            }
        }

        for token in groups {
            let group = &token[1..];
            if group.chars().any(|c| !c.is_ascii_alphabetic()) {
                return Err(CmdrError::InvalidFlagGroup(group.to_string()));
            }

            for flag in group.chars() {
                let index = command
                    .options()
                    .iter()
                    .position(|o| o.flag == Some(flag))
                    .ok_or(CmdrError::UnknownFlag {
                        flag,
                        group: group.to_string(),
                    })?;
                let option = &command.options()[index];

                if !self.seen.insert(index) {
                    return Err(CmdrError::DuplicateOption(option.describe()));
                }
                if !self.flags.insert(flag) {
                    return Err(CmdrError::DuplicateFlag(flag));
                }
                if let Some(name) = &option.name {
                    self.write_option(name, Value::Bool(true))?;
                }
                if let Some(alias) = &option.alias {
                    self.write_option(alias, Value::Bool(true))?;
                }
            }
        }
        Ok(())
    }

    /// Dispatch the next token: args collector, `--option`, stray flag
    /// (internal error), or positional.
    fn step(&mut self) -> Result<()> {
        let command = self.command()?;
        let token = &self.args[0];

        if token == ARG_SEPARATOR {
            if let Some(last) = command.options().last() {
                if last.type_mask.contains(TypeMask::ARGS) {
                    return self.collect_args();
                }
            }
            // no collector declared: the separator falls through below
        }
        if is_option_token(token) {
            return self.parse_option();
        }
        if is_flag_token(token) {
            return Err(CmdrError::Internal(format!(
                "unhandled flag {token} found in args"
            )));
        }
        self.parse_positional()
    }

    /// Hand everything after `--` verbatim to the trailing args collector.
    fn collect_args(&mut self) -> Result<()> {
        let command = self.command()?;
        let option = command
            .options()
            .last()
            .ok_or_else(|| CmdrError::Internal("args collector disappeared".to_string()))?;
        let name = option.name.clone().ok_or_else(|| {
            CmdrError::Internal("option name for args collector is missing".to_string())
        })?;

        self.args.remove(0); // the separator itself
        let rest: Vec<String> = self.args.drain(..).collect();

        self.write_option(&name, Value::Args(rest.clone()))?;
        if let Some(alias) = option.alias.clone() {
            self.write_option(&alias, Value::Args(rest))?;
        }
        Ok(())
    }

    fn parse_option(&mut self) -> Result<()> {
        let command = self.command()?;

        let token = self.args.remove(0);
        let name = token
            .strip_prefix("--")
            .filter(|n| is_command_name(n))
            .ok_or_else(|| CmdrError::InvalidOptionToken(token.clone()))?
            .to_string();

        // if the next token looks like a flag or option, this option has no
        // value token of its own
        let no_next = self.args.first().map_or(true, |next| next.starts_with('-'));

        let index = command
            .options()
            .iter()
            .position(|o| o.name.as_deref() == Some(&name) || o.alias.as_deref() == Some(&name))
            .ok_or_else(|| CmdrError::UnknownOption(name.clone()))?;
        let option = &command.options()[index];

        if !self.seen.insert(index) {
            return Err(CmdrError::DuplicateOption(format!("--{name}")));
        }
        if option.positional {
            return Err(CmdrError::Internal(format!(
                "option --{name} cannot be configured as positional"
            )));
        }
        let option_name = option.name.clone().ok_or_else(|| {
            CmdrError::Internal(format!("option --{name} name is missing"))
        })?;
        if self.options.contains_key(&OptionKey::from(option_name.as_str())) {
            return Err(CmdrError::OptionConflict {
                option: name,
                slot: option_name,
            });
        }
        if let Some(alias) = &option.alias {
            if self.options.contains_key(&OptionKey::from(alias.as_str())) {
                return Err(CmdrError::OptionConflict {
                    option: name,
                    slot: alias.clone(),
                });
            }
        }

        let value = if no_next {
            if option.type_mask.contains(TypeMask::BOOLEAN) {
                Value::Bool(true)
            } else {
                // a non-boolean option with no value token is a user error,
                // never a silent default
                return Err(CmdrError::MissingValue { option: name });
            }
        } else {
            let next = self.args.remove(0);
            coerce(Value::Str(next), option.type_mask)?
        };

        if option.flag.is_some() && !matches!(value, Value::Bool(_)) {
            return Err(CmdrError::Internal(format!(
                "non-boolean option --{name} cannot carry a flag"
            )));
        }

        if let Some(flag) = option.flag {
            if value.is_true() {
                self.flags.insert(flag);
            }
        }
        self.write_option(&option_name, value.clone())?;
        if let Some(alias) = option.alias.clone() {
            self.write_option(&alias, value)?;
        }
        Ok(())
    }

    fn parse_positional(&mut self) -> Result<()> {
        let command = self.command()?;
        let token = self.args.remove(0);

        let index = command
            .options()
            .iter()
            .enumerate()
            .position(|(i, o)| o.positional && !self.seen.contains(&i))
            .ok_or_else(|| CmdrError::NoPositionalSlot(token.clone()))?;
        let option = &command.options()[index];
        self.seen.insert(index);

        if option.name.is_none() && option.alias.is_none() {
            return Err(CmdrError::Internal(
                "positional must have a name and/or alias".to_string(),
            ));
        }
        if option.flag.is_some() {
            return Err(CmdrError::Internal(
                "positional cannot specify a flag".to_string(),
            ));
        }
        if option.type_mask.intersects(!(TypeMask::NUMBER | TypeMask::STRING)) {
            return Err(CmdrError::Internal(
                "invalid option type for positional argument".to_string(),
            ));
        }

        let value = coerce(Value::Str(token), option.type_mask)?;

        self.options
            .insert(OptionKey::Index(self.positionals.len()), value.clone());
        self.positionals.push(value.clone());

        if let Some(name) = &option.name {
            if self.options.contains_key(&OptionKey::from(name.as_str())) {
                return Err(CmdrError::DuplicatePositional(name.clone()));
            }
            self.options.insert(OptionKey::from(name.as_str()), value.clone());
        }
        if let Some(alias) = &option.alias {
            if self.options.contains_key(&OptionKey::from(alias.as_str())) {
                return Err(CmdrError::DuplicatePositional(alias.clone()));
            }
            self.options.insert(OptionKey::from(alias.as_str()), value);
        }
        Ok(())
    }

    /// Write a value under one option key, guarding against double writes
    /// through another channel (alias vs name vs flag).
    fn write_option(&mut self, key: &str, value: Value) -> Result<()> {
        let key = OptionKey::from(key);
        if self.options.contains_key(&key) {
            let OptionKey::Name(name) = key else {
                unreachable!()
            };
            return Err(CmdrError::DuplicateOption(name));
        }
        self.options.insert(key, value);
        Ok(())
    }
}

/// `-f` or `-abc`, but not `--`, `--x`, or a bare `-`.
fn is_flag_token(token: &str) -> bool {
    let Some(rest) = token.strip_prefix('-') else {
        return false;
    };
    !rest.is_empty() && !rest.starts_with('-')
}

/// `--name`, but not `--` or `---x`.
fn is_option_token(token: &str) -> bool {
    let Some(rest) = token.strip_prefix("--") else {
        return false;
    };
    !rest.is_empty() && !rest.starts_with('-')
}
