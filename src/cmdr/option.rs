//! Option descriptors: the normalized, validated shape of one command option.
//!
//! An option is either named (`--dir`, optionally with an alias and a
//! single-character flag) or positional (assigned by declaration order).
//! Validation happens at registration time so the parser can assume every
//! descriptor it reads is well-formed.

use crate::error::{CmdrError, Result};
use crate::types::{is_command_name, is_flag_char, TypeMask};
use serde::Serialize;

/// One declared option of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOption {
    /// Key the value is written under (`--name`). Required unless positional.
    pub name: Option<String>,
    /// Secondary key, written alongside `name` with the identical value.
    pub alias: Option<String>,
    /// Single-character switch (`-x`), boolean options only.
    pub flag: Option<char>,
    /// Assigned from bare tokens in declaration order.
    pub positional: bool,
    /// Accepted value kinds, tested in coercion priority order.
    pub type_mask: TypeMask,
}

impl CommandOption {
    /// A named boolean switch (`--verbose`). Adjust the mask with
    /// [`with_type`](Self::with_type) for value-taking options.
    pub fn named(name: impl Into<String>) -> Self {
        CommandOption {
            name: Some(name.into()),
            alias: None,
            flag: None,
            positional: false,
            type_mask: TypeMask::BOOLEAN,
        }
    }

    /// A positional option. Positionals are restricted to `NUMBER`/`STRING`
    /// masks and need a name or alias to be addressable in the result.
    pub fn positional(type_mask: TypeMask) -> Self {
        CommandOption {
            name: None,
            alias: None,
            flag: None,
            positional: true,
            type_mask,
        }
    }

    /// A trailing collector for everything after a literal `--`.
    pub fn args_collector(name: impl Into<String>) -> Self {
        CommandOption {
            name: Some(name.into()),
            alias: None,
            flag: None,
            positional: false,
            type_mask: TypeMask::ARGS,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_flag(mut self, flag: char) -> Self {
        self.flag = Some(flag);
        self
    }

    pub fn with_type(mut self, type_mask: TypeMask) -> Self {
        self.type_mask = type_mask;
        self
    }

    /// Display name for error messages: name, else alias, else flag.
    pub fn describe(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        if let Some(flag) = self.flag {
            return flag.to_string();
        }
        "<unnamed>".to_string()
    }

    /// Checks the declaration invariants. Called by the registry before an
    /// option is staged; the parser relies on these holding.
    pub fn validate(&self) -> Result<()> {
        if self.type_mask.is_empty() {
            return Err(CmdrError::InvalidOption(format!(
                "option '{}' declares no type",
                self.describe()
            )));
        }

        if let Some(name) = &self.name {
            if !is_command_name(name) {
                return Err(CmdrError::InvalidOption(format!(
                    "invalid option name '{}'",
                    name
                )));
            }
        }
        if let Some(alias) = &self.alias {
            if !is_command_name(alias) {
                return Err(CmdrError::InvalidOption(format!(
                    "invalid option alias '{}'",
                    alias
                )));
            }
            if self.name.as_deref() == Some(alias.as_str()) {
                return Err(CmdrError::InvalidOption(format!(
                    "option alias '{}' is the same as its name",
                    alias
                )));
            }
        }

        if self.type_mask.contains(TypeMask::ARGS) {
            if self.type_mask != TypeMask::ARGS {
                return Err(CmdrError::InvalidOption(format!(
                    "option '{}' combines ARGS with other types",
                    self.describe()
                )));
            }
            if self.positional {
                return Err(CmdrError::InvalidOption(
                    "an args collector cannot be positional".to_string(),
                ));
            }
            if self.flag.is_some() {
                return Err(CmdrError::InvalidOption(
                    "an args collector cannot carry a flag".to_string(),
                ));
            }
            if self.name.is_none() {
                return Err(CmdrError::InvalidOption(
                    "an args collector must declare a name".to_string(),
                ));
            }
            return Ok(());
        }

        if self.positional {
            if self.flag.is_some() {
                return Err(CmdrError::InvalidOption(format!(
                    "positional option '{}' cannot specify a flag",
                    self.describe()
                )));
            }
            if self.type_mask.intersects(!(TypeMask::NUMBER | TypeMask::STRING)) {
                return Err(CmdrError::InvalidOption(format!(
                    "positional option '{}' must be string or number typed",
                    self.describe()
                )));
            }
            if self.name.is_none() && self.alias.is_none() {
                return Err(CmdrError::InvalidOption(
                    "positional option needs a name or an alias".to_string(),
                ));
            }
            return Ok(());
        }

        // named option
        let name = self.name.as_deref().ok_or_else(|| {
            CmdrError::InvalidOption("non-positional option must declare a name".to_string())
        })?;
        if let Some(flag) = self.flag {
            if !is_flag_char(flag) {
                return Err(CmdrError::InvalidOption(format!(
                    "invalid flag '{}' on option '{}'",
                    flag, name
                )));
            }
            let flag_str = flag.to_string();
            if flag_str == name || self.alias.as_deref() == Some(flag_str.as_str()) {
                return Err(CmdrError::InvalidOption(format!(
                    "flag '{}' duplicates the option name or alias",
                    flag
                )));
            }
            if !self.type_mask.contains(TypeMask::BOOLEAN) {
                return Err(CmdrError::InvalidOption(format!(
                    "flag-bearing option '{}' must accept booleans",
                    name
                )));
            }
        }
        Ok(())
    }
}
