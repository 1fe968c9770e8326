use crate::types::TypeMask;
use thiserror::Error;

/// All failure modes of the engine.
///
/// Registration errors abort setup, resolution and parse errors surface to
/// the invoker with enough context to render a user-facing message.
/// [`CmdrError::Internal`] marks invariant violations (bugs), which callers
/// may want to report differently from user input errors.
#[derive(Error, Debug)]
pub enum CmdrError {
    // --- registration ---
    #[error("handler '{0}' is already registered")]
    DuplicateHandler(String),

    #[error("invalid command name '{0}'")]
    InvalidCommandName(String),

    #[error("invalid alias '{alias}': {reason}")]
    InvalidAlias { alias: String, reason: &'static str },

    #[error("invalid option declaration: {0}")]
    InvalidOption(String),

    #[error("handler '{0}' has no registered commands")]
    EmptyHandler(String),

    #[error("command '{command}' was staged for a different handler than '{handler}'")]
    ForeignCommand { command: String, handler: String },

    #[error("duplicate command '{command}' in handler '{handler}'")]
    DuplicateCommand { command: String, handler: String },

    #[error("duplicate command route '{0}'")]
    DuplicateRoute(String),

    #[error("alias '{0}' already exists or is the same as a command")]
    DuplicateAlias(String),

    #[error("a fallback command is only legal under the default handler")]
    MisplacedFallback,

    #[error("a fallback command is already registered")]
    DuplicateFallback,

    // --- resolution ---
    #[error("no command argument passed, and no default command is registered")]
    NoDefaultCommand,

    #[error("no command resolved for '{0}'")]
    UnknownCommand(String),

    // --- parsing ---
    #[error("invalid characters in flag group -{0}")]
    InvalidFlagGroup(String),

    #[error("unknown flag -{flag} in group -{group}")]
    UnknownFlag { flag: char, group: String },

    #[error("option '{0}' already declared")]
    DuplicateOption(String),

    #[error("flag -{0} already set")]
    DuplicateFlag(char),

    #[error("option --{option} already specified as --{slot}")]
    OptionConflict { option: String, slot: String },

    #[error("positional option '{0}' already specified")]
    DuplicatePositional(String),

    #[error("invalid option '{0}'")]
    InvalidOptionToken(String),

    #[error("unknown option --{0}")]
    UnknownOption(String),

    #[error("missing value for option --{option}")]
    MissingValue { option: String },

    #[error("no positional option available for argument '{0}'")]
    NoPositionalSlot(String),

    #[error("cannot coerce {kind} value '{value}' to expected type {mask:?}")]
    TypeMismatch {
        kind: &'static str,
        value: String,
        mask: TypeMask,
    },

    // --- handler-level ---
    #[error("{0}")]
    App(String),

    // --- invariant violations ---
    #[error("[internal] {0}")]
    Internal(String),
}

impl CmdrError {
    /// Distinguishes invariant violations (bugs) from user input errors.
    pub fn is_internal(&self) -> bool {
        matches!(self, CmdrError::Internal(_))
    }
}

pub type Result<T> = std::result::Result<T, CmdrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_flagged() {
        assert!(CmdrError::Internal("x".into()).is_internal());
        assert!(!CmdrError::NoDefaultCommand.is_internal());
        assert!(!CmdrError::UnknownCommand("x".into()).is_internal());
    }

    #[test]
    fn messages_carry_context() {
        let err = CmdrError::UnknownFlag {
            flag: 'x',
            group: "xy".into(),
        };
        assert_eq!(err.to_string(), "unknown flag -x in group -xy");

        let err = CmdrError::TypeMismatch {
            kind: "string",
            value: "abc".into(),
            mask: TypeMask::NUMBER,
        };
        assert!(err.to_string().contains("abc"));
        assert!(err.to_string().contains("NUMBER"));
    }
}
