//! Type masks and token grammars shared by option validation and parsing.
//!
//! A [`TypeMask`] describes which value kinds an option accepts. Masks are
//! combinable (`NUMBER | STRING`), and coercion tests the bits in a fixed
//! priority order (see [`crate::value::coerce`]).

use bitflags::bitflags;
use once_cell::sync::Lazy;
use regex::Regex;

bitflags! {
    /// Bitmask of value kinds an option can accept.
    ///
    /// The numeric values are part of the public contract and never change.
    /// `ARGS` marks a trailing collector for everything after a literal `--`
    /// and cannot be combined with any other bit. `MAP`, `SET`, `BUFFER`,
    /// `OBJECT` and `FUNCTION` only apply to pre-typed programmatic values,
    /// never to argv tokens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[derive(serde::Serialize)]
    pub struct TypeMask: u32 {
        const BOOLEAN  = 1;
        const NUMBER   = 2;
        const STRING   = 4;
        const INTEGER  = 8;
        const ARRAY    = 16;
        const OBJECT   = 32;
        const FUNCTION = 64;
        const MAP      = 128;
        const SET      = 256;
        const BUFFER   = 512;
        const ARGS     = 1024;
        const NULL     = 2048;
    }
}

// param-case with numbers, first char can't be a number or dash.
// valid: a, a-a, a-1, a1-1, a1-111, a-a1
static COMMAND_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]+[a-z0-9]*(-[a-z0-9]+)*$").expect("command name pattern"));

/// True when `name` is a valid command name, alias or `--option` name.
pub fn is_command_name(name: &str) -> bool {
    COMMAND_NAME_RE.is_match(name)
}

/// True when `c` can act as a single-character flag (`-x`). Case-sensitive.
pub fn is_flag_char(c: char) -> bool {
    c.is_ascii_alphabetic()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_bits_are_stable() {
        assert_eq!(TypeMask::BOOLEAN.bits(), 1);
        assert_eq!(TypeMask::NUMBER.bits(), 2);
        assert_eq!(TypeMask::STRING.bits(), 4);
        assert_eq!(TypeMask::INTEGER.bits(), 8);
        assert_eq!(TypeMask::ARRAY.bits(), 16);
        assert_eq!(TypeMask::OBJECT.bits(), 32);
        assert_eq!(TypeMask::FUNCTION.bits(), 64);
        assert_eq!(TypeMask::MAP.bits(), 128);
        assert_eq!(TypeMask::SET.bits(), 256);
        assert_eq!(TypeMask::BUFFER.bits(), 512);
        assert_eq!(TypeMask::ARGS.bits(), 1024);
        assert_eq!(TypeMask::NULL.bits(), 2048);
    }

    #[test]
    fn masks_combine() {
        let mask = TypeMask::NUMBER | TypeMask::STRING;
        assert!(mask.contains(TypeMask::NUMBER));
        assert!(mask.contains(TypeMask::STRING));
        assert!(!mask.contains(TypeMask::BOOLEAN));
    }

    #[test]
    fn accepts_valid_command_names() {
        for name in ["a", "ab", "a1", "a-a", "a-1", "a1-1", "a1-111", "a-a1", "create-component"] {
            assert!(is_command_name(name), "expected '{}' to be valid", name);
        }
    }

    #[test]
    fn rejects_invalid_command_names() {
        for name in ["", "A", "1a", "-a", "a-", "a--b", "a_b", "a b", "über", "a-B"] {
            assert!(!is_command_name(name), "expected '{}' to be invalid", name);
        }
    }

    #[test]
    fn flag_chars_are_single_ascii_letters() {
        assert!(is_flag_char('a'));
        assert!(is_flag_char('Z'));
        assert!(!is_flag_char('1'));
        assert!(!is_flag_char('-'));
        assert!(!is_flag_char('é'));
    }
}
