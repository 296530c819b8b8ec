// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scheme alphabet and classification.
//!
//! A scheme is the leading run of control characters of a route string. The alphabet is
//! fixed (`/ . ! - +`) and only a handful of combinations carry meaning:
//!
//! | scheme | constant     | meaning                                              |
//! |--------|--------------|------------------------------------------------------|
//! | `""`   | [`NONE`]     | current level                                        |
//! | `/`    | [`ROOT`]     | tree root; applies once, to the outermost segment    |
//! | `./`   | [`NESTED`]   | nested child scope                                   |
//! | `../`  | [`PARENT`]   | parent scope; repeat to go further up                |
//! | `!`    | [`DIALOG`]   | open in a dialog scope                               |
//! | `-`    | [`BACK`]     | back; repeat to pop more levels                      |
//! | `-!`   | [`CLOSE`]    | close the enclosing dialog scope                     |
//! | `+`    | [`FORWARD`]  | push even when the target is already current         |
//!
//! [`SchemeKind::classify`] tests the raw prefix for root, nested and parent. Dialog, back,
//! close and forward are tested after stripping one leading `/` or `./`, so `/-` and `./-`
//! are back references qualified by root or nested scope.

/// Current level.
pub const NONE: &str = "";
/// Tree root.
pub const ROOT: &str = "/";
/// Nested child scope.
pub const NESTED: &str = "./";
/// Parent scope.
pub const PARENT: &str = "../";
/// Dialog scope.
pub const DIALOG: &str = "!";
/// Back navigation.
pub const BACK: &str = "-";
/// Close the enclosing dialog scope.
pub const CLOSE: &str = "-!";
/// Forward navigation.
pub const FORWARD: &str = "+";
/// Segment separator inside a path.
pub const SEPARATOR: char = '/';

/// Returns true for characters of the scheme alphabet.
pub fn is_scheme_char(c: char) -> bool {
    matches!(c, '/' | '.' | '!' | '-' | '+')
}

/// Returns true for characters allowed in a base segment.
pub fn is_base_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

bitflags::bitflags! {
    /// Classification of a scheme string.
    ///
    /// Several flags may be set at once, for example `/-` is both [`SchemeKind::ROOT`] and
    /// [`SchemeKind::BACK`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SchemeKind: u8 {
        /// Starts with `/` (but not `./` or `../`).
        const ROOT    = 0b0000_0001;
        /// Starts with `./`.
        const NESTED  = 0b0000_0010;
        /// Starts with `../`.
        const PARENT  = 0b0000_0100;
        /// Dialog marker `!`.
        const DIALOG  = 0b0000_1000;
        /// Back marker `-`.
        const BACK    = 0b0001_0000;
        /// Close marker `-!`.
        const CLOSE   = 0b0010_0000;
        /// Forward marker `+`.
        const FORWARD = 0b0100_0000;
    }
}

impl SchemeKind {
    /// Classify a scheme string.
    pub fn classify(scheme: &str) -> Self {
        let mut kind = Self::empty();
        if scheme.starts_with(PARENT) {
            kind |= Self::PARENT;
        } else if scheme.starts_with(NESTED) {
            kind |= Self::NESTED;
        } else if scheme.starts_with(ROOT) {
            kind |= Self::ROOT;
        }
        let rest = strip_scope(scheme);
        if rest.starts_with(DIALOG) {
            kind |= Self::DIALOG;
        }
        if rest.starts_with(BACK) {
            kind |= Self::BACK;
        }
        if rest.starts_with(CLOSE) {
            kind |= Self::CLOSE;
        }
        if rest.starts_with(FORWARD) {
            kind |= Self::FORWARD;
        }
        kind
    }
}

/// Strip a single leading `./` or `/` scope qualifier.
pub fn strip_scope(scheme: &str) -> &str {
    scheme
        .strip_prefix(NESTED)
        .or_else(|| scheme.strip_prefix(ROOT))
        .unwrap_or(scheme)
}

/// Number of consecutive back markers at the start of `scheme`.
///
/// The count starts at the first character: `--` is 2, `/-` is 0.
pub fn back_count(scheme: &str) -> usize {
    scheme.chars().take_while(|c| *c == '-').count()
}

/// Returns true when every character of `scheme` belongs to the alphabet.
pub fn is_valid(scheme: &str) -> bool {
    scheme.chars().all(is_scheme_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_scope_prefixes() {
        assert_eq!(SchemeKind::classify(""), SchemeKind::empty());
        assert_eq!(SchemeKind::classify("/"), SchemeKind::ROOT);
        assert_eq!(SchemeKind::classify("./"), SchemeKind::NESTED);
        assert_eq!(SchemeKind::classify("../"), SchemeKind::PARENT);
        assert_eq!(SchemeKind::classify("../../"), SchemeKind::PARENT);
    }

    #[test]
    fn back_references_are_recognized_behind_scope() {
        assert!(SchemeKind::classify("-").contains(SchemeKind::BACK));
        assert!(SchemeKind::classify("/-").contains(SchemeKind::ROOT | SchemeKind::BACK));
        assert!(SchemeKind::classify("./-").contains(SchemeKind::NESTED | SchemeKind::BACK));
        assert!(!SchemeKind::classify("../-").contains(SchemeKind::BACK));
    }

    #[test]
    fn close_is_a_back_reference() {
        let kind = SchemeKind::classify("-!");
        assert!(kind.contains(SchemeKind::CLOSE));
        assert!(kind.contains(SchemeKind::BACK));
        assert!(!kind.contains(SchemeKind::DIALOG));
    }

    #[test]
    fn back_count_is_consecutive_from_start() {
        assert_eq!(back_count(""), 0);
        assert_eq!(back_count("-"), 1);
        assert_eq!(back_count("---"), 3);
        assert_eq!(back_count("-!-"), 1);
        assert_eq!(back_count("/-"), 0);
    }

    #[test]
    fn base_characters_are_ascii() {
        assert!("Shell_2".chars().all(is_base_char));
        assert!(!is_base_char('\u{e9}'));
        assert!(!is_base_char('\u{663}'));
        assert!(!is_base_char('-'));
    }

    #[test]
    fn validity() {
        assert!(is_valid("../"));
        assert!(is_valid("-!"));
        assert!(!is_valid("#"));
        assert!(!is_valid("/?"));
    }
}
