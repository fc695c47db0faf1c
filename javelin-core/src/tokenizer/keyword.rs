//! # Keywords and Primitive Types
//!
//! Every Java reserved word is recognised, including those the evaluator does
//! not support (`switch`, `try`, `interface`, ...). Reserving them means a
//! program using them fails with a syntax error at the keyword instead of
//! being misread as an identifier.
//!
//! Primitive type names get their own token kind, [`PrimitiveType`], because
//! they start declarations and casts.
//!
//! Words are classified only after the whole word has been read, so
//! `returnValue` is an identifier and not `return` followed by `Value`.

use strum::IntoEnumIterator;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    // Declarations and modifiers
    Class,
    Public,
    Private,
    Protected,
    Static,
    Final,
    Abstract,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    // Control flow
    If,
    Else,
    While,
    Do,
    For,
    Break,
    Continue,
    Return,
    Switch,
    Case,
    Default,
    // Exceptions
    Throw,
    Throws,
    Try,
    Catch,
    Finally,
    // Objects
    New,
    This,
    Super,
    Instanceof,
    // Unsupported declarations
    Interface,
    Enum,
    Extends,
    Implements,
    Package,
    Import,
    Assert,
    Const,
    Goto,
}

impl Keyword {
    /// Modifiers accepted (and ignored) in front of classes and methods.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Keyword::Public
                | Keyword::Private
                | Keyword::Protected
                | Keyword::Static
                | Keyword::Final
                | Keyword::Abstract
                | Keyword::Native
                | Keyword::Synchronized
                | Keyword::Transient
                | Keyword::Volatile
                | Keyword::Strictfp
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveType {
    Boolean,
    Char,
    Int,
    Long,
    Double,
    Void,
    // Recognised so that they are reserved, rejected by the parser.
    Byte,
    Short,
    Float,
}

impl PrimitiveType {
    pub fn is_supported(&self) -> bool {
        !matches!(
            self,
            PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Float
        )
    }
}

/// Returns true for words that can never name a variable.
pub fn is_reserved_word(word: &str) -> bool {
    matches!(word, "true" | "false" | "null")
        || Keyword::iter().any(|kw| kw.as_ref() == word)
        || PrimitiveType::iter().any(|ty| ty.as_ref() == word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_keyword_round_trip_names() {
        assert_eq!(Keyword::from_str("while").unwrap(), Keyword::While);
        assert_eq!(Keyword::Instanceof.to_string(), "instanceof");
        assert!(Keyword::from_str("While").is_err());
    }

    #[test]
    fn test_modifiers() {
        assert!(Keyword::Static.is_modifier());
        assert!(Keyword::Public.is_modifier());
        assert!(!Keyword::Class.is_modifier());
    }

    #[test]
    fn test_primitive_types() {
        assert_eq!(PrimitiveType::from_str("double").unwrap(), PrimitiveType::Double);
        assert!(PrimitiveType::Int.is_supported());
        assert!(!PrimitiveType::Float.is_supported());
    }

    #[test]
    fn test_reserved_words() {
        for word in ["class", "int", "null", "goto", "float"] {
            assert!(is_reserved_word(word), "{} should be reserved", word);
        }
        for word in ["String", "main", "classic", "var"] {
            assert!(!is_reserved_word(word), "{} should not be reserved", word);
        }
    }
}
