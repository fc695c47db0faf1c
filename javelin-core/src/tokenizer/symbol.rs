//! # Operators and Delimiters
//!
//! Operators are matched longest first so that `>>>=` is never read as
//! `>>` followed by `>=`. The plain `=` is a [`Delimiter`]; compound
//! assignments such as `+=` are operators.

use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{map, value},
    error::context,
};
use strum_macros::{AsRefStr, Display, EnumString};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Operator {
    // Member access and conditional
    #[strum(serialize = ".")]
    Dot,
    #[strum(serialize = "?")]
    Question,

    // Comparison
    #[strum(serialize = "==")]
    EqualEqual,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,

    // Arithmetic
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulo,
    #[strum(serialize = "++")]
    Increment,
    #[strum(serialize = "--")]
    Decrement,

    // Logical
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "!")]
    Not,

    // Bitwise and shifts
    #[strum(serialize = "&")]
    BitAnd,
    #[strum(serialize = "|")]
    BitOr,
    #[strum(serialize = "^")]
    BitXor,
    #[strum(serialize = "~")]
    BitNot,
    #[strum(serialize = "<<")]
    ShiftLeft,
    #[strum(serialize = ">>")]
    ShiftRight,
    #[strum(serialize = ">>>")]
    UnsignedShiftRight,

    // Compound assignment
    #[strum(serialize = "+=")]
    PlusAssign,
    #[strum(serialize = "-=")]
    MinusAssign,
    #[strum(serialize = "*=")]
    MultiplyAssign,
    #[strum(serialize = "/=")]
    DivideAssign,
    #[strum(serialize = "%=")]
    ModuloAssign,
    #[strum(serialize = "&=")]
    BitAndAssign,
    #[strum(serialize = "|=")]
    BitOrAssign,
    #[strum(serialize = "^=")]
    BitXorAssign,
    #[strum(serialize = "<<=")]
    ShiftLeftAssign,
    #[strum(serialize = ">>=")]
    ShiftRightAssign,
    #[strum(serialize = ">>>=")]
    UnsignedShiftRightAssign,
}

/// Structural punctuation.
///
/// Rendered through [`Delimiter::as_symbol`] because strum's `Display`
/// derive trips over a bare `}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Comma,
    Semicolon,
    Colon,
    Equal,
}

impl Delimiter {
    pub fn as_symbol(&self) -> &'static str {
        match self {
            Delimiter::OpenBrace => "{",
            Delimiter::CloseBrace => "}",
            Delimiter::OpenParen => "(",
            Delimiter::CloseParen => ")",
            Delimiter::OpenBracket => "[",
            Delimiter::CloseBracket => "]",
            Delimiter::Comma => ",",
            Delimiter::Semicolon => ";",
            Delimiter::Colon => ":",
            Delimiter::Equal => "=",
        }
    }
}

/// Parses an operator token, longest match first.
///
/// ```
/// # use javelin_core::tokenizer::symbol::{parse_operator, Operator};
/// # use javelin_core::tokenizer::token::Token;
/// let (rest, token) = parse_operator(">>>= 2").unwrap();
/// assert_eq!(token, Token::Operator(Operator::UnsignedShiftRightAssign));
/// assert_eq!(rest, " 2");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        map(
            alt((
                // Three and four characters
                alt((
                    value(Operator::UnsignedShiftRightAssign, tag(">>>=")),
                    value(Operator::UnsignedShiftRight, tag(">>>")),
                    value(Operator::ShiftLeftAssign, tag("<<=")),
                    value(Operator::ShiftRightAssign, tag(">>=")),
                )),
                // Two characters
                alt((
                    value(Operator::EqualEqual, tag("==")),
                    value(Operator::NotEqual, tag("!=")),
                    value(Operator::GreaterEqual, tag(">=")),
                    value(Operator::LessEqual, tag("<=")),
                    value(Operator::And, tag("&&")),
                    value(Operator::Or, tag("||")),
                    value(Operator::Increment, tag("++")),
                    value(Operator::Decrement, tag("--")),
                    value(Operator::PlusAssign, tag("+=")),
                    value(Operator::MinusAssign, tag("-=")),
                    value(Operator::MultiplyAssign, tag("*=")),
                    value(Operator::DivideAssign, tag("/=")),
                    value(Operator::ModuloAssign, tag("%=")),
                    value(Operator::BitAndAssign, tag("&=")),
                    value(Operator::BitOrAssign, tag("|=")),
                    value(Operator::BitXorAssign, tag("^=")),
                    value(Operator::ShiftLeft, tag("<<")),
                    value(Operator::ShiftRight, tag(">>")),
                )),
                // Single character
                alt((
                    value(Operator::Dot, tag(".")),
                    value(Operator::Question, tag("?")),
                    value(Operator::Greater, tag(">")),
                    value(Operator::Less, tag("<")),
                    value(Operator::Plus, tag("+")),
                    value(Operator::Minus, tag("-")),
                    value(Operator::Multiply, tag("*")),
                    value(Operator::Divide, tag("/")),
                    value(Operator::Modulo, tag("%")),
                    value(Operator::Not, tag("!")),
                    value(Operator::BitNot, tag("~")),
                    value(Operator::BitAnd, tag("&")),
                    value(Operator::BitOr, tag("|")),
                    value(Operator::BitXor, tag("^")),
                )),
            )),
            Token::Operator,
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        map(
            alt((
                value(Delimiter::OpenBrace, tag("{")),
                value(Delimiter::CloseBrace, tag("}")),
                value(Delimiter::OpenParen, tag("(")),
                value(Delimiter::CloseParen, tag(")")),
                value(Delimiter::OpenBracket, tag("[")),
                value(Delimiter::CloseBracket, tag("]")),
                value(Delimiter::Comma, tag(",")),
                value(Delimiter::Semicolon, tag(";")),
                value(Delimiter::Colon, tag(":")),
                value(Delimiter::Equal, tag("=")),
            )),
            Token::Delimiter,
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators() {
        let test_cases = [
            ("==", Operator::EqualEqual),
            ("!=", Operator::NotEqual),
            (">=", Operator::GreaterEqual),
            ("<<", Operator::ShiftLeft),
            (">>>", Operator::UnsignedShiftRight),
            ("++", Operator::Increment),
            ("%=", Operator::ModuloAssign),
            ("?", Operator::Question),
            ("~", Operator::BitNot),
        ];

        for (input, expected) in test_cases {
            let (rest, token) = parse_operator(input).unwrap();
            assert_eq!(token, Token::Operator(expected));
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_longest_match() {
        let (rest, token) = parse_operator(">>=1").unwrap();
        assert_eq!(token, Token::Operator(Operator::ShiftRightAssign));
        assert_eq!(rest, "1");

        let (rest, token) = parse_operator("+-x").unwrap();
        assert_eq!(token, Token::Operator(Operator::Plus));
        assert_eq!(rest, "-x");
    }

    #[test]
    fn test_delimiters() {
        for symbol in ["{", "}", "(", ")", "[", "]", ",", ";", ":", "="] {
            let (rest, token) = parse_delimiter(symbol).unwrap();
            match token {
                Token::Delimiter(delimiter) => assert_eq!(delimiter.as_symbol(), symbol),
                other => panic!("expected delimiter, got {:?}", other),
            }
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(Operator::UnsignedShiftRight.to_string(), ">>>");
        assert_eq!(Operator::PlusAssign.to_string(), "+=");
    }
}
