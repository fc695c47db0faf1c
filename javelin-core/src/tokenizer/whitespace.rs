//! Whitespace and line terminators.
//!
//! Both are kept as tokens so that spans stay exact. Java treats space, tab
//! and form feed as whitespace and accepts `\n`, `\r\n` and a bare `\r` as
//! line terminators.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::map,
    error::context,
};

use super::token::{ParserResult, Token};

/// Parses a run of spaces, tabs and form feeds.
///
/// ```
/// # use javelin_core::tokenizer::whitespace::parse_whitespace;
/// # use javelin_core::tokenizer::token::Token;
/// let (rest, token) = parse_whitespace("  \tx").unwrap();
/// assert_eq!(token, Token::Whitespace("  \t".to_string()));
/// assert_eq!(rest, "x");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<Token> {
    context(
        "whitespace expected",
        map(
            take_while1(|c| c == ' ' || c == '\t' || c == '\u{000C}'),
            |ws: &str| Token::Whitespace(ws.to_string()),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_newline(input: &str) -> ParserResult<Token> {
    context(
        "newline expected",
        map(alt((tag("\r\n"), tag("\n"), tag("\r"))), |_| Token::Newline),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace() {
        let (rest, token) = parse_whitespace("\t\t  int").unwrap();
        assert_eq!(token, Token::Whitespace("\t\t  ".to_string()));
        assert_eq!(rest, "int");
    }

    #[test]
    fn test_line_terminators() {
        for (input, rest) in [("\nx", "x"), ("\r\ny", "y"), ("\rz", "z")] {
            let (remaining, token) = parse_newline(input).unwrap();
            assert_eq!(token, Token::Newline);
            assert_eq!(remaining, rest);
        }
    }

    #[test]
    fn test_error() {
        assert!(parse_whitespace("x").is_err());
        assert!(parse_newline("x").is_err());
    }
}
