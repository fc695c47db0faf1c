//! # Literal Tokens
//!
//! Numeric, character and string literals. The word literals `true`,
//! `false` and `null` are classified together with identifiers in
//! [`token`](super::token).
//!
//! Integer literals are stored before sign handling: `2147483648` lexes
//! fine and is only rejected later if it is not the operand of a unary
//! minus. Hexadecimal, octal and binary literals are stored as their two's
//! complement value, so `0xFFFFFFFF` is `-1`.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while_m_n, take_while1},
    character::complete::{char, none_of, one_of, satisfy},
    combinator::{map, map_opt, opt, peek, recognize, value},
    error::{ErrorKind, ParseError, VerboseError, context},
    multi::{fold_many0, many1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use super::token::{ParserResult, Token};

/// Largest magnitude an `int` literal may have (only valid after unary minus).
pub const INT_LITERAL_LIMIT: i64 = 1 << 31;
/// Largest magnitude a `long` literal may have (only valid after unary minus).
pub const LONG_LITERAL_LIMIT: i128 = 1 << 63;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Char(char),
    Integer(i64),
    Long(i128),
    Double(f64),
    Boolean(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "\"{}\"", s.escape_default()),
            Literal::Char(c) => write!(f, "'{}'", c.escape_default()),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Long(l) => write!(f, "{}L", l),
            Literal::Double(d) => write!(f, "{:?}", d),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

fn literal_error(input: &str) -> nom::Err<VerboseError<&str>> {
    nom::Err::Error(VerboseError::from_error_kind(input, ErrorKind::Verify))
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_escape(input: &str) -> ParserResult<char> {
    context(
        "escape sequence",
        preceded(
            char('\\'),
            alt((
                // A lone surrogate has no `char` and becomes U+FFFD.
                map_opt(
                    preceded(
                        many1(char('u')),
                        take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
                    ),
                    |hex: &str| {
                        u32::from_str_radix(hex, 16)
                            .ok()
                            .map(|code| char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
                    },
                ),
                map_opt(
                    take_while_m_n(1, 3, |c: char| ('0'..='7').contains(&c)),
                    |oct: &str| {
                        u32::from_str_radix(oct, 8)
                            .ok()
                            .filter(|v| *v <= 0o377)
                            .and_then(char::from_u32)
                    },
                ),
                value('\n', char('n')),
                value('\t', char('t')),
                value('\u{0008}', char('b')),
                value('\r', char('r')),
                value('\u{000C}', char('f')),
                value(' ', char('s')),
                value('\'', char('\'')),
                value('"', char('"')),
                value('\\', char('\\')),
            )),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    context(
        "string literal",
        map(
            delimited(
                char('"'),
                fold_many0(
                    alt((
                        map(parse_escape, StringChunk::Char),
                        map(
                            take_while1(|c| c != '"' && c != '\\' && c != '\n' && c != '\r'),
                            StringChunk::Text,
                        ),
                    )),
                    String::new,
                    |mut acc, chunk| {
                        match chunk {
                            StringChunk::Char(c) => acc.push(c),
                            StringChunk::Text(text) => acc.push_str(text),
                        }
                        acc
                    },
                ),
                char('"'),
            ),
            Literal::String,
        ),
    )(input)
}

enum StringChunk<'a> {
    Char(char),
    Text(&'a str),
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_char_literal(input: &str) -> ParserResult<Literal> {
    context(
        "character literal",
        map(
            delimited(char('\''), alt((parse_escape, none_of("'\\\n\r"))), char('\'')),
            Literal::Char,
        ),
    )(input)
}

fn decimal_digits(input: &str) -> ParserResult<&str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_digit()),
        take_while(|c: char| c.is_ascii_digit() || c == '_'),
    ))(input)
}

fn exponent(input: &str) -> ParserResult<&str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), decimal_digits)))(input)
}

fn strip_underscores(text: &str) -> String {
    text.chars().filter(|c| *c != '_').collect()
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_double_literal(input: &str) -> ParserResult<Literal> {
    let (rest, body) = context(
        "floating point literal",
        alt((
            recognize(tuple((decimal_digits, char('.'), decimal_digits, opt(exponent)))),
            recognize(tuple((char('.'), decimal_digits, opt(exponent)))),
            recognize(pair(decimal_digits, exponent)),
            terminated(decimal_digits, peek(one_of("dDfF"))),
        )),
    )(input)?;
    let (rest, _) = opt(one_of("dDfF"))(rest)?;
    let parsed = strip_underscores(body)
        .parse::<f64>()
        .map_err(|_| literal_error(input))?;
    Ok((rest, Literal::Double(parsed)))
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_radix_literal(input: &str) -> ParserResult<Literal> {
    let (rest, (radix, body)) = context(
        "hexadecimal or binary literal",
        alt((
            map(
                preceded(
                    pair(char('0'), one_of("xX")),
                    take_while1(|c: char| c.is_ascii_hexdigit() || c == '_'),
                ),
                |body| (16, body),
            ),
            map(
                preceded(
                    pair(char('0'), one_of("bB")),
                    take_while1(|c: char| c == '0' || c == '1' || c == '_'),
                ),
                |body| (2, body),
            ),
        )),
    )(input)?;
    let (rest, long_suffix) = opt(one_of("lL"))(rest)?;
    let bits = u64::from_str_radix(&strip_underscores(body), radix)
        .map_err(|_| literal_error(input))?;
    into_integer_literal(input, rest, bits, long_suffix.is_some())
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_integer_literal(input: &str) -> ParserResult<Literal> {
    let (rest, body) = context("integer literal", decimal_digits)(input)?;
    let (rest, long_suffix) = opt(one_of("lL"))(rest)?;
    let digits = strip_underscores(body);

    // A leading zero makes the literal octal.
    if digits.len() > 1 && digits.starts_with('0') {
        let bits = u64::from_str_radix(&digits[1..], 8).map_err(|_| literal_error(input))?;
        return into_integer_literal(input, rest, bits, long_suffix.is_some());
    }

    let magnitude = digits.parse::<u64>().map_err(|_| literal_error(input))?;
    if long_suffix.is_some() {
        if magnitude as i128 > LONG_LITERAL_LIMIT {
            return Err(literal_error(input));
        }
        Ok((rest, Literal::Long(magnitude as i128)))
    } else {
        if magnitude as i128 > INT_LITERAL_LIMIT as i128 {
            return Err(literal_error(input));
        }
        Ok((rest, Literal::Integer(magnitude as i64)))
    }
}

fn into_integer_literal<'a>(
    input: &'a str,
    rest: &'a str,
    bits: u64,
    long: bool,
) -> ParserResult<'a, Literal> {
    if long {
        Ok((rest, Literal::Long(bits as i64 as i128)))
    } else {
        let bits = u32::try_from(bits).map_err(|_| literal_error(input))?;
        Ok((rest, Literal::Integer(bits as i32 as i64)))
    }
}

/// Parses a numeric, character or string literal.
///
/// ```
/// # use javelin_core::tokenizer::literal::{parse_literal, Literal};
/// # use javelin_core::tokenizer::token::Token;
/// let (rest, token) = parse_literal("1.5e3;").unwrap();
/// assert_eq!(token, Token::Literal(Literal::Double(1500.0)));
/// assert_eq!(rest, ";");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((
                parse_string_literal,
                parse_char_literal,
                parse_radix_literal,
                parse_double_literal,
                parse_integer_literal,
            )),
            Token::Literal,
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(input: &str) -> Literal {
        match parse_literal(input) {
            Ok(("", Token::Literal(literal))) => literal,
            other => panic!("failed to lex {:?}: {:?}", input, other),
        }
    }

    #[test]
    fn test_integer_literals() {
        assert_eq!(literal("42"), Literal::Integer(42));
        assert_eq!(literal("1_000_000"), Literal::Integer(1_000_000));
        assert_eq!(literal("2147483648"), Literal::Integer(2147483648));
        assert_eq!(literal("010"), Literal::Integer(8));
        assert_eq!(literal("0"), Literal::Integer(0));
        assert!(parse_literal("2147483649").is_err());
    }

    #[test]
    fn test_long_literals() {
        assert_eq!(literal("999999999999L"), Literal::Long(999_999_999_999));
        assert_eq!(literal("5l"), Literal::Long(5));
        assert_eq!(
            literal("9223372036854775808L"),
            Literal::Long(9_223_372_036_854_775_808)
        );
    }

    #[test]
    fn test_radix_literals() {
        assert_eq!(literal("0xFF"), Literal::Integer(255));
        assert_eq!(literal("0xFFFFFFFF"), Literal::Integer(-1));
        assert_eq!(literal("0b101"), Literal::Integer(5));
        assert_eq!(literal("0x7fffffffffffffffL"), Literal::Long(i64::MAX as i128));
        assert!(parse_literal("0x1FFFFFFFF").is_err());
    }

    #[test]
    fn test_double_literals() {
        assert_eq!(literal("3.14"), Literal::Double(3.14));
        assert_eq!(literal(".5"), Literal::Double(0.5));
        assert_eq!(literal("1e3"), Literal::Double(1000.0));
        assert_eq!(literal("2.5E-1"), Literal::Double(0.25));
        assert_eq!(literal("7d"), Literal::Double(7.0));
        assert_eq!(literal("1.5f"), Literal::Double(1.5));
    }

    #[test]
    fn test_char_literals() {
        assert_eq!(literal("'a'"), Literal::Char('a'));
        assert_eq!(literal("'\\n'"), Literal::Char('\n'));
        assert_eq!(literal("'\\''"), Literal::Char('\''));
        assert_eq!(literal("'\\u0041'"), Literal::Char('A'));
        assert_eq!(literal("'\\0'"), Literal::Char('\0'));
        assert_eq!(literal("'\\uD800'"), Literal::Char(char::REPLACEMENT_CHARACTER));
        assert!(parse_literal("''").is_err());
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            literal(r#""Hello\nWorld\t!""#),
            Literal::String("Hello\nWorld\t!".to_string())
        );
        assert_eq!(
            literal(r#""say \"hi\"""#),
            Literal::String("say \"hi\"".to_string())
        );
        assert_eq!(literal(r#""""#), Literal::String(String::new()));
        assert!(parse_literal("\"broken\nline\"").is_err());
    }

    #[test]
    fn test_member_access_after_integer() {
        let (rest, token) = parse_literal("1.length").unwrap();
        assert_eq!(token, Token::Literal(Literal::Integer(1)));
        assert_eq!(rest, ".length");
    }
}
