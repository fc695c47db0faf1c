//! # Comment Tokens
//!
//! Java-style comments are kept as tokens until the preprocessor drops them:
//!
//! * **Line**: `// text`
//! * **Block**: `/* text */`
//! * **Documentation line**: `/// text`
//! * **Documentation block**: `/** text */`
//!
//! Block comments do not nest. The first `*/` closes the comment.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::not_line_ending,
    combinator::map,
    error::context,
    sequence::{delimited, preceded},
};

use super::token::{CommentType, ParserResult, Token};

/// Parses a `//` comment up to (not including) the line ending.
///
/// ```
/// # use javelin_core::tokenizer::comment::parse_line_comment;
/// # use javelin_core::tokenizer::token::{Token, CommentType};
/// let (rest, token) = parse_line_comment("// total so far\nsum += x;").unwrap();
/// assert_eq!(token, Token::Comment {
///     content: "total so far".to_string(),
///     comment_type: CommentType::Line,
/// });
/// assert_eq!(rest, "\nsum += x;");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_line_comment(input: &str) -> ParserResult<Token> {
    context(
        "line comment",
        map(preceded(tag("//"), not_line_ending), |content: &str| {
            Token::Comment {
                content: content.trim().to_string(),
                comment_type: CommentType::Line,
            }
        }),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_block_comment(input: &str) -> ParserResult<Token> {
    context(
        "block comment",
        map(
            delimited(tag("/*"), take_until("*/"), tag("*/")),
            |content: &str| Token::Comment {
                content: content.to_string(),
                comment_type: CommentType::Block,
            },
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_line_documentation_comment(input: &str) -> ParserResult<Token> {
    context(
        "line documentation comment",
        map(preceded(tag("///"), not_line_ending), |content: &str| {
            Token::Comment {
                content: content.trim().to_string(),
                comment_type: CommentType::DocumentationLine,
            }
        }),
    )(input)
}

/// Parses a Javadoc-style `/** ... */` comment. An empty `/**/` is a plain
/// block comment and is left to [`parse_block_comment`].
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_block_documentation_comment(input: &str) -> ParserResult<Token> {
    context(
        "block documentation comment",
        map(
            delimited(tag("/**"), take_until("*/"), tag("*/")),
            |content: &str| Token::Comment {
                content: content.to_string(),
                comment_type: CommentType::DocumentationBlock,
            },
        ),
    )(input)
}

/// Parses any comment, most specific form first.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_comment(input: &str) -> ParserResult<Token> {
    context(
        "comment",
        alt((
            parse_block_documentation_comment,
            parse_line_documentation_comment,
            parse_block_comment,
            parse_line_comment,
        )),
    )(input)
}
