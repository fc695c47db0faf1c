use std::fmt;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    combinator::recognize,
    error::{VerboseError, context},
    sequence::pair,
};
use thiserror::Error;

use super::{
    comment::parse_comment,
    keyword::{Keyword, PrimitiveType},
    literal::{Literal, parse_literal},
    symbol::{Delimiter, Operator, parse_delimiter, parse_operator},
    whitespace::{parse_newline, parse_whitespace},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Keyword(Keyword),
    // Identifiers
    Identifier(String),
    // Primitive types
    Type(PrimitiveType),
    // Symbols
    Operator(Operator),
    Delimiter(Delimiter),
    // Literals
    Literal(Literal),
    // Formatting
    Whitespace(String),
    Newline,
    Comment {
        content: String,
        comment_type: CommentType,
    },
}

impl Token {
    pub fn is_comment(&self) -> bool {
        matches!(self, Token::Comment { .. })
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace(_))
    }

    pub fn is_newline(&self) -> bool {
        matches!(self, Token::Newline)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(kw) => write!(f, "{}", kw),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Type(ty) => write!(f, "{}", ty),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Delimiter(delimiter) => write!(f, "{}", delimiter.as_symbol()),
            Token::Literal(literal) => write!(f, "{}", literal),
            Token::Whitespace(ws) => write!(f, "{}", ws),
            Token::Newline => writeln!(f),
            Token::Comment { content, .. } => write!(f, "/*{}*/", content),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentType {
    Line,               // //
    Block,              // /* */
    DocumentationLine,  // ///
    DocumentationBlock, // /** */
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    current_position: usize,
    current_line: usize,
    current_column: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            current_position: 0,
            current_line: 1,   // 1-based
            current_column: 1, // 1-based
        }
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub fn tokenize(&mut self, input: &str) -> TokenizerResult<Vec<TokenSpan>> {
        let mut tokens = Vec::new();
        let mut remaining = input;

        while !remaining.is_empty() {
            let start_position = self.current_position;
            let start_line = self.current_line;
            let start_column = self.current_column;

            let result = alt((
                // Formatting
                parse_whitespace,
                parse_newline,
                // Comments come before operators so that `/` does not win
                parse_comment,
                // Literals
                parse_literal,
                // Words: keywords, types, word literals and identifiers
                parse_word,
                // Symbols
                parse_operator,
                parse_delimiter,
            ))(remaining);

            match result {
                Ok((new_remaining, token)) => {
                    let consumed = &remaining[..(remaining.len() - new_remaining.len())];
                    self.update_position(consumed);

                    tokens.push(TokenSpan {
                        token,
                        start: start_position,
                        end: self.current_position,
                        line: start_line,
                        column: start_column,
                    });

                    remaining = new_remaining;
                }
                Err(e) => {
                    let found = remaining.chars().take(20).collect::<String>();
                    let span = Span {
                        start: self.current_position,
                        end: self.current_position + 1,
                        line: self.current_line,
                        column: self.current_column,
                    };
                    let error = match e {
                        nom::Err::Incomplete(e) => TokenizerError::ParseError {
                            message: format!("Incomplete input, {:?}", e),
                            found,
                            span,
                        },
                        nom::Err::Error(_) | nom::Err::Failure(_) => TokenizerError::ParseError {
                            message: describe_unexpected(remaining),
                            found,
                            span,
                        },
                    };
                    tracing::error!("{}", error);
                    return Err(error);
                }
            }
        }

        Ok(tokens)
    }

    fn update_position(&mut self, text: &str) {
        for c in text.chars() {
            self.current_position += c.len_utf8();
            if c == '\n' {
                self.current_line += 1;
                self.current_column = 1;
            } else {
                self.current_column += 1;
            }
        }
    }
}

/// Whether a quoted literal uses an escape Java does not define.
fn has_illegal_escape(quoted: &str, quote: char) -> bool {
    let mut chars = quoted.chars().skip(1);
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('u' | 'n' | 't' | 'b' | 'r' | 'f' | 's' | '\'' | '"' | '\\' | '0'..='7') => {}
                _ => return true,
            },
            '\n' | '\r' => return false,
            c if c == quote => return false,
            _ => {}
        }
    }
    false
}

fn describe_unexpected(remaining: &str) -> String {
    if remaining.starts_with("/*") {
        return "unclosed comment".to_string();
    }
    match remaining.chars().next() {
        Some(quote @ ('"' | '\'')) if has_illegal_escape(remaining, quote) => {
            "illegal escape character".to_string()
        }
        Some('"') => "unclosed string literal".to_string(),
        Some('\'') if remaining.starts_with("''") => "empty character literal".to_string(),
        Some('\'') => "unclosed character literal".to_string(),
        Some(c) if c.is_ascii_digit() => {
            let radix_prefix = ["0x", "0X", "0b", "0B"]
                .iter()
                .any(|prefix| remaining.starts_with(prefix));
            if radix_prefix {
                "malformed number literal".to_string()
            } else {
                "integer number too large".to_string()
            }
        }
        Some(c) => format!("illegal character: '{}'", c.escape_default()),
        None => "unexpected end of input".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct TokenSpan {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl TokenSpan {
    pub fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
            line: self.line,
            column: self.column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line: {}, column: {}, start: {}, end: {}",
            self.line, self.column, self.start, self.end
        )
    }
}

/// Reads a whole word and classifies it.
///
/// Keywords, primitive type names and the word literals (`true`, `false`,
/// `null`) are recognised only when they make up the entire word, so
/// `iffy` and `intValue` stay identifiers.
#[tracing::instrument(level = "debug", skip(input))]
fn parse_word(input: &str) -> ParserResult<Token> {
    let (input, word) = context(
        "identifier",
        recognize(pair(
            take_while1(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
            take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
        )),
    )(input)?;

    Ok((input, classify_word(word)))
}

pub(crate) fn classify_word(word: &str) -> Token {
    match word {
        "true" => return Token::Literal(Literal::Boolean(true)),
        "false" => return Token::Literal(Literal::Boolean(false)),
        "null" => return Token::Literal(Literal::Null),
        _ => {}
    }
    if let Ok(kw) = Keyword::try_from(word) {
        return Token::Keyword(kw);
    }
    if let Ok(ty) = PrimitiveType::try_from(word) {
        return Token::Type(ty);
    }
    Token::Identifier(word.to_string())
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub type TokenizerResult<T> = Result<T, TokenizerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizerError {
    #[error("Parse error: {message} at position {span}")]
    ParseError {
        message: String,
        found: String,
        span: Span,
    },
}

impl TokenizerError {
    pub fn span(&self) -> &Span {
        match self {
            TokenizerError::ParseError { span, .. } => span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TokenizerError::ParseError { message, .. } => message,
        }
    }
}
