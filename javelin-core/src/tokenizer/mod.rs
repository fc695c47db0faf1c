//! # Tokenizer
//!
//! Lexical analysis: source text in, [`TokenSpan`](token::TokenSpan)s out.
//!
//! Whitespace, newlines and comments are emitted as tokens. The
//! [`preprocessor`](crate::preprocessor) removes them before parsing, but
//! keeping them here means every span (byte range, line, column) is exact.
//!
//! * [`token`]: token types and the [`Tokenizer`](token::Tokenizer) driver
//! * [`keyword`]: reserved words and primitive type names
//! * [`symbol`]: operators and delimiters
//! * [`literal`]: numeric, character and string literals
//! * [`whitespace`]: blanks and line terminators
//! * [`comment`]: `//`, `/* */` and documentation comments
//!
//! ```rust
//! use javelin_core::tokenizer::token::{Token, Tokenizer};
//!
//! let tokens = Tokenizer::new().tokenize("int x = 1;").unwrap();
//! assert_eq!(tokens[0].line, 1);
//! assert!(matches!(tokens.last().map(|t| &t.token), Some(Token::Delimiter(_))));
//! ```

pub mod comment;
pub mod keyword;
pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;
