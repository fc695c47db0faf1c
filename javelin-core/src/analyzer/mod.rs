//! # Analyzer
//!
//! Turns the preprocessed token stream into an [`ast::CompilationUnit`](crate::ast::CompilationUnit)
//! with a small parser combinator library.
//!
//! ## Core Components
//!
//! * **Parser Trait**: the parsing contract, see [`core`]
//! * **Combinators**: composable building blocks, see [`combinators`] and [`prelude`]
//! * **Grammar**: expressions, statements and top-level units, see [`parsers`]
//!
//! ## Position in the Pipeline
//!
//! ```text
//! Source → Tokenizer → Preprocessor → Analyzer → Type Checker → Interpreter
//! ```
//!
//! ## Usage Example
//!
//! ```
//! use javelin_core::analyzer::prelude::*;
//! use javelin_core::analyzer::Parser;
//! use javelin_core::tokenizer::token::Token;
//!
//! let parser = equal(Token::Identifier("example".to_string()));
//! let tokens = vec![Token::Identifier("example".to_string())];
//! assert!(parser.parse(&tokens, 0).is_ok());
//! ```

pub mod combinators;
pub mod core;
pub mod parsers;
pub mod prelude;

pub use core::ParseError;
pub use core::ParseResult;
pub use core::Parser;
pub use parsers::parse_compilation_unit;
