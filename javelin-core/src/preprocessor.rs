//! # Preprocessor
//!
//! Sits between the tokenizer and the parser:
//!
//! ```text
//! Source → Tokenizer → Preprocessor → Parser → Type Checker → Interpreter
//! ```
//!
//! The parser only sees significant tokens, so whitespace, newlines and
//! comments are dropped here. The span of every surviving token is kept in
//! a [`SourceMap`] indexed by token position, which is how parse errors,
//! type errors and runtime stack frames find their way back to a line and
//! column.

use crate::tokenizer::token::{Span, Token, TokenSpan};

/// A trait for preprocessing different types of input
pub trait Preprocessor<T, U = T> {
    fn process(&self, input: T) -> U;
}

/// Significant tokens plus the span of each one.
#[derive(Debug, Clone, Default)]
pub struct PreprocessedTokens {
    pub tokens: Vec<Token>,
    pub source_map: SourceMap,
}

/// Maps token positions (as seen by the parser) to source spans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    spans: Vec<Span>,
    end: Span,
}

impl SourceMap {
    pub fn new(spans: Vec<Span>, end: Span) -> Self {
        Self { spans, end }
    }

    /// Span of the token at `position`. Positions past the last token map to
    /// the end of the input.
    pub fn span(&self, position: usize) -> &Span {
        self.spans.get(position).unwrap_or(&self.end)
    }

    pub fn line(&self, position: usize) -> usize {
        self.span(position).line
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Token-specific preprocessor implementation
#[derive(Debug, Default)]
pub struct TokenPreprocessor {}

impl TokenPreprocessor {
    pub fn new() -> Self {
        Self {}
    }
}

impl Preprocessor<Vec<TokenSpan>, PreprocessedTokens> for TokenPreprocessor {
    fn process(&self, input: Vec<TokenSpan>) -> PreprocessedTokens {
        let end = input
            .last()
            .map(|last| {
                let lines_in_last = last.token.is_newline() as usize;
                Span {
                    start: last.end,
                    end: last.end,
                    line: last.line + lines_in_last,
                    column: if lines_in_last == 1 {
                        1
                    } else {
                        last.column + (last.end - last.start)
                    },
                }
            })
            .unwrap_or(Span {
                start: 0,
                end: 0,
                line: 1,
                column: 1,
            });

        let (tokens, spans): (Vec<Token>, Vec<Span>) = input
            .into_iter()
            .filter(|span| {
                !span.token.is_comment() && !span.token.is_whitespace() && !span.token.is_newline()
            })
            .map(|span| {
                let location = span.span();
                (span.token, location)
            })
            .unzip();

        tracing::debug!(significant = tokens.len(), "preprocessed token stream");
        PreprocessedTokens {
            tokens,
            source_map: SourceMap::new(spans, end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{keyword::PrimitiveType, token::Tokenizer};

    fn preprocess(source: &str) -> PreprocessedTokens {
        let spans = Tokenizer::new().tokenize(source).unwrap();
        TokenPreprocessor::new().process(spans)
    }

    #[test]
    fn test_drops_trivia() {
        let result = preprocess("int /* count */ x; // done\n");
        assert_eq!(result.tokens.len(), 3);
        assert_eq!(result.tokens[0], Token::Type(PrimitiveType::Int));
        assert_eq!(result.source_map.len(), 3);
    }

    #[test]
    fn test_source_map_positions() {
        let result = preprocess("int x;\n  x = 2;");
        let map = &result.source_map;
        assert_eq!(map.line(0), 1);
        assert_eq!(map.span(3).line, 2);
        assert_eq!(map.span(3).column, 3);
    }

    #[test]
    fn test_end_of_input_span() {
        let result = preprocess("x *");
        let end = result.source_map.span(10);
        assert_eq!(end.line, 1);
        assert_eq!(end.column, 4);

        let empty = preprocess("");
        assert!(empty.tokens.is_empty());
        assert_eq!(empty.source_map.span(0).line, 1);
    }
}
