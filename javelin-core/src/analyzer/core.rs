//! # Core Parser Definitions
//!
//! The [`Parser`] trait and the [`ParseError`] every combinator reports.
//!
//! Positions are token indices into the preprocessed token stream. They
//! are turned into lines and columns by the
//! [`SourceMap`](crate::preprocessor::SourceMap) once parsing is over.

use thiserror::Error;

/// Parses a slice of `I` starting at `pos`, producing an `O` and the
/// position just after what was consumed.
pub trait Parser<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O>;
}

pub type ParseResult<O> = Result<(usize, O), ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected EOF: {message} at position {position}, context: {context:?}")]
    UnexpectedEOF {
        message: String,
        position: usize,
        context: Option<String>,
    },
    #[error("Unexpected: expected {expected}, parsed {parsed} at position {position}, context: {context:?}")]
    Unexpected {
        expected: String,
        parsed: String,
        position: usize,
        context: Option<String>,
    },
    #[error("No alternative matched at position {position}, context: {context:?}")]
    NoAlternative {
        position: usize,
        context: Option<String>,
    },
    #[error("Failure: {message} at position {position}, context: {context:?}")]
    Failure {
        message: String,
        position: usize,
        context: Option<String>,
    },
    /// An error no alternative can recover from, such as nesting past
    /// [`MAX_NESTING_DEPTH`](super::combinators::MAX_NESTING_DEPTH) or an
    /// out of range literal. Never backtracked over.
    #[error("Fatal: {message} at position {position}")]
    Fatal { message: String, position: usize },
}

fn push_context(context: Option<String>, ctx: &str) -> Option<String> {
    Some(match context {
        Some(c) => format!("{} -> {}", c, ctx),
        None => ctx.to_string(),
    })
}

impl ParseError {
    pub fn with_context(self, ctx: &str) -> Self {
        match self {
            ParseError::UnexpectedEOF {
                message,
                position,
                context,
            } => ParseError::UnexpectedEOF {
                message,
                position,
                context: push_context(context, ctx),
            },
            ParseError::Unexpected {
                expected,
                parsed,
                position,
                context,
            } => ParseError::Unexpected {
                expected,
                parsed,
                position,
                context: push_context(context, ctx),
            },
            ParseError::NoAlternative { position, context } => ParseError::NoAlternative {
                position,
                context: push_context(context, ctx),
            },
            ParseError::Failure {
                message,
                position,
                context,
            } => ParseError::Failure {
                message,
                position,
                context: push_context(context, ctx),
            },
            fatal @ ParseError::Fatal { .. } => fatal,
        }
    }

    pub fn get_position(&self) -> usize {
        match self {
            ParseError::UnexpectedEOF { position, .. } => *position,
            ParseError::Unexpected { position, .. } => *position,
            ParseError::NoAlternative { position, .. } => *position,
            ParseError::Failure { position, .. } => *position,
            ParseError::Fatal { position, .. } => *position,
        }
    }

    /// Whether a parser that started at `pos` must report this error
    /// instead of backtracking.
    pub fn commits(&self, pos: usize) -> bool {
        matches!(self, ParseError::Fatal { .. }) || self.get_position() > pos
    }

    /// The innermost context, i.e. the construct that was being parsed when
    /// the error happened.
    pub fn innermost_context(&self) -> Option<&str> {
        let context = match self {
            ParseError::UnexpectedEOF { context, .. }
            | ParseError::Unexpected { context, .. }
            | ParseError::NoAlternative { context, .. }
            | ParseError::Failure { context, .. } => context.as_deref(),
            ParseError::Fatal { .. } => None,
        };
        context.and_then(|c| c.split(" -> ").next())
    }

    /// A compiler-style one line description.
    pub fn describe(&self) -> String {
        match self {
            ParseError::UnexpectedEOF { .. } => "reached end of file while parsing".to_string(),
            ParseError::Unexpected {
                expected, parsed, ..
            } => format!("'{}' expected but found '{}'", expected, parsed),
            ParseError::NoAlternative { .. } => format!(
                "illegal start of {}",
                self.innermost_context().unwrap_or("expression")
            ),
            ParseError::Failure { message, .. } => message.clone(),
            ParseError::Fatal { message, .. } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_chain() {
        let error = ParseError::NoAlternative {
            position: 3,
            context: None,
        }
        .with_context("expression")
        .with_context("statement");

        assert_eq!(error.get_position(), 3);
        assert_eq!(error.innermost_context(), Some("expression"));
        assert_eq!(error.describe(), "illegal start of expression");
    }

    #[test]
    fn test_describe() {
        let error = ParseError::Unexpected {
            expected: ";".to_string(),
            parsed: "System".to_string(),
            position: 5,
            context: None,
        };
        assert_eq!(error.describe(), "';' expected but found 'System'");

        let eof = ParseError::UnexpectedEOF {
            message: "expected expression".to_string(),
            position: 2,
            context: None,
        };
        assert_eq!(eof.describe(), "reached end of file while parsing");

        let deep = ParseError::Fatal {
            message: "code too deeply nested".to_string(),
            position: 7,
        }
        .with_context("expression");
        assert_eq!(deep.describe(), "code too deeply nested");
        assert!(deep.commits(7));
    }
}
