//! Error types shared across the pipeline.
//!
//! Each stage has its own error ([`TokenizerError`], [`ParseError`],
//! [`TypeCheckError`], [`RuntimeError`]). Callers of [`evaluate`](crate::evaluate)
//! and the [`Engine`](crate::engine::Engine) only ever see
//! [`EvaluationError`], which classifies a failure as a compile error, a
//! runtime exception, a timeout or a cancellation.

use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use thiserror::Error;

use crate::{
    analyzer::ParseError, tokenizer::token::TokenizerError, type_checker::TypeCheckError,
};

/// Frames shown under an exception.
pub const MAX_STACK_FRAMES: usize = 3;

/// One line of an exception's stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub class: String,
    pub method: String,
    pub line: usize,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}.{}(line {})", self.class, self.method, self.line)
    }
}

fn exception_text(class: &str, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("{}: {}", class, message),
        None => class.to_string(),
    }
}

fn compile_text(message: &str, line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!("Line {}, Column {}: {}", line, column, message),
        (Some(line), None) => format!("Line {}: {}", line, message),
        _ => message.to_string(),
    }
}

/// How a running program stopped abnormally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A Java exception nobody caught.
    #[error("{}", exception_text(.class, .message))]
    Exception {
        class: String,
        message: Option<String>,
        stack: Vec<StackFrame>,
    },
    #[error("execution timed out")]
    Timeout,
    #[error("execution cancelled")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// The source could not be turned into a program. Nothing ran.
    #[error("{}", compile_text(.message, .line, .column))]
    Compile {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },
    /// The program threw. `output` is what it printed before that.
    #[error("{}", exception_text(.exception, .message))]
    Runtime {
        exception: String,
        message: Option<String>,
        stack: Vec<StackFrame>,
        output: String,
    },
    #[error(
        "Timeout: code execution timed out after {}ms. Check for infinite loops or excessive computation.",
        .limit.as_millis()
    )]
    Timeout { limit: Duration },
    #[error("Execution cancelled")]
    Cancelled,
}

impl EvaluationError {
    pub fn compile(message: impl Into<String>) -> Self {
        EvaluationError::Compile {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn compile_at(message: impl Into<String>, line: usize, column: usize) -> Self {
        EvaluationError::Compile {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Attaches the interpreter's view of a failure to the output printed so far.
    pub fn from_runtime(error: RuntimeError, output: String, limit: Duration) -> Self {
        match error {
            RuntimeError::Exception {
                class,
                message,
                stack,
            } => EvaluationError::Runtime {
                exception: class,
                message,
                stack,
                output,
            },
            RuntimeError::Timeout => EvaluationError::Timeout { limit },
            RuntimeError::Cancelled => EvaluationError::Cancelled,
        }
    }

    pub fn is_compile(&self) -> bool {
        matches!(self, EvaluationError::Compile { .. })
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, EvaluationError::Runtime { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, EvaluationError::Timeout { .. })
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            EvaluationError::Compile { line, .. } => *line,
            EvaluationError::Runtime { stack, .. } => stack.first().map(|frame| frame.line),
            _ => None,
        }
    }

    /// Output printed before a runtime failure.
    pub fn output(&self) -> Option<&str> {
        match self {
            EvaluationError::Runtime { output, .. } => Some(output),
            _ => None,
        }
    }

    /// The message followed by the stack trace, for runtime failures.
    pub fn report(&self) -> String {
        match self {
            EvaluationError::Runtime { stack, .. } if !stack.is_empty() => {
                let mut report = format!("{}\n\nStack trace:", self);
                for frame in stack.iter().take(MAX_STACK_FRAMES) {
                    report.push_str(&format!("\n  {}", frame));
                }
                report
            }
            _ => self.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Any error this crate produces.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Type check error: {0}")]
    TypeCheck(#[from] TypeCheckError),
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_display() {
        let error = EvaluationError::compile_at("';' expected", 2, 7);
        assert_eq!(error.to_string(), "Line 2, Column 7: ';' expected");
        assert_eq!(error.line(), Some(2));
        assert_eq!(EvaluationError::compile("Code is empty").to_string(), "Code is empty");
    }

    #[test]
    fn test_timeout_message() {
        let error = EvaluationError::Timeout {
            limit: Duration::from_millis(5000),
        };
        let message = error.to_string();
        assert!(message.starts_with("Timeout: code execution timed out after 5000ms"));
        assert!(error.is_timeout());
    }

    #[test]
    fn test_runtime_report() {
        let error = EvaluationError::from_runtime(
            RuntimeError::Exception {
                class: "ArithmeticException".to_string(),
                message: Some("/ by zero".to_string()),
                stack: vec![
                    StackFrame {
                        class: "Main".to_string(),
                        method: "divide".to_string(),
                        line: 3,
                    },
                    StackFrame {
                        class: "Main".to_string(),
                        method: "main".to_string(),
                        line: 7,
                    },
                ],
            },
            "before\n".to_string(),
            Duration::from_secs(1),
        );
        assert_eq!(error.to_string(), "ArithmeticException: / by zero");
        assert_eq!(error.output(), Some("before\n"));
        assert_eq!(error.line(), Some(3));
        assert_eq!(
            error.report(),
            "ArithmeticException: / by zero\n\nStack trace:\n  at Main.divide(line 3)\n  at Main.main(line 7)"
        );
    }

    #[test]
    fn test_interrupts_map_to_evaluation_errors() {
        let limit = Duration::from_millis(700);
        assert_eq!(
            EvaluationError::from_runtime(RuntimeError::Timeout, String::new(), limit),
            EvaluationError::Timeout { limit }
        );
        assert_eq!(
            EvaluationError::from_runtime(RuntimeError::Cancelled, String::new(), limit),
            EvaluationError::Cancelled
        );
    }
}
