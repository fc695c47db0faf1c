//! # Javelin: an embeddable evaluator for a Java subset
//!
//! Javelin compiles and runs small Java programs and snippets: a single
//! expression, a sequence of statements, a list of static methods with a
//! `main`, or one complete class. Callers pass named bindings in and get a
//! typed [`Value`] or a classified [`EvaluationError`] back.
//!
//! ```no_run
//! use javelin_core::{evaluate, Bindings, Value};
//!
//! let mut bindings = Bindings::new();
//! bindings.insert("a".to_string(), Value::Int(2));
//! bindings.insert("b".to_string(), Value::Int(3));
//! assert_eq!(evaluate("a + b", &bindings), Ok(Value::Int(5)));
//! ```
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source → Tokenizer → Preprocessor → Parser → Type Checker → Interpreter
//! ```
//!
//! ### Stage 1: Tokenization
//!
//! The [`tokenizer`] module turns source text into tokens with their
//! positions, rejecting malformed literals and unterminated comments.
//!
//! ### Stage 2: Preprocessing
//!
//! The [`preprocessor`] drops whitespace and comments and records a
//! [`SourceMap`](preprocessor::SourceMap) so later stages can report lines
//! and columns.
//!
//! ### Stage 3: Parsing
//!
//! The [`analyzer`] module builds the [`ast`] with parser combinators,
//! deciding which of the four program shapes the source has.
//!
//! ### Stage 4: Type Checking
//!
//! The [`type_checker`] resolves names, overloads and built-ins
//! ([`builtins`]), enforces Java's typing rules and lowers the tree into a
//! slot-addressed [`program::Program`].
//!
//! ### Stage 5: Evaluation
//!
//! The [`eval`] module walks the program under a time budget, an output
//! limit and a call depth limit.
//!
//! ## Engine
//!
//! For repeated use, the [`engine::Engine`] keeps compiled programs in a
//! cache, runs them on dedicated worker threads and reports through
//! [`result::ExecutionResult`] and [`result::TestReport`].

pub mod analyzer;
pub mod ast;
pub mod builtins;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod preprocessor;
pub mod program;
pub mod result;
pub mod tokenizer;
pub mod type_checker;

use tracing::warn;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, EvaluationError, InternalResult, RuntimeError, StackFrame};
pub use eval::{Bindings, Interrupt, Outcome, Value};
pub use result::{ErrorKind, ExecutionResult, TestCase, TestCaseResult, TestReport};

/// Compiles and runs `source` with the default configuration.
///
/// The returned value is the expression's value, the value of a top-level
/// `return`, or [`Value::Void`] for programs that only print.
pub fn evaluate(source: &str, bindings: &Bindings) -> Result<Value, EvaluationError> {
    evaluate_with_config(source, bindings, &EngineConfig::default())
}

/// Like [`evaluate`], with the limits taken from `config`.
///
/// The program runs on its own thread so deep recursion has the configured
/// stack to work with; the caller blocks until it finishes.
pub fn evaluate_with_config(
    source: &str,
    bindings: &Bindings,
    config: &EngineConfig,
) -> Result<Value, EvaluationError> {
    std::thread::scope(|scope| {
        let spawned = std::thread::Builder::new()
            .name("javelin-eval".to_string())
            .stack_size(config.worker_stack_size)
            .spawn_scoped(scope, || run(source, bindings, config));
        match spawned {
            Ok(handle) => handle
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload)),
            Err(e) => {
                warn!("failed to spawn evaluation thread, running inline: {}", e);
                run(source, bindings, config)
            }
        }
    })
}

fn run(source: &str, bindings: &Bindings, config: &EngineConfig) -> Result<Value, EvaluationError> {
    let types = compiler::binding_types(bindings)?;
    let program = compiler::compile(source, &types)?;
    let interrupt = Interrupt::with_timeout(config::clamp_timeout(config.timeout));
    eval::Interpreter::new(config)
        .run(&program, bindings, &[], interrupt)
        .map(|outcome| outcome.value)
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        // Log output for unit tests is controlled by RUST_LOG.
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
