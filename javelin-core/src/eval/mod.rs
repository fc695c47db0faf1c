//! Javelin Evaluation System
//!
//! Runs a checked [`Program`](crate::program::Program). Everything that can
//! be decided statically already was, so evaluation is a plain tree walk
//! over typed nodes.
//!
//! # Core Components
//!
//! ## Interpreter
//! The entry point. Builds the globals from the caller's bindings, runs the
//! program's entry (an expression, loose statements or `main`) and turns
//! the result into an [`Outcome`] or an
//! [`EvaluationError`](crate::error::EvaluationError).
//!
//! ## Statement and Expression Evaluators
//! `exec` and `eval` on the per-run evaluator. Statements report how they
//! finished through a control-flow value (`break`, `continue`, `return`);
//! exceptions travel as [`RuntimeError`](crate::error::RuntimeError) and
//! carry their stack trace from the point they were raised.
//!
//! ## Execution Context
//! Local slots of every active method, the globals, the bounded output
//! buffer and the [`Interrupt`] polled on every loop iteration and method
//! entry.
//!
//! ## Built-ins
//! The runtime side of the library methods resolved by
//! [`crate::builtins`].

pub mod builtins;
pub mod context;
mod expression;
pub mod interpreter;
mod statement;
pub mod value;

pub use context::{Interrupt, OutputBuffer};
pub use interpreter::{Interpreter, Outcome};
pub use value::{Bindings, Value};
