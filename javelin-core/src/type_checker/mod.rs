pub mod checker;
pub mod conversion;
mod error;
mod expression;
pub mod scope;
mod statement;

pub use checker::{BindingTypes, TypeChecker};
pub use error::{SymbolKind, TypeCheckError, TypeCheckResult};
pub use scope::TypeScope;

use crate::ast::{CompilationUnit, Type};
use crate::program::Program;

/// # Type Checker
///
/// Sits between the parser and the interpreter:
///
/// ```text
/// Parser → CompilationUnit → TypeChecker → Program → Interpreter
/// ```
///
/// It applies Java's static rules for the supported subset and lowers the
/// syntax tree into a [`Program`] at the same time. Every name is resolved
/// to a local slot, a global or a method index, every implicit conversion
/// becomes an explicit node, and overloads (user methods and built-ins) are
/// picked here.
///
/// ## Checks
/// - unresolved variables, methods and classes
/// - duplicate locals, fields and methods
/// - incompatible types in assignments, arguments and returns, with
///   widening `char → int → long → double` and `int` constants narrowing
///   to `char`
/// - bad operand types for unary and binary operators
/// - non-boolean conditions
/// - `break` and `continue` outside a loop
/// - "missing return statement" for non-void methods that can fall off
///   their end
/// - a bare `void` call written as an expression without `;`
///
/// The first error stops the check; compile errors are reported one at a
/// time, like the compiler they imitate.
///
/// # Type Context
/// Per-body state: the block scopes, what a `return` must produce and how
/// many loops enclose the current statement.
#[derive(Debug, Clone, Default)]
pub struct TypeContext {
    pub scope: TypeScope,
    pub returns: ReturnRule,
    pub loop_depth: usize,
}

/// What `return` accepts in the body being checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReturnRule {
    /// Loose statements: any value, or none.
    #[default]
    Any,
    /// A method body returning this type (`Void` for none).
    Method(Type),
}

impl TypeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_method(return_type: Type) -> Self {
        Self {
            returns: ReturnRule::Method(return_type),
            ..Self::default()
        }
    }

    pub fn in_loop(&self) -> bool {
        self.loop_depth > 0
    }
}

/// Checks a compilation unit against the given binding types.
pub fn run_type_checker(
    unit: &CompilationUnit,
    bindings: &BindingTypes,
) -> TypeCheckResult<Program> {
    TypeChecker::new().check(unit, bindings)
}
