//! # Program
//!
//! The checked form of a compilation unit, produced by the
//! [`TypeChecker`](crate::type_checker::TypeChecker) and run by the
//! [`Interpreter`](crate::eval::Interpreter).
//!
//! Names are gone at this point. Locals live in numbered slots of the
//! current frame, globals (bindings first, then class fields) in a single
//! table, and calls refer to methods by index. Every implicit conversion
//! is an explicit [`ExprKind::Convert`] node, so the interpreter never has
//! to consult types to pick an operation's width.

use crate::{
    ast::{BinaryOperator, IncDec, Type, UnaryOperator},
    builtins::Builtin,
    eval::value::Value,
    preprocessor::SourceMap,
};

#[derive(Debug, Clone)]
pub struct Program {
    pub class_name: String,
    pub entry: Entry,
    pub methods: Vec<Method>,
    pub globals: Vec<Global>,
    /// The first `binding_count` globals are filled from the caller's bindings.
    pub binding_count: usize,
    pub source_map: SourceMap,
}

impl Program {
    pub fn line(&self, pos: usize) -> usize {
        self.source_map.line(pos)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone)]
pub enum Entry {
    /// A single expression; its value is the result.
    Expression {
        body: Expr,
        frame_size: usize,
        args_slot: Option<usize>,
    },
    /// Loose statements; the result is a top-level `return` value.
    Block {
        body: Vec<Stmt>,
        frame_size: usize,
        args_slot: Option<usize>,
    },
    /// A class; runs `main` if there is one.
    Main(Option<usize>),
}

#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    pub ty: Type,
    /// Field initializer, run once before `main`.
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub body: Vec<Stmt>,
    /// Slots needed by parameters and locals together.
    pub frame_size: usize,
    pub pos: usize,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub pos: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type, pos: usize) -> Self {
        Self { kind, ty, pos }
    }

    /// Wraps `self` in a conversion to `to` unless it already has that type.
    pub fn convert_to(self, to: &Type) -> Expr {
        if self.ty == *to || !to.is_numeric() || !self.ty.is_numeric() {
            return self;
        }
        let pos = self.pos;
        Expr::new(ExprKind::Convert(Box::new(self)), to.clone(), pos)
    }

    /// The value of an `int` literal, for constant narrowing.
    pub fn int_constant(&self) -> Option<i64> {
        match &self.kind {
            ExprKind::Const(Value::Int(i)) => Some(*i as i64),
            _ => None,
        }
    }

    pub fn is_constant_true(&self) -> bool {
        matches!(self.kind, ExprKind::Const(Value::Boolean(true)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logical {
    And,
    Or,
}

/// Something that can be assigned to.
#[derive(Debug, Clone)]
pub enum Place {
    Local(usize),
    Global(usize),
    Index { array: Box<Expr>, index: Box<Expr> },
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Const(Value),
    Local(usize),
    Global(usize),
    ArrayLength(Box<Expr>),
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    /// Primitive conversion to the node's own type.
    Convert(Box<Expr>),
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Both operands already have the same promoted type (booleans for the
    /// bitwise operators, or the shift rules for shifts).
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// String concatenation.
    Concat {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: Logical,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        target: Box<Place>,
        value: Box<Expr>,
    },
    /// `target op= value`: computed in `operand_type`, then cast back to the
    /// target's type. A `String` operand type means concatenation.
    CompoundAssign {
        target: Box<Place>,
        op: BinaryOperator,
        operand_type: Type,
        value: Box<Expr>,
    },
    IncDec {
        target: Box<Place>,
        op: IncDec,
        prefix: bool,
    },
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call {
        method: usize,
        arguments: Vec<Expr>,
    },
    Builtin {
        builtin: Builtin,
        receiver: Option<Box<Expr>>,
        arguments: Vec<Expr>,
    },
    /// `new T[a][b][]`; the node's type is the full array type.
    NewArray {
        dimensions: Vec<Expr>,
    },
    /// `{a, b, c}`; the node's type is the array type.
    ArrayLiteral(Vec<Expr>),
    NewException {
        class: String,
        message: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: usize,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: usize) -> Self {
        Self { kind, pos }
    }
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expression(Expr),
    /// Without an initializer the slot gets the type's default value.
    Declare {
        slot: usize,
        ty: Type,
        init: Option<Expr>,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        init: Vec<Stmt>,
        condition: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    /// Elements are converted to `ty` before landing in `slot`.
    ForEach {
        slot: usize,
        ty: Type,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Return(Option<Expr>),
    Throw(Expr),
    Block(Vec<Stmt>),
}

/// Whether execution can fall off the end of `statements`.
pub fn can_complete_normally(statements: &[Stmt]) -> bool {
    statements.iter().all(statement_completes)
}

fn statement_completes(statement: &Stmt) -> bool {
    match &statement.kind {
        StmtKind::Return(_) | StmtKind::Throw(_) | StmtKind::Break | StmtKind::Continue => false,
        StmtKind::Block(statements) => can_complete_normally(statements),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => match else_branch {
            Some(else_branch) => statement_completes(then_branch) || statement_completes(else_branch),
            None => true,
        },
        StmtKind::While { condition, body } => !condition.is_constant_true() || breaks_out(body),
        StmtKind::DoWhile { body, condition } => {
            (statement_completes(body) && !condition.is_constant_true()) || breaks_out(body)
        }
        StmtKind::For {
            condition, body, ..
        } => {
            let endless = condition.as_ref().is_none_or(Expr::is_constant_true);
            !endless || breaks_out(body)
        }
        _ => true,
    }
}

/// Whether `statement` contains a `break` for the loop around it.
fn breaks_out(statement: &Stmt) -> bool {
    match &statement.kind {
        StmtKind::Break => true,
        StmtKind::Block(statements) => statements.iter().any(breaks_out),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => breaks_out(then_branch) || else_branch.as_deref().is_some_and(breaks_out),
        _ => false,
    }
}
