//! Syntax tree for the supported Java subset.
//!
//! Every expression and statement carries `pos`, the index of its first
//! token in the preprocessed token stream. The
//! [`SourceMap`](crate::preprocessor::SourceMap) turns it into a line and
//! column for diagnostics and stack traces.

use core::fmt;

use crate::tokenizer::keyword::PrimitiveType;

/// A type as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeName {
    Primitive(PrimitiveType),
    /// A class name such as `String`. Resolved by the type checker.
    Named(String),
    Array(Box<TypeName>),
    /// `var`: the type of the initializer. Replaced by the type checker.
    Var,
}

impl TypeName {
    pub fn array_of(self, dimensions: usize) -> TypeName {
        (0..dimensions).fold(self, |ty, _| TypeName::Array(Box::new(ty)))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Primitive(p) => write!(f, "{}", p),
            TypeName::Named(name) => write!(f, "{}", name),
            TypeName::Array(inner) => write!(f, "{}[]", inner),
            TypeName::Var => write!(f, "var"),
        }
    }
}

/// A resolved static type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Long,
    Double,
    Boolean,
    Char,
    Void,
    String,
    /// The type of the `null` literal.
    Null,
    Array(Box<Type>),
    /// An exception class such as `IllegalArgumentException`.
    Exception(String),
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Long | Type::Double | Type::Char)
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Type::Int | Type::Long | Type::Char)
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::String | Type::Null | Type::Array(_) | Type::Exception(_)
        )
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// Rank used for numeric promotion: char < int < long < double.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            Type::Char => Some(0),
            Type::Int => Some(1),
            Type::Long => Some(2),
            Type::Double => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Long => write!(f, "long"),
            Type::Double => write!(f, "double"),
            Type::Boolean => write!(f, "boolean"),
            Type::Char => write!(f, "char"),
            Type::Void => write!(f, "void"),
            Type::String => write!(f, "String"),
            Type::Null => write!(f, "<null>"),
            Type::Array(inner) => write!(f, "{}[]", inner),
            Type::Exception(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Char(char),
    String(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::LessThan
                | BinaryOperator::GreaterThan
                | BinaryOperator::LessThanEqual
                | BinaryOperator::GreaterThanEqual
        )
    }

    pub fn is_shift(&self) -> bool {
        matches!(
            self,
            BinaryOperator::ShiftLeft
                | BinaryOperator::ShiftRight
                | BinaryOperator::UnsignedShiftRight
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanEqual => "<=",
            BinaryOperator::GreaterThanEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::UnsignedShiftRight => ">>>",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
    BitNot,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Plus => write!(f, "+"),
            UnaryOperator::Minus => write!(f, "-"),
            UnaryOperator::Not => write!(f, "!"),
            UnaryOperator::BitNot => write!(f, "~"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDec {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub pos: usize,
}

impl Expression {
    pub fn new(kind: ExpressionKind, pos: usize) -> Self {
        Self { kind, pos }
    }

    /// Whether the expression may appear on the left of an assignment.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Name(_)
                | ExpressionKind::Index { .. }
                | ExpressionKind::FieldAccess { .. }
        )
    }

    /// Whether the expression may stand alone as a statement.
    pub fn is_statement_expression(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Assign { .. }
                | ExpressionKind::IncDec { .. }
                | ExpressionKind::MethodCall { .. }
                | ExpressionKind::NewObject { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Literal(Literal),
    Name(String),
    FieldAccess {
        target: Box<Expression>,
        name: String,
    },
    MethodCall {
        target: Option<Box<Expression>>,
        name: String,
        arguments: Vec<Expression>,
    },
    Index {
        array: Box<Expression>,
        index: Box<Expression>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    IncDec {
        op: IncDec,
        prefix: bool,
        target: Box<Expression>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `target = value` or, with `op`, a compound assignment like `target += value`.
    Assign {
        op: Option<BinaryOperator>,
        target: Box<Expression>,
        value: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
    },
    Cast {
        target: TypeName,
        expr: Box<Expression>,
    },
    /// `new int[n][m][]`: one expression per sized dimension plus the
    /// number of trailing unsized ones.
    NewArray {
        element: TypeName,
        dimensions: Vec<Expression>,
        extra_dimensions: usize,
    },
    /// `new int[]{1, 2}` or a bare `{1, 2}` initializer. `ty` is the array type.
    ArrayInit {
        ty: TypeName,
        elements: Vec<Expression>,
    },
    /// `new IllegalArgumentException("...")`
    NewObject {
        class: String,
        arguments: Vec<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: String,
    /// Brackets after the name, as in `int a[]`.
    pub extra_dimensions: usize,
    pub init: Option<Expression>,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub ty: TypeName,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub pos: usize,
}

impl Statement {
    pub fn new(kind: StatementKind, pos: usize) -> Self {
        Self { kind, pos }
    }
}

pub type Statements = Vec<Statement>;

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    LocalVariable(VariableDeclaration),
    Expression(Expression),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Expression,
    },
    For {
        init: Statements,
        condition: Option<Expression>,
        update: Vec<Expression>,
        body: Box<Statement>,
    },
    ForEach {
        ty: TypeName,
        name: String,
        iterable: Expression,
        body: Box<Statement>,
    },
    Break,
    Continue,
    Return(Option<Expression>),
    Throw(Expression),
    Block(Statements),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub ty: TypeName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub return_type: TypeName,
    pub parameters: Vec<Parameter>,
    pub body: Statements,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub declaration: VariableDeclaration,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    /// True when the source was a bare list of methods.
    pub implicit: bool,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub pos: usize,
}

impl ClassDecl {
    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// What a piece of source turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum CompilationUnit {
    /// A single expression; its value is the result.
    Expression(Expression),
    /// Loose statements; the result is a top-level `return` value or void.
    Block(Statements),
    /// A class, or a list of methods wrapped in an implicit `Main` class.
    Class(ClassDecl),
}
