use thiserror::Error;

use crate::ast::Type;

/// What kind of name failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SymbolKind {
    Variable,
    Method,
    Class,
}

/// Error type for type checking. `pos` is the token position the error
/// is reported at.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeCheckError {
    #[error("cannot find symbol: {kind} {name}")]
    UndefinedSymbol {
        kind: SymbolKind,
        name: String,
        pos: usize,
    },

    #[error("variable {name} is already defined")]
    DuplicateVariable { name: String, pos: usize },

    #[error("method {name} is already defined")]
    DuplicateMethod { name: String, pos: usize },

    #[error("incompatible types: {found} cannot be converted to {expected}")]
    TypeMismatch {
        expected: Type,
        found: Type,
        pos: usize,
    },

    #[error("bad operand types for binary operator '{operator}' ({left}, {right})")]
    BadOperands {
        operator: String,
        left: Type,
        right: Type,
        pos: usize,
    },

    #[error("bad operand type {operand} for unary operator '{operator}'")]
    BadOperand {
        operator: String,
        operand: Type,
        pos: usize,
    },

    #[error("method {name} cannot be applied to given types ({found})")]
    InvalidArguments {
        name: String,
        found: String,
        pos: usize,
    },

    #[error("missing return statement")]
    MissingReturn { pos: usize },

    #[error("{message}")]
    Invalid { message: String, pos: usize },
}

pub type TypeCheckResult<T> = Result<T, TypeCheckError>;

impl TypeCheckError {
    pub fn undefined(kind: SymbolKind, name: impl Into<String>, pos: usize) -> Self {
        Self::UndefinedSymbol {
            kind,
            name: name.into(),
            pos,
        }
    }

    pub fn type_mismatch(expected: Type, found: Type, pos: usize) -> Self {
        Self::TypeMismatch {
            expected,
            found,
            pos,
        }
    }

    pub fn bad_operands(operator: impl ToString, left: Type, right: Type, pos: usize) -> Self {
        Self::BadOperands {
            operator: operator.to_string(),
            left,
            right,
            pos,
        }
    }

    pub fn bad_operand(operator: impl ToString, operand: Type, pos: usize) -> Self {
        Self::BadOperand {
            operator: operator.to_string(),
            operand,
            pos,
        }
    }

    pub fn invalid_arguments(name: impl Into<String>, found: &[Type], pos: usize) -> Self {
        Self::InvalidArguments {
            name: name.into(),
            found: found
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            pos,
        }
    }

    pub fn invalid(message: impl Into<String>, pos: usize) -> Self {
        Self::Invalid {
            message: message.into(),
            pos,
        }
    }

    pub fn pos(&self) -> usize {
        match self {
            Self::UndefinedSymbol { pos, .. }
            | Self::DuplicateVariable { pos, .. }
            | Self::DuplicateMethod { pos, .. }
            | Self::TypeMismatch { pos, .. }
            | Self::BadOperands { pos, .. }
            | Self::BadOperand { pos, .. }
            | Self::InvalidArguments { pos, .. }
            | Self::MissingReturn { pos }
            | Self::Invalid { pos, .. } => *pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            TypeCheckError::undefined(SymbolKind::Variable, "y", 0).to_string(),
            "cannot find symbol: variable y"
        );
        assert_eq!(
            TypeCheckError::type_mismatch(Type::String, Type::Int, 3).to_string(),
            "incompatible types: int cannot be converted to String"
        );
        assert_eq!(
            TypeCheckError::invalid_arguments("add", &[Type::Int, Type::String], 1).to_string(),
            "method add cannot be applied to given types (int,String)"
        );
        assert_eq!(TypeCheckError::MissingReturn { pos: 9 }.pos(), 9);
    }
}
