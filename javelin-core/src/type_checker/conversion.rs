//! Conversion and promotion rules between [`Type`]s.

use crate::ast::Type;

/// Identity or primitive widening: `char → int → long → double`.
pub fn is_widening(from: &Type, to: &Type) -> bool {
    if from == to {
        return true;
    }
    match (from, to) {
        (Type::Char, Type::Int | Type::Long | Type::Double) => true,
        (Type::Int, Type::Long | Type::Double) => true,
        (Type::Long, Type::Double) => true,
        _ => false,
    }
}

/// Exception types form a shallow hierarchy: everything is a `Throwable`
/// and an `Exception`, most things are `RuntimeException`s.
pub fn is_exception_subtype(from: &str, to: &str) -> bool {
    from == to
        || to == "Throwable"
        || (to == "Exception" && !matches!(from, "Error" | "AssertionError" | "StackOverflowError"))
        || (to == "RuntimeException"
            && !matches!(
                from,
                "Exception" | "Throwable" | "Error" | "AssertionError" | "StackOverflowError"
            ))
        || (to == "IndexOutOfBoundsException"
            && matches!(
                from,
                "ArrayIndexOutOfBoundsException" | "StringIndexOutOfBoundsException"
            ))
        || (to == "IllegalArgumentException" && from == "NumberFormatException")
        || (to == "Error" && matches!(from, "AssertionError" | "StackOverflowError"))
}

/// Conversions allowed when passing an argument: widening, `null` to any
/// reference and an exception to one of its supertypes.
pub fn is_method_convertible(from: &Type, to: &Type) -> bool {
    if is_widening(from, to) {
        return true;
    }
    match (from, to) {
        (Type::Null, to) => to.is_reference() && *to != Type::Null,
        (Type::Exception(from), Type::Exception(to)) => is_exception_subtype(from, to),
        _ => false,
    }
}

/// Conversions allowed in assignments. On top of argument conversions, an
/// `int` constant fits in a `char` when it is in range.
pub fn is_assignable(from: &Type, to: &Type, constant: Option<i64>) -> bool {
    if is_method_convertible(from, to) {
        return true;
    }
    matches!(
        (from, to, constant),
        (Type::Int, Type::Char, Some(value)) if (0..=0xFFFF).contains(&value)
    )
}

/// Binary numeric promotion: the wider of the two, at least `int`.
pub fn binary_numeric_promotion(left: &Type, right: &Type) -> Option<Type> {
    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }
    Some(if *left == Type::Double || *right == Type::Double {
        Type::Double
    } else if *left == Type::Long || *right == Type::Long {
        Type::Long
    } else {
        Type::Int
    })
}

/// Unary numeric promotion: `char` becomes `int`.
pub fn unary_numeric_promotion(ty: &Type) -> Option<Type> {
    match ty {
        Type::Char => Some(Type::Int),
        Type::Int | Type::Long | Type::Double => Some(ty.clone()),
        _ => None,
    }
}

/// Casts between primitives. Reference casts are not supported.
pub fn is_castable(from: &Type, to: &Type) -> bool {
    from == to || (from.is_numeric() && to.is_numeric())
}

/// Types that may be compared with `==`.
pub fn is_comparable(left: &Type, right: &Type) -> bool {
    if left.is_numeric() && right.is_numeric() {
        return true;
    }
    if *left == Type::Boolean && *right == Type::Boolean {
        return true;
    }
    if !left.is_reference() || !right.is_reference() {
        return false;
    }
    is_method_convertible(left, right) || is_method_convertible(right, left)
}
