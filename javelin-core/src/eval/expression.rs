use std::{borrow::Cow, sync::Arc};

use crate::{
    ast::{BinaryOperator, IncDec, Type, UnaryOperator},
    error::RuntimeError,
    eval::{
        builtins::{self, Thrown, check_string_len},
        interpreter::Evaluator,
        value::{ArrayValue, Value},
    },
    program::{Expr, ExprKind, Logical, Place},
};

/// Larger arrays fail like an exhausted heap.
const MAX_ARRAY_LENGTH: usize = 16 * 1024 * 1024;

/// A place with its array and index already evaluated.
enum Resolved {
    Local(usize),
    Global(usize),
    Element(Arc<ArrayValue>, i32),
}

/// How Java names an array in null and store messages.
fn array_kind(element: &Type) -> &'static str {
    match element {
        Type::Int => "int",
        Type::Long => "long",
        Type::Double => "double",
        Type::Char => "char",
        Type::Boolean => "byte/boolean",
        _ => "object",
    }
}

fn out_of_bounds(index: i32, length: usize) -> Thrown {
    Thrown::new(
        "ArrayIndexOutOfBoundsException",
        format!("Index {} out of bounds for length {}", index, length),
    )
}

fn same_reference(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b),
        (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
        (Value::Exception(a), Value::Exception(b)) => Arc::ptr_eq(a, b),
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// Applies a binary operator to two values already promoted to their
/// operand type.
fn binary(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, Thrown> {
    use BinaryOperator::*;

    if op.is_shift() {
        let count = right.as_long().unwrap_or(0) as u32;
        return Ok(match (op, left) {
            (ShiftLeft, Value::Int(a)) => Value::Int(a.wrapping_shl(count & 31)),
            (ShiftRight, Value::Int(a)) => Value::Int(a.wrapping_shr(count & 31)),
            (UnsignedShiftRight, Value::Int(a)) => {
                Value::Int(((*a as u32) >> (count & 31)) as i32)
            }
            (ShiftLeft, Value::Long(a)) => Value::Long(a.wrapping_shl(count & 63)),
            (ShiftRight, Value::Long(a)) => Value::Long(a.wrapping_shr(count & 63)),
            (UnsignedShiftRight, Value::Long(a)) => {
                Value::Long(((*a as u64) >> (count & 63)) as i64)
            }
            _ => Value::Void,
        });
    }

    let value = match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            match op {
                Add => Value::Int(a.wrapping_add(b)),
                Subtract => Value::Int(a.wrapping_sub(b)),
                Multiply => Value::Int(a.wrapping_mul(b)),
                Divide | Remainder if b == 0 => return Err(Thrown::division_by_zero()),
                Divide => Value::Int(a.wrapping_div(b)),
                Remainder => Value::Int(a.wrapping_rem(b)),
                BitAnd => Value::Int(a & b),
                BitOr => Value::Int(a | b),
                BitXor => Value::Int(a ^ b),
                Equal => Value::Boolean(a == b),
                NotEqual => Value::Boolean(a != b),
                LessThan => Value::Boolean(a < b),
                GreaterThan => Value::Boolean(a > b),
                LessThanEqual => Value::Boolean(a <= b),
                GreaterThanEqual => Value::Boolean(a >= b),
                _ => Value::Void,
            }
        }
        (Value::Long(a), Value::Long(b)) => {
            let (a, b) = (*a, *b);
            match op {
                Add => Value::Long(a.wrapping_add(b)),
                Subtract => Value::Long(a.wrapping_sub(b)),
                Multiply => Value::Long(a.wrapping_mul(b)),
                Divide | Remainder if b == 0 => return Err(Thrown::division_by_zero()),
                Divide => Value::Long(a.wrapping_div(b)),
                Remainder => Value::Long(a.wrapping_rem(b)),
                BitAnd => Value::Long(a & b),
                BitOr => Value::Long(a | b),
                BitXor => Value::Long(a ^ b),
                Equal => Value::Boolean(a == b),
                NotEqual => Value::Boolean(a != b),
                LessThan => Value::Boolean(a < b),
                GreaterThan => Value::Boolean(a > b),
                LessThanEqual => Value::Boolean(a <= b),
                GreaterThanEqual => Value::Boolean(a >= b),
                _ => Value::Void,
            }
        }
        (Value::Double(a), Value::Double(b)) => {
            let (a, b) = (*a, *b);
            match op {
                Add => Value::Double(a + b),
                Subtract => Value::Double(a - b),
                Multiply => Value::Double(a * b),
                Divide => Value::Double(a / b),
                Remainder => Value::Double(a % b),
                Equal => Value::Boolean(a == b),
                NotEqual => Value::Boolean(a != b),
                LessThan => Value::Boolean(a < b),
                GreaterThan => Value::Boolean(a > b),
                LessThanEqual => Value::Boolean(a <= b),
                GreaterThanEqual => Value::Boolean(a >= b),
                _ => Value::Void,
            }
        }
        (Value::Boolean(a), Value::Boolean(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BitAnd => Value::Boolean(a & b),
                BitOr => Value::Boolean(a | b),
                BitXor | NotEqual => Value::Boolean(a != b),
                Equal => Value::Boolean(a == b),
                _ => Value::Void,
            }
        }
        (left, right) => match op {
            Equal => Value::Boolean(same_reference(left, right)),
            NotEqual => Value::Boolean(!same_reference(left, right)),
            _ => Value::Void,
        },
    };
    Ok(value)
}

fn text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Str(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// String `+`. The length is checked before anything is allocated.
fn concat(left: &Value, right: &Value, max_len: usize) -> Result<Value, Thrown> {
    let (left, right) = (text(left), text(right));
    check_string_len(left.len().checked_add(right.len()), max_len)?;
    let mut joined = String::with_capacity(left.len() + right.len());
    joined.push_str(&left);
    joined.push_str(&right);
    Ok(Value::from(joined))
}

impl<'p> Evaluator<'p> {
    fn throw(&self, thrown: Thrown, pos: usize) -> RuntimeError {
        self.context.exception(thrown.class, thrown.message, pos)
    }

    fn null_pointer(&self, message: String, pos: usize) -> RuntimeError {
        self.context
            .exception("NullPointerException", Some(message), pos)
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let pos = expr.pos;
        match &expr.kind {
            ExprKind::Const(value) => Ok(value.clone()),
            ExprKind::Local(slot) => Ok(self.context.local(*slot)),
            ExprKind::Global(index) => Ok(self.context.global(*index)),
            ExprKind::ArrayLength(array) => match self.eval(array)? {
                Value::Array(array) => Ok(Value::Int(array.len() as i32)),
                _ => Err(self.null_pointer(
                    "Cannot read the array length because value is null".to_string(),
                    pos,
                )),
            },
            ExprKind::Index { array, index } => {
                let array = self.eval(array)?;
                let index = self.eval_int(index)?;
                let Value::Array(array) = array else {
                    return Err(self.null_pointer(
                        format!(
                            "Cannot load from {} array because value is null",
                            array_kind(&expr.ty)
                        ),
                        pos,
                    ));
                };
                usize::try_from(index)
                    .ok()
                    .and_then(|i| array.get(i))
                    .ok_or_else(|| self.throw(out_of_bounds(index, array.len()), pos))
            }
            ExprKind::Convert(inner) => Ok(self.eval(inner)?.convert(&expr.ty)),
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match (op, value) {
                    (UnaryOperator::Minus, Value::Int(i)) => Value::Int(i.wrapping_neg()),
                    (UnaryOperator::Minus, Value::Long(l)) => Value::Long(l.wrapping_neg()),
                    (UnaryOperator::Minus, Value::Double(d)) => Value::Double(-d),
                    (UnaryOperator::Not, Value::Boolean(b)) => Value::Boolean(!b),
                    (UnaryOperator::BitNot, Value::Int(i)) => Value::Int(!i),
                    (UnaryOperator::BitNot, Value::Long(l)) => Value::Long(!l),
                    (_, value) => value,
                })
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, &left, &right).map_err(|thrown| self.throw(thrown, pos))
            }
            ExprKind::Concat { left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                concat(&left, &right, self.max_string_len).map_err(|thrown| self.throw(thrown, pos))
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.eval_bool(left)?;
                let value = match op {
                    Logical::And => left && self.eval_bool(right)?,
                    Logical::Or => left || self.eval_bool(right)?,
                };
                Ok(Value::Boolean(value))
            }
            ExprKind::Assign { target, value } => {
                let place = self.resolve(target)?;
                let value = self.eval(value)?;
                self.store(&place, value.clone(), pos)?;
                Ok(value)
            }
            ExprKind::CompoundAssign {
                target,
                op,
                operand_type,
                value,
            } => {
                let place = self.resolve(target)?;
                let current = self.load(&place, pos)?;
                let operand = self.eval(value)?;
                let result = if *operand_type == Type::String {
                    concat(&current, &operand, self.max_string_len)
                        .map_err(|thrown| self.throw(thrown, pos))?
                } else {
                    binary(*op, &current.convert(operand_type), &operand)
                        .map_err(|thrown| self.throw(thrown, pos))?
                        .convert(&expr.ty)
                };
                self.store(&place, result.clone(), pos)?;
                Ok(result)
            }
            ExprKind::IncDec { target, op, prefix } => {
                let place = self.resolve(target)?;
                let old = self.load(&place, pos)?;
                let new = match old.clone().convert(&promoted(&expr.ty)) {
                    Value::Int(i) => Value::Int(match op {
                        IncDec::Increment => i.wrapping_add(1),
                        IncDec::Decrement => i.wrapping_sub(1),
                    }),
                    Value::Long(l) => Value::Long(match op {
                        IncDec::Increment => l.wrapping_add(1),
                        IncDec::Decrement => l.wrapping_sub(1),
                    }),
                    Value::Double(d) => Value::Double(match op {
                        IncDec::Increment => d + 1.0,
                        IncDec::Decrement => d - 1.0,
                    }),
                    other => other,
                }
                .convert(&expr.ty);
                self.store(&place, new.clone(), pos)?;
                Ok(if *prefix { new } else { old })
            }
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                if self.eval_bool(condition)? {
                    self.eval(then_expr)
                } else {
                    self.eval(else_expr)
                }
            }
            ExprKind::Call { method, arguments } => {
                let arguments = self.eval_all(arguments)?;
                self.context.set_call_site(pos);
                self.invoke(*method, arguments, pos)
            }
            ExprKind::Builtin {
                builtin,
                receiver,
                arguments,
            } => {
                let receiver = match receiver {
                    Some(receiver) => Some((self.eval(receiver)?, &receiver.ty)),
                    None => None,
                };
                let arguments = self.eval_all(arguments)?;
                let receiver = match receiver {
                    Some((Value::Null, ty)) => {
                        let class = match ty {
                            Type::Exception(_) => "Throwable".to_string(),
                            other => other.to_string(),
                        };
                        let thrown =
                            Thrown::null_receiver(&class, builtins::method_name(*builtin));
                        return Err(self.throw(thrown, pos));
                    }
                    Some((value, _)) => Some(value),
                    None => None,
                };
                builtins::call(
                    *builtin,
                    receiver,
                    arguments,
                    &mut self.context.output,
                    self.max_string_len,
                )
                .map_err(|thrown| self.throw(thrown, pos))
            }
            ExprKind::NewArray { dimensions } => {
                let mut lengths = Vec::with_capacity(dimensions.len());
                for dimension in dimensions {
                    let length = self.eval_int(dimension)?;
                    if length < 0 {
                        return Err(self.throw(
                            Thrown::new("NegativeArraySizeException", length.to_string()),
                            pos,
                        ));
                    }
                    lengths.push(length as usize);
                }
                let total = lengths
                    .iter()
                    .try_fold(1usize, |total, length| total.checked_mul((*length).max(1)));
                if total.is_none_or(|total| total > MAX_ARRAY_LENGTH) {
                    return Err(self.throw(Thrown::out_of_memory(), pos));
                }
                Ok(new_array(&expr.ty, &lengths))
            }
            ExprKind::ArrayLiteral(elements) => {
                let element = expr.ty.element_type().cloned().unwrap_or(Type::Null);
                let items = self.eval_all(elements)?;
                Ok(Value::array(element, items))
            }
            ExprKind::NewException { class, message } => {
                let message = match message {
                    Some(message) => self.eval(message)?.as_str().map(str::to_string),
                    None => None,
                };
                Ok(Value::exception(class.clone(), message))
            }
        }
    }

    pub(crate) fn eval_bool(&mut self, expr: &Expr) -> Result<bool, RuntimeError> {
        Ok(self.eval(expr)?.as_bool().unwrap_or(false))
    }

    fn eval_int(&mut self, expr: &Expr) -> Result<i32, RuntimeError> {
        Ok(self.eval(expr)?.as_int().unwrap_or(0))
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    /// Evaluates the array and index of a place, left to right.
    fn resolve(&mut self, place: &Place) -> Result<Resolved, RuntimeError> {
        match place {
            Place::Local(slot) => Ok(Resolved::Local(*slot)),
            Place::Global(index) => Ok(Resolved::Global(*index)),
            Place::Index { array, index } => {
                let array_value = self.eval(array)?;
                let index = self.eval_int(index)?;
                match array_value {
                    Value::Array(array) => Ok(Resolved::Element(array, index)),
                    _ => {
                        let kind = array
                            .ty
                            .element_type()
                            .map_or("object", array_kind);
                        Err(self.null_pointer(
                            format!("Cannot store to {} array because value is null", kind),
                            array.pos,
                        ))
                    }
                }
            }
        }
    }

    fn load(&self, place: &Resolved, pos: usize) -> Result<Value, RuntimeError> {
        match place {
            Resolved::Local(slot) => Ok(self.context.local(*slot)),
            Resolved::Global(index) => Ok(self.context.global(*index)),
            Resolved::Element(array, index) => usize::try_from(*index)
                .ok()
                .and_then(|i| array.get(i))
                .ok_or_else(|| self.throw(out_of_bounds(*index, array.len()), pos)),
        }
    }

    fn store(
        &mut self,
        place: &Resolved,
        value: Value,
        pos: usize,
    ) -> Result<(), RuntimeError> {
        match place {
            Resolved::Local(slot) => self.context.set_local(*slot, value),
            Resolved::Global(index) => self.context.set_global(*index, value),
            Resolved::Element(array, index) => {
                let stored = usize::try_from(*index)
                    .ok()
                    .is_some_and(|i| array.set(i, value));
                if !stored {
                    return Err(self.throw(out_of_bounds(*index, array.len()), pos));
                }
            }
        }
        Ok(())
    }
}

/// `char` arithmetic happens in `int`.
fn promoted(ty: &Type) -> Type {
    match ty {
        Type::Char => Type::Int,
        other => other.clone(),
    }
}

/// `new T[a][b]...`: sized levels are filled, the innermost with defaults
/// and unsized trailing levels with `null`.
fn new_array(ty: &Type, lengths: &[usize]) -> Value {
    let element = ty.element_type().cloned().unwrap_or(Type::Null);
    let items = match lengths {
        [] => return Value::Null,
        [length] => vec![Value::default_for(&element); *length],
        [length, rest @ ..] => (0..*length).map(|_| new_array(&element, rest)).collect(),
    };
    Value::array(element, items)
}
