//! Checking and lowering of expressions.

use crate::{
    analyzer::combinators::MAX_NESTING_DEPTH,
    ast::{BinaryOperator, Expression, ExpressionKind, IncDec, Literal, Type, TypeName, UnaryOperator},
    builtins::{self, Lookup, is_builtin_class, is_exception_class},
    eval::value::{Value, char_from_code},
    program::{Expr, ExprKind, Logical, Place},
    type_checker::{
        SymbolKind, TypeCheckError, TypeCheckResult, TypeChecker, TypeContext,
        conversion::{
            binary_numeric_promotion, is_assignable, is_castable, is_comparable,
            is_method_convertible, unary_numeric_promotion,
        },
    },
};

fn array_of(ty: Type) -> Type {
    Type::Array(Box::new(ty))
}

impl TypeChecker {
    /// Operator chains such as `1 + 1 + ... + 1` parse without recursion but
    /// still nest, so depth is bounded here as well as in the parser.
    pub(super) fn visit_expression(
        &mut self,
        expression: &Expression,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(TypeCheckError::invalid(
                "code too deeply nested",
                expression.pos,
            ));
        }
        self.depth += 1;
        let result = self.visit_expression_kind(expression, ctx);
        self.depth -= 1;
        result
    }

    fn visit_expression_kind(
        &mut self,
        expression: &Expression,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let pos = expression.pos;
        match &expression.kind {
            ExpressionKind::Literal(literal) => Ok(self.visit_literal(literal, pos)),
            ExpressionKind::Name(name) => self.visit_name(name, pos, ctx),
            ExpressionKind::FieldAccess { target, name } => {
                self.visit_field_access(target, name, pos, ctx)
            }
            ExpressionKind::MethodCall {
                target,
                name,
                arguments,
            } => self.visit_method_call(target.as_deref(), name, arguments, pos, ctx),
            ExpressionKind::Index { array, index } => {
                let (array, index, element) = self.visit_index(array, index, pos, ctx)?;
                Ok(Expr::new(
                    ExprKind::Index {
                        array: Box::new(array),
                        index: Box::new(index),
                    },
                    element,
                    pos,
                ))
            }
            ExpressionKind::Unary { op, operand } => self.visit_unary(*op, operand, pos, ctx),
            ExpressionKind::IncDec { op, prefix, target } => {
                self.visit_inc_dec(*op, *prefix, target, pos, ctx)
            }
            ExpressionKind::Binary { op, left, right } => {
                self.visit_binary(*op, left, right, pos, ctx)
            }
            ExpressionKind::Assign { op, target, value } => {
                self.visit_assign(*op, target, value, pos, ctx)
            }
            ExpressionKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => self.visit_conditional(condition, then_expr, else_expr, pos, ctx),
            ExpressionKind::Cast { target, expr } => self.visit_cast(target, expr, pos, ctx),
            ExpressionKind::NewArray {
                element,
                dimensions,
                extra_dimensions,
            } => self.visit_new_array(element, dimensions, *extra_dimensions, pos, ctx),
            ExpressionKind::ArrayInit { ty, elements } => {
                self.visit_array_init(ty, elements, pos, ctx)
            }
            ExpressionKind::NewObject { class, arguments } => {
                self.visit_new_object(class, arguments, pos, ctx)
            }
        }
    }

    /// An expression that must produce a value.
    pub(super) fn visit_value(
        &mut self,
        expression: &Expression,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let expr = self.visit_expression(expression, ctx)?;
        if expr.ty == Type::Void {
            return Err(TypeCheckError::invalid(
                "'void' type not allowed here",
                expression.pos,
            ));
        }
        Ok(expr)
    }

    pub(super) fn visit_condition(
        &mut self,
        expression: &Expression,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let condition = self.visit_value(expression, ctx)?;
        if condition.ty != Type::Boolean {
            return Err(TypeCheckError::type_mismatch(
                Type::Boolean,
                condition.ty,
                expression.pos,
            ));
        }
        Ok(condition)
    }

    /// Assignment conversion of `expr` to `to`.
    pub(super) fn coerce(&self, expr: Expr, to: &Type) -> TypeCheckResult<Expr> {
        if is_assignable(&expr.ty, to, expr.int_constant()) {
            if let (Type::Char, Some(code)) = (to, expr.int_constant()) {
                let ch = char_from_code(code as u16);
                return Ok(Expr::new(ExprKind::Const(Value::Char(ch)), Type::Char, expr.pos));
            }
            return Ok(expr.convert_to(to));
        }
        if expr.ty.is_numeric() && to.is_numeric() {
            return Err(TypeCheckError::invalid(
                format!(
                    "incompatible types: possible lossy conversion from {} to {}",
                    expr.ty, to
                ),
                expr.pos,
            ));
        }
        Err(TypeCheckError::type_mismatch(to.clone(), expr.ty, expr.pos))
    }

    fn visit_literal(&mut self, literal: &Literal, pos: usize) -> Expr {
        let (value, ty) = match literal {
            Literal::Int(i) => (Value::Int(*i), Type::Int),
            Literal::Long(l) => (Value::Long(*l), Type::Long),
            Literal::Double(d) => (Value::Double(*d), Type::Double),
            Literal::Boolean(b) => (Value::Boolean(*b), Type::Boolean),
            Literal::Char(c) => (Value::Char(*c), Type::Char),
            Literal::String(s) => (Value::Str(self.intern(s)), Type::String),
            Literal::Null => (Value::Null, Type::Null),
        };
        Expr::new(ExprKind::Const(value), ty, pos)
    }

    fn visit_name(&self, name: &str, pos: usize, ctx: &TypeContext) -> TypeCheckResult<Expr> {
        if let Some(local) = ctx.scope.lookup(name) {
            return Ok(Expr::new(ExprKind::Local(local.slot), local.ty.clone(), pos));
        }
        if let Some(index) = self.global_index(name) {
            let ty = self.globals[index].ty.clone();
            return Ok(Expr::new(ExprKind::Global(index), ty, pos));
        }
        Err(TypeCheckError::undefined(SymbolKind::Variable, name, pos))
    }

    fn visit_field_access(
        &mut self,
        target: &Expression,
        name: &str,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        if let ExpressionKind::Name(class) = &target.kind {
            if self.is_class_name(class, ctx) {
                if let Some(value) = builtins::static_field(class, name) {
                    let ty = value.static_type().unwrap_or(Type::Null);
                    return Ok(Expr::new(ExprKind::Const(value), ty, pos));
                }
                if *class == self.class_name {
                    if let Some(index) = self.global_index(name) {
                        let ty = self.globals[index].ty.clone();
                        return Ok(Expr::new(ExprKind::Global(index), ty, pos));
                    }
                }
                if class == "System" && matches!(name, "out" | "err") {
                    return Err(TypeCheckError::invalid(
                        format!("System.{} can only be used to call print methods", name),
                        pos,
                    ));
                }
                return Err(TypeCheckError::undefined(SymbolKind::Variable, name, pos));
            }
        }

        let target = self.visit_value(target, ctx)?;
        match &target.ty {
            Type::Array(_) if name == "length" => Ok(Expr::new(
                ExprKind::ArrayLength(Box::new(target)),
                Type::Int,
                pos,
            )),
            ty if ty.is_reference() && *ty != Type::Null => {
                Err(TypeCheckError::undefined(SymbolKind::Variable, name, pos))
            }
            ty => Err(TypeCheckError::invalid(
                format!("{} cannot be dereferenced", ty),
                pos,
            )),
        }
    }

    fn visit_method_call(
        &mut self,
        target: Option<&Expression>,
        name: &str,
        arguments: &[Expression],
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let arguments = arguments
            .iter()
            .map(|argument| self.visit_expression(argument, ctx))
            .collect::<TypeCheckResult<Vec<_>>>()?;
        let types: Vec<Type> = arguments.iter().map(|a| a.ty.clone()).collect();

        let Some(target) = target else {
            return self.resolve_user_call(name, arguments, pos);
        };

        if let ExpressionKind::FieldAccess {
            target: inner,
            name: stream,
        } = &target.kind
        {
            if matches!(&inner.kind, ExpressionKind::Name(n) if n == "System" && self.is_class_name(n, ctx))
            {
                let lookup = builtins::resolve_print(stream, name, &types);
                return builtin_call(lookup, None, arguments, name, pos);
            }
        }

        if let ExpressionKind::Name(class) = &target.kind {
            if self.is_class_name(class, ctx) {
                if *class == self.class_name {
                    return self.resolve_user_call(name, arguments, pos);
                }
                let lookup = builtins::resolve_static(class, name, &types);
                return builtin_call(lookup, None, arguments, name, pos);
            }
        }

        let receiver = self.visit_value(target, ctx)?;
        if !receiver.ty.is_reference() || receiver.ty == Type::Null {
            return Err(TypeCheckError::invalid(
                format!("{} cannot be dereferenced", receiver.ty),
                pos,
            ));
        }
        let lookup = builtins::resolve_instance(&receiver.ty, name, &types);
        builtin_call(lookup, Some(receiver), arguments, name, pos)
    }

    /// Picks an overload of a method declared in the program: an exact
    /// match first, then the first one the arguments convert to.
    fn resolve_user_call(
        &self,
        name: &str,
        arguments: Vec<Expr>,
        pos: usize,
    ) -> TypeCheckResult<Expr> {
        let candidates: Vec<usize> = self
            .methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.name == name)
            .map(|(index, _)| index)
            .collect();
        if candidates.is_empty() {
            return Err(TypeCheckError::undefined(SymbolKind::Method, name, pos));
        }

        let types: Vec<Type> = arguments.iter().map(|a| a.ty.clone()).collect();
        let applicable = |index: &&usize| {
            let params = &self.methods[**index].params;
            params.len() == types.len()
                && types
                    .iter()
                    .zip(params)
                    .all(|(arg, param)| is_method_convertible(arg, param))
        };
        let chosen = candidates
            .iter()
            .find(|index| self.methods[**index].params == types)
            .or_else(|| candidates.iter().find(applicable))
            .copied()
            .ok_or_else(|| TypeCheckError::invalid_arguments(name, &types, pos))?;

        let signature = &self.methods[chosen];
        let arguments = arguments
            .into_iter()
            .zip(&signature.params)
            .map(|(argument, param)| argument.convert_to(param))
            .collect();
        Ok(Expr::new(
            ExprKind::Call {
                method: chosen,
                arguments,
            },
            signature.returns.clone(),
            pos,
        ))
    }

    fn visit_index(
        &mut self,
        array: &Expression,
        index: &Expression,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<(Expr, Expr, Type)> {
        let array = self.visit_value(array, ctx)?;
        let element = match &array.ty {
            Type::Array(element) => (**element).clone(),
            other => {
                return Err(TypeCheckError::invalid(
                    format!("array required, but {} found", other),
                    pos,
                ));
            }
        };
        let index = self.visit_value(index, ctx)?;
        let index = self.coerce(index, &Type::Int)?;
        Ok((array, index, element))
    }

    fn visit_place(
        &mut self,
        target: &Expression,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<(Place, Type)> {
        let pos = target.pos;
        match &target.kind {
            ExpressionKind::Name(name) => {
                if let Some(local) = ctx.scope.lookup(name) {
                    return Ok((Place::Local(local.slot), local.ty.clone()));
                }
                if let Some(index) = self.global_index(name) {
                    return Ok((Place::Global(index), self.globals[index].ty.clone()));
                }
                Err(TypeCheckError::undefined(SymbolKind::Variable, name, pos))
            }
            ExpressionKind::Index { array, index } => {
                let (array, index, element) = self.visit_index(array, index, pos, ctx)?;
                Ok((
                    Place::Index {
                        array: Box::new(array),
                        index: Box::new(index),
                    },
                    element,
                ))
            }
            ExpressionKind::FieldAccess { target, name } => match &target.kind {
                ExpressionKind::Name(class)
                    if *class == self.class_name && self.is_class_name(class, ctx) =>
                {
                    let index = self
                        .global_index(name)
                        .ok_or_else(|| TypeCheckError::undefined(SymbolKind::Variable, name, pos))?;
                    Ok((Place::Global(index), self.globals[index].ty.clone()))
                }
                _ => {
                    let value = self.visit_field_access(target, name, pos, ctx)?;
                    let message = match value.kind {
                        ExprKind::ArrayLength(_) => {
                            "cannot assign a value to final variable length".to_string()
                        }
                        _ => format!("cannot assign a value to final variable {}", name),
                    };
                    Err(TypeCheckError::invalid(message, pos))
                }
            },
            _ => Err(TypeCheckError::invalid(
                "unexpected type: required variable, found value",
                pos,
            )),
        }
    }

    fn visit_unary(
        &mut self,
        op: UnaryOperator,
        operand: &Expression,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let operand = self.visit_value(operand, ctx)?;
        let ty = match op {
            UnaryOperator::Not if operand.ty == Type::Boolean => Type::Boolean,
            UnaryOperator::Plus | UnaryOperator::Minus => unary_numeric_promotion(&operand.ty)
                .ok_or_else(|| TypeCheckError::bad_operand(op, operand.ty.clone(), pos))?,
            UnaryOperator::BitNot if operand.ty.is_integral() => unary_numeric_promotion(&operand.ty)
                .ok_or_else(|| TypeCheckError::bad_operand(op, operand.ty.clone(), pos))?,
            _ => return Err(TypeCheckError::bad_operand(op, operand.ty, pos)),
        };
        let operand = operand.convert_to(&ty);
        if op == UnaryOperator::Plus {
            return Ok(operand);
        }
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
            pos,
        ))
    }

    fn visit_inc_dec(
        &mut self,
        op: IncDec,
        prefix: bool,
        target: &Expression,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let (place, ty) = self.visit_place(target, ctx)?;
        if !ty.is_numeric() {
            let symbol = match op {
                IncDec::Increment => "++",
                IncDec::Decrement => "--",
            };
            return Err(TypeCheckError::bad_operand(symbol, ty, pos));
        }
        Ok(Expr::new(
            ExprKind::IncDec {
                target: Box::new(place),
                op,
                prefix,
            },
            ty,
            pos,
        ))
    }

    fn visit_binary(
        &mut self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let left = self.visit_value(left, ctx)?;
        let right = self.visit_value(right, ctx)?;
        let bad = |left: &Expr, right: &Expr| {
            TypeCheckError::bad_operands(op, left.ty.clone(), right.ty.clone(), pos)
        };

        match op {
            BinaryOperator::And | BinaryOperator::Or => {
                if left.ty != Type::Boolean || right.ty != Type::Boolean {
                    return Err(bad(&left, &right));
                }
                let op = if op == BinaryOperator::And {
                    Logical::And
                } else {
                    Logical::Or
                };
                Ok(Expr::new(
                    ExprKind::Logical {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    Type::Boolean,
                    pos,
                ))
            }
            BinaryOperator::Add if left.ty == Type::String || right.ty == Type::String => {
                Ok(Expr::new(
                    ExprKind::Concat {
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    Type::String,
                    pos,
                ))
            }
            BinaryOperator::Add
            | BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Remainder => {
                let ty = binary_numeric_promotion(&left.ty, &right.ty)
                    .ok_or_else(|| bad(&left, &right))?;
                Ok(binary(op, left, right, &ty, ty.clone(), pos))
            }
            BinaryOperator::LessThan
            | BinaryOperator::GreaterThan
            | BinaryOperator::LessThanEqual
            | BinaryOperator::GreaterThanEqual => {
                let ty = binary_numeric_promotion(&left.ty, &right.ty)
                    .ok_or_else(|| bad(&left, &right))?;
                Ok(binary(op, left, right, &ty, Type::Boolean, pos))
            }
            BinaryOperator::ShiftLeft
            | BinaryOperator::ShiftRight
            | BinaryOperator::UnsignedShiftRight => {
                if !left.ty.is_integral() || !right.ty.is_integral() {
                    return Err(bad(&left, &right));
                }
                let left_ty = unary_numeric_promotion(&left.ty).ok_or_else(|| bad(&left, &right))?;
                let right_ty =
                    unary_numeric_promotion(&right.ty).ok_or_else(|| bad(&left, &right))?;
                Ok(Expr::new(
                    ExprKind::Binary {
                        op,
                        left: Box::new(left.convert_to(&left_ty)),
                        right: Box::new(right.convert_to(&right_ty)),
                    },
                    left_ty,
                    pos,
                ))
            }
            BinaryOperator::Equal | BinaryOperator::NotEqual => {
                if let Some(ty) = binary_numeric_promotion(&left.ty, &right.ty) {
                    return Ok(binary(op, left, right, &ty, Type::Boolean, pos));
                }
                if !is_comparable(&left.ty, &right.ty) {
                    if left.ty.is_reference() && right.ty.is_reference() {
                        return Err(TypeCheckError::invalid(
                            format!("incomparable types: {} and {}", left.ty, right.ty),
                            pos,
                        ));
                    }
                    return Err(bad(&left, &right));
                }
                Ok(binary(op, left, right, &Type::Null, Type::Boolean, pos))
            }
            BinaryOperator::BitAnd | BinaryOperator::BitOr | BinaryOperator::BitXor => {
                if left.ty == Type::Boolean && right.ty == Type::Boolean {
                    return Ok(binary(op, left, right, &Type::Boolean, Type::Boolean, pos));
                }
                if !left.ty.is_integral() || !right.ty.is_integral() {
                    return Err(bad(&left, &right));
                }
                let ty = binary_numeric_promotion(&left.ty, &right.ty)
                    .ok_or_else(|| bad(&left, &right))?;
                Ok(binary(op, left, right, &ty, ty.clone(), pos))
            }
        }
    }

    fn visit_assign(
        &mut self,
        op: Option<BinaryOperator>,
        target: &Expression,
        value: &Expression,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let (place, target_ty) = self.visit_place(target, ctx)?;
        let value = self.visit_value(value, ctx)?;

        let Some(op) = op else {
            let value = self.coerce(value, &target_ty)?;
            return Ok(Expr::new(
                ExprKind::Assign {
                    target: Box::new(place),
                    value: Box::new(value),
                },
                target_ty,
                pos,
            ));
        };

        let bad = || TypeCheckError::bad_operands(op, target_ty.clone(), value.ty.clone(), pos);
        let (operand_type, value_type) = match op {
            BinaryOperator::Add if target_ty == Type::String => (Type::String, value.ty.clone()),
            BinaryOperator::ShiftLeft
            | BinaryOperator::ShiftRight
            | BinaryOperator::UnsignedShiftRight => {
                if !target_ty.is_integral() || !value.ty.is_integral() {
                    return Err(bad());
                }
                (
                    unary_numeric_promotion(&target_ty).ok_or_else(bad)?,
                    unary_numeric_promotion(&value.ty).ok_or_else(bad)?,
                )
            }
            BinaryOperator::BitAnd | BinaryOperator::BitOr | BinaryOperator::BitXor
                if target_ty == Type::Boolean && value.ty == Type::Boolean =>
            {
                (Type::Boolean, Type::Boolean)
            }
            BinaryOperator::BitAnd | BinaryOperator::BitOr | BinaryOperator::BitXor => {
                if !target_ty.is_integral() || !value.ty.is_integral() {
                    return Err(bad());
                }
                let ty = binary_numeric_promotion(&target_ty, &value.ty).ok_or_else(bad)?;
                (ty.clone(), ty)
            }
            BinaryOperator::Add
            | BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Remainder => {
                let ty = binary_numeric_promotion(&target_ty, &value.ty).ok_or_else(bad)?;
                (ty.clone(), ty)
            }
            _ => return Err(bad()),
        };

        Ok(Expr::new(
            ExprKind::CompoundAssign {
                target: Box::new(place),
                op,
                operand_type,
                value: Box::new(value.convert_to(&value_type)),
            },
            target_ty,
            pos,
        ))
    }

    fn visit_conditional(
        &mut self,
        condition: &Expression,
        then_expr: &Expression,
        else_expr: &Expression,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let condition = self.visit_condition(condition, ctx)?;
        let then_expr = self.visit_value(then_expr, ctx)?;
        let else_expr = self.visit_value(else_expr, ctx)?;

        let ty = conditional_type(&then_expr, &else_expr).ok_or_else(|| {
            TypeCheckError::invalid(
                format!(
                    "incompatible types in conditional expression: {} and {}",
                    then_expr.ty, else_expr.ty
                ),
                pos,
            )
        })?;
        let then_expr = self.coerce(then_expr, &ty)?;
        let else_expr = self.coerce(else_expr, &ty)?;
        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            ty,
            pos,
        ))
    }

    fn visit_cast(
        &mut self,
        target: &TypeName,
        expr: &Expression,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let to = self.resolve_value_type(target, pos)?;
        let expr = self.visit_value(expr, ctx)?;
        if !is_castable(&expr.ty, &to) {
            return Err(TypeCheckError::type_mismatch(to, expr.ty, pos));
        }
        if expr.ty == to {
            return Ok(expr);
        }
        Ok(Expr::new(ExprKind::Convert(Box::new(expr)), to, pos))
    }

    fn visit_new_array(
        &mut self,
        element: &TypeName,
        dimensions: &[Expression],
        extra_dimensions: usize,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let element = self.resolve_value_type(element, pos)?;
        let dimensions = dimensions
            .iter()
            .map(|dimension| {
                let value = self.visit_value(dimension, ctx)?;
                self.coerce(value, &Type::Int)
            })
            .collect::<TypeCheckResult<Vec<_>>>()?;
        let ty = (0..dimensions.len() + extra_dimensions).fold(element, |ty, _| array_of(ty));
        Ok(Expr::new(ExprKind::NewArray { dimensions }, ty, pos))
    }

    fn visit_array_init(
        &mut self,
        ty: &TypeName,
        elements: &[Expression],
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        let ty = self.resolve_value_type(ty, pos)?;
        let element = match &ty {
            Type::Array(element) => (**element).clone(),
            other => {
                return Err(TypeCheckError::invalid(
                    format!("illegal initializer for {}", other),
                    pos,
                ));
            }
        };
        let elements = elements
            .iter()
            .map(|expression| {
                let value = self.visit_value(expression, ctx)?;
                self.coerce(value, &element)
            })
            .collect::<TypeCheckResult<Vec<_>>>()?;
        Ok(Expr::new(ExprKind::ArrayLiteral(elements), ty, pos))
    }

    fn visit_new_object(
        &mut self,
        class: &str,
        arguments: &[Expression],
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Expr> {
        if !is_exception_class(class) {
            if is_builtin_class(class) {
                return Err(TypeCheckError::invalid(
                    format!("creating {} objects with 'new' is not supported", class),
                    pos,
                ));
            }
            return Err(TypeCheckError::undefined(SymbolKind::Class, class, pos));
        }

        let mut arguments = arguments
            .iter()
            .map(|argument| self.visit_value(argument, ctx))
            .collect::<TypeCheckResult<Vec<_>>>()?;
        let message = match arguments.len() {
            0 => None,
            1 if matches!(arguments[0].ty, Type::String | Type::Null) => arguments.pop(),
            _ => {
                let types: Vec<Type> = arguments.iter().map(|a| a.ty.clone()).collect();
                return Err(TypeCheckError::invalid_arguments(class, &types, pos));
            }
        };
        Ok(Expr::new(
            ExprKind::NewException {
                class: class.to_string(),
                message: message.map(Box::new),
            },
            Type::Exception(class.to_string()),
            pos,
        ))
    }
}

/// Both operands converted to `operand_type`, producing `ty`.
fn binary(
    op: BinaryOperator,
    left: Expr,
    right: Expr,
    operand_type: &Type,
    ty: Type,
    pos: usize,
) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left.convert_to(operand_type)),
            right: Box::new(right.convert_to(operand_type)),
        },
        ty,
        pos,
    )
}

fn builtin_call(
    lookup: Lookup,
    receiver: Option<Expr>,
    arguments: Vec<Expr>,
    name: &str,
    pos: usize,
) -> TypeCheckResult<Expr> {
    match lookup {
        Lookup::Found(signature) => {
            let arguments = arguments
                .into_iter()
                .zip(&signature.params)
                .map(|(argument, param)| argument.convert_to(param))
                .collect();
            Ok(Expr::new(
                ExprKind::Builtin {
                    builtin: signature.builtin,
                    receiver: receiver.map(Box::new),
                    arguments,
                },
                signature.returns,
                pos,
            ))
        }
        Lookup::NoSuchMethod => Err(TypeCheckError::undefined(SymbolKind::Method, name, pos)),
        Lookup::WrongArguments => {
            let types: Vec<Type> = arguments.iter().map(|a| a.ty.clone()).collect();
            Err(TypeCheckError::invalid_arguments(name, &types, pos))
        }
    }
}

/// The type of `c ? a : b`.
fn conditional_type(then_expr: &Expr, else_expr: &Expr) -> Option<Type> {
    let (a, b) = (&then_expr.ty, &else_expr.ty);
    if a == b {
        return Some(a.clone());
    }
    if a.is_numeric() && b.is_numeric() {
        let fits_char = |e: &Expr| e.int_constant().is_some_and(|v| (0..=0xFFFF).contains(&v));
        if (*a == Type::Char && fits_char(else_expr)) || (*b == Type::Char && fits_char(then_expr))
        {
            return Some(Type::Char);
        }
        return binary_numeric_promotion(a, b);
    }
    if is_method_convertible(a, b) {
        return Some(b.clone());
    }
    if is_method_convertible(b, a) {
        return Some(a.clone());
    }
    None
}
