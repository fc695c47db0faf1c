//! Checking and lowering of statements.

use crate::{
    ast::{Expression, Statement, StatementKind, Type, TypeName, VariableDeclaration},
    program::{Expr, Stmt, StmtKind},
    type_checker::{
        ReturnRule, TypeCheckError, TypeCheckResult, TypeChecker, TypeContext,
        conversion::is_assignable,
    },
};

impl TypeChecker {
    pub(super) fn visit_statements(
        &mut self,
        statements: &[Statement],
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Vec<Stmt>> {
        statements
            .iter()
            .map(|statement| self.visit_statement(statement, ctx))
            .collect()
    }

    fn visit_statement(
        &mut self,
        statement: &Statement,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Stmt> {
        let pos = statement.pos;
        let kind = match &statement.kind {
            StatementKind::LocalVariable(declaration) => {
                return self.visit_local_variable(declaration, pos, ctx);
            }
            StatementKind::Expression(expression) => {
                if !expression.is_statement_expression() {
                    return Err(TypeCheckError::invalid("not a statement", expression.pos));
                }
                StmtKind::Expression(self.visit_expression(expression, ctx)?)
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.visit_condition(condition, ctx)?;
                let then_branch = self.visit_scoped(then_branch, ctx)?;
                let else_branch = match else_branch {
                    Some(branch) => Some(Box::new(self.visit_scoped(branch, ctx)?)),
                    None => None,
                };
                StmtKind::If {
                    condition,
                    then_branch: Box::new(then_branch),
                    else_branch,
                }
            }
            StatementKind::While { condition, body } => {
                let condition = self.visit_condition(condition, ctx)?;
                let body = self.visit_loop_body(body, ctx)?;
                StmtKind::While {
                    condition,
                    body: Box::new(body),
                }
            }
            StatementKind::DoWhile { body, condition } => {
                let body = self.visit_loop_body(body, ctx)?;
                let condition = self.visit_condition(condition, ctx)?;
                StmtKind::DoWhile {
                    body: Box::new(body),
                    condition,
                }
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                ctx.scope.enter_scope();
                let result = self.visit_for(init, condition.as_ref(), update, body, ctx);
                ctx.scope.exit_scope();
                result?
            }
            StatementKind::ForEach {
                ty,
                name,
                iterable,
                body,
            } => {
                let iterable = self.visit_value(iterable, ctx)?;
                let element = match &iterable.ty {
                    Type::Array(element) => (**element).clone(),
                    other => {
                        return Err(TypeCheckError::invalid(
                            format!("for-each not applicable to expression type {}", other),
                            pos,
                        ));
                    }
                };
                let ty = match ty {
                    TypeName::Var => element.clone(),
                    ty => self.resolve_value_type(ty, pos)?,
                };
                if !is_assignable(&element, &ty, None) {
                    return Err(TypeCheckError::type_mismatch(ty, element, pos));
                }

                ctx.scope.enter_scope();
                let result = match ctx.scope.declare(name, ty.clone()) {
                    Some(slot) => self
                        .visit_loop_body(body, ctx)
                        .map(|body| (slot, body)),
                    None => Err(TypeCheckError::DuplicateVariable {
                        name: name.clone(),
                        pos,
                    }),
                };
                ctx.scope.exit_scope();
                let (slot, body) = result?;
                StmtKind::ForEach {
                    slot,
                    ty,
                    iterable,
                    body: Box::new(body),
                }
            }
            StatementKind::Break => {
                if !ctx.in_loop() {
                    return Err(TypeCheckError::invalid("break outside switch or loop", pos));
                }
                StmtKind::Break
            }
            StatementKind::Continue => {
                if !ctx.in_loop() {
                    return Err(TypeCheckError::invalid("continue outside of loop", pos));
                }
                StmtKind::Continue
            }
            StatementKind::Return(value) => {
                StmtKind::Return(self.visit_return(value.as_ref(), pos, ctx)?)
            }
            StatementKind::Throw(expression) => {
                let value = self.visit_value(expression, ctx)?;
                if !matches!(value.ty, Type::Exception(_) | Type::Null) {
                    return Err(TypeCheckError::type_mismatch(
                        Type::Exception("Throwable".to_string()),
                        value.ty,
                        expression.pos,
                    ));
                }
                StmtKind::Throw(value)
            }
            StatementKind::Block(statements) => {
                ctx.scope.enter_scope();
                let result = self.visit_statements(statements, ctx);
                ctx.scope.exit_scope();
                StmtKind::Block(result?)
            }
            StatementKind::Empty => StmtKind::Block(Vec::new()),
        };
        Ok(Stmt::new(kind, pos))
    }

    /// A branch or loop body gets its own scope even without braces.
    fn visit_scoped(
        &mut self,
        statement: &Statement,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Stmt> {
        ctx.scope.enter_scope();
        let result = self.visit_statement(statement, ctx);
        ctx.scope.exit_scope();
        result
    }

    fn visit_loop_body(
        &mut self,
        body: &Statement,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Stmt> {
        ctx.loop_depth += 1;
        let result = self.visit_scoped(body, ctx);
        ctx.loop_depth -= 1;
        result
    }

    fn visit_for(
        &mut self,
        init: &[Statement],
        condition: Option<&Expression>,
        update: &[Expression],
        body: &Statement,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<StmtKind> {
        let init = self.visit_statements(init, ctx)?;
        let condition = condition
            .map(|condition| self.visit_condition(condition, ctx))
            .transpose()?;
        let update = update
            .iter()
            .map(|expression| {
                if !expression.is_statement_expression() {
                    return Err(TypeCheckError::invalid("not a statement", expression.pos));
                }
                self.visit_expression(expression, ctx)
            })
            .collect::<TypeCheckResult<Vec<_>>>()?;
        let body = self.visit_loop_body(body, ctx)?;
        Ok(StmtKind::For {
            init,
            condition,
            update,
            body: Box::new(body),
        })
    }

    fn visit_local_variable(
        &mut self,
        declaration: &VariableDeclaration,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Stmt> {
        let mut declared = Vec::with_capacity(declaration.declarators.len());
        for declarator in &declaration.declarators {
            let (ty, init) = match &declaration.ty {
                TypeName::Var => {
                    if declarator.extra_dimensions > 0 {
                        return Err(TypeCheckError::invalid(
                            "'var' is not allowed as an element type of an array",
                            declarator.pos,
                        ));
                    }
                    let Some(init) = &declarator.init else {
                        return Err(TypeCheckError::invalid(
                            format!(
                                "cannot infer type for local variable {} (cannot use 'var' on variable without initializer)",
                                declarator.name
                            ),
                            declarator.pos,
                        ));
                    };
                    let value = self.visit_value(init, ctx)?;
                    if value.ty == Type::Null {
                        return Err(TypeCheckError::invalid(
                            format!(
                                "cannot infer type for local variable {} (variable initializer is 'null')",
                                declarator.name
                            ),
                            declarator.pos,
                        ));
                    }
                    (value.ty.clone(), Some(value))
                }
                ty => {
                    let ty = self.resolve_value_type(
                        &ty.clone().array_of(declarator.extra_dimensions),
                        declarator.pos,
                    )?;
                    let init = match &declarator.init {
                        Some(init) => {
                            let value = self.visit_value(init, ctx)?;
                            Some(self.coerce(value, &ty)?)
                        }
                        None => None,
                    };
                    (ty, init)
                }
            };

            // The name comes into scope after its own initializer.
            let slot = ctx.scope.declare(&declarator.name, ty.clone()).ok_or_else(|| {
                TypeCheckError::DuplicateVariable {
                    name: declarator.name.clone(),
                    pos: declarator.pos,
                }
            })?;
            declared.push(Stmt::new(StmtKind::Declare { slot, ty, init }, declarator.pos));
        }

        if declared.len() == 1 {
            if let Some(statement) = declared.pop() {
                return Ok(statement);
            }
        }
        Ok(Stmt::new(StmtKind::Block(declared), pos))
    }

    fn visit_return(
        &mut self,
        value: Option<&Expression>,
        pos: usize,
        ctx: &mut TypeContext,
    ) -> TypeCheckResult<Option<Expr>> {
        match (ctx.returns.clone(), value) {
            (ReturnRule::Any, None) => Ok(None),
            (ReturnRule::Any, Some(value)) => Ok(Some(self.visit_value(value, ctx)?)),
            (ReturnRule::Method(Type::Void), None) => Ok(None),
            (ReturnRule::Method(Type::Void), Some(value)) => Err(TypeCheckError::invalid(
                "incompatible types: unexpected return value",
                value.pos,
            )),
            (ReturnRule::Method(_), None) => Err(TypeCheckError::invalid(
                "incompatible types: missing return value",
                pos,
            )),
            (ReturnRule::Method(ty), Some(value)) => {
                let value = self.visit_value(value, ctx)?;
                Ok(Some(self.coerce(value, &ty)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        analyzer::parsers::unit::parse_compilation_unit,
        preprocessor::{Preprocessor, TokenPreprocessor},
        program::{Entry, Program, StmtKind},
        tokenizer::token::Tokenizer,
        type_checker::{BindingTypes, TypeCheckError, TypeCheckResult, run_type_checker},
    };

    fn check(source: &str) -> TypeCheckResult<Program> {
        check_with(source, &BindingTypes::new())
    }

    fn check_with(source: &str, bindings: &BindingTypes) -> TypeCheckResult<Program> {
        let tokens = Tokenizer::new().tokenize(source).expect("tokenize");
        let tokens = TokenPreprocessor::new().process(tokens);
        let unit = parse_compilation_unit(&tokens.tokens).expect("parse");
        run_type_checker(&unit, bindings)
    }

    fn message(source: &str) -> String {
        check(source).expect_err("should not type check").to_string()
    }

    #[test]
    fn test_block_declares_slots() {
        let program = check("int a = 1; { int b = 2; } int c = a; return c;").unwrap();
        let Entry::Block { body, frame_size, .. } = &program.entry else {
            panic!("expected a block");
        };
        assert_eq!(body.len(), 4);
        // args, a, b (released), c reuses b's slot
        assert_eq!(*frame_size, 3);
        assert!(matches!(body[2].kind, StmtKind::Declare { slot: 2, .. }));
    }

    #[test]
    fn test_multiple_declarators() {
        let program = check("int a = 1, b = a + 1; return b;").unwrap();
        let Entry::Block { body, .. } = &program.entry else {
            panic!("expected a block");
        };
        assert!(matches!(&body[0].kind, StmtKind::Block(d) if d.len() == 2));
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(message("break;"), "break outside switch or loop");
        assert_eq!(message("if (true) continue;"), "continue outside of loop");
        assert!(check("while (true) { if (true) break; }").is_ok());
    }

    #[test]
    fn test_return_rules() {
        assert_eq!(
            message("static void f() { return 1; }"),
            "incompatible types: unexpected return value"
        );
        assert_eq!(
            message("static int f() { return; }"),
            "incompatible types: missing return value"
        );
        assert_eq!(
            message("static int f(int x) { if (x > 0) return 1; }"),
            "missing return statement"
        );
        assert!(check("static int f() { while (true) { } }").is_ok());
    }

    #[test]
    fn test_var_inference() {
        assert!(check("var xs = new int[3]; return xs.length;").is_ok());
        assert_eq!(
            message("var x = null;"),
            "cannot infer type for local variable x (variable initializer is 'null')"
        );
        assert_eq!(
            message("var x;"),
            "cannot infer type for local variable x (cannot use 'var' on variable without initializer)"
        );
    }

    #[test]
    fn test_duplicate_local() {
        let error = check("int x = 1; { int x = 2; }").unwrap_err();
        assert!(matches!(error, TypeCheckError::DuplicateVariable { .. }));
        assert!(check("{ int x = 1; } { int x = 2; }").is_ok());
    }

    #[test]
    fn test_for_each_element_type() {
        assert!(check("long sum = 0; for (int x : new int[]{1, 2}) sum += x; return sum;").is_ok());
        assert!(check("for (double d : new int[]{1}) { }").is_ok());
        assert_eq!(
            message("for (int x : 5) { }"),
            "for-each not applicable to expression type int"
        );
    }

    #[test]
    fn test_conditions_must_be_boolean() {
        assert_eq!(
            message("int x = 1; if (x) { }"),
            "incompatible types: int cannot be converted to boolean"
        );
    }

    #[test]
    fn test_throw_requires_exception() {
        assert!(check("throw new IllegalStateException(\"bad\");").is_ok());
        assert_eq!(
            message("throw \"bad\";"),
            "incompatible types: String cannot be converted to Throwable"
        );
    }

    #[test]
    fn test_void_expression_without_semicolon() {
        assert_eq!(message("System.out.println(1)"), "';' expected");
    }

    #[test]
    fn test_bindings_are_globals() {
        let bindings = vec![("n".to_string(), crate::ast::Type::Int)];
        let program = check_with("return n * 2;", &bindings).unwrap();
        assert_eq!(program.binding_count, 1);
        assert_eq!(program.globals[0].name, "n");
    }
}
