use crate::{
    error::RuntimeError,
    eval::{
        interpreter::{ControlFlow, Evaluator},
        value::Value,
    },
    program::{Stmt, StmtKind},
};

/// What the loop statement does after its body finished with `flow`.
enum LoopStep {
    Next,
    Exit(ControlFlow),
}

fn loop_step(flow: ControlFlow) -> LoopStep {
    match flow {
        ControlFlow::Normal | ControlFlow::Continue => LoopStep::Next,
        ControlFlow::Break => LoopStep::Exit(ControlFlow::Normal),
        ControlFlow::Return(value) => LoopStep::Exit(ControlFlow::Return(value)),
    }
}

impl<'p> Evaluator<'p> {
    pub(crate) fn exec(&mut self, statement: &Stmt) -> Result<ControlFlow, RuntimeError> {
        match &statement.kind {
            StmtKind::Expression(expr) => {
                self.eval(expr)?;
                Ok(ControlFlow::Normal)
            }
            StmtKind::Declare { slot, ty, init } => {
                let value = match init {
                    Some(init) => self.eval(init)?,
                    None => Value::default_for(ty),
                };
                self.context.set_local(*slot, value);
                Ok(ControlFlow::Normal)
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_bool(condition)? {
                    self.exec(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch)
                } else {
                    Ok(ControlFlow::Normal)
                }
            }
            StmtKind::While { condition, body } => {
                loop {
                    self.context.tick()?;
                    if !self.eval_bool(condition)? {
                        return Ok(ControlFlow::Normal);
                    }
                    if let LoopStep::Exit(flow) = loop_step(self.exec(body)?) {
                        return Ok(flow);
                    }
                }
            }
            StmtKind::DoWhile { body, condition } => loop {
                self.context.tick()?;
                if let LoopStep::Exit(flow) = loop_step(self.exec(body)?) {
                    return Ok(flow);
                }
                if !self.eval_bool(condition)? {
                    return Ok(ControlFlow::Normal);
                }
            },
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                self.exec_block(init)?;
                loop {
                    self.context.tick()?;
                    if let Some(condition) = condition {
                        if !self.eval_bool(condition)? {
                            return Ok(ControlFlow::Normal);
                        }
                    }
                    if let LoopStep::Exit(flow) = loop_step(self.exec(body)?) {
                        return Ok(flow);
                    }
                    for expr in update {
                        self.eval(expr)?;
                    }
                }
            }
            StmtKind::ForEach {
                slot,
                ty,
                iterable,
                body,
            } => {
                let Value::Array(array) = self.eval(iterable)? else {
                    return Err(self.context.exception(
                        "NullPointerException",
                        Some("Cannot read the array length because value is null".to_string()),
                        iterable.pos,
                    ));
                };
                let length = array.len();
                for index in 0..length {
                    self.context.tick()?;
                    let element = array.get(index).unwrap_or(Value::Null);
                    self.context.set_local(*slot, element.convert(ty));
                    if let LoopStep::Exit(flow) = loop_step(self.exec(body)?) {
                        return Ok(flow);
                    }
                }
                Ok(ControlFlow::Normal)
            }
            StmtKind::Break => Ok(ControlFlow::Break),
            StmtKind::Continue => Ok(ControlFlow::Continue),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(value)?,
                    None => Value::Void,
                };
                Ok(ControlFlow::Return(value))
            }
            StmtKind::Throw(expr) => match self.eval(expr)? {
                Value::Exception(exception) => Err(self.context.exception(
                    &exception.class,
                    exception.message.clone(),
                    statement.pos,
                )),
                _ => Err(self.context.exception(
                    "NullPointerException",
                    Some("Cannot throw exception because value is null".to_string()),
                    statement.pos,
                )),
            },
            StmtKind::Block(statements) => self.exec_block(statements),
        }
    }
}
