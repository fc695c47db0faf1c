use std::time::Duration;

use tracing::debug;

use crate::{
    ast::Type,
    config::EngineConfig,
    error::{EvaluationError, RuntimeError},
    eval::{
        context::{ExecutionContext, Interrupt, OutputBuffer},
        value::{Bindings, Value},
    },
    program::{Entry, Program, Stmt},
};

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The expression's value, a top-level `return` value, or `Void`.
    pub value: Value,
    pub output: String,
    pub warnings: Vec<String>,
}

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Runs checked [`Program`]s. Holds only limits, so one interpreter can
/// run any number of programs, also concurrently.
#[derive(Debug, Clone)]
pub struct Interpreter {
    max_output_len: usize,
    max_call_depth: usize,
    max_string_len: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Interpreter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_output_len: config.max_output_len,
            max_call_depth: config.max_call_depth,
            max_string_len: config.max_string_len,
        }
    }

    /// Runs `program` with the given bindings and program arguments.
    ///
    /// `bindings` must supply a value for every binding the program was
    /// compiled against; a missing one starts out as its type's default.
    #[tracing::instrument(level = "debug", skip_all, fields(class = %program.class_name))]
    pub fn run(
        &self,
        program: &Program,
        bindings: &Bindings,
        args: &[String],
        interrupt: Interrupt,
    ) -> Result<Outcome, EvaluationError> {
        let globals = program
            .globals
            .iter()
            .enumerate()
            .map(|(index, global)| {
                let bound = (index < program.binding_count)
                    .then(|| bindings.get(&global.name))
                    .flatten();
                match bound {
                    Some(value) => value.clone().convert(&global.ty),
                    None => Value::default_for(&global.ty),
                }
            })
            .collect();

        let limit = interrupt.limit().unwrap_or(Duration::ZERO);
        let context = ExecutionContext::new(
            program,
            globals,
            OutputBuffer::new(self.max_output_len),
            self.max_call_depth,
            interrupt,
        );
        let mut evaluator = Evaluator {
            program,
            context,
            max_string_len: self.max_string_len,
        };
        let result = evaluator.execute(args);

        let output = evaluator.context.output;
        let mut warnings = Vec::new();
        if output.is_truncated() {
            warnings.push(format!(
                "Output truncated: exceeded {} characters",
                self.max_output_len
            ));
        }
        match result {
            Ok(value) => {
                debug!(result = %value, "program finished");
                Ok(Outcome {
                    value,
                    output: output.into_string(),
                    warnings,
                })
            }
            Err(error) => {
                debug!(%error, "program stopped");
                Err(EvaluationError::from_runtime(
                    error,
                    output.into_string(),
                    limit,
                ))
            }
        }
    }
}

/// A single run of a program.
pub(crate) struct Evaluator<'p> {
    pub(crate) program: &'p Program,
    pub(crate) context: ExecutionContext<'p>,
    pub(crate) max_string_len: usize,
}

impl<'p> Evaluator<'p> {
    fn execute(&mut self, args: &[String]) -> Result<Value, RuntimeError> {
        let program = self.program;
        let args = Value::array(
            Type::String,
            args.iter().map(|arg| Value::string(arg)).collect(),
        );

        self.initialize_fields()?;

        match &program.entry {
            Entry::Expression {
                body,
                frame_size,
                args_slot,
            } => {
                self.enter_entry(*frame_size, *args_slot, args);
                let value = self.eval(body);
                self.context.leave();
                value
            }
            Entry::Block {
                body,
                frame_size,
                args_slot,
            } => {
                self.enter_entry(*frame_size, *args_slot, args);
                let flow = self.exec_block(body);
                self.context.leave();
                match flow? {
                    ControlFlow::Return(value) => Ok(value),
                    _ => Ok(Value::Void),
                }
            }
            Entry::Main(Some(main)) => {
                let arguments = match program.methods.get(*main) {
                    Some(method) if !method.params.is_empty() => vec![args],
                    _ => Vec::new(),
                };
                self.invoke(*main, arguments, 0)
            }
            Entry::Main(None) => Ok(Value::Void),
        }
    }

    fn enter_entry(&mut self, frame_size: usize, args_slot: Option<usize>, args: Value) {
        self.context.enter(None, frame_size);
        if let Some(slot) = args_slot {
            self.context.set_local(slot, args);
        }
    }

    /// Field initializers run in declaration order before anything else.
    fn initialize_fields(&mut self) -> Result<(), RuntimeError> {
        let program = self.program;
        if program.globals.iter().all(|global| global.init.is_none()) {
            return Ok(());
        }
        self.context.enter(None, 0);
        let mut result = Ok(());
        for (index, global) in program.globals.iter().enumerate() {
            if let Some(init) = &global.init {
                match self.eval(init) {
                    Ok(value) => self.context.set_global(index, value),
                    Err(error) => {
                        result = Err(error);
                        break;
                    }
                }
            }
        }
        self.context.leave();
        result
    }

    /// Calls a method of the program. `pos` is the call expression.
    pub(crate) fn invoke(
        &mut self,
        index: usize,
        arguments: Vec<Value>,
        pos: usize,
    ) -> Result<Value, RuntimeError> {
        self.context.tick()?;
        let program = self.program;
        let Some(method) = program.methods.get(index) else {
            return Err(self
                .context
                .exception("IllegalStateException", Some("no such method".to_string()), pos));
        };
        if !self.context.enter(Some(index), method.frame_size) {
            return Err(self.context.exception("StackOverflowError", None, pos));
        }
        for (slot, argument) in arguments.into_iter().enumerate() {
            self.context.set_local(slot, argument);
        }
        let flow = self.exec_block(&method.body);
        self.context.leave();
        match flow? {
            ControlFlow::Return(value) => Ok(value),
            _ => Ok(Value::Void),
        }
    }

    pub(crate) fn exec_block(&mut self, statements: &[Stmt]) -> Result<ControlFlow, RuntimeError> {
        for statement in statements {
            match self.exec(statement)? {
                ControlFlow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(ControlFlow::Normal)
    }
}
