use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    error::{RuntimeError, StackFrame},
    eval::value::Value,
    program::Program,
};

/// Loop iterations and calls between two reads of the clock.
const CLOCK_CHECK_INTERVAL: u32 = 64;

/// When a run must stop early: a deadline, a cancellation token, or both.
#[derive(Debug, Clone)]
pub struct Interrupt {
    limit: Option<Duration>,
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

impl Interrupt {
    /// Cancellation only, no deadline.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            limit: None,
            deadline: None,
            token,
        }
    }

    /// A deadline `limit` from now.
    pub fn with_timeout(limit: Duration) -> Self {
        Self::new(CancellationToken::new()).timeout(limit)
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.limit = Some(limit);
        self.deadline = Instant::now().checked_add(limit);
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn check(&self) -> Result<(), RuntimeError> {
        if self.token.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(RuntimeError::Timeout),
            _ => Ok(()),
        }
    }
}

/// Console output of one run, cut off at a fixed number of characters.
#[derive(Debug)]
pub struct OutputBuffer {
    text: String,
    chars: usize,
    limit: usize,
    truncated: bool,
}

impl OutputBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            text: String::new(),
            chars: 0,
            limit,
            truncated: false,
        }
    }

    pub fn write(&mut self, s: &str) {
        if self.truncated {
            return;
        }
        let room = self.limit - self.chars;
        let count = s.chars().count();
        if count <= room {
            self.text.push_str(s);
            self.chars += count;
            return;
        }
        self.text.extend(s.chars().take(room));
        self.chars = self.limit;
        self.truncated = true;
        warn!(limit = self.limit, "output truncated");
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// One active method. `call_site` is where it is currently calling out
/// from, used for the caller lines of a stack trace.
#[derive(Debug, Clone, Copy)]
struct Activation {
    method: Option<usize>,
    base: usize,
    call_site: usize,
}

/// Mutable state of a single run: the local slots of every active method,
/// the globals, the output and the interrupt.
pub struct ExecutionContext<'p> {
    program: &'p Program,
    pub globals: Vec<Value>,
    slots: Vec<Value>,
    calls: Vec<Activation>,
    max_call_depth: usize,
    pub output: OutputBuffer,
    interrupt: Interrupt,
    ticks: u32,
}

impl<'p> ExecutionContext<'p> {
    pub fn new(
        program: &'p Program,
        globals: Vec<Value>,
        output: OutputBuffer,
        max_call_depth: usize,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            program,
            globals,
            slots: Vec::new(),
            calls: Vec::new(),
            max_call_depth,
            output,
            interrupt,
            ticks: 0,
        }
    }

    /// Polls the interrupt. The token is read every time, the clock every
    /// [`CLOCK_CHECK_INTERVAL`] ticks.
    pub fn tick(&mut self) -> Result<(), RuntimeError> {
        self.ticks = self.ticks.wrapping_add(1);
        if self.interrupt.token().is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        if self.ticks % CLOCK_CHECK_INTERVAL == 0 {
            self.interrupt.check()?;
        }
        Ok(())
    }

    /// Pushes a frame of `frame_size` default-initialised slots.
    /// Returns false when the call depth limit is reached.
    pub fn enter(&mut self, method: Option<usize>, frame_size: usize) -> bool {
        if self.calls.len() >= self.max_call_depth {
            return false;
        }
        let base = self.slots.len();
        self.slots.resize(base + frame_size, Value::Null);
        self.calls.push(Activation {
            method,
            base,
            call_site: 0,
        });
        true
    }

    pub fn leave(&mut self) {
        if let Some(activation) = self.calls.pop() {
            self.slots.truncate(activation.base);
        }
    }

    /// Records where the current method calls out from.
    pub fn set_call_site(&mut self, pos: usize) {
        if let Some(activation) = self.calls.last_mut() {
            activation.call_site = pos;
        }
    }

    fn base(&self) -> usize {
        self.calls.last().map_or(0, |activation| activation.base)
    }

    pub fn local(&self, slot: usize) -> Value {
        self.slots
            .get(self.base() + slot)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn set_local(&mut self, slot: usize, value: Value) {
        let index = self.base() + slot;
        if let Some(target) = self.slots.get_mut(index) {
            *target = value;
        }
    }

    pub fn global(&self, index: usize) -> Value {
        self.globals.get(index).cloned().unwrap_or(Value::Null)
    }

    pub fn set_global(&mut self, index: usize, value: Value) {
        if let Some(target) = self.globals.get_mut(index) {
            *target = value;
        }
    }

    /// The innermost frames, starting with the one executing `pos`.
    pub fn stack_trace(&self, pos: usize) -> Vec<StackFrame> {
        let program = self.program;
        let mut frames = Vec::new();
        let mut line_pos = pos;
        for activation in self.calls.iter().rev() {
            let method = activation
                .method
                .and_then(|index| program.methods.get(index))
                .map_or("main", |method| method.name.as_str());
            frames.push(StackFrame {
                class: program.class_name.clone(),
                method: method.to_string(),
                line: program.line(line_pos),
            });
            line_pos = activation.call_site;
        }
        frames.truncate(crate::error::MAX_STACK_FRAMES);
        frames
    }

    /// A Java exception raised at `pos`.
    pub fn exception(&self, class: &str, message: Option<String>, pos: usize) -> RuntimeError {
        RuntimeError::Exception {
            class: class.to_string(),
            message,
            stack: self.stack_trace(pos),
        }
    }

    pub fn depth(&self) -> usize {
        self.calls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_truncates_at_limit() {
        let mut output = OutputBuffer::new(5);
        output.write("abc");
        assert!(!output.is_truncated());
        output.write("défgh");
        assert!(output.is_truncated());
        assert_eq!(output.as_str(), "abcdé");
        output.write("more");
        assert_eq!(output.into_string(), "abcdé");
    }

    #[test]
    fn test_interrupt_cancellation() {
        let interrupt = Interrupt::default();
        assert!(interrupt.check().is_ok());
        interrupt.cancel();
        assert_eq!(interrupt.check(), Err(RuntimeError::Cancelled));
    }

    #[test]
    fn test_interrupt_deadline() {
        let interrupt = Interrupt::with_timeout(Duration::ZERO);
        assert_eq!(interrupt.check(), Err(RuntimeError::Timeout));
        assert_eq!(interrupt.limit(), Some(Duration::ZERO));
    }
}
