//! Reports handed to callers of the [`Engine`](crate::engine::Engine):
//! one per execution, and one per batch of test cases.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{config::duration_ms, error::EvaluationError, eval::Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum ErrorKind {
    #[serde(rename = "COMPILATION_ERROR")]
    #[strum(serialize = "COMPILATION_ERROR")]
    Compilation,
    #[serde(rename = "RUNTIME_ERROR")]
    #[strum(serialize = "RUNTIME_ERROR")]
    Runtime,
    #[serde(rename = "TIMEOUT_ERROR")]
    #[strum(serialize = "TIMEOUT_ERROR")]
    Timeout,
    #[serde(rename = "CANCELLED")]
    #[strum(serialize = "CANCELLED")]
    Cancelled,
}

impl From<&EvaluationError> for ErrorKind {
    fn from(error: &EvaluationError) -> Self {
        match error {
            EvaluationError::Compile { .. } => ErrorKind::Compilation,
            EvaluationError::Runtime { .. } => ErrorKind::Runtime,
            EvaluationError::Timeout { .. } => ErrorKind::Timeout,
            EvaluationError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Everything a front end needs to show the result of running a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Program output; for runtime errors, what was printed before the failure.
    pub output: String,
    pub error_message: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub error_line: Option<usize>,
    #[serde(with = "duration_ms")]
    pub execution_time: Duration,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ExecutionResult {
    pub fn success(outcome: Outcome, execution_time: Duration) -> Self {
        Self {
            success: true,
            output: outcome.output,
            error_message: None,
            error_kind: None,
            error_line: None,
            execution_time,
            warnings: outcome.warnings,
        }
    }

    pub fn failure(error: &EvaluationError, execution_time: Duration) -> Self {
        Self {
            success: false,
            output: error.output().unwrap_or_default().to_string(),
            error_message: Some(error.report()),
            error_kind: Some(ErrorKind::from(error)),
            error_line: error.line(),
            execution_time,
            warnings: Vec::new(),
        }
    }

    pub fn from_result(result: Result<Outcome, EvaluationError>, execution_time: Duration) -> Self {
        match result {
            Ok(outcome) => Self::success(outcome, execution_time),
            Err(error) => Self::failure(&error, execution_time),
        }
    }

    /// A block of text for the user, or `None` on success.
    pub fn formatted_error_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        let message = self.error_message.as_deref().unwrap_or("Unknown error");
        let text = match self.error_kind {
            Some(ErrorKind::Compilation) => match self.error_line {
                Some(line) => format!("❌ Compilation Error (Line {})\n\n{}", line, message),
                None => format!("❌ Compilation Error\n\n{}", message),
            },
            Some(ErrorKind::Runtime) => {
                let mut text = format!("❌ Runtime Error\n\n{}", message);
                if !self.output.is_empty() {
                    text.push_str("\n\nOutput before error:\n");
                    text.push_str(&self.output);
                }
                text
            }
            Some(ErrorKind::Timeout) => format!("⏱️ Timeout Error\n\n{}", message),
            Some(ErrorKind::Cancelled) => format!("⏹️ Execution Cancelled\n\n{}", message),
            None => format!("❌ Error\n\n{}", message),
        };
        Some(text)
    }

    /// One line, for logs.
    pub fn summary(&self) -> String {
        if self.success {
            format!(
                "Success ({} ms) - Output length: {} chars",
                self.execution_time.as_millis(),
                self.output.chars().count()
            )
        } else {
            let kind = self
                .error_kind
                .map_or_else(|| "UNKNOWN".to_string(), |kind| kind.to_string());
            let message = self.error_message.as_deref().unwrap_or("Unknown error");
            let first_line = message.lines().next().unwrap_or_default();
            format!("Failed ({}) - {}", kind, first_line)
        }
    }
}

/// Input for a program and the output it should produce.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestCase {
    /// Shown in reports; "Test N" when left empty.
    #[serde(default)]
    pub name: String,
    /// Passed to the program as `args[0]`; empty means no arguments.
    #[serde(default)]
    pub input: String,
    pub expected: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            input: input.into(),
            expected: expected.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn args(&self) -> Vec<String> {
        if self.input.is_empty() {
            Vec::new()
        } else {
            vec![self.input.clone()]
        }
    }

    /// Output matches when both sides are equal after trimming.
    pub fn matches(&self, actual: &str) -> bool {
        self.expected.trim() == actual.trim()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub name: String,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
    pub error: Option<String>,
}

impl TestCaseResult {
    pub fn new(index: usize, case: &TestCase, result: &ExecutionResult) -> Self {
        let name = if case.name.is_empty() {
            format!("Test {}", index + 1)
        } else {
            case.name.clone()
        };
        Self {
            name,
            input: case.input.clone(),
            expected: case.expected.clone(),
            actual: result.output.clone(),
            passed: result.success && case.matches(&result.output),
            error: result.error_message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub success: bool,
    pub summary: String,
    pub results: Vec<TestCaseResult>,
    #[serde(with = "duration_ms")]
    pub execution_time: Duration,
}

impl TestReport {
    pub fn new(results: Vec<TestCaseResult>, execution_time: Duration) -> Self {
        let passed = results.iter().filter(|result| result.passed).count();
        Self {
            success: passed == results.len(),
            summary: format!("Tests: {}/{} passed", passed, results.len()),
            results,
            execution_time,
        }
    }

    /// The report for code that did not compile: every case fails with the
    /// same error.
    pub fn failed(cases: &[TestCase], result: &ExecutionResult) -> Self {
        let results = cases
            .iter()
            .enumerate()
            .map(|(index, case)| TestCaseResult::new(index, case, result))
            .collect();
        Self::new(results, result.execution_time)
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|result| result.passed).count()
    }
}
