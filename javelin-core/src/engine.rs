//! A long-lived evaluation service.
//!
//! The [`Engine`] owns a pool of worker threads, a cache of compiled
//! programs and the time budget for each run. Requests arrive through
//! async methods; each one becomes a [`Job`] on a shared queue and its
//! result comes back over a oneshot channel.
//!
//! Programs are checked against their deadline from inside the
//! interpreter. A run that does not notice its deadline (for example one
//! stuck inside a single large built-in call) is abandoned after a short
//! grace period and its cancellation token is fired.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    compiler::{binding_types, Compiler},
    config::{clamp_timeout, EngineConfig},
    error::{Error, EvaluationError, InternalResult},
    eval::{Bindings, Interpreter, Interrupt, Outcome, Value},
    result::{ExecutionResult, TestCase, TestCaseResult, TestReport},
};

/// Extra time a worker gets to notice its own deadline.
const DEADLINE_GRACE: Duration = Duration::from_millis(250);

const SELF_TEST_SOURCE: &str = r#"System.out.println("Test");"#;

type Reply = oneshot::Sender<Result<Outcome, EvaluationError>>;

/// One evaluation request waiting for a worker.
struct Job {
    id: Uuid,
    source: String,
    bindings: Bindings,
    args: Vec<String>,
    interrupt: Interrupt,
    reply: Reply,
}

type Queue = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

pub struct Engine {
    config: EngineConfig,
    compiler: Arc<Compiler>,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown: CancellationToken,
    timeout_ms: AtomicU64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> InternalResult<Self> {
        config.validate()?;

        let compiler = Arc::new(Compiler::new(config.cache_capacity));
        let interpreter = Interpreter::new(&config);
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue: Queue = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let queue = queue.clone();
            let compiler = compiler.clone();
            let interpreter = interpreter.clone();
            let handle = std::thread::Builder::new()
                .name(format!("javelin-worker-{}", index))
                .stack_size(config.worker_stack_size)
                .spawn(move || worker_loop(index, queue, compiler, interpreter))
                .map_err(|e| Error::Internal(format!("failed to spawn worker: {}", e)))?;
            workers.push(handle);
        }

        let timeout = clamp_timeout(config.timeout);
        info!(
            workers = config.workers,
            timeout_ms = timeout.as_millis() as u64,
            cache_capacity = config.cache_capacity,
            "engine started"
        );

        Ok(Self {
            config,
            compiler,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            shutdown: CancellationToken::new(),
            timeout_ms: AtomicU64::new(timeout.as_millis() as u64),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.load(Ordering::Relaxed))
    }

    /// Sets the budget for later runs, clamped to the accepted range.
    pub fn set_timeout(&self, timeout: Duration) {
        let timeout = clamp_timeout(timeout);
        self.timeout_ms
            .store(timeout.as_millis() as u64, Ordering::Relaxed);
        debug!(timeout_ms = timeout.as_millis() as u64, "timeout updated");
    }

    /// Programs currently held by the compile cache.
    pub fn cached_programs(&self) -> usize {
        self.compiler.len()
    }

    pub fn clear_cache(&self) {
        self.compiler.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Evaluates `source` with `bindings` and returns its value.
    pub async fn evaluate(
        &self,
        source: &str,
        bindings: &Bindings,
    ) -> Result<Value, EvaluationError> {
        self.run(source, bindings.clone(), Vec::new())
            .await
            .map(|outcome| outcome.value)
    }

    /// Runs `source` without bindings and reports on it.
    pub async fn execute(&self, source: &str) -> ExecutionResult {
        self.execute_with_args(source, Vec::new()).await
    }

    /// Runs `source` with `args` passed to `main`.
    pub async fn execute_with_args(&self, source: &str, args: Vec<String>) -> ExecutionResult {
        let started = Instant::now();
        let result = self.run(source, Bindings::new(), args).await;
        let result = ExecutionResult::from_result(result, started.elapsed());
        debug!(summary = %result.summary(), "execution finished");
        result
    }

    /// Runs `source` once per test case, feeding each case's input as the
    /// program's argument. Code that fails to compile fails every case
    /// without running.
    pub async fn execute_with_tests(&self, source: &str, cases: &[TestCase]) -> TestReport {
        let started = Instant::now();

        if let Err(error) = self.compile(source, &Bindings::new()) {
            let result = ExecutionResult::failure(&error, started.elapsed());
            return TestReport::failed(cases, &result);
        }

        let mut results = Vec::with_capacity(cases.len());
        for (index, case) in cases.iter().enumerate() {
            let result = self.execute_with_args(source, case.args()).await;
            let outcome = TestCaseResult::new(index, case, &result);
            debug!(name = %outcome.name, passed = outcome.passed, "test case finished");
            results.push(outcome);
        }

        let report = TestReport::new(results, started.elapsed());
        info!(summary = %report.summary, "test run finished");
        report
    }

    /// Runs a trivial program and checks its output.
    pub async fn run_self_test(&self) -> bool {
        let result = self.execute(SELF_TEST_SOURCE).await;
        let passed = result.success && result.output.trim() == "Test";
        if passed {
            info!("self test passed");
        } else {
            error!(summary = %result.summary(), "self test failed");
        }
        passed
    }

    /// Compiles without running, filling the cache.
    pub fn compile(&self, source: &str, bindings: &Bindings) -> Result<(), EvaluationError> {
        let types = binding_types(bindings)?;
        self.compiler.compile(source, &types).map(|_| ())
    }

    /// Stops accepting work, cancels running programs and waits for the
    /// workers to exit.
    pub async fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        info!("engine shutting down");
        self.shutdown.cancel();
        self.close_queue();

        let handles = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        let joined = tokio::task::spawn_blocking(move || {
            for handle in handles {
                if handle.join().is_err() {
                    warn!("worker exited with a panic");
                }
            }
        })
        .await;
        if let Err(e) = joined {
            error!("failed to join workers: {}", e);
        }
        info!("engine stopped");
    }

    fn close_queue(&self) {
        match self.sender.lock() {
            Ok(mut sender) => sender.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
    }

    fn submit(&self, job: Job) -> Result<(), EvaluationError> {
        let sender = match self.sender.lock() {
            Ok(sender) => sender,
            Err(poisoned) => poisoned.into_inner(),
        };
        match sender.as_ref() {
            Some(sender) => sender.send(job).map_err(|_| EvaluationError::Cancelled),
            None => Err(EvaluationError::Cancelled),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    async fn run(
        &self,
        source: &str,
        bindings: Bindings,
        args: Vec<String>,
    ) -> Result<Outcome, EvaluationError> {
        if self.shutdown.is_cancelled() {
            return Err(EvaluationError::Cancelled);
        }

        let limit = self.timeout();
        let interrupt = Interrupt::new(self.shutdown.child_token()).timeout(limit);
        let (reply, receiver) = oneshot::channel();
        let id = Uuid::new_v4();
        self.submit(Job {
            id,
            source: source.to_string(),
            bindings,
            args,
            interrupt: interrupt.clone(),
            reply,
        })?;

        match tokio::time::timeout(limit + DEADLINE_GRACE, receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                warn!(%id, "worker dropped the job");
                Err(EvaluationError::Cancelled)
            }
            Err(_) => {
                warn!(%id, limit_ms = limit.as_millis() as u64, "job missed its deadline, cancelling");
                interrupt.cancel();
                Err(EvaluationError::Timeout { limit })
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.close_queue();
    }
}

fn worker_loop(index: usize, queue: Queue, compiler: Arc<Compiler>, interpreter: Interpreter) {
    debug!(worker = index, "worker started");
    loop {
        let job = match queue.lock() {
            Ok(mut receiver) => receiver.blocking_recv(),
            Err(poisoned) => poisoned.into_inner().blocking_recv(),
        };
        let Some(job) = job else {
            break;
        };

        let result = if job.interrupt.token().is_cancelled() {
            Err(EvaluationError::Cancelled)
        } else {
            run_job(&compiler, &interpreter, &job)
        };
        debug!(worker = index, id = %job.id, ok = result.is_ok(), "job finished");
        if job.reply.send(result).is_err() {
            debug!(worker = index, id = %job.id, "caller no longer waiting");
        }
    }
    debug!(worker = index, "worker stopped");
}

fn run_job(
    compiler: &Compiler,
    interpreter: &Interpreter,
    job: &Job,
) -> Result<Outcome, EvaluationError> {
    let run = || {
        let types = binding_types(&job.bindings)?;
        let program = compiler.compile(&job.source, &types)?;
        interpreter.run(&program, &job.bindings, &job.args, job.interrupt.clone())
    };
    panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(id = %job.id, "evaluation panicked: {}", message);
        Err(EvaluationError::Runtime {
            exception: "InternalError".to_string(),
            message: Some(message),
            stack: Vec::new(),
            output: String::new(),
        })
    })
}
