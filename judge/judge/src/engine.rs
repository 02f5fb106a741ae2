//! The public entry points: judged submissions and playground runs.

use crate::config::JudgeGlobalConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{messages, JudgeError, JudgeResult};
use crate::executor::Executor;
use crate::types::{ExecutionRequest, ExecutionResult, FreeformResult, Invocation, Verdict};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub struct JudgeEngine {
    config: JudgeGlobalConfig,
    dispatcher: Dispatcher,
}

impl JudgeEngine {
    pub fn new() -> JudgeResult<Self> {
        Self::with_config(JudgeGlobalConfig::default())
    }

    pub fn from_env() -> JudgeResult<Self> {
        crate::init_logging();
        Self::with_config(JudgeGlobalConfig::from_env())
    }

    pub fn with_config(config: JudgeGlobalConfig) -> JudgeResult<Self> {
        config
            .validate()
            .map_err(|reason| JudgeError::Validation(messages::config_error("judge", &reason)))?;
        config.print_summary();
        let dispatcher = Dispatcher::new(&config)?;
        Ok(Self { config, dispatcher })
    }

    /// Replaces the executor serving `executor.strategy()`.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.dispatcher = self.dispatcher.with_executor(executor);
        self
    }

    pub fn config(&self) -> &JudgeGlobalConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Grades `request` against its test cases.
    ///
    /// Never fails: unsupported languages, invalid requests, backend errors
    /// and panics all come back as a rejected result.
    pub async fn submit(&self, request: ExecutionRequest) -> ExecutionResult {
        let submission = Uuid::new_v4();
        let total = request.test_cases.len();
        let started = Instant::now();

        let (language, executor) = match self.dispatcher.resolve(&request.language) {
            Ok(resolved) => resolved,
            Err(err) => {
                log::info!("Submission {submission} rejected: {err}");
                return ExecutionResult::rejected(Verdict::CompilationError, total, err.to_string());
            }
        };

        let judged = crate::verdict::run(&request, &self.config, &language, executor.as_ref());
        let result = match AssertUnwindSafe(judged).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                log::error!("Submission {submission} panicked: {reason}");
                ExecutionResult::rejected(
                    Verdict::RuntimeError,
                    total,
                    JudgeError::Internal(reason).to_string(),
                )
            }
        };

        log::info!(
            "Submission {submission} ({}): {} {}/{} in {}ms",
            language.language,
            result.status,
            result.passed_test_cases,
            result.total_test_cases,
            started.elapsed().as_millis()
        );
        result
    }

    /// Runs `code` once with no test cases and returns what it printed.
    pub async fn run_freeform(&self, language: &str, code: &str) -> FreeformResult {
        let run = AssertUnwindSafe(self.try_run_freeform(language, code)).catch_unwind();
        match run.await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => FreeformResult {
                output: String::new(),
                error: Some(err.to_string()),
            },
            Err(panic) => FreeformResult {
                output: String::new(),
                error: Some(JudgeError::Internal(panic_message(panic.as_ref())).to_string()),
            },
        }
    }

    async fn try_run_freeform(&self, language: &str, code: &str) -> JudgeResult<FreeformResult> {
        let (config, executor) = self.dispatcher.resolve(language)?;
        if code.trim().is_empty() {
            return Err(crate::error::validation::empty_source());
        }
        if code.len() > self.config.max_source_bytes {
            return Err(crate::error::validation::source_too_large(
                code.len(),
                self.config.max_source_bytes,
            ));
        }

        let timeout = self.config.freeform_timeout();
        let invocation = Invocation::playground(
            config.language,
            code,
            timeout,
            self.config.default_memory_limit_mb.saturating_mul(1024 * 1024),
        );
        let deadline = timeout + executor.deadline_allowance();
        log::debug!("Playground run ({})", config.language);

        let output = tokio::time::timeout(deadline, executor.execute(&invocation))
            .await
            .map_err(|_| JudgeError::Timeout)??;

        let mut stdout = output.stdout;
        if stdout.len() > config.max_output_bytes {
            let mut end = config.max_output_bytes;
            while !stdout.is_char_boundary(end) {
                end -= 1;
            }
            stdout.truncate(end);
        }
        Ok(FreeformResult {
            output: stdout,
            error: output.fault.map(|fault| fault.message()),
        })
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("executor panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("executor panicked: {message}")
    } else {
        "executor panicked".to_string()
    }
}
