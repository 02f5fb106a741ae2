//! Runs a single test case under a wall-clock deadline and grades it.

use crate::comparator::outputs_match;
use crate::error::JudgeError;
use crate::executor::Executor;
use crate::types::{ExecOutput, Fault, Invocation, Language, LanguageConfig, TestCase, Verdict};
use std::time::{Duration, Instant};

/// The graded result of one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
    pub verdict: Verdict,
    pub output: String,
    pub error: Option<String>,
    pub time_ms: u64,
    pub memory_bytes: u64,
}

#[derive(Debug, Clone)]
struct CaseMonitor {
    start_time: Instant,
    memory_limit: u64,
}

impl CaseMonitor {
    fn start(memory_limit: u64) -> Self {
        Self {
            start_time: Instant::now(),
            memory_limit,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start_time.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn exceeds_memory(&self, usage: u64) -> bool {
        usage > self.memory_limit
    }
}

/// Everything about a submission that stays fixed across its test cases.
pub struct Harness<'a> {
    executor: &'a dyn Executor,
    language: &'a LanguageConfig,
    code: &'a str,
    entry_point: Option<&'a str>,
    time_limit: Duration,
    memory_limit_bytes: u64,
    memory_estimate_factor: u64,
}

impl<'a> Harness<'a> {
    pub fn new(
        executor: &'a dyn Executor,
        language: &'a LanguageConfig,
        code: &'a str,
        time_limit: Duration,
        memory_limit_bytes: u64,
    ) -> Self {
        Self {
            executor,
            language,
            code,
            entry_point: None,
            time_limit,
            memory_limit_bytes,
            memory_estimate_factor: 1,
        }
    }

    pub fn with_entry_point(mut self, entry_point: Option<&'a str>) -> Self {
        self.entry_point = entry_point;
        self
    }

    pub fn with_memory_estimate_factor(mut self, factor: u64) -> Self {
        self.memory_estimate_factor = factor;
        self
    }

    fn language(&self) -> Language {
        self.language.language
    }

    pub async fn run(&self, test_case: &TestCase) -> CaseOutcome {
        let invocation = Invocation::judged(
            self.language(),
            self.code,
            self.entry_point.map(str::to_string),
            &test_case.input,
            self.time_limit,
            self.memory_limit_bytes,
        );
        let deadline = self.time_limit + self.executor.deadline_allowance();

        let monitor = CaseMonitor::start(self.memory_limit_bytes);
        let result = tokio::time::timeout(deadline, self.executor.execute(&invocation)).await;
        let time_ms = monitor.elapsed_ms();

        let outcome = |verdict: Verdict, output: String, error: Option<String>, memory_bytes: u64| {
            CaseOutcome {
                verdict,
                output,
                error,
                time_ms,
                memory_bytes,
            }
        };

        let output = match result {
            Err(_) => {
                log::debug!("{} case timed out after {time_ms}ms", self.language());
                return outcome(
                    Verdict::TimeLimitExceeded,
                    String::new(),
                    Some(time_limit_message(self.time_limit)),
                    0,
                );
            }
            Ok(Err(JudgeError::Timeout)) => {
                return outcome(
                    Verdict::TimeLimitExceeded,
                    String::new(),
                    Some(time_limit_message(self.time_limit)),
                    0,
                );
            }
            Ok(Err(err)) => {
                log::debug!("{} executor failed: {err}", self.language());
                return outcome(Verdict::RuntimeError, String::new(), Some(err.to_string()), 0);
            }
            Ok(Ok(output)) => output,
        };

        let ExecOutput {
            stdout,
            fault,
            memory_bytes,
        } = output;
        let stdout = self.truncate(stdout);
        let memory = memory_bytes.unwrap_or_else(|| self.estimate_memory(&stdout));

        match fault {
            Some(Fault::Timeout) => outcome(
                Verdict::TimeLimitExceeded,
                stdout,
                Some(time_limit_message(self.time_limit)),
                memory,
            ),
            Some(Fault::OutOfMemory(message)) => {
                outcome(Verdict::MemoryLimitExceeded, stdout, Some(message), memory)
            }
            _ if monitor.exceeds_memory(memory) => outcome(
                Verdict::MemoryLimitExceeded,
                stdout,
                Some(format!(
                    "Memory usage {memory} bytes exceeds the limit of {} bytes",
                    self.memory_limit_bytes
                )),
                memory,
            ),
            Some(Fault::Compile(message)) => {
                outcome(Verdict::CompilationError, stdout, Some(message), memory)
            }
            Some(Fault::Runtime(message)) => {
                outcome(Verdict::RuntimeError, stdout, Some(message), memory)
            }
            None if outputs_match(&stdout, &test_case.expected_output) => {
                outcome(Verdict::Accepted, stdout, None, memory)
            }
            None => outcome(Verdict::WrongAnswer, stdout, None, memory),
        }
    }

    fn estimate_memory(&self, output: &str) -> u64 {
        let bytes = (self.code.len() + output.len()) as u64;
        bytes.saturating_mul(self.memory_estimate_factor)
    }

    fn truncate(&self, mut output: String) -> String {
        let limit = self.language.max_output_bytes;
        if output.len() <= limit {
            return output;
        }
        log::warn!(
            "{} output of {} bytes truncated to {limit} bytes",
            self.language(),
            output.len()
        );
        let mut end = limit;
        while !output.is_char_boundary(end) {
            end -= 1;
        }
        output.truncate(end);
        output
    }
}

fn time_limit_message(limit: Duration) -> String {
    format!("Execution exceeded the time limit of {}ms", limit.as_millis())
}
