//! Folds per-case outcomes into one submission result.
//!
//! Cases run strictly in order and the first one that is not accepted ends
//! the submission. Request validation and the syntax gate run once, before
//! any case.

use crate::config::JudgeGlobalConfig;
use crate::error::{validation, JudgeError};
use crate::executor::Executor;
use crate::harness::Harness;
use crate::precheck;
use crate::types::{ExecutionRequest, ExecutionResult, LanguageConfig, Verdict};

pub async fn run(
    request: &ExecutionRequest,
    config: &JudgeGlobalConfig,
    language: &LanguageConfig,
    executor: &dyn Executor,
) -> ExecutionResult {
    let total = request.test_cases.len();

    if let Err(err) = validate(request, config) {
        return ExecutionResult::rejected(Verdict::RuntimeError, total, err.to_string());
    }

    if request.code.trim().is_empty() {
        return ExecutionResult::rejected(
            Verdict::CompilationError,
            total,
            validation::empty_source().to_string(),
        );
    }

    if let Err(reason) = precheck::check(language.language, &request.code) {
        log::debug!("{} submission rejected by syntax gate: {reason}", language.language);
        return ExecutionResult::rejected(
            Verdict::CompilationError,
            total,
            validation::syntax_error(&reason).to_string(),
        );
    }

    let harness = Harness::new(
        executor,
        language,
        &request.code,
        request.time_limit(),
        request.memory_limit_bytes(),
    )
    .with_entry_point(request.entry_point_name.as_deref())
    .with_memory_estimate_factor(config.memory_estimate_factor);

    let mut time = 0u64;
    let mut memory = 0u64;
    let mut last_output = String::new();

    for (index, test_case) in request.test_cases.iter().enumerate() {
        let outcome = harness.run(test_case).await;
        time = time.saturating_add(outcome.time_ms);
        memory = memory.max(outcome.memory_bytes);
        log::debug!(
            "Case {}/{total}: {} in {}ms",
            index + 1,
            outcome.verdict,
            outcome.time_ms
        );

        if outcome.verdict != Verdict::Accepted {
            return ExecutionResult {
                status: outcome.verdict,
                passed_test_cases: index,
                total_test_cases: total,
                output: outcome.output,
                expected_output: Some(test_case.expected_output.clone()),
                error: outcome.error,
                time,
                memory,
            };
        }
        last_output = outcome.output;
    }

    ExecutionResult {
        status: Verdict::Accepted,
        passed_test_cases: total,
        total_test_cases: total,
        output: last_output,
        expected_output: None,
        error: None,
        time,
        memory,
    }
}

fn validate(request: &ExecutionRequest, config: &JudgeGlobalConfig) -> Result<(), JudgeError> {
    if request.time_limit_ms == 0 {
        return Err(validation::time_limit_zero());
    }
    if request.time_limit_ms > config.max_time_limit_ms {
        return Err(validation::time_limit_too_large(config.max_time_limit_ms));
    }
    if request.memory_limit_mb == 0 {
        return Err(validation::memory_limit_zero());
    }
    if request.memory_limit_mb > config.max_memory_limit_mb {
        return Err(validation::memory_limit_too_large(config.max_memory_limit_mb));
    }
    if request.code.len() > config.max_source_bytes {
        return Err(validation::source_too_large(
            request.code.len(),
            config.max_source_bytes,
        ));
    }
    Ok(())
}
