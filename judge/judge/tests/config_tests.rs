//! Environment-driven configuration, seen from outside the crate.

use golem_judge::config::{env_vars, JudgeGlobalConfig};
use golem_judge::JudgeEngine;
use std::env;
use std::sync::Mutex;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[cfg(test)]
mod configuration_tests {
    use super::*;

    #[test]
    fn test_limits_and_remote_from_env() {
        let _guard = ENV_MUTEX.lock().unwrap();

        env::set_var(env_vars::JUDGE_MAX_TIME_LIMIT_MS, "10000");
        env::set_var(env_vars::JUDGE_MAX_MEMORY_LIMIT_MB, "512");
        env::set_var(env_vars::JUDGE_MAX_SOURCE_BYTES, "1024");
        env::set_var(env_vars::JUDGE_FREEFORM_TIMEOUT_MS, "1500");
        env::set_var(env_vars::JUDGE_MEMORY_ESTIMATE_FACTOR, "16");
        env::set_var(env_vars::JUDGE_REMOTE_COMPILE_TIMEOUT_MS, "4000");
        env::set_var(env_vars::JUDGE_REMOTE_RUN_TIMEOUT_MS, "1000");
        env::set_var(env_vars::JUDGE_REMOTE_REQUEST_TIMEOUT_MS, "8000");
        env::set_var(env_vars::JUDGE_REMOTE_MAX_PROCESSES, "8");
        env::set_var(env_vars::JUDGE_PYTHON_BOOTSTRAP_TIMEOUT_MS, "2500");

        let config = JudgeGlobalConfig::from_env();

        assert_eq!(config.max_time_limit_ms, 10000);
        assert_eq!(config.max_memory_limit_mb, 512);
        assert_eq!(config.max_source_bytes, 1024);
        assert_eq!(config.freeform_timeout_ms, 1500);
        assert_eq!(config.memory_estimate_factor, 16);
        assert_eq!(config.remote.compile_timeout_ms, 4000);
        assert_eq!(config.remote.run_timeout_ms, 1000);
        assert_eq!(config.remote.request_timeout_ms, 8000);
        assert_eq!(config.remote.max_process_count, 8);
        assert_eq!(config.python.bootstrap_timeout_ms, 2500);
        assert!(config.validate().is_ok());

        for var in [
            env_vars::JUDGE_MAX_TIME_LIMIT_MS,
            env_vars::JUDGE_MAX_MEMORY_LIMIT_MB,
            env_vars::JUDGE_MAX_SOURCE_BYTES,
            env_vars::JUDGE_FREEFORM_TIMEOUT_MS,
            env_vars::JUDGE_MEMORY_ESTIMATE_FACTOR,
            env_vars::JUDGE_REMOTE_COMPILE_TIMEOUT_MS,
            env_vars::JUDGE_REMOTE_RUN_TIMEOUT_MS,
            env_vars::JUDGE_REMOTE_REQUEST_TIMEOUT_MS,
            env_vars::JUDGE_REMOTE_MAX_PROCESSES,
            env_vars::JUDGE_PYTHON_BOOTSTRAP_TIMEOUT_MS,
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_unparseable_values_keep_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();

        env::set_var(env_vars::JUDGE_TIME_LIMIT_MS, "fast");
        env::set_var(env_vars::JUDGE_REMOTE_MAX_PROCESSES, "-1");

        let config = JudgeGlobalConfig::from_env();
        let defaults = JudgeGlobalConfig::default();
        assert_eq!(config.default_time_limit_ms, defaults.default_time_limit_ms);
        assert_eq!(
            config.remote.max_process_count,
            defaults.remote.max_process_count
        );

        env::remove_var(env_vars::JUDGE_TIME_LIMIT_MS);
        env::remove_var(env_vars::JUDGE_REMOTE_MAX_PROCESSES);
    }

    #[test]
    fn test_engine_rejects_inconsistent_env() {
        let _guard = ENV_MUTEX.lock().unwrap();

        env::set_var(env_vars::JUDGE_TIME_LIMIT_MS, "90000");
        let engine = JudgeEngine::from_env();
        env::remove_var(env_vars::JUDGE_TIME_LIMIT_MS);

        let err = engine.err().unwrap();
        assert!(err.to_string().contains("Default time limit exceeds"));
    }
}
