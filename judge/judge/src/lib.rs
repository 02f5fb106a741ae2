pub mod comparator;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod executor;
pub mod harness;
pub mod input;
pub mod precheck;
pub mod runtime;
pub mod synth;
pub mod types;
pub mod verdict;

pub use config::JudgeGlobalConfig;
pub use dispatcher::{language_config, Dispatcher};
pub use engine::JudgeEngine;
pub use error::{
    convert, messages, remote as remote_errors, runtime as runtime_errors, validation, JudgeError,
    JudgeResult,
};
pub use executor::Executor;
pub use types::*;

/// Installs `env_logger` once, when `JUDGE_LOG` is set.
pub fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        if std::env::var(config::env_vars::JUDGE_LOG).is_ok() {
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().filter_or(config::env_vars::JUDGE_LOG, "info"),
            )
            .try_init();
        }
    });
}
