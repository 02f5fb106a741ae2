//! Language table and executor lookup.

use crate::config::JudgeGlobalConfig;
use crate::error::{JudgeError, JudgeResult};
use crate::executor::{Executor, InterpreterExecutor, RemoteExecutor};
use crate::runtime::{PythonBootstrap, RuntimeManager};
use crate::types::{ExecutionStrategy, Language, LanguageConfig, RemoteTarget};
use std::collections::HashMap;
use std::sync::Arc;

const SCRIPT_OUTPUT_LIMIT: usize = 64 * 1024;
const PROCESS_OUTPUT_LIMIT: usize = 1024 * 1024;

/// Static per-language configuration.
pub fn language_config(language: Language) -> LanguageConfig {
    let remote = |language_id: &'static str, version: &'static str, file_name: &'static str| {
        LanguageConfig {
            language,
            strategy: ExecutionStrategy::RemoteGateway,
            compile_required: true,
            max_output_bytes: PROCESS_OUTPUT_LIMIT,
            remote: Some(RemoteTarget {
                language_id,
                version,
                file_name,
            }),
        }
    };

    match language {
        Language::Javascript => LanguageConfig {
            language,
            strategy: ExecutionStrategy::LocalScript,
            compile_required: false,
            max_output_bytes: SCRIPT_OUTPUT_LIMIT,
            remote: None,
        },
        Language::Python => LanguageConfig {
            language,
            strategy: ExecutionStrategy::EmbeddedInterpreter,
            compile_required: false,
            max_output_bytes: PROCESS_OUTPUT_LIMIT,
            remote: None,
        },
        Language::Sql => LanguageConfig {
            language,
            strategy: ExecutionStrategy::EmbeddedQuery,
            compile_required: false,
            max_output_bytes: SCRIPT_OUTPUT_LIMIT,
            remote: None,
        },
        Language::Cpp => remote("c++", "10.2.0", "main.cpp"),
        Language::Java => remote("java", "15.0.2", "Main.java"),
        Language::Go => remote("go", "1.16.2", "main.go"),
        Language::Rust => remote("rust", "1.68.2", "main.rs"),
    }
}

/// Maps each execution strategy to the executor that serves it.
#[derive(Clone)]
pub struct Dispatcher {
    executors: HashMap<ExecutionStrategy, Arc<dyn Executor>>,
}

impl Dispatcher {
    /// Builds the executors compiled into this crate.
    ///
    /// The Python runtime is not started here; the first Python submission
    /// bootstraps it.
    pub fn new(config: &JudgeGlobalConfig) -> JudgeResult<Self> {
        let mut dispatcher = Self::empty();

        #[cfg(feature = "javascript")]
        {
            dispatcher = dispatcher.with_executor(Arc::new(crate::executor::ScriptExecutor::new()));
        }

        #[cfg(feature = "sql")]
        {
            dispatcher = dispatcher.with_executor(Arc::new(crate::executor::QueryExecutor::new()));
        }

        let manager = Arc::new(RuntimeManager::new(PythonBootstrap::new(
            config.python.clone(),
        )));
        dispatcher = dispatcher
            .with_executor(Arc::new(InterpreterExecutor::new(manager)))
            .with_executor(Arc::new(RemoteExecutor::new(config.remote.clone())?));

        Ok(dispatcher)
    }

    /// A dispatcher with no executors registered.
    pub fn empty() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Registers `executor` for the strategy it reports, replacing any
    /// previous one.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executors.insert(executor.strategy(), executor);
        self
    }

    pub fn executor(&self, strategy: ExecutionStrategy) -> Option<Arc<dyn Executor>> {
        self.executors.get(&strategy).cloned()
    }

    pub fn resolve(&self, language: &str) -> JudgeResult<(LanguageConfig, Arc<dyn Executor>)> {
        let language: Language = language.parse()?;
        let config = language_config(language);
        let executor = self
            .executor(config.strategy)
            .ok_or_else(|| JudgeError::UnsupportedLanguage(language.id().to_string()))?;
        Ok((config, executor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExecOutput, Invocation};
    use async_trait::async_trait;

    struct Echo(ExecutionStrategy);

    #[async_trait]
    impl Executor for Echo {
        fn strategy(&self) -> ExecutionStrategy {
            self.0
        }

        async fn execute(&self, invocation: &Invocation) -> JudgeResult<ExecOutput> {
            Ok(ExecOutput::success(invocation.code.clone()))
        }
    }

    #[test]
    fn test_every_language_has_a_config() {
        for language in Language::ALL {
            let config = language_config(language);
            assert_eq!(config.language, language);
            assert!(config.max_output_bytes > 0);
            assert_eq!(
                config.remote.is_some(),
                config.strategy == ExecutionStrategy::RemoteGateway
            );
            assert_eq!(config.compile_required, config.remote.is_some());
        }
        assert_eq!(
            language_config(Language::Java).remote.unwrap().file_name,
            "Main.java"
        );
    }

    #[test]
    fn test_resolve_uses_registered_executor() {
        let dispatcher = Dispatcher::empty()
            .with_executor(Arc::new(Echo(ExecutionStrategy::EmbeddedQuery)));

        let (config, executor) = dispatcher.resolve("SQL").unwrap();
        assert_eq!(config.language, Language::Sql);
        assert_eq!(executor.strategy(), ExecutionStrategy::EmbeddedQuery);
    }

    #[test]
    fn test_resolve_rejects_unknown_and_unregistered() {
        let dispatcher = Dispatcher::empty();
        assert!(matches!(
            dispatcher.resolve("brainfuck"),
            Err(JudgeError::UnsupportedLanguage(_))
        ));
        assert!(matches!(
            dispatcher.resolve("go"),
            Err(JudgeError::UnsupportedLanguage(id)) if id == "go"
        ));
    }

    #[test]
    fn test_default_dispatcher_serves_all_languages() {
        let dispatcher = Dispatcher::new(&JudgeGlobalConfig::default()).unwrap();
        for language in Language::ALL {
            if cfg!(not(feature = "javascript")) && language == Language::Javascript {
                continue;
            }
            if cfg!(not(feature = "sql")) && language == Language::Sql {
                continue;
            }
            assert!(dispatcher.resolve(language.id()).is_ok(), "{language}");
        }
    }
}
