//! Lazily bootstrapped, process-wide language runtimes.
//!
//! A [`RuntimeManager`] owns one runtime handle. The first caller of
//! [`RuntimeManager::get_interpreter`] runs the bootstrap; every concurrent
//! caller awaits that same bootstrap instead of starting its own. Once ready the
//! handle is shared for the rest of the process. A failed bootstrap leaves the
//! manager empty so a later call can try again.

pub mod python;

use crate::error::JudgeResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub use python::{PythonBootstrap, PythonRuntime};

/// Produces a runtime handle. Called at most once per successful bootstrap.
#[async_trait]
pub trait Bootstrap: Send + Sync + 'static {
    type Handle: Send + Sync + 'static;

    fn name(&self) -> &str;

    async fn bootstrap(&self) -> JudgeResult<Self::Handle>;
}

pub struct RuntimeManager<B: Bootstrap = PythonBootstrap> {
    bootstrap: B,
    handle: OnceCell<Arc<B::Handle>>,
    attempts: AtomicUsize,
}

impl<B: Bootstrap> RuntimeManager<B> {
    pub fn new(bootstrap: B) -> Self {
        Self {
            bootstrap,
            handle: OnceCell::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub async fn get_interpreter(&self) -> JudgeResult<Arc<B::Handle>> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                log::info!(
                    "Bootstrapping {} runtime (attempt {attempt})",
                    self.bootstrap.name()
                );
                match self.bootstrap.bootstrap().await {
                    Ok(handle) => Ok(Arc::new(handle)),
                    Err(e) => {
                        log::warn!("{} runtime bootstrap failed: {e}", self.bootstrap.name());
                        Err(e)
                    }
                }
            })
            .await?;
        Ok(Arc::clone(handle))
    }

    /// How many bootstraps have been started.
    pub fn bootstrap_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.handle.initialized()
    }
}

pub mod utils {
    use crate::error::{runtime, JudgeResult};
    use std::path::{Path, PathBuf};

    /// Create a temporary directory for one execution; removed on drop.
    pub fn create_temp_dir(prefix: &str) -> JudgeResult<tempfile::TempDir> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .map_err(runtime::temp_dir_failed)
    }

    /// Find an executable in PATH.
    pub fn find_in_path(name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    /// Resolves a configured executable, or the first default present in PATH.
    pub fn find_executable(
        configured: Option<&Path>,
        defaults: &[String],
        runtime_name: &str,
        env_var: &str,
    ) -> JudgeResult<PathBuf> {
        if let Some(path) = configured {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return which::which(path)
                .map_err(|_| runtime::executable_not_found(runtime_name, env_var));
        }

        defaults
            .iter()
            .find_map(|name| find_in_path(name))
            .ok_or_else(|| runtime::executable_not_found(runtime_name, env_var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JudgeError;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    struct SlowBootstrap {
        fail_first: AtomicBool,
    }

    #[async_trait]
    impl Bootstrap for SlowBootstrap {
        type Handle = String;

        fn name(&self) -> &str {
            "test"
        }

        async fn bootstrap(&self) -> JudgeResult<String> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.fail_first.swap(false, Ordering::SeqCst) {
                return Err(JudgeError::Runtime("not yet".to_string()));
            }
            Ok("ready".to_string())
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_bootstrap() {
        let manager = Arc::new(RuntimeManager::new(SlowBootstrap {
            fail_first: AtomicBool::new(false),
        }));

        let calls = (0..8).map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get_interpreter().await })
        });
        let handles = futures::future::join_all(calls).await;

        let first = handles[0].as_ref().unwrap().as_ref().unwrap().clone();
        for handle in &handles {
            let handle = handle.as_ref().unwrap().as_ref().unwrap();
            assert!(Arc::ptr_eq(&first, handle));
        }
        assert_eq!(manager.bootstrap_count(), 1);
        assert!(manager.is_ready());
    }

    #[tokio::test]
    async fn test_failed_bootstrap_can_retry() {
        let manager = RuntimeManager::new(SlowBootstrap {
            fail_first: AtomicBool::new(true),
        });

        assert!(manager.get_interpreter().await.is_err());
        assert!(!manager.is_ready());

        let handle = manager.get_interpreter().await.unwrap();
        assert_eq!(handle.as_str(), "ready");
        assert_eq!(manager.bootstrap_count(), 2);
    }

    #[test]
    fn test_missing_executable() {
        let err = utils::find_executable(
            None,
            &["definitely-not-a-real-python-binary".to_string()],
            "python",
            "JUDGE_PYTHON_EXECUTABLE",
        )
        .unwrap_err();
        assert!(err.to_string().contains("JUDGE_PYTHON_EXECUTABLE"));
    }
}
