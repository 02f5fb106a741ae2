use super::{utils, Bootstrap};
use crate::config::{env_vars, PythonConfig};
use crate::error::{runtime, JudgeResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Modules every submission may import; the bootstrap fails if any is missing.
pub const EXTENSION_MODULES: [&str; 10] = [
    "json",
    "math",
    "collections",
    "heapq",
    "itertools",
    "functools",
    "bisect",
    "re",
    "typing",
    "string",
];

/// A verified Python interpreter. Holds no per-call state, so one handle
/// serves any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct PythonRuntime {
    executable: PathBuf,
    version: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl PythonRuntime {
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Runs `script` in a fresh isolated interpreter process with `stdin` as
    /// its standard input. The process is killed if the returned future is
    /// dropped.
    pub async fn run(&self, script: &Path, stdin: &str) -> JudgeResult<ProcessOutput> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("-I")
            .arg(script)
            .env_clear()
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = script.parent() {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| runtime::spawn_failed("python", e))?;

        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(stdin.as_bytes())
                .await
                .map_err(|e| runtime::execution_failed("python", e))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| runtime::execution_failed("python", e))?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

pub struct PythonBootstrap {
    config: PythonConfig,
}

impl PythonBootstrap {
    pub fn new(config: PythonConfig) -> Self {
        Self { config }
    }

    fn readiness_script() -> String {
        format!(
            "import sys, {}; print('%d.%d.%d' % sys.version_info[:3])",
            EXTENSION_MODULES.join(", ")
        )
    }
}

#[async_trait]
impl Bootstrap for PythonBootstrap {
    type Handle = PythonRuntime;

    fn name(&self) -> &str {
        "python"
    }

    async fn bootstrap(&self) -> JudgeResult<PythonRuntime> {
        let executable = utils::find_executable(
            self.config.executable.as_deref(),
            &self.config.default_executables,
            "python",
            env_vars::JUDGE_PYTHON_EXECUTABLE,
        )?;
        log::debug!("Checking python interpreter at {}", executable.display());

        let mut check = Command::new(&executable);
        check
            .arg("-I")
            .arg("-c")
            .arg(Self::readiness_script())
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.config.bootstrap_timeout(), check.output())
            .await
            .map_err(|_| {
                runtime::bootstrap_failed(
                    "python",
                    format!(
                        "readiness check did not finish within {}ms",
                        self.config.bootstrap_timeout_ms
                    ),
                )
            })?
            .map_err(|e| runtime::bootstrap_failed("python", e))?;

        if !output.status.success() {
            return Err(runtime::bootstrap_failed(
                "python",
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        log::info!(
            "Python runtime ready: {} (version {version})",
            executable.display()
        );
        Ok(PythonRuntime {
            executable,
            version,
        })
    }
}
