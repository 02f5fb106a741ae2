use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Global configuration for the judge engine
#[derive(Debug, Clone)]
pub struct JudgeGlobalConfig {
    /// Time limit applied when a request does not carry one, in milliseconds
    pub default_time_limit_ms: u64,
    /// Memory limit applied when a request does not carry one, in megabytes
    pub default_memory_limit_mb: u64,
    /// Largest time limit a request may ask for
    pub max_time_limit_ms: u64,
    /// Largest memory limit a request may ask for
    pub max_memory_limit_mb: u64,
    /// Maximum accepted source size in bytes
    pub max_source_bytes: usize,
    /// Wall-clock bound for playground runs
    pub freeform_timeout_ms: u64,
    /// Bytes of estimated memory per byte of source and output
    pub memory_estimate_factor: u64,
    /// Python runtime configuration
    pub python: PythonConfig,
    /// Remote execution gateway configuration
    pub remote: RemoteConfig,
    /// Enable debug logging
    pub debug_logging: bool,
}

/// Python runtime configuration
#[derive(Debug, Clone)]
pub struct PythonConfig {
    /// Explicit interpreter path
    pub executable: Option<PathBuf>,
    /// Interpreter names searched on PATH, in order
    pub default_executables: Vec<String>,
    /// Upper bound for the one-time runtime bootstrap
    pub bootstrap_timeout_ms: u64,
}

/// Remote execution gateway configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the Piston-compatible execution service
    pub base_url: String,
    /// Compile step timeout forwarded to the service
    pub compile_timeout_ms: u64,
    /// Run step timeout forwarded to the service
    pub run_timeout_ms: u64,
    /// Local bound on the whole HTTP exchange
    pub request_timeout_ms: u64,
    /// Process count ceiling forwarded to the service
    pub max_process_count: u32,
}

impl Default for JudgeGlobalConfig {
    fn default() -> Self {
        Self {
            default_time_limit_ms: 2000,
            default_memory_limit_mb: 256,
            max_time_limit_ms: 30000,
            max_memory_limit_mb: 2048,
            max_source_bytes: 64 * 1024,
            freeform_timeout_ms: 10000,
            memory_estimate_factor: 1024,
            python: PythonConfig::default(),
            remote: RemoteConfig::default(),
            debug_logging: false,
        }
    }
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            executable: None,
            default_executables: vec!["python3".to_string(), "python".to_string()],
            bootstrap_timeout_ms: 30000,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://emkc.org/api/v2/piston".to_string(),
            compile_timeout_ms: 10000,
            run_timeout_ms: 3000,
            request_timeout_ms: 30000,
            max_process_count: 64,
        }
    }
}

impl RemoteConfig {
    pub fn execute_url(&self) -> String {
        format!("{}/execute", self.base_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl PythonConfig {
    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap_timeout_ms)
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

impl JudgeGlobalConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = parse_env(env_vars::JUDGE_TIME_LIMIT_MS) {
            config.default_time_limit_ms = ms;
        }

        if let Some(mb) = parse_env(env_vars::JUDGE_MEMORY_LIMIT_MB) {
            config.default_memory_limit_mb = mb;
        }

        if let Some(ms) = parse_env(env_vars::JUDGE_MAX_TIME_LIMIT_MS) {
            config.max_time_limit_ms = ms;
        }

        if let Some(mb) = parse_env(env_vars::JUDGE_MAX_MEMORY_LIMIT_MB) {
            config.max_memory_limit_mb = mb;
        }

        if let Some(bytes) = parse_env(env_vars::JUDGE_MAX_SOURCE_BYTES) {
            config.max_source_bytes = bytes;
        }

        if let Some(ms) = parse_env(env_vars::JUDGE_FREEFORM_TIMEOUT_MS) {
            config.freeform_timeout_ms = ms;
        }

        if let Some(factor) = parse_env(env_vars::JUDGE_MEMORY_ESTIMATE_FACTOR) {
            config.memory_estimate_factor = factor;
        }

        if let Ok(path) = env::var(env_vars::JUDGE_PYTHON_EXECUTABLE) {
            config.python.executable = Some(PathBuf::from(path));
        }

        if let Some(ms) = parse_env(env_vars::JUDGE_PYTHON_BOOTSTRAP_TIMEOUT_MS) {
            config.python.bootstrap_timeout_ms = ms;
        }

        if let Ok(url) = env::var(env_vars::JUDGE_REMOTE_URL) {
            config.remote.base_url = url;
        }

        if let Some(ms) = parse_env(env_vars::JUDGE_REMOTE_COMPILE_TIMEOUT_MS) {
            config.remote.compile_timeout_ms = ms;
        }

        if let Some(ms) = parse_env(env_vars::JUDGE_REMOTE_RUN_TIMEOUT_MS) {
            config.remote.run_timeout_ms = ms;
        }

        if let Some(ms) = parse_env(env_vars::JUDGE_REMOTE_REQUEST_TIMEOUT_MS) {
            config.remote.request_timeout_ms = ms;
        }

        if let Some(count) = parse_env(env_vars::JUDGE_REMOTE_MAX_PROCESSES) {
            config.remote.max_process_count = count;
        }

        config.debug_logging =
            env::var(env_vars::JUDGE_LOG).is_ok() || env::var(env_vars::JUDGE_DEBUG).is_ok();

        config
    }

    pub fn freeform_timeout(&self) -> Duration {
        Duration::from_millis(self.freeform_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.default_time_limit_ms == 0 {
            return Err("Default time limit must be greater than 0".to_string());
        }

        if self.default_memory_limit_mb == 0 {
            return Err("Default memory limit must be greater than 0".to_string());
        }

        if self.default_time_limit_ms > self.max_time_limit_ms {
            return Err("Default time limit exceeds the maximum time limit".to_string());
        }

        if self.default_memory_limit_mb > self.max_memory_limit_mb {
            return Err("Default memory limit exceeds the maximum memory limit".to_string());
        }

        if self.max_source_bytes == 0 {
            return Err("Source size limit must be greater than 0".to_string());
        }

        if self.freeform_timeout_ms == 0 {
            return Err("Playground timeout must be greater than 0".to_string());
        }

        if self.remote.base_url.trim().is_empty() {
            return Err("Remote execution URL cannot be empty".to_string());
        }

        if self.remote.max_process_count == 0 {
            return Err("Remote process limit must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn print_summary(&self) {
        if self.debug_logging {
            log::info!("Golem Judge Configuration:");
            log::info!("  Default Time Limit: {}ms", self.default_time_limit_ms);
            log::info!("  Default Memory Limit: {}MB", self.default_memory_limit_mb);
            log::info!("  Max Time Limit: {}ms", self.max_time_limit_ms);
            log::info!("  Max Memory Limit: {}MB", self.max_memory_limit_mb);
            log::info!("  Max Source Size: {} bytes", self.max_source_bytes);
            log::info!("  Playground Timeout: {}ms", self.freeform_timeout_ms);
            log::info!("  Python Executable: {:?}", self.python.executable);
            log::info!("  Remote URL: {}", self.remote.base_url);
            log::info!("  Debug Logging: {}", self.debug_logging);
        }
    }
}

/// Environment variable names used by golem-judge
pub mod env_vars {
    /// Default time limit in milliseconds
    pub const JUDGE_TIME_LIMIT_MS: &str = "JUDGE_TIME_LIMIT_MS";

    /// Default memory limit in megabytes
    pub const JUDGE_MEMORY_LIMIT_MB: &str = "JUDGE_MEMORY_LIMIT_MB";

    /// Maximum time limit a request may carry
    pub const JUDGE_MAX_TIME_LIMIT_MS: &str = "JUDGE_MAX_TIME_LIMIT_MS";

    /// Maximum memory limit a request may carry
    pub const JUDGE_MAX_MEMORY_LIMIT_MB: &str = "JUDGE_MAX_MEMORY_LIMIT_MB";

    /// Maximum source size in bytes
    pub const JUDGE_MAX_SOURCE_BYTES: &str = "JUDGE_MAX_SOURCE_BYTES";

    /// Playground wall-clock bound in milliseconds
    pub const JUDGE_FREEFORM_TIMEOUT_MS: &str = "JUDGE_FREEFORM_TIMEOUT_MS";

    /// Memory estimate multiplier
    pub const JUDGE_MEMORY_ESTIMATE_FACTOR: &str = "JUDGE_MEMORY_ESTIMATE_FACTOR";

    /// Path to the Python interpreter
    pub const JUDGE_PYTHON_EXECUTABLE: &str = "JUDGE_PYTHON_EXECUTABLE";

    /// Python runtime bootstrap timeout in milliseconds
    pub const JUDGE_PYTHON_BOOTSTRAP_TIMEOUT_MS: &str = "JUDGE_PYTHON_BOOTSTRAP_TIMEOUT_MS";

    /// Base URL of the remote execution service
    pub const JUDGE_REMOTE_URL: &str = "JUDGE_REMOTE_URL";

    /// Remote compile timeout in milliseconds
    pub const JUDGE_REMOTE_COMPILE_TIMEOUT_MS: &str = "JUDGE_REMOTE_COMPILE_TIMEOUT_MS";

    /// Remote run timeout in milliseconds
    pub const JUDGE_REMOTE_RUN_TIMEOUT_MS: &str = "JUDGE_REMOTE_RUN_TIMEOUT_MS";

    /// Local HTTP request timeout in milliseconds
    pub const JUDGE_REMOTE_REQUEST_TIMEOUT_MS: &str = "JUDGE_REMOTE_REQUEST_TIMEOUT_MS";

    /// Remote process count ceiling
    pub const JUDGE_REMOTE_MAX_PROCESSES: &str = "JUDGE_REMOTE_MAX_PROCESSES";

    /// Enable debug logging
    pub const JUDGE_LOG: &str = "JUDGE_LOG";

    /// Alternative debug logging flag
    pub const JUDGE_DEBUG: &str = "JUDGE_DEBUG";
}

#[cfg(test)]
use std::sync::Mutex;
#[cfg(test)]
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());
