use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JudgeError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Runtime(String),
    #[error("Remote execution failed: {0}")]
    Remote(String),
    #[error("Query engine error: {0}")]
    Query(String),
    #[error("Could not build driver program: {0}")]
    Synthesis(String),
    #[error("Execution timed out")]
    Timeout,
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type JudgeResult<T> = Result<T, JudgeError>;

impl From<std::io::Error> for JudgeError {
    fn from(err: std::io::Error) -> Self {
        convert::io_error("io operation", err)
    }
}

impl From<serde_json::Error> for JudgeError {
    fn from(err: serde_json::Error) -> Self {
        convert::json_error("serialization", err)
    }
}

impl From<reqwest::Error> for JudgeError {
    fn from(err: reqwest::Error) -> Self {
        remote::transport_failed(err)
    }
}

pub mod messages {
    pub fn format_error(context: &str, error: impl std::fmt::Display) -> String {
        format!("{context}: {error}")
    }

    pub fn runtime_error(runtime: &str, operation: &str, error: impl std::fmt::Display) -> String {
        format!("{runtime} runtime error during {operation}: {error}")
    }

    pub fn validation_error(field: &str, reason: &str) -> String {
        format!("Validation failed for {field}: {reason}")
    }

    pub fn limit_error(
        resource: &str,
        limit: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> String {
        format!("{resource} limit exceeded: {actual} > {limit}")
    }

    pub fn config_error(setting: &str, reason: &str) -> String {
        format!("Configuration error for {setting}: {reason}")
    }
}

pub mod convert {
    use super::*;

    pub fn io_error(context: &str, error: std::io::Error) -> JudgeError {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => JudgeError::Internal(messages::format_error(
                &format!("Permission denied during {context}"),
                error,
            )),
            std::io::ErrorKind::NotFound => JudgeError::Internal(messages::format_error(
                &format!("Required component not found during {context}"),
                error,
            )),
            _ => JudgeError::Internal(messages::format_error(
                &format!("IO error during {context}"),
                error,
            )),
        }
    }

    pub fn json_error(context: &str, error: serde_json::Error) -> JudgeError {
        JudgeError::Internal(messages::format_error(
            &format!("JSON error in {context}"),
            error,
        ))
    }
}

pub mod validation {
    use super::*;

    pub fn empty_source() -> JudgeError {
        JudgeError::Validation(messages::validation_error("source code", "cannot be empty"))
    }

    pub fn source_too_large(size: usize, limit: usize) -> JudgeError {
        JudgeError::Validation(messages::limit_error("Source size", limit, size))
    }

    pub fn time_limit_zero() -> JudgeError {
        JudgeError::Validation(messages::validation_error(
            "time limit",
            "must be greater than 0",
        ))
    }

    pub fn time_limit_too_large(max_ms: u64) -> JudgeError {
        JudgeError::Validation(messages::validation_error(
            "time limit",
            &format!("exceeds maximum allowed ({max_ms}ms)"),
        ))
    }

    pub fn memory_limit_zero() -> JudgeError {
        JudgeError::Validation(messages::validation_error(
            "memory limit",
            "must be greater than 0",
        ))
    }

    pub fn memory_limit_too_large(max_mb: u64) -> JudgeError {
        JudgeError::Validation(messages::validation_error(
            "memory limit",
            &format!("exceeds maximum allowed ({max_mb}MB)"),
        ))
    }

    pub fn syntax_error(reason: &str) -> JudgeError {
        JudgeError::Validation(messages::validation_error("syntax", reason))
    }

    pub fn invalid_entry_point(name: &str) -> JudgeError {
        JudgeError::Validation(messages::validation_error(
            "entry point",
            &format!("'{name}' is not a valid identifier"),
        ))
    }

    pub fn unsupported_argument(reason: &str) -> JudgeError {
        JudgeError::Synthesis(messages::validation_error("test input", reason))
    }
}

pub mod runtime {
    use super::*;

    pub fn executable_not_found(runtime: &str, env_var: &str) -> JudgeError {
        JudgeError::Runtime(messages::config_error(
            runtime,
            &format!(
                "executable not found. Please install {runtime} \
                 or set {env_var} environment variable"
            ),
        ))
    }

    pub fn bootstrap_failed(runtime: &str, error: impl std::fmt::Display) -> JudgeError {
        JudgeError::Runtime(messages::runtime_error(runtime, "bootstrap", error))
    }

    pub fn execution_failed(runtime: &str, error: impl std::fmt::Display) -> JudgeError {
        JudgeError::Runtime(messages::runtime_error(runtime, "execution", error))
    }

    pub fn spawn_failed(runtime: &str, error: impl std::fmt::Display) -> JudgeError {
        JudgeError::Runtime(messages::runtime_error(runtime, "process spawn", error))
    }

    pub fn task_failed(runtime: &str, error: impl std::fmt::Display) -> JudgeError {
        JudgeError::Internal(messages::runtime_error(runtime, "worker task", error))
    }

    pub fn temp_dir_failed(error: impl std::fmt::Display) -> JudgeError {
        JudgeError::Internal(messages::format_error(
            "Failed to create temporary directory",
            error,
        ))
    }
}

pub mod remote {
    use super::*;

    pub fn transport_failed(error: impl std::fmt::Display) -> JudgeError {
        JudgeError::Remote(messages::format_error("request to execution service failed", error))
    }

    pub fn bad_status(status: u16, body: &str) -> JudgeError {
        let body = body.trim();
        if body.is_empty() {
            JudgeError::Remote(format!("execution service responded with HTTP {status}"))
        } else {
            JudgeError::Remote(format!(
                "execution service responded with HTTP {status}: {body}"
            ))
        }
    }

    pub fn invalid_response(error: impl std::fmt::Display) -> JudgeError {
        JudgeError::Remote(messages::format_error(
            "execution service returned an unreadable response",
            error,
        ))
    }

    pub fn missing_target(language: &str) -> JudgeError {
        JudgeError::Internal(messages::config_error(
            language,
            "no remote execution target configured",
        ))
    }
}
