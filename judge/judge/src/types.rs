use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
    Sql,
    Cpp,
    Java,
    Go,
    Rust,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Javascript,
        Language::Python,
        Language::Sql,
        Language::Cpp,
        Language::Java,
        Language::Go,
        Language::Rust,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Sql => "sql",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Language {
    type Err = crate::error::JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" | "node" | "nodejs" => Ok(Language::Javascript),
            "python" | "python3" | "py" => Ok(Language::Python),
            "sql" | "sqlite" | "mysql" | "postgresql" => Ok(Language::Sql),
            "cpp" | "c++" | "cplusplus" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            "go" | "golang" => Ok(Language::Go),
            "rust" | "rs" => Ok(Language::Rust),
            _ => Err(crate::error::JudgeError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// How a language is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStrategy {
    LocalScript,
    EmbeddedInterpreter,
    EmbeddedQuery,
    RemoteGateway,
}

/// Where a remotely executed language is sent and under which file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteTarget {
    pub language_id: &'static str,
    pub version: &'static str,
    pub file_name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageConfig {
    pub language: Language,
    pub strategy: ExecutionStrategy,
    pub compile_required: bool,
    pub max_output_bytes: usize,
    pub remote: Option<RemoteTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub is_hidden: bool,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
            is_hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub entry_point_name: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    pub time_limit_ms: u64,
    pub memory_limit_mb: u64,
}

impl ExecutionRequest {
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        let defaults = crate::config::JudgeGlobalConfig::default();
        Self {
            language: language.into(),
            code: code.into(),
            entry_point_name: None,
            test_cases: Vec::new(),
            time_limit_ms: defaults.default_time_limit_ms,
            memory_limit_mb: defaults.default_memory_limit_mb,
        }
    }

    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point_name = Some(name.into());
        self
    }

    pub fn with_test_case(mut self, test_case: TestCase) -> Self {
        self.test_cases.push(test_case);
        self
    }

    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.time_limit_ms = time_limit_ms;
        self
    }

    pub fn with_memory_limit_mb(mut self, memory_limit_mb: u64) -> Self {
        self.memory_limit_mb = memory_limit_mb;
        self
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    pub fn memory_limit_bytes(&self) -> u64 {
        self.memory_limit_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Accepted")]
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Compilation Error")]
    CompilationError,
    #[serde(rename = "Runtime Error")]
    RuntimeError,
    #[serde(rename = "Time Limit Exceeded")]
    TimeLimitExceeded,
    #[serde(rename = "Memory Limit Exceeded")]
    MemoryLimitExceeded,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::CompilationError => "Compilation Error",
            Verdict::RuntimeError => "Runtime Error",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
            Verdict::MemoryLimitExceeded => "Memory Limit Exceeded",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub status: Verdict,
    pub passed_test_cases: usize,
    pub total_test_cases: usize,
    pub output: String,
    pub expected_output: Option<String>,
    pub error: Option<String>,
    pub time: u64,
    pub memory: u64,
}

impl ExecutionResult {
    /// A result for a submission that never reached a test case.
    pub fn rejected(status: Verdict, total_test_cases: usize, error: impl Into<String>) -> Self {
        Self {
            status,
            passed_test_cases: 0,
            total_test_cases,
            output: String::new(),
            expected_output: None,
            error: Some(error.into()),
            time: 0,
            memory: 0,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == Verdict::Accepted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeformResult {
    pub output: String,
    pub error: Option<String>,
}

/// What an executor is asked to do with the submitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Playground,
    Judged {
        entry_point: Option<String>,
        input: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub language: Language,
    pub code: String,
    pub mode: Mode,
    pub time_limit: Duration,
    pub memory_limit_bytes: u64,
}

impl Invocation {
    pub fn playground(
        language: Language,
        code: impl Into<String>,
        time_limit: Duration,
        memory_limit_bytes: u64,
    ) -> Self {
        Self {
            language,
            code: code.into(),
            mode: Mode::Playground,
            time_limit,
            memory_limit_bytes,
        }
    }

    pub fn judged(
        language: Language,
        code: impl Into<String>,
        entry_point: Option<String>,
        input: impl Into<String>,
        time_limit: Duration,
        memory_limit_bytes: u64,
    ) -> Self {
        Self {
            language,
            code: code.into(),
            mode: Mode::Judged {
                entry_point,
                input: input.into(),
            },
            time_limit,
            memory_limit_bytes,
        }
    }

    pub fn is_playground(&self) -> bool {
        matches!(self.mode, Mode::Playground)
    }
}

/// A failure the executor observed inside the submitted program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Compile(String),
    Runtime(String),
    OutOfMemory(String),
    Timeout,
}

impl Fault {
    pub fn message(&self) -> String {
        match self {
            Fault::Compile(msg) | Fault::Runtime(msg) | Fault::OutOfMemory(msg) => msg.clone(),
            Fault::Timeout => "Execution timed out".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub fault: Option<Fault>,
    pub memory_bytes: Option<u64>,
}

impl ExecOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            fault: None,
            memory_bytes: None,
        }
    }

    pub fn faulted(stdout: impl Into<String>, fault: Fault) -> Self {
        Self {
            stdout: stdout.into(),
            fault: Some(fault),
            memory_bytes: None,
        }
    }

    pub fn with_memory(mut self, memory_bytes: Option<u64>) -> Self {
        self.memory_bytes = memory_bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_aliases() {
        assert_eq!("JS".parse::<Language>().unwrap(), Language::Javascript);
        assert_eq!("python3".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!(" golang ".parse::<Language>().unwrap(), Language::Go);
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn test_verdict_serializes_to_vocabulary() {
        let json = serde_json::to_string(&Verdict::TimeLimitExceeded).unwrap();
        assert_eq!(json, "\"Time Limit Exceeded\"");
        let back: Verdict = serde_json::from_str("\"Wrong Answer\"").unwrap();
        assert_eq!(back, Verdict::WrongAnswer);
    }

    #[test]
    fn test_request_deserializes_from_camel_case() {
        let request: ExecutionRequest = serde_json::from_str(
            r#"{
                "language": "javascript",
                "code": "function solve() {}",
                "entryPointName": "solve",
                "testCases": [{"input": "1", "expectedOutput": "1", "isHidden": true}],
                "timeLimitMs": 1000,
                "memoryLimitMb": 64
            }"#,
        )
        .unwrap();
        assert_eq!(request.entry_point_name.as_deref(), Some("solve"));
        assert!(request.test_cases[0].is_hidden);
        assert_eq!(request.memory_limit_bytes(), 64 * 1024 * 1024);
    }
}
