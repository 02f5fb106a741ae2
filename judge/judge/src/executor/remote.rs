//! Compiled languages, run by a Piston-compatible execution service.
//!
//! Judged submissions are wrapped into a complete program by [`crate::synth`];
//! playground code is sent as is. The service enforces the run time limit
//! itself and reports each stage separately, which maps directly onto
//! compile and runtime faults. Failed requests are never retried.

use super::Executor;
use crate::config::RemoteConfig;
use crate::dispatcher::language_config;
use crate::error::{remote, JudgeResult};
use crate::synth::{synthesize, SourceFile};
use crate::types::{ExecOutput, ExecutionStrategy, Fault, Invocation, Mode};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<FilePayload>,
    stdin: &'a str,
    compile_timeout: u64,
    run_timeout: u64,
    max_process_count: u32,
}

#[derive(Debug, Serialize)]
struct FilePayload {
    name: String,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    compile: Option<Stage>,
    #[serde(default)]
    run: Option<Stage>,
    #[serde(default)]
    memory: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Stage {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    output: String,
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    signal: Option<String>,
}

impl Stage {
    /// Diagnostic text: stderr, else combined output, else stdout.
    fn diagnostic(&self) -> String {
        [&self.stderr, &self.output, &self.stdout]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

pub struct RemoteExecutor {
    client: Client,
    config: RemoteConfig,
}

impl RemoteExecutor {
    pub fn new(config: RemoteConfig) -> JudgeResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn source_for(&self, invocation: &Invocation, file_name: &str) -> JudgeResult<SourceFile> {
        match &invocation.mode {
            Mode::Playground => Ok(SourceFile {
                name: file_name.to_string(),
                content: invocation.code.clone(),
            }),
            Mode::Judged { entry_point, input } => synthesize(
                invocation.language,
                &invocation.code,
                entry_point.as_deref(),
                input,
            ),
        }
    }
}

#[async_trait]
impl Executor for RemoteExecutor {
    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::RemoteGateway
    }

    fn deadline_allowance(&self) -> Duration {
        self.config.request_timeout()
    }

    async fn execute(&self, invocation: &Invocation) -> JudgeResult<ExecOutput> {
        let language = invocation.language;
        let target = language_config(language)
            .remote
            .ok_or_else(|| remote::missing_target(language.id()))?;
        let source = self.source_for(invocation, target.file_name)?;

        let run_timeout = self
            .config
            .run_timeout_ms
            .min(u64::try_from(invocation.time_limit.as_millis()).unwrap_or(u64::MAX));
        let request = ExecuteRequest {
            language: target.language_id,
            version: target.version,
            files: vec![FilePayload {
                name: source.name,
                content: source.content,
            }],
            stdin: "",
            compile_timeout: self.config.compile_timeout_ms,
            run_timeout,
            max_process_count: self.config.max_process_count,
        };

        let url = self.config.execute_url();
        log::debug!("Submitting {language} program to {url}");
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(remote::transport_failed)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(remote::bad_status(status.as_u16(), &body));
        }

        let body: ExecuteResponse = response.json().await.map_err(remote::invalid_response)?;
        classify(body)
    }
}

fn classify(response: ExecuteResponse) -> JudgeResult<ExecOutput> {
    if let Some(compile) = &response.compile {
        let failed = compile.code.map(|c| c != 0).unwrap_or(false) || compile.signal.is_some();
        if failed {
            let diagnostic = compile.diagnostic();
            let message = if diagnostic.is_empty() {
                match &compile.signal {
                    Some(signal) => format!("Compilation terminated by {signal}"),
                    None => "Compilation failed".to_string(),
                }
            } else {
                diagnostic
            };
            return Ok(ExecOutput::faulted(&compile.stdout, Fault::Compile(message)));
        }
    }

    let run = match response.run {
        Some(run) => run,
        None => {
            let reason = response
                .message
                .unwrap_or_else(|| "response has no run stage".to_string());
            return Err(remote::invalid_response(reason));
        }
    };

    // Only a clean exit (code 0, no signal, empty stderr) counts as success.
    let clean_exit = run.code == Some(0) && run.signal.is_none();
    let output = if run.signal.as_deref() == Some("SIGKILL") {
        ExecOutput::faulted(run.stdout, Fault::Timeout)
    } else if !clean_exit || !run.stderr.trim().is_empty() {
        let message = match (run.stderr.trim(), &run.signal, run.code) {
            ("", Some(signal), _) => format!("Process terminated by {signal}"),
            ("", None, Some(code)) => format!("Process exited with code {code}"),
            ("", None, None) => "Process exited without a status".to_string(),
            (stderr, _, _) => stderr.to_string(),
        };
        ExecOutput::faulted(run.stdout, Fault::Runtime(message))
    } else {
        ExecOutput::success(run.stdout)
    };
    Ok(output.with_memory(response.memory))
}
