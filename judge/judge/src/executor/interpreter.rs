//! Python execution through the shared runtime handle.
//!
//! The interpreter is bootstrapped once by the [`RuntimeManager`]; each call
//! then writes the submission and a small driver into its own temporary
//! directory and runs them in a fresh isolated process. Standard streams are
//! per process, so concurrent calls never see each other's output, and
//! dropping the call kills the process.

use super::{entry_point_candidates, Executor};
use crate::error::{runtime, JudgeResult};
use crate::input::parse_arguments;
use crate::runtime::python::ProcessOutput;
use crate::runtime::{utils, PythonBootstrap, RuntimeManager};
use crate::types::{ExecOutput, ExecutionStrategy, Fault, Invocation, Mode};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const SOLUTION_FILE: &str = "solution.py";
const DRIVER_FILE: &str = "driver.py";

const DRIVER: &str = r#"import contextlib
import io
import json
import os
import runpy
import sys
import traceback
import types


def limit_memory(limit):
    try:
        import resource
        resource.setrlimit(resource.RLIMIT_AS, (limit, limit))
    except Exception:
        pass


def locate(namespace, candidates):
    solution_cls = namespace.get("Solution")
    instance = solution_cls() if isinstance(solution_cls, type) else None
    for name in candidates:
        if instance is not None:
            method = getattr(instance, name, None)
            if callable(method):
                return method
        fn = namespace.get(name)
        if isinstance(fn, types.FunctionType):
            return fn
    if instance is not None:
        for name, member in vars(solution_cls).items():
            if not name.startswith("_") and callable(member):
                return getattr(instance, name)
    for member in namespace.values():
        if isinstance(member, types.FunctionType) and member.__module__ == "solution":
            return member
    raise NameError("No entry point function found (tried: %s)" % ", ".join(candidates))


def encode(value):
    if isinstance(value, (set, frozenset)):
        return sorted(value)
    return str(value)


def main():
    request = json.loads(sys.stdin.read())
    limit_memory(request["memory_limit"])
    path = os.path.join(os.path.dirname(os.path.abspath(__file__)), "solution.py")

    if request["mode"] == "playground":
        runpy.run_path(path, run_name="__main__")
        return

    with open(path, encoding="utf-8") as f:
        source = f.read()
    namespace = {"__name__": "solution", "__builtins__": __builtins__}
    with contextlib.redirect_stdout(io.StringIO()):
        exec(compile(source, "solution.py", "exec"), namespace)
        result = locate(namespace, request["candidates"])(*request["args"])
    print(json.dumps(result, separators=(",", ":"), default=encode))


try:
    main()
except SystemExit:
    raise
except BaseException:
    traceback.print_exc()
    sys.exit(1)
"#;

#[derive(Serialize)]
struct DriverRequest<'a> {
    mode: &'a str,
    candidates: Vec<String>,
    args: Vec<Value>,
    memory_limit: u64,
}

pub struct InterpreterExecutor {
    manager: Arc<RuntimeManager<PythonBootstrap>>,
}

impl InterpreterExecutor {
    pub fn new(manager: Arc<RuntimeManager<PythonBootstrap>>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<RuntimeManager<PythonBootstrap>> {
        &self.manager
    }
}

#[async_trait]
impl Executor for InterpreterExecutor {
    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::EmbeddedInterpreter
    }

    async fn execute(&self, invocation: &Invocation) -> JudgeResult<ExecOutput> {
        let python = self.manager.get_interpreter().await?;

        let request = match &invocation.mode {
            Mode::Playground => DriverRequest {
                mode: "playground",
                candidates: Vec::new(),
                args: Vec::new(),
                memory_limit: invocation.memory_limit_bytes,
            },
            Mode::Judged { entry_point, input } => DriverRequest {
                mode: "judged",
                candidates: entry_point_candidates(entry_point.as_deref()),
                args: parse_arguments(input),
                memory_limit: invocation.memory_limit_bytes,
            },
        };
        let stdin = serde_json::to_string(&request)?;

        let dir = utils::create_temp_dir("golem-judge-python-")?;
        std::fs::write(dir.path().join(SOLUTION_FILE), &invocation.code)
            .map_err(|e| runtime::execution_failed("python", e))?;
        let driver = dir.path().join(DRIVER_FILE);
        std::fs::write(&driver, DRIVER).map_err(|e| runtime::execution_failed("python", e))?;

        let output = python.run(&driver, &stdin).await?;
        Ok(classify(output))
    }
}

fn classify(output: ProcessOutput) -> ExecOutput {
    if output.success() {
        return ExecOutput::success(output.stdout);
    }

    let stderr = output.stderr.trim().to_string();
    let message = match (stderr.is_empty(), output.exit_code) {
        (false, _) => stderr,
        (true, Some(code)) => format!("Process exited with code {code}"),
        (true, None) => "Process terminated by signal".to_string(),
    };

    if message.contains("MemoryError") {
        ExecOutput::faulted(output.stdout, Fault::OutOfMemory(message))
    } else {
        ExecOutput::faulted(output.stdout, Fault::Runtime(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PythonConfig;
    use crate::types::Language;
    use std::time::Duration;

    fn executor() -> Option<InterpreterExecutor> {
        let config = PythonConfig::default();
        if config
            .default_executables
            .iter()
            .all(|name| utils::find_in_path(name).is_none())
        {
            println!("Skipping Python test: no interpreter found");
            return None;
        }
        let manager = RuntimeManager::new(PythonBootstrap::new(config));
        Some(InterpreterExecutor::new(Arc::new(manager)))
    }

    fn judged(code: &str, entry: Option<&str>, input: &str) -> Invocation {
        Invocation::judged(
            Language::Python,
            code,
            entry.map(str::to_string),
            input,
            Duration::from_secs(5),
            512 * 1024 * 1024,
        )
    }

    #[test]
    fn test_classify_exit_codes() {
        let ok = classify(ProcessOutput {
            stdout: "3\n".into(),
            stderr: String::new(),
            exit_code: Some(0),
        });
        assert_eq!(ok, ExecOutput::success("3\n"));

        let failed = classify(ProcessOutput {
            stdout: String::new(),
            stderr: "Traceback...\nZeroDivisionError: division by zero\n".into(),
            exit_code: Some(1),
        });
        assert!(matches!(failed.fault, Some(Fault::Runtime(m)) if m.ends_with("division by zero")));

        let oom = classify(ProcessOutput {
            stdout: String::new(),
            stderr: "MemoryError".into(),
            exit_code: Some(1),
        });
        assert!(matches!(oom.fault, Some(Fault::OutOfMemory(_))));
    }

    #[tokio::test]
    async fn test_solution_class_method() {
        let Some(executor) = executor() else { return };
        let code = concat!(
            "class Solution:\n",
            "    def twoSum(self, nums, target):\n",
            "        seen = {}\n",
            "        for i, n in enumerate(nums):\n",
            "            if target - n in seen:\n",
            "                return [seen[target - n], i]\n",
            "            seen[n] = i\n",
        );
        let output = executor
            .execute(&judged(code, Some("twoSum"), "[2,7,11,15], 9"))
            .await
            .unwrap();
        assert_eq!(output.fault, None);
        assert_eq!(output.stdout.trim(), "[0,1]");
    }

    #[tokio::test]
    async fn test_free_function_fallback_and_prints_are_hidden() {
        let Some(executor) = executor() else { return };
        let code = concat!(
            "import math\n",
            "\n",
            "def hyp(a, b):\n",
            "    print('debug')\n",
            "    return math.hypot(a, b)\n",
        );
        let output = executor
            .execute(&judged(code, Some("missing"), "3, 4"))
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "5.0");
    }

    #[tokio::test]
    async fn test_exception_reported_as_runtime_fault() {
        let Some(executor) = executor() else { return };
        let output = executor
            .execute(&judged("def solve(x):\n    return x / 0\n", None, "1"))
            .await
            .unwrap();
        assert!(matches!(output.fault, Some(Fault::Runtime(m)) if m.contains("ZeroDivisionError")));
    }

    #[tokio::test]
    async fn test_playground_runs_as_main() {
        let Some(executor) = executor() else { return };
        let code = "if __name__ == '__main__':\n    print('hello')\n";
        let invocation = Invocation::playground(
            Language::Python,
            code,
            Duration::from_secs(5),
            512 * 1024 * 1024,
        );
        let output = executor.execute(&invocation).await.unwrap();
        assert_eq!(output.stdout, "hello\n");
    }
}
