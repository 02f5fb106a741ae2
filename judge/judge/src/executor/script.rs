//! In-process JavaScript execution on QuickJS.
//!
//! Each call gets its own runtime and context on a blocking thread, so no
//! state survives between submissions. Before user code runs, every global not
//! named by the [`CapabilitySet`] is deleted and `console` is replaced by a
//! writer into a per-call buffer. An interrupt handler stops the VM shortly
//! after the time limit, which makes a runaway loop cancellable even after the
//! harness has stopped waiting.

use super::{entry_point_candidates, Executor};
use crate::error::{runtime, JudgeResult};
use crate::input::parse_arguments;
use crate::types::{ExecOutput, ExecutionStrategy, Fault, Invocation, Mode};
use async_trait::async_trait;
use regex::Regex;
use rquickjs::{CatchResultExt, CaughtError, Context, Ctx, Runtime, Value};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long the VM may outlive the harness deadline before it is interrupted.
const INTERRUPT_GRACE: Duration = Duration::from_millis(100);

const MAX_STACK_SIZE: usize = 512 * 1024;

const STANDARD_GLOBALS: &[&str] = &[
    "globalThis",
    "undefined",
    "NaN",
    "Infinity",
    "Object",
    "Function",
    "Array",
    "Number",
    "Boolean",
    "String",
    "Symbol",
    "BigInt",
    "Math",
    "JSON",
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    "Date",
    "RegExp",
    "Error",
    "TypeError",
    "RangeError",
    "SyntaxError",
    "ReferenceError",
    "EvalError",
    "URIError",
    "AggregateError",
    "InternalError",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "encodeURIComponent",
    "decodeURIComponent",
    "ArrayBuffer",
    "Int8Array",
    "Uint8Array",
    "Int16Array",
    "Uint16Array",
    "Int32Array",
    "Uint32Array",
    "Float32Array",
    "Float64Array",
    "BigInt64Array",
    "BigUint64Array",
];

/// The globals a submission may see. Everything else is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    globals: BTreeSet<String>,
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::standard()
    }
}

impl CapabilitySet {
    /// Math, JSON, collections, primitive constructors and error types.
    pub fn standard() -> Self {
        Self {
            globals: STANDARD_GLOBALS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_global(mut self, name: impl Into<String>) -> Self {
        self.globals.insert(name.into());
        self
    }

    pub fn without_global(mut self, name: &str) -> Self {
        self.globals.remove(name);
        self
    }

    pub fn allows(&self, name: &str) -> bool {
        self.globals.contains(name)
    }

    fn prelude(&self) -> JudgeResult<String> {
        let allowed = serde_json::to_string(&self.globals)?;
        Ok(format!(
            r#"(() => {{
  const allowed = new Set({allowed});
  for (const name of Object.getOwnPropertyNames(globalThis)) {{
    if (!allowed.has(name)) {{
      try {{ delete globalThis[name]; }} catch (e) {{}}
    }}
  }}
  const lines = [];
  const show = (v) => {{
    if (typeof v === 'string') return v;
    if (v === undefined) return 'undefined';
    if (typeof v === 'function' || typeof v === 'symbol' || typeof v === 'bigint') return String(v);
    try {{
      const s = JSON.stringify(v);
      return s === undefined ? String(v) : s;
    }} catch (e) {{
      return String(v);
    }}
  }};
  const write = (...args) => {{ lines.push(args.map(show).join(' ')); }};
  Object.defineProperty(globalThis, '__judge_stdout', {{ value: lines, enumerable: false }});
  globalThis.console = {{ log: write, info: write, warn: write, error: write, debug: write }};
}})();"#
        ))
    }
}

pub struct ScriptExecutor {
    capabilities: CapabilitySet,
}

impl Default for ScriptExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptExecutor {
    pub fn new() -> Self {
        Self::with_capabilities(CapabilitySet::standard())
    }

    pub fn with_capabilities(capabilities: CapabilitySet) -> Self {
        Self { capabilities }
    }
}

#[async_trait]
impl Executor for ScriptExecutor {
    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::LocalScript
    }

    async fn execute(&self, invocation: &Invocation) -> JudgeResult<ExecOutput> {
        let invocation = invocation.clone();
        let prelude = self.capabilities.prelude()?;
        tokio::task::spawn_blocking(move || run_script(&invocation, &prelude))
            .await
            .map_err(|e| runtime::task_failed("javascript", e))?
    }
}

struct ScriptFailure {
    message: String,
    stdout: String,
}

fn run_script(invocation: &Invocation, prelude: &str) -> JudgeResult<ExecOutput> {
    let driver = match &invocation.mode {
        Mode::Playground => None,
        Mode::Judged { entry_point, input } => Some(judged_driver(
            &invocation.code,
            entry_point.as_deref(),
            input,
        )?),
    };

    let rt = Runtime::new().map_err(|e| runtime::execution_failed("javascript", e))?;
    rt.set_memory_limit(usize::try_from(invocation.memory_limit_bytes).unwrap_or(usize::MAX));
    rt.set_max_stack_size(MAX_STACK_SIZE);

    let deadline = Instant::now() + invocation.time_limit + INTERRUPT_GRACE;
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    rt.set_interrupt_handler(Some(Box::new(move || {
        let expired = Instant::now() >= deadline;
        if expired {
            flag.store(true, Ordering::SeqCst);
        }
        expired
    })));

    let ctx = Context::full(&rt).map_err(|e| runtime::execution_failed("javascript", e))?;
    let outcome = ctx.with(|ctx| evaluate(&ctx, prelude, &invocation.code, driver.as_deref()));
    let memory = u64::try_from(rt.memory_usage().memory_used_size).ok();

    if interrupted.load(Ordering::SeqCst) {
        log::debug!("JavaScript execution interrupted at deadline");
        return Ok(ExecOutput::faulted("", Fault::Timeout).with_memory(memory));
    }

    let output = match outcome {
        Ok(stdout) => ExecOutput::success(stdout),
        Err(failure) if failure.message.contains("out of memory") => {
            ExecOutput::faulted(failure.stdout, Fault::OutOfMemory(failure.message))
        }
        Err(failure) => ExecOutput::faulted(failure.stdout, Fault::Runtime(failure.message)),
    };
    Ok(output.with_memory(memory))
}

fn evaluate(
    ctx: &Ctx<'_>,
    prelude: &str,
    code: &str,
    driver: Option<&str>,
) -> Result<String, ScriptFailure> {
    ctx.eval::<Value, _>(prelude)
        .catch(ctx)
        .map_err(|e| failure(ctx, e))?;
    ctx.eval::<Value, _>(code)
        .catch(ctx)
        .map_err(|e| failure(ctx, e))?;

    match driver {
        None => Ok(captured_output(ctx)),
        Some(driver) => ctx
            .eval::<String, _>(driver)
            .catch(ctx)
            .map_err(|e| failure(ctx, e)),
    }
}

fn failure(ctx: &Ctx<'_>, error: CaughtError<'_>) -> ScriptFailure {
    ScriptFailure {
        message: describe(error),
        stdout: captured_output(ctx),
    }
}

fn captured_output(ctx: &Ctx<'_>) -> String {
    ctx.eval::<String, _>("globalThis.__judge_stdout ? globalThis.__judge_stdout.join('\\n') : ''")
        .unwrap_or_default()
}

fn describe(error: CaughtError<'_>) -> String {
    match error {
        CaughtError::Exception(exception) => {
            let message = exception.message().unwrap_or_default();
            match exception.get::<_, String>("name") {
                Ok(name) if !name.is_empty() => format!("{name}: {message}"),
                _ => message,
            }
        }
        CaughtError::Value(value) => format!("Uncaught {value:?}"),
        CaughtError::Error(error) => error.to_string(),
    }
}

/// Script that calls the first available entry point with the parsed input
/// and evaluates to the JSON text of its return value.
///
/// A `Solution` class is checked first, by candidate name, then free
/// functions, then the first method declared on `Solution`.
fn judged_driver(code: &str, entry_point: Option<&str>, input: &str) -> JudgeResult<String> {
    let mut candidates = entry_point_candidates(entry_point);
    if let Some(declared) = first_declared_function(code) {
        if !candidates.contains(&declared) {
            candidates.push(declared);
        }
    }

    let lookup = candidates
        .iter()
        .map(|name| format!("typeof {name} === 'function' ? {name} : "))
        .collect::<String>();
    let names = serde_json::to_string(&candidates)?;
    let args = serde_json::to_string(&parse_arguments(input))?;
    let tried = candidates.join(", ");

    Ok(format!(
        r#"(() => {{
  const instance = typeof Solution === 'function' ? new Solution() : undefined;
  const method = (name) =>
    instance !== undefined && typeof instance[name] === 'function'
      ? instance[name].bind(instance)
      : undefined;
  const declared = instance === undefined
    ? undefined
    : Object.getOwnPropertyNames(Solution.prototype).find(
        (name) => name !== 'constructor' && method(name) !== undefined);
  let entry = {names}.map(method).find((f) => f !== undefined);
  if (entry === undefined) entry = {lookup}undefined;
  if (entry === undefined && declared !== undefined) entry = method(declared);
  if (entry === undefined) {{
    throw new ReferenceError('No entry point function found (tried: {tried})');
  }}
  const result = entry(...{args});
  if (result === undefined) return 'undefined';
  const text = JSON.stringify(result);
  return text === undefined ? String(result) : text;
}})()"#
    ))
}

fn first_declared_function(code: &str) -> Option<String> {
    let re = Regex::new(concat!(
        r"(?m)^\s*(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)",
        r"|^\s*(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s*)?",
        r"(?:function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)",
    ))
    .ok()?;
    let name = re.captures_iter(code).find_map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    });
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;

    fn judged(code: &str, entry: Option<&str>, input: &str) -> Invocation {
        Invocation::judged(
            Language::Javascript,
            code,
            entry.map(str::to_string),
            input,
            Duration::from_millis(2000),
            64 * 1024 * 1024,
        )
    }

    fn playground(code: &str) -> Invocation {
        Invocation::playground(
            Language::Javascript,
            code,
            Duration::from_millis(2000),
            64 * 1024 * 1024,
        )
    }

    #[tokio::test]
    async fn test_playground_captures_console() {
        let output = ScriptExecutor::new()
            .execute(&playground("console.log('a', 1, [1,2]); console.error({x: true});"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "a 1 [1,2]\n{\"x\":true}");
        assert!(output.fault.is_none());
        assert!(output.memory_bytes.unwrap_or(0) > 0);
    }

    #[tokio::test]
    async fn test_judged_calls_requested_entry_point() {
        let code = r#"
function twoSum(nums, target) {
  const seen = new Map();
  for (let i = 0; i < nums.length; i++) {
    if (seen.has(target - nums[i])) return [seen.get(target - nums[i]), i];
    seen.set(nums[i], i);
  }
  return [];
}"#;
        let output = ScriptExecutor::new()
            .execute(&judged(code, Some("twoSum"), "[2,7,11,15], 9"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "[0,1]");
    }

    #[tokio::test]
    async fn test_judged_falls_back_to_declared_function() {
        let code = "const double = (x) => x * 2;";
        let output = ScriptExecutor::new()
            .execute(&judged(code, Some("missing"), "21"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "42");
    }

    #[tokio::test]
    async fn test_judged_resolves_solution_class_methods() {
        let code = r#"
class Solution {
  constructor() { this.calls = 0; }
  twoSum(nums, target) {
    this.calls += 1;
    const seen = new Map();
    for (let i = 0; i < nums.length; i++) {
      if (seen.has(target - nums[i])) return [seen.get(target - nums[i]), i];
      seen.set(nums[i], i);
    }
    return [];
  }
}"#;
        let output = ScriptExecutor::new()
            .execute(&judged(code, Some("twoSum"), "[2,7,11,15], 9"))
            .await
            .unwrap();
        assert_eq!(output.fault, None);
        assert_eq!(output.stdout, "[0,1]");

        let code = "class Solution { helper() { return 1; } maxDepth(n) { return n + 1; } }";
        let output = ScriptExecutor::new()
            .execute(&judged(code, Some("missing"), "41"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "1");
    }

    #[tokio::test]
    async fn test_free_function_wins_over_solution_fallback() {
        let code = concat!(
            "class Solution { other() { return 'method'; } }\n",
            "function solve() { return 'free'; }",
        );
        let output = ScriptExecutor::new()
            .execute(&judged(code, None, ""))
            .await
            .unwrap();
        assert_eq!(output.stdout, "\"free\"");
    }

    #[tokio::test]
    async fn test_undefined_result() {
        let output = ScriptExecutor::new()
            .execute(&judged("function solve() {}", None, ""))
            .await
            .unwrap();
        assert_eq!(output.stdout, "undefined");
    }

    #[tokio::test]
    async fn test_exception_is_runtime_fault() {
        let output = ScriptExecutor::new()
            .execute(&playground("console.log('before'); null.x;"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "before");
        match output.fault {
            Some(Fault::Runtime(message)) => assert!(message.starts_with("TypeError")),
            other => panic!("unexpected fault: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_syntax_error_is_runtime_fault() {
        let output = ScriptExecutor::new()
            .execute(&playground("function ("))
            .await
            .unwrap();
        assert!(matches!(output.fault, Some(Fault::Runtime(m)) if m.contains("SyntaxError")));
    }

    #[tokio::test]
    async fn test_globals_outside_capabilities_are_removed() {
        let code = "console.log(typeof eval, typeof Proxy, typeof Math, typeof setTimeout);";
        let output = ScriptExecutor::new().execute(&playground(code)).await.unwrap();
        assert_eq!(output.stdout, "undefined undefined object undefined");

        let capabilities = CapabilitySet::standard().with_global("Proxy");
        let widened = ScriptExecutor::with_capabilities(capabilities);
        let output = widened.execute(&playground(code)).await.unwrap();
        assert_eq!(output.stdout, "undefined function object undefined");
    }

    #[tokio::test]
    async fn test_infinite_loop_is_interrupted() {
        let invocation = Invocation::playground(
            Language::Javascript,
            "while (true) {}",
            Duration::from_millis(100),
            64 * 1024 * 1024,
        );
        let started = Instant::now();
        let output = ScriptExecutor::new().execute(&invocation).await.unwrap();
        assert_eq!(output.fault, Some(Fault::Timeout));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_memory_ceiling() {
        let code = "const keep = []; while (true) { keep.push(new Array(100000).fill(7)); }";
        let invocation = Invocation::playground(
            Language::Javascript,
            code,
            Duration::from_millis(5000),
            8 * 1024 * 1024,
        );
        let output = ScriptExecutor::new().execute(&invocation).await.unwrap();
        assert!(matches!(
            output.fault,
            Some(Fault::OutOfMemory(_)) | Some(Fault::Runtime(_))
        ));
    }

    #[test]
    fn test_first_declared_function() {
        assert_eq!(
            first_declared_function("// helper\nfunction maxProfit(prices) {}").as_deref(),
            Some("maxProfit")
        );
        assert_eq!(
            first_declared_function("let f = async (a) => a;").as_deref(),
            Some("f")
        );
        assert_eq!(first_declared_function("const x = 5;"), None);
    }
}
