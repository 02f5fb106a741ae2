//! Python submissions. Skipped when no interpreter is installed.

use golem_judge::runtime::utils::find_in_path;
use golem_judge::*;
use std::time::{Duration, Instant};

fn python_available() -> bool {
    if ["python3", "python"]
        .iter()
        .any(|name| find_in_path(name).is_some())
    {
        true
    } else {
        println!("Skipping Python test: runtime not available");
        false
    }
}

#[tokio::test]
async fn test_solution_class_accepted() {
    if !python_available() {
        return;
    }
    let code = r#"
class Solution:
    def twoSum(self, nums, target):
        seen = {}
        for i, n in enumerate(nums):
            if target - n in seen:
                return [seen[target - n], i]
            seen[n] = i
"#;
    let request = ExecutionRequest::new("python", code)
        .with_entry_point("twoSum")
        .with_test_case(TestCase::new("nums = [2,7,11,15], target = 9", "[0,1]"))
        .with_test_case(TestCase::new("[3,2,4], 6", "[1, 2]"))
        .with_time_limit_ms(5000);

    let result = JudgeEngine::new().unwrap().submit(request).await;
    assert_eq!(result.status, Verdict::Accepted, "{:?}", result.error);
    assert_eq!(result.passed_test_cases, 2);
}

#[tokio::test]
async fn test_exception_is_runtime_error() {
    if !python_available() {
        return;
    }
    let request = ExecutionRequest::new("py", "def solve(xs):\n    return xs[10]\n")
        .with_test_case(TestCase::new("[1, 2]", "1"))
        .with_time_limit_ms(5000);

    let result = JudgeEngine::new().unwrap().submit(request).await;
    assert_eq!(result.status, Verdict::RuntimeError);
    assert!(result.error.unwrap().contains("IndexError"));
}

#[tokio::test]
async fn test_infinite_loop_is_killed() {
    if !python_available() {
        return;
    }
    let engine = JudgeEngine::new().unwrap();
    // Warm the shared runtime so the deadline only covers the loop.
    let warmup = engine.run_freeform("python", "print(1)").await;
    assert_eq!(warmup.output.trim(), "1");

    let request = ExecutionRequest::new("python", "def solve():\n    while True:\n        pass\n")
        .with_test_case(TestCase::new("", "1"))
        .with_time_limit_ms(300);
    let started = Instant::now();
    let result = engine.submit(request).await;
    assert_eq!(result.status, Verdict::TimeLimitExceeded);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_playground_output() {
    if !python_available() {
        return;
    }
    let result = JudgeEngine::new()
        .unwrap()
        .run_freeform("python", "for i in range(3):\n    print(i)\n")
        .await;
    assert_eq!(result.output, "0\n1\n2\n");
    assert_eq!(result.error, None);
}
