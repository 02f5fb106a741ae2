//! Output comparison.
//!
//! Outputs are first compared after normalization (line endings unified,
//! ends trimmed, all whitespace removed). When that fails both sides are read
//! as JSON and compared structurally, so `[1, 2]` matches `[1,2]` and `2.0`
//! matches `2`.

use serde_json::Value;

/// Line endings unified, ends trimmed and every whitespace character removed.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Whether `actual` is an acceptable answer for `expected`.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    if normalize(actual) == normalize(expected) {
        return true;
    }

    match (
        serde_json::from_str::<Value>(actual.trim()),
        serde_json::from_str::<Value>(expected.trim()),
    ) {
        (Ok(a), Ok(e)) => values_equal(&a, &e),
        _ => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, v)| ym.get(k).map(|w| values_equal(v, w)).unwrap_or(false))
        }
        _ => a == b,
    }
}
