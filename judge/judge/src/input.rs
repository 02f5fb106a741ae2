//! Heuristic parsing of free-text test input into typed arguments.
//!
//! Test inputs are authored as plain text such as `[2,7,11,15], 9` or
//! `nums = [2,7,11,15], target = 9`. The text is split on top-level commas
//! and newlines, an optional `name =` prefix is dropped, and every segment is
//! read as JSON where possible. This is an approximation of a structured
//! test-case schema, not a contract: anything that does not parse becomes a
//! string argument.

use serde_json::Value;

/// Splits `input` into argument values.
pub fn parse_arguments(input: &str) -> Vec<Value> {
    split_top_level(input)
        .iter()
        .map(|segment| parse_value(segment))
        .collect()
}

/// The first argument that is a non-empty list of numbers.
pub fn first_numeric_list(args: &[Value]) -> Option<&Vec<Value>> {
    args.iter().find_map(|arg| match arg {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_number) => {
            Some(items)
        }
        _ => None,
    })
}

/// The last argument when it is a number and not the only argument.
pub fn trailing_scalar(args: &[Value]) -> Option<&serde_json::Number> {
    if args.len() < 2 {
        return None;
    }
    match args.last() {
        Some(Value::Number(n)) => Some(n),
        _ => None,
    }
}

fn split_top_level(input: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in input.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' | '{' | '(' => {
                depth += 1;
                current.push(ch);
            }
            ']' | '}' | ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' | '\n' if depth <= 0 => {
                push_segment(&mut segments, &mut current);
            }
            _ => current.push(ch),
        }
    }
    push_segment(&mut segments, &mut current);
    segments
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
    current.clear();
}

fn parse_value(segment: &str) -> Value {
    let text = strip_assignment(segment).trim();

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return value;
    }

    let normalized = normalize_literal(text);
    if let Ok(value) = serde_json::from_str::<Value>(&normalized) {
        return value;
    }

    let unquoted = text
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(text);
    Value::String(unquoted.to_string())
}

/// Drops a leading `identifier =` so `target = 9` reads as `9`.
fn strip_assignment(segment: &str) -> &str {
    if let Some(pos) = segment.find('=') {
        let (name, rest) = segment.split_at(pos);
        let name = name.trim();
        let is_identifier = !name.is_empty()
            && name
                .chars()
                .next()
                .map(|c| c.is_ascii_alphabetic() || c == '_')
                .unwrap_or(false)
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if is_identifier && !rest.starts_with("==") {
            return &rest[1..];
        }
    }
    segment
}

/// Rewrites Python-flavoured literals (`'a'`, `True`, `None`) into JSON.
fn normalize_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_double = false;
    let mut in_single = false;
    let mut escaped = false;
    let mut word = String::new();

    let flush_word = |word: &mut String, out: &mut String| {
        match word.as_str() {
            "True" => out.push_str("true"),
            "False" => out.push_str("false"),
            "None" => out.push_str("null"),
            _ => out.push_str(word),
        }
        word.clear();
    };

    for ch in text.chars() {
        if in_double || in_single {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }
            match ch {
                '\\' => {
                    escaped = true;
                    out.push(ch);
                }
                '"' if in_double => {
                    in_double = false;
                    out.push(ch);
                }
                '\'' if in_single => {
                    in_single = false;
                    out.push('"');
                }
                '"' if in_single => out.push_str("\\\""),
                _ => out.push(ch),
            }
            continue;
        }

        if ch.is_ascii_alphanumeric() || ch == '_' {
            word.push(ch);
            continue;
        }
        flush_word(&mut word, &mut out);

        match ch {
            '"' => {
                in_double = true;
                out.push(ch);
            }
            '\'' => {
                in_single = true;
                out.push('"');
            }
            _ => out.push(ch),
        }
    }
    flush_word(&mut word, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_and_scalar() {
        let args = parse_arguments("[2,7,11,15], 9");
        assert_eq!(args, vec![json!([2, 7, 11, 15]), json!(9)]);
    }

    #[test]
    fn test_named_arguments() {
        let args = parse_arguments("nums = [3,2,4], target = 6");
        assert_eq!(args, vec![json!([3, 2, 4]), json!(6)]);
    }

    #[test]
    fn test_newline_separated_arguments() {
        let args = parse_arguments("[[1,2],[3,4]]\n\"abc\"\n2.5");
        assert_eq!(args, vec![json!([[1, 2], [3, 4]]), json!("abc"), json!(2.5)]);
    }

    #[test]
    fn test_python_literals() {
        let args = parse_arguments("['a', 'b'], True, None");
        assert_eq!(args, vec![json!(["a", "b"]), json!(true), json!(null)]);
    }

    #[test]
    fn test_commas_inside_strings_are_kept() {
        let args = parse_arguments("\"a,b\", 'c'");
        assert_eq!(args, vec![json!("a,b"), json!("c")]);
    }

    #[test]
    fn test_unparseable_segment_becomes_string() {
        let args = parse_arguments("hello world");
        assert_eq!(args, vec![json!("hello world")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_arguments("   ").is_empty());
    }

    #[test]
    fn test_numeric_helpers() {
        let args = parse_arguments("[5,3,9], 4");
        assert_eq!(first_numeric_list(&args).map(|v| v.len()), Some(3));
        assert_eq!(trailing_scalar(&args).and_then(|n| n.as_i64()), Some(4));

        let single = parse_arguments("[5,3,9]");
        assert!(trailing_scalar(&single).is_none());
    }
}
