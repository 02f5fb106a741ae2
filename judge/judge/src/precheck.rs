//! Shallow static checks run once per submission before any test case.
//!
//! These are deliberately cheap: non-empty source, balanced brackets outside
//! strings, comments and JavaScript regex literals, and a language landmark
//! (a `class` or method for Java, a `func` for Go). Anything deeper is left to
//! the compiler or the runtime.

use crate::types::Language;
use regex::Regex;

/// A method header with a return type, e.g. `public boolean isEven(long n) {`.
const JAVA_METHOD: &str =
    r"[A-Za-z_][\w<>\[\],.?]*\s+[A-Za-z_]\w*\s*\([^;{}]*\)\s*(?:throws\s[^{;]*)?\{";

/// Keywords after which a `/` starts a regex literal rather than a division.
const REGEX_PRECEDING_WORDS: &[&str] = &[
    "return", "typeof", "case", "in", "of", "delete", "void", "throw", "new", "else", "do",
    "instanceof", "yield", "await",
];

pub fn check(language: Language, code: &str) -> Result<(), String> {
    if code.trim().is_empty() {
        return Err("Source code is empty".to_string());
    }

    match language {
        Language::Python | Language::Sql => Ok(()),
        Language::Javascript => check_brackets(code, Dialect::Script),
        Language::Cpp | Language::Go | Language::Java => {
            check_brackets(code, Dialect::CLike)?;
            check_landmark(language, code)
        }
        Language::Rust => {
            check_brackets(code, Dialect::Rust)?;
            check_landmark(language, code)
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Script,
    CLike,
    Rust,
}

fn check_landmark(language: Language, code: &str) -> Result<(), String> {
    let (landmark, description) = match language {
        Language::Java => ("class", "a class or method declaration"),
        Language::Go => ("func", "a func declaration"),
        Language::Rust => ("fn", "an fn item"),
        _ => ("{", "a block"),
    };

    let found = match language {
        // Bare methods are wrapped in a class before compiling.
        Language::Java => contains_word(code, landmark) || has_java_method(code),
        _ if landmark == "{" => code.contains('{'),
        _ => contains_word(code, landmark),
    };

    if found && code.contains('{') {
        Ok(())
    } else {
        Err(format!("Expected {description} in {language} source"))
    }
}

fn has_java_method(code: &str) -> bool {
    Regex::new(JAVA_METHOD)
        .map(|re| re.is_match(code))
        .unwrap_or(false)
}

fn contains_word(code: &str, word: &str) -> bool {
    code.match_indices(word).any(|(pos, _)| {
        let before = code[..pos].chars().next_back();
        let after = code[pos + word.len()..].chars().next();
        let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
        !before.map(is_ident).unwrap_or(false) && !after.map(is_ident).unwrap_or(false)
    })
}

fn check_brackets(code: &str, dialect: Dialect) -> Result<(), String> {
    let chars: Vec<char> = code.chars().collect();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();

        match ch {
            '\n' => line += 1,
            '/' if dialect == Dialect::Script
                && next != Some('/')
                && next != Some('*')
                && starts_regex(&chars, i) =>
            {
                i = skip_regex(&chars, i);
                continue;
            }
            '/' if next == Some('/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if next == Some('*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
                i += 2;
                continue;
            }
            '"' => {
                i = skip_quoted(&chars, i, '"', &mut line);
                continue;
            }
            '`' if dialect != Dialect::Rust => {
                i = skip_quoted(&chars, i, '`', &mut line);
                continue;
            }
            '\'' if dialect != Dialect::Rust => {
                i = skip_quoted(&chars, i, '\'', &mut line);
                continue;
            }
            '\'' => {
                // Rust char literals; a lone quote is a lifetime.
                if let Some(end) = rust_char_literal_end(&chars, i) {
                    i = end;
                    continue;
                }
            }
            '(' | '[' | '{' => stack.push((ch, line)),
            ')' | ']' | '}' => {
                let open = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((top, _)) if top == open => {}
                    Some((top, opened_at)) => {
                        return Err(format!(
                            "Mismatched '{ch}' on line {line} \
                             (expected closing for '{top}' opened on line {opened_at})"
                        ));
                    }
                    None => return Err(format!("Unexpected '{ch}' on line {line}")),
                }
            }
            _ => {}
        }
        i += 1;
    }

    match stack.pop() {
        Some((open, opened_at)) => Err(format!("Unclosed '{open}' opened on line {opened_at}")),
        None => Ok(()),
    }
}

/// Index just past the closing quote, or the end of input.
fn skip_quoted(chars: &[char], start: usize, quote: char, line: &mut usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '\n' => *line += 1,
            c if c == quote => return i + 1,
            _ => {}
        }
        i += 1;
    }
    i
}

/// Whether a `/` at `pos` opens a regex literal, judged by what precedes it.
fn starts_regex(chars: &[char], pos: usize) -> bool {
    let mut end = pos;
    while end > 0 && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    if end == 0 {
        return true;
    }
    let last = chars[end - 1];
    if "(,=:[!&|?{};+-*%<>~^".contains(last) {
        return true;
    }
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$';
    let mut start = end;
    while start > 0 && is_ident(chars[start - 1]) {
        start -= 1;
    }
    let word: String = chars[start..end].iter().collect();
    REGEX_PRECEDING_WORDS.contains(&word.as_str())
}

/// Index just past the closing `/` of a regex literal. Stops before a newline
/// so an unterminated literal does not swallow the rest of the source.
fn skip_regex(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    let mut in_class = false;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '\n' => return i,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => return i + 1,
            _ => {}
        }
        i += 1;
    }
    i
}

fn rust_char_literal_end(chars: &[char], start: usize) -> Option<usize> {
    match (chars.get(start + 1), chars.get(start + 2), chars.get(start + 3)) {
        (Some('\\'), _, _) => {
            let mut i = start + 2;
            while i < chars.len() && i < start + 12 {
                if chars[i] == '\'' {
                    return Some(i + 1);
                }
                i += 1;
            }
            None
        }
        (Some(_), Some('\''), _) => Some(start + 3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_is_rejected() {
        assert!(check(Language::Python, "   \n").is_err());
        assert!(check(Language::Javascript, "").is_err());
    }

    #[test]
    fn test_balanced_javascript() {
        let code = "function f(a) { return [a, '}', \"(\"]; } // )";
        assert!(check(Language::Javascript, code).is_ok());
    }

    #[test]
    fn test_unbalanced_javascript() {
        let err = check(Language::Javascript, "function f() {\n  return 1;\n").unwrap_err();
        assert!(err.contains("Unclosed '{'"));
        assert!(check(Language::Javascript, "f(]").is_err());
    }

    #[test]
    fn test_regex_literals_are_skipped() {
        let quote_in_regex = "function strip(s) {\n  return s.replace(/'/g, \"\");\n}";
        assert!(check(Language::Javascript, quote_in_regex).is_ok());

        let escaped_slashes = "function norm(u) { return u.replace(/\\/\\//g, '/'); }";
        assert!(check(Language::Javascript, escaped_slashes).is_ok());

        let class_with_bracket = "function f(s) { return /[)/]+/.test(s); }";
        assert!(check(Language::Javascript, class_with_bracket).is_ok());
    }

    #[test]
    fn test_division_is_not_a_regex() {
        let code = "function f(a, b, c) { return (a / b / c) + [a][0] / 2; }";
        assert!(check(Language::Javascript, code).is_ok());
        assert!(check(Language::Javascript, "function f(a, b) { return a / (b; }").is_err());
    }

    #[test]
    fn test_block_comments_are_ignored() {
        assert!(check(Language::Cpp, "/* { */ int main() { return 0; }").is_ok());
    }

    #[test]
    fn test_java_requires_class_or_method() {
        assert!(check(Language::Java, "int[] xs = {1, 2};").is_err());
        assert!(check(Language::Java, "class Solution { int f() { return 0; } }").is_ok());
        let bare = "public boolean isEven(long n) { return n % 2 == 0; }";
        assert!(check(Language::Java, bare).is_ok());
        let generic =
            "List<Integer> twoSum(int[] nums, int target) throws Exception { return null; }";
        assert!(check(Language::Java, generic).is_ok());
    }

    #[test]
    fn test_go_requires_func() {
        assert!(check(Language::Go, "var x = map[int]int{}").is_err());
        assert!(check(Language::Go, "func twoSum(nums []int) []int { return nil }").is_ok());
    }

    #[test]
    fn test_rust_lifetimes_and_chars() {
        let code = "impl Solution { pub fn f<'a>(s: &'a str) -> char { '{' } }";
        assert!(check(Language::Rust, code).is_ok());
        assert!(check(Language::Rust, "struct A;").is_err());
    }

    #[test]
    fn test_python_and_sql_only_need_content() {
        assert!(check(Language::Python, "def f(:").is_ok());
        assert!(check(Language::Sql, "SELECT (").is_ok());
    }
}
