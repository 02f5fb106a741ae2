//! Driver program synthesis for remotely compiled languages.
//!
//! A judged submission for a compiled language is only a function or a
//! `Solution` class. To run it, the gateway wraps it in a complete program:
//! typed bindings for every test argument, a call to the entry point and a
//! printer that writes the result as JSON-compatible text. The argument types
//! are inferred from the parsed input into a small [`ArgType`] IR, and each
//! language renders that IR through its [`DriverTemplate`].

pub mod cpp;
pub mod go;
pub mod java;
pub mod rust;

use crate::error::{validation, JudgeResult};
use crate::input::parse_arguments;
use crate::types::Language;
use regex::Regex;
use serde_json::Value;

pub use cpp::CppTemplate;
pub use go::GoTemplate;
pub use java::JavaTemplate;
pub use rust::RustTemplate;

/// Statically typed view of one test argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    Int,
    Long,
    Float,
    Bool,
    Str,
    List(Box<ArgType>),
}

impl ArgType {
    pub fn infer(value: &Value) -> JudgeResult<ArgType> {
        match value {
            Value::Bool(_) => Ok(ArgType::Bool),
            Value::String(_) => Ok(ArgType::Str),
            Value::Number(n) => Ok(match n.as_i64() {
                Some(i) if i32::try_from(i).is_ok() => ArgType::Int,
                Some(_) => ArgType::Long,
                None => ArgType::Float,
            }),
            Value::Array(items) => {
                // Empty sublists take the type of their siblings.
                let mut element: Option<ArgType> = None;
                let mut saw_empty_list = false;
                for item in items {
                    if matches!(item, Value::Array(inner) if inner.is_empty()) {
                        saw_empty_list = true;
                        continue;
                    }
                    let ty = ArgType::infer(item)?;
                    element = Some(match element {
                        Some(current) => current.unify(ty)?,
                        None => ty,
                    });
                }
                let element = match (element, saw_empty_list) {
                    (Some(ty @ ArgType::List(_)), _) | (Some(ty), false) => ty,
                    (Some(ty), true) => {
                        return Err(validation::unsupported_argument(&format!(
                            "mixed element types {ty:?} and list"
                        )))
                    }
                    (None, true) => ArgType::List(Box::new(ArgType::Int)),
                    (None, false) => ArgType::Int,
                };
                Ok(ArgType::List(Box::new(element)))
            }
            Value::Null => Err(validation::unsupported_argument("null values have no type")),
            Value::Object(_) => Err(validation::unsupported_argument(
                "object arguments are not supported for compiled languages",
            )),
        }
    }

    /// The narrowest type both sides widen to.
    pub fn unify(self, other: ArgType) -> JudgeResult<ArgType> {
        use ArgType::*;
        match (self, other) {
            (a, b) if a == b => Ok(a),
            (Int, Long) | (Long, Int) => Ok(Long),
            (Int | Long, Float) | (Float, Int | Long) => Ok(Float),
            (List(a), List(b)) => Ok(List(Box::new(a.unify(*b)?))),
            (a, b) => Err(validation::unsupported_argument(&format!(
                "mixed element types {a:?} and {b:?}"
            ))),
        }
    }

    pub fn element(&self) -> Option<&ArgType> {
        match self {
            ArgType::List(inner) => Some(inner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySignature {
    pub name: String,
    pub params: Vec<ArgType>,
}

impl EntrySignature {
    pub fn infer(name: impl Into<String>, args: &[Value]) -> JudgeResult<Self> {
        let params = args.iter().map(ArgType::infer).collect::<JudgeResult<Vec<_>>>()?;
        Ok(Self {
            name: name.into(),
            params,
        })
    }
}

/// How the entry point is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// A method on a `Solution` instance or type.
    Solution,
    Free,
}

/// Everything a template needs to render one driver.
#[derive(Debug, Clone)]
pub struct DriverPlan {
    pub signature: EntrySignature,
    pub args: Vec<Value>,
    pub receiver: Receiver,
}

impl DriverPlan {
    /// `(binding name, type, value)` for every argument.
    pub fn bindings(&self) -> impl Iterator<Item = (String, &ArgType, &Value)> {
        self.signature
            .params
            .iter()
            .zip(&self.args)
            .enumerate()
            .map(|(i, (ty, value))| (format!("arg{i}"), ty, value))
    }

    pub fn argument_list(&self) -> String {
        (0..self.args.len())
            .map(|i| format!("arg{i}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

pub trait DriverTemplate: Send + Sync {
    fn file_name(&self) -> &'static str;

    /// Pattern whose first capture group names a candidate entry point.
    fn entry_pattern(&self) -> &'static str;

    fn receiver(&self, code: &str) -> Receiver;

    /// The name to call, given the requested entry point.
    fn callable_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn literal(&self, ty: &ArgType, value: &Value) -> JudgeResult<String>;

    fn render(&self, code: &str, plan: &DriverPlan) -> JudgeResult<String>;
}

pub fn template_for(language: Language) -> Option<&'static dyn DriverTemplate> {
    match language {
        Language::Cpp => Some(&CppTemplate),
        Language::Java => Some(&JavaTemplate),
        Language::Go => Some(&GoTemplate),
        Language::Rust => Some(&RustTemplate),
        Language::Javascript | Language::Python | Language::Sql => None,
    }
}

/// Builds the complete program for one judged test case.
pub fn synthesize(
    language: Language,
    code: &str,
    entry_point: Option<&str>,
    input: &str,
) -> JudgeResult<SourceFile> {
    let template = template_for(language).ok_or_else(|| {
        validation::unsupported_argument(&format!("{language} does not use a synthesized driver"))
    })?;

    let name = match entry_point {
        Some(name) if is_identifier(name) => name.to_string(),
        Some(name) => return Err(validation::invalid_entry_point(name)),
        None => find_entry_point(code, template.entry_pattern())
            .ok_or_else(|| validation::invalid_entry_point("<none found>"))?,
    };

    let args = parse_arguments(input);
    let signature = EntrySignature::infer(template.callable_name(&name), &args)?;
    let plan = DriverPlan {
        signature,
        args,
        receiver: template.receiver(code),
    };

    Ok(SourceFile {
        name: template.file_name().to_string(),
        content: template.render(code, &plan)?,
    })
}

const NOT_ENTRY_POINTS: &[&str] = &[
    "main", "if", "for", "while", "switch", "catch", "return", "sizeof", "Solution", "new",
];

fn find_entry_point(code: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let found = re
        .captures_iter(code)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .find(|name| !NOT_ENTRY_POINTS.contains(&name.as_str()));
    found
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn has_word(code: &str, pattern: &str) -> bool {
    Regex::new(pattern).map(|re| re.is_match(code)).unwrap_or(false)
}

/// A JSON string literal, which is also a valid C-family string literal for
/// printable text.
pub(crate) fn quoted(value: &Value) -> JudgeResult<String> {
    match value {
        Value::String(s) => Ok(serde_json::to_string(s)?),
        other => Err(type_mismatch("string", other)),
    }
}

pub(crate) fn integer_text(value: &Value) -> JudgeResult<String> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(type_mismatch("integer", other)),
    }
}

pub(crate) fn float_text(value: &Value) -> JudgeResult<String> {
    value
        .as_f64()
        .map(|f| format!("{f:?}"))
        .ok_or_else(|| type_mismatch("number", value))
}

pub(crate) fn bool_text(value: &Value) -> JudgeResult<String> {
    value
        .as_bool()
        .map(|b| b.to_string())
        .ok_or_else(|| type_mismatch("boolean", value))
}

pub(crate) fn list_items(value: &Value) -> JudgeResult<&Vec<Value>> {
    value.as_array().ok_or_else(|| type_mismatch("list", value))
}

fn type_mismatch(expected: &str, actual: &Value) -> crate::error::JudgeError {
    validation::unsupported_argument(&format!("expected {expected}, found {actual}"))
}
