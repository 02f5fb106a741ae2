use super::{
    bool_text, float_text, has_word, integer_text, list_items, ArgType, DriverPlan,
    DriverTemplate, Receiver,
};
use crate::error::{validation, JudgeResult};
use serde_json::Value;

pub struct RustTemplate;

impl RustTemplate {
    fn type_name(ty: &ArgType) -> String {
        match ty {
            ArgType::Int => "i32".to_string(),
            ArgType::Long => "i64".to_string(),
            ArgType::Float => "f64".to_string(),
            ArgType::Bool => "bool".to_string(),
            ArgType::Str => "String".to_string(),
            ArgType::List(inner) => format!("Vec<{}>", Self::type_name(inner)),
        }
    }
}

/// `twoSum` -> `two_sum`; names already in snake case are unchanged.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower_or_digit = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else {
            out.push(ch);
            prev_lower_or_digit = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

impl DriverTemplate for RustTemplate {
    fn file_name(&self) -> &'static str {
        "main.rs"
    }

    fn entry_pattern(&self) -> &'static str {
        r"\bfn\s+([A-Za-z_]\w*)"
    }

    fn receiver(&self, code: &str) -> Receiver {
        if has_word(code, r"\bimpl\s+Solution\b") {
            Receiver::Solution
        } else {
            Receiver::Free
        }
    }

    fn callable_name(&self, name: &str) -> String {
        to_snake_case(name)
    }

    fn literal(&self, ty: &ArgType, value: &Value) -> JudgeResult<String> {
        match ty {
            ArgType::Int | ArgType::Long => integer_text(value),
            ArgType::Float => float_text(value),
            ArgType::Bool => bool_text(value),
            ArgType::Str => match value {
                Value::String(s) => Ok(format!("String::from({s:?})")),
                other => Err(validation::unsupported_argument(&format!(
                    "expected string, found {other}"
                ))),
            },
            ArgType::List(inner) => {
                let items = list_items(value)?
                    .iter()
                    .map(|item| self.literal(inner, item))
                    .collect::<JudgeResult<Vec<_>>>()?;
                Ok(format!("vec![{}]", items.join(", ")))
            }
        }
    }

    fn render(&self, code: &str, plan: &DriverPlan) -> JudgeResult<String> {
        let mut out = String::from("#![allow(unused)]\nuse std::collections::*;\n\n");
        if plan.receiver == Receiver::Solution && !has_word(code, r"\bstruct\s+Solution\b") {
            out.push_str("struct Solution;\n\n");
        }
        out.push_str(code.trim_end());
        out.push_str("\n\nfn main() {\n");
        for (name, ty, value) in plan.bindings() {
            out.push_str(&format!(
                "    let {}: {} = {};\n",
                name,
                Self::type_name(ty),
                self.literal(ty, value)?
            ));
        }
        let path = match plan.receiver {
            Receiver::Solution => format!("Solution::{}", plan.signature.name),
            Receiver::Free => plan.signature.name.clone(),
        };
        out.push_str(&format!(
            "    let result = {}({});\n",
            path,
            plan.argument_list()
        ));
        out.push_str("    println!(\"{:?}\", result);\n}\n");
        Ok(out)
    }
}
