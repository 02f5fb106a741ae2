use super::{
    bool_text, float_text, has_word, integer_text, list_items, quoted, ArgType, DriverPlan,
    DriverTemplate, Receiver,
};
use crate::error::{JudgeError, JudgeResult};
use regex::Regex;
use serde_json::Value;

const FORMATTER: &str = r#"final class JudgeFormat {
    static String format(Object value) {
        if (value == null) return "null";
        if (value instanceof String) return quote((String) value);
        if (value instanceof Character) return quote(String.valueOf(value));
        if (value instanceof int[]) {
            return format(java.util.Arrays.stream((int[]) value).boxed().toArray());
        }
        if (value instanceof long[]) {
            return format(java.util.Arrays.stream((long[]) value).boxed().toArray());
        }
        if (value instanceof double[]) {
            return format(java.util.Arrays.stream((double[]) value).boxed().toArray());
        }
        if (value instanceof boolean[]) {
            boolean[] items = (boolean[]) value;
            Object[] boxed = new Object[items.length];
            for (int i = 0; i < items.length; i++) boxed[i] = items[i];
            return format(boxed);
        }
        if (value instanceof char[]) {
            char[] items = (char[]) value;
            Object[] boxed = new Object[items.length];
            for (int i = 0; i < items.length; i++) boxed[i] = items[i];
            return format(boxed);
        }
        if (value instanceof Object[]) {
            StringBuilder sb = new StringBuilder("[");
            Object[] items = (Object[]) value;
            for (int i = 0; i < items.length; i++) {
                if (i > 0) sb.append(',');
                sb.append(format(items[i]));
            }
            return sb.append(']').toString();
        }
        if (value instanceof Iterable) {
            StringBuilder sb = new StringBuilder("[");
            boolean first = true;
            for (Object item : (Iterable<?>) value) {
                if (!first) sb.append(',');
                sb.append(format(item));
                first = false;
            }
            return sb.append(']').toString();
        }
        return String.valueOf(value);
    }

    static String quote(String s) {
        return "\"" + s.replace("\\", "\\\\").replace("\"", "\\\"") + "\"";
    }
}
"#;

pub struct JavaTemplate;

impl JavaTemplate {
    fn type_name(ty: &ArgType) -> String {
        match ty {
            ArgType::Int => "int".to_string(),
            ArgType::Long => "long".to_string(),
            ArgType::Float => "double".to_string(),
            ArgType::Bool => "boolean".to_string(),
            ArgType::Str => "String".to_string(),
            ArgType::List(inner) => format!("{}[]", Self::type_name(inner)),
        }
    }

    /// Splits `import` lines from the body and drops any `package` line.
    fn split_imports(code: &str) -> (Vec<String>, String) {
        let mut imports = Vec::new();
        let mut body = Vec::new();
        for line in code.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("import ") && trimmed.ends_with(';') {
                imports.push(trimmed.to_string());
            } else if !(trimmed.starts_with("package ") && trimmed.ends_with(';')) {
                body.push(line);
            }
        }
        (imports, body.join("\n"))
    }
}

impl DriverTemplate for JavaTemplate {
    fn file_name(&self) -> &'static str {
        "Main.java"
    }

    fn entry_pattern(&self) -> &'static str {
        r"([A-Za-z_]\w*)\s*\([^;{}]*\)\s*(?:throws\s+[\w\s,.]+)?\{"
    }

    fn receiver(&self, _code: &str) -> Receiver {
        Receiver::Solution
    }

    fn literal(&self, ty: &ArgType, value: &Value) -> JudgeResult<String> {
        match ty {
            ArgType::Int => integer_text(value),
            ArgType::Long => Ok(format!("{}L", integer_text(value)?)),
            ArgType::Float => float_text(value),
            ArgType::Bool => bool_text(value),
            ArgType::Str => quoted(value),
            ArgType::List(inner) => {
                let items = list_items(value)?
                    .iter()
                    .map(|item| self.literal(inner, item))
                    .collect::<JudgeResult<Vec<_>>>()?;
                Ok(format!("new {}{{{}}}", Self::type_name(ty), items.join(", ")))
            }
        }
    }

    fn render(&self, code: &str, plan: &DriverPlan) -> JudgeResult<String> {
        let (imports, body) = Self::split_imports(code);

        let body = if has_word(&body, r"\bclass\s+Solution\b") {
            let public_class = Regex::new(r"\bpublic\s+((?:final\s+)?class\s+Solution\b)")
                .map_err(|e| JudgeError::Internal(e.to_string()))?;
            public_class.replace_all(&body, "$1").into_owned()
        } else {
            format!("class Solution {{\n{}\n}}", body.trim_end())
        };

        let mut out = String::from("import java.util.*;\n");
        for import in imports.iter().filter(|i| i.as_str() != "import java.util.*;") {
            out.push_str(import);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(body.trim_end());
        out.push_str("\n\npublic class Main {\n    public static void main(String[] args) {\n");
        for (name, ty, value) in plan.bindings() {
            out.push_str(&format!(
                "        {} {} = {};\n",
                Self::type_name(ty),
                name,
                self.literal(ty, value)?
            ));
        }
        out.push_str("        Solution solution = new Solution();\n");
        out.push_str(&format!(
            "        Object result = solution.{}({});\n",
            plan.signature.name,
            plan.argument_list()
        ));
        out.push_str("        System.out.println(JudgeFormat.format(result));\n");
        out.push_str("    }\n}\n\n");
        out.push_str(FORMATTER);
        Ok(out)
    }
}
