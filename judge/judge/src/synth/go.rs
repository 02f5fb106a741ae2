use super::{
    bool_text, float_text, integer_text, list_items, quoted, ArgType, DriverPlan, DriverTemplate,
    Receiver,
};
use crate::error::{JudgeError, JudgeResult};
use regex::Regex;
use serde_json::Value;

const DRIVER_IMPORTS: [&str; 2] = ["\"encoding/json\"", "\"fmt\""];

pub struct GoTemplate;

impl GoTemplate {
    fn type_name(ty: &ArgType) -> String {
        match ty {
            ArgType::Int | ArgType::Long => "int".to_string(),
            ArgType::Float => "float64".to_string(),
            ArgType::Bool => "bool".to_string(),
            ArgType::Str => "string".to_string(),
            ArgType::List(inner) => format!("[]{}", Self::type_name(inner)),
        }
    }

    /// Removes `package` and `import` declarations, returning the import specs.
    fn split_imports(code: &str) -> JudgeResult<(Vec<String>, String)> {
        let package = Regex::new(r"(?m)^\s*package\s+\w+\s*;?\s*$")
            .map_err(|e| JudgeError::Internal(e.to_string()))?;
        let block = Regex::new(r"(?s)\bimport\s*\((.*?)\)")
            .map_err(|e| JudgeError::Internal(e.to_string()))?;
        let single = Regex::new(r#"(?m)^\s*import\s+((?:[\w.]+\s+)?"[^"]+")\s*;?\s*$"#)
            .map_err(|e| JudgeError::Internal(e.to_string()))?;

        let mut specs = Vec::new();
        let code = package.replace_all(code, "");

        for caps in block.captures_iter(&code) {
            if let Some(inner) = caps.get(1) {
                specs.extend(
                    inner
                        .as_str()
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty() && !line.starts_with("//"))
                        .map(str::to_string),
                );
            }
        }
        let code = block.replace_all(&code, "");

        for caps in single.captures_iter(&code) {
            if let Some(spec) = caps.get(1) {
                specs.push(spec.as_str().trim().to_string());
            }
        }
        let code = single.replace_all(&code, "");

        Ok((specs, code.trim().to_string()))
    }
}

impl DriverTemplate for GoTemplate {
    fn file_name(&self) -> &'static str {
        "main.go"
    }

    fn entry_pattern(&self) -> &'static str {
        r"\bfunc\s+([A-Za-z_]\w*)\s*\("
    }

    fn receiver(&self, _code: &str) -> Receiver {
        Receiver::Free
    }

    fn literal(&self, ty: &ArgType, value: &Value) -> JudgeResult<String> {
        match ty {
            ArgType::Int | ArgType::Long => integer_text(value),
            ArgType::Float => float_text(value),
            ArgType::Bool => bool_text(value),
            ArgType::Str => quoted(value),
            ArgType::List(inner) => {
                let items = list_items(value)?
                    .iter()
                    .map(|item| self.literal(inner, item))
                    .collect::<JudgeResult<Vec<_>>>()?;
                Ok(format!("{}{{{}}}", Self::type_name(ty), items.join(", ")))
            }
        }
    }

    fn render(&self, code: &str, plan: &DriverPlan) -> JudgeResult<String> {
        let (user_imports, body) = Self::split_imports(code)?;

        let mut imports: Vec<String> = DRIVER_IMPORTS.iter().map(|s| s.to_string()).collect();
        for spec in user_imports {
            if !imports.contains(&spec) {
                imports.push(spec);
            }
        }

        let mut out = String::from("package main\n\nimport (\n");
        for spec in &imports {
            out.push_str(&format!("\t{spec}\n"));
        }
        out.push_str(")\n\n");
        out.push_str(&body);
        out.push_str("\n\nfunc main() {\n");
        for (name, ty, value) in plan.bindings() {
            out.push_str(&format!(
                "\tvar {} {} = {}\n",
                name,
                Self::type_name(ty),
                self.literal(ty, value)?
            ));
        }
        out.push_str(&format!(
            "\tresult := {}({})\n",
            plan.signature.name,
            plan.argument_list()
        ));
        out.push_str("\tout, err := json.Marshal(result)\n");
        out.push_str("\tif err != nil {\n\t\tfmt.Println(result)\n\t\treturn\n\t}\n");
        out.push_str("\tfmt.Println(string(out))\n}\n");
        Ok(out)
    }
}
