use super::{
    bool_text, float_text, has_word, integer_text, list_items, quoted, ArgType, DriverPlan,
    DriverTemplate, Receiver,
};
use crate::error::JudgeResult;
use serde_json::Value;

const PRELUDE: &str = r#"#include <bits/stdc++.h>
using namespace std;

namespace judge_io {
inline void print(std::ostream& os, const std::string& v) {
    os << '"';
    for (char c : v) {
        if (c == '"' || c == '\\') os << '\\';
        os << c;
    }
    os << '"';
}
inline void print(std::ostream& os, const char* v) { print(os, std::string(v)); }
inline void print(std::ostream& os, char v) { print(os, std::string(1, v)); }
inline void print(std::ostream& os, bool v) { os << (v ? "true" : "false"); }
inline void print(std::ostream& os, double v) { os << std::setprecision(15) << v; }
template <typename T> void print(std::ostream& os, const T& v) { os << v; }
template <typename T> void print(std::ostream& os, const std::vector<T>& v) {
    os << '[';
    for (size_t i = 0; i < v.size(); ++i) {
        if (i) os << ',';
        const T& item = v[i];
        print(os, item);
    }
    os << ']';
}
}
"#;

pub struct CppTemplate;

impl CppTemplate {
    fn type_name(ty: &ArgType) -> String {
        match ty {
            ArgType::Int => "int".to_string(),
            ArgType::Long => "long long".to_string(),
            ArgType::Float => "double".to_string(),
            ArgType::Bool => "bool".to_string(),
            ArgType::Str => "string".to_string(),
            ArgType::List(inner) => format!("vector<{}>", Self::type_name(inner)),
        }
    }
}

impl DriverTemplate for CppTemplate {
    fn file_name(&self) -> &'static str {
        "main.cpp"
    }

    fn entry_pattern(&self) -> &'static str {
        r"([A-Za-z_]\w*)\s*\([^;{}]*\)\s*(?:const\s*)?\{"
    }

    fn receiver(&self, code: &str) -> Receiver {
        if has_word(code, r"\b(class|struct)\s+Solution\b") {
            Receiver::Solution
        } else {
            Receiver::Free
        }
    }

    fn literal(&self, ty: &ArgType, value: &Value) -> JudgeResult<String> {
        match ty {
            ArgType::Int => integer_text(value),
            ArgType::Long => Ok(format!("{}LL", integer_text(value)?)),
            ArgType::Float => float_text(value),
            ArgType::Bool => bool_text(value),
            ArgType::Str => Ok(format!("string({})", quoted(value)?)),
            ArgType::List(inner) => {
                let items = list_items(value)?
                    .iter()
                    .map(|item| self.literal(inner, item))
                    .collect::<JudgeResult<Vec<_>>>()?;
                Ok(format!("{{{}}}", items.join(", ")))
            }
        }
    }

    fn render(&self, code: &str, plan: &DriverPlan) -> JudgeResult<String> {
        let mut main = String::from("int main() {\n");
        for (name, ty, value) in plan.bindings() {
            main.push_str(&format!(
                "    {} {} = {};\n",
                Self::type_name(ty),
                name,
                self.literal(ty, value)?
            ));
        }

        let call = match plan.receiver {
            Receiver::Solution => {
                main.push_str("    Solution solution;\n");
                format!("solution.{}({})", plan.signature.name, plan.argument_list())
            }
            Receiver::Free => format!("{}({})", plan.signature.name, plan.argument_list()),
        };
        main.push_str(&format!("    auto result = {call};\n"));
        main.push_str("    judge_io::print(std::cout, result);\n");
        main.push_str("    std::cout << std::endl;\n");
        main.push_str("    return 0;\n}\n");

        Ok(format!("{PRELUDE}\n{}\n\n{main}", code.trim_end()))
    }
}

#[cfg(test)]
mod tests {
    use crate::synth::synthesize;
    use crate::types::Language;

    #[test]
    fn test_solution_class_driver() {
        let code = concat!(
            "class Solution {\n",
            "public:\n",
            "    vector<int> twoSum(vector<int>& nums, int target) {\n",
            "        return {0, 1};\n",
            "    }\n",
            "};",
        );
        let file = synthesize(Language::Cpp, code, Some("twoSum"), "[2,7,11,15], 9").unwrap();
        assert_eq!(file.name, "main.cpp");
        assert!(file.content.starts_with("#include <bits/stdc++.h>"));
        assert!(file.content.contains("vector<int> arg0 = {2, 7, 11, 15};"));
        assert!(file.content.contains("int arg1 = 9;"));
        assert!(file.content.contains("auto result = solution.twoSum(arg0, arg1);"));
    }

    #[test]
    fn test_free_function_with_nested_strings() {
        let code = "int count(vector<vector<string>> grid) { return grid.size(); }";
        let file = synthesize(Language::Cpp, code, None, "[[\"a\"],[\"b\",\"c\"]]").unwrap();
        assert!(file.content.contains(
            "vector<vector<string>> arg0 = {{string(\"a\")}, {string(\"b\"), string(\"c\")}};"
        ));
        assert!(file.content.contains("auto result = count(arg0);"));
        assert!(!file.content.contains("Solution solution;"));
    }

    #[test]
    fn test_long_and_float_literals() {
        let code = "double f(long long a, double b) { return b; }";
        let file = synthesize(Language::Cpp, code, Some("f"), "3000000000, 2").unwrap();
        assert!(file.content.contains("long long arg0 = 3000000000LL;"));
        assert!(file.content.contains("int arg1 = 2;"));
    }
}
