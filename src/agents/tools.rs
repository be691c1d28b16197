//! Tools an LLM-backed agent may call
//!
//! Agents request a tool by writing `TOOL_CALL: name | input` on its own
//! line; [`apply_tool_calls`] runs each call and splices the result back
//! into the agent's output.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static TOOL_CALL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"TOOL_CALL:\s*(\w+)\s*\|\s*(.+)").expect("valid tool call regex"));

/// A locally executed agent tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentTool {
    Calculator,
    WebSearch,
    DataAnalyzer,
}

impl AgentTool {
    pub const ALL: [AgentTool; 3] = [AgentTool::Calculator, AgentTool::WebSearch, AgentTool::DataAnalyzer];

    pub fn name(&self) -> &'static str {
        match self {
            AgentTool::Calculator => "calculator",
            AgentTool::WebSearch => "web_search",
            AgentTool::DataAnalyzer => "data_analyzer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentTool::Calculator => {
                "Performs mathematical calculations. Input should be a math expression like '1000 * 12 / 365'"
            }
            AgentTool::WebSearch => "Searches the web for current information. Input should be a search query.",
            AgentTool::DataAnalyzer => "Analyzes JSON data and extracts insights. Input should be valid JSON.",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        AgentTool::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// Run the tool. Failures are reported in the returned text, never raised.
    pub fn execute(&self, input: &str) -> String {
        match self {
            AgentTool::Calculator => match evaluate_expression(input) {
                Ok(value) => format!("Calculation result: {}", value),
                Err(e) => format!("Error in calculation: {}", e),
            },
            AgentTool::WebSearch => format!(
                "[Web search for \"{}\" is not connected to a search provider; no live results available.]",
                input
            ),
            AgentTool::DataAnalyzer => analyze_json(input),
        }
    }
}

/// Record of one tool call made while expanding an agent's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUsage {
    pub tool: String,
    pub input: String,
    pub result: String,
}

/// The tool section appended to an agent prompt, empty when no tools are enabled
pub fn tools_prompt(enabled: &[AgentTool]) -> String {
    if enabled.is_empty() {
        return String::new();
    }
    let lines = enabled
        .iter()
        .map(|t| format!("- {}: {}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "\n\nAvailable tools:\n{}\n\nTo use a tool, respond with: TOOL_CALL: tool_name | input",
        lines
    )
}

/// Replace every `TOOL_CALL:` line for an enabled tool with its result.
/// Calls naming unknown or disabled tools are left in place.
pub fn apply_tool_calls(output: &str, enabled: &[AgentTool]) -> (String, Vec<ToolUsage>) {
    let mut expanded = output.to_string();
    let mut usage = Vec::new();

    for caps in TOOL_CALL_PATTERN.captures_iter(output) {
        let full = &caps[0];
        let name = &caps[1];
        let input = caps[2].trim();

        let Some(tool) = AgentTool::parse(name).filter(|t| enabled.contains(t)) else {
            debug!("Ignoring call to unavailable tool '{}'", name);
            continue;
        };

        debug!("Executing tool: {}", name);
        let result = tool.execute(input);
        expanded = expanded.replacen(full, &format!("[Tool: {}]\n{}", name, result), 1);
        usage.push(ToolUsage {
            tool: name.to_string(),
            input: input.to_string(),
            result,
        });
    }

    (expanded, usage)
}

fn analyze_json(input: &str) -> String {
    let data: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => return format!("Error analyzing data: {}", e),
    };

    let (kind, length, keys) = match &data {
        Value::Array(items) => ("array", items.len(), "N/A".to_string()),
        Value::Object(map) => (
            "object",
            map.len(),
            map.keys().cloned().collect::<Vec<_>>().join(", "),
        ),
        Value::String(_) => ("string", 0, String::new()),
        Value::Number(_) => ("number", 0, String::new()),
        Value::Bool(_) => ("boolean", 0, String::new()),
        Value::Null => ("null", 0, String::new()),
    };

    let analysis = serde_json::json!({
        "type": kind,
        "length": length,
        "keys": keys,
        "summary": format!("Analyzed {} with {} items", kind, length),
    });
    serde_json::to_string_pretty(&analysis).unwrap_or_else(|_| analysis.to_string())
}

/// Evaluate `+ - * /` arithmetic with parentheses. Characters outside
/// digits, operators, parentheses, `.` and whitespace are dropped first.
pub fn evaluate_expression(input: &str) -> Result<f64, String> {
    let sanitized: Vec<char> = input
        .chars()
        .filter(|c| c.is_ascii_digit() || c.is_whitespace() || "+-*/().".contains(*c))
        .collect();
    if sanitized.iter().all(|c| c.is_whitespace()) {
        return Err("empty expression".to_string());
    }

    let mut parser = ExprParser { chars: &sanitized, pos: 0, depth: 0 };
    let value = parser.expr()?;
    if let Some(c) = parser.peek() {
        return Err(format!("unexpected '{}'", c));
    }
    if !value.is_finite() {
        return Err("result is not a finite number".to_string());
    }
    Ok(value)
}

/// Deepest run of parentheses or unary signs the calculator accepts
const MAX_NESTING: usize = 256;

struct ExprParser<'a> {
    chars: &'a [char],
    pos: usize,
    depth: usize,
}

impl ExprParser<'_> {
    /// Next non-whitespace character, without consuming it
    fn peek(&mut self) -> Option<char> {
        while matches!(self.chars.get(self.pos), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.chars.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            if op == '+' { value += rhs } else { value -= rhs }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '*' { value *= rhs } else { value /= rhs }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, String> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err("expression nested too deeply".to_string());
        }
        let value = self.unary();
        self.depth -= 1;
        value
    }

    fn unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some('+') => {
                self.pos += 1;
                self.factor()
            }
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek() != Some(')') {
                    return Err("missing ')'".to_string());
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(format!("unexpected '{}'", c)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while matches!(self.chars.get(self.pos), Some(c) if c.is_ascii_digit() || *c == '.') {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>().map_err(|_| format!("invalid number '{}'", text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculator_precedence_and_parens() {
        assert_eq!(evaluate_expression("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate_expression("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate_expression("-(4 - 10) / 2").unwrap(), 3.0);
        assert_eq!(evaluate_expression("1000 * 12 / 365").unwrap(), 1000.0 * 12.0 / 365.0);
    }

    #[test]
    fn test_calculator_strips_foreign_characters() {
        // "$1,200 x 3" sanitizes to "1200  3", two numbers with no operator
        assert!(evaluate_expression("$1,200 x 3").is_err());
        assert_eq!(evaluate_expression("$1200 * 3 dollars").unwrap(), 3600.0);
    }

    #[test]
    fn test_calculator_errors() {
        assert!(evaluate_expression("").is_err());
        assert!(evaluate_expression("(1 + 2").is_err());
        assert!(evaluate_expression("1 / 0").is_err());
        assert!(evaluate_expression("1 +").is_err());
    }

    #[test]
    fn test_calculator_rejects_deep_nesting() {
        let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate_expression(&shallow).unwrap(), 1.0);

        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(evaluate_expression(&deep).unwrap_err(), "expression nested too deeply");

        let negations = format!("{}7", "-".repeat(200_000));
        assert_eq!(evaluate_expression(&negations).unwrap_err(), "expression nested too deeply");

        let output = format!("TOOL_CALL: calculator | {}", deep);
        let (expanded, usage) = apply_tool_calls(&output, &AgentTool::ALL);
        assert_eq!(expanded, "[Tool: calculator]\nError in calculation: expression nested too deeply");
        assert_eq!(usage.len(), 1);
    }

    #[test]
    fn test_calculator_tool_output() {
        assert_eq!(AgentTool::Calculator.execute("6 * 7"), "Calculation result: 42");
        assert!(AgentTool::Calculator.execute("((").starts_with("Error in calculation:"));
    }

    #[test]
    fn test_data_analyzer() {
        let out = AgentTool::DataAnalyzer.execute(r#"{"b": 1, "a": 2}"#);
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["type"], "object");
        assert_eq!(v["length"], 2);
        assert_eq!(v["keys"], "a, b");

        let out = AgentTool::DataAnalyzer.execute("[1, 2, 3]");
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["type"], "array");
        assert_eq!(v["summary"], "Analyzed array with 3 items");

        assert!(AgentTool::DataAnalyzer.execute("not json").starts_with("Error analyzing data:"));
    }

    #[test]
    fn test_apply_tool_calls_expands_enabled_tools() {
        let output = "Let me compute.\nTOOL_CALL: calculator | 2 * 21\nDone.";
        let (expanded, usage) = apply_tool_calls(output, &AgentTool::ALL);
        assert_eq!(expanded, "Let me compute.\n[Tool: calculator]\nCalculation result: 42\nDone.");
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].input, "2 * 21");
    }

    #[test]
    fn test_apply_tool_calls_skips_disabled_and_unknown() {
        let output = "TOOL_CALL: calculator | 1 + 1\nTOOL_CALL: teleport | mars";
        let (expanded, usage) = apply_tool_calls(output, &[AgentTool::WebSearch]);
        assert_eq!(expanded, output);
        assert!(usage.is_empty());
    }

    #[test]
    fn test_tools_prompt() {
        assert_eq!(tools_prompt(&[]), "");
        let prompt = tools_prompt(&[AgentTool::WebSearch]);
        assert!(prompt.contains("- web_search: Searches the web"));
        assert!(prompt.ends_with("TOOL_CALL: tool_name | input"));
    }
}
