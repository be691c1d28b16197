//! Reasoning traces in agent output
//!
//! In reasoning mode an agent is asked to structure its answer under fixed
//! markdown headers. This module holds the instructions that request that
//! layout and the parser that reads it back.

use serde::{Deserialize, Serialize};

/// Confidence assumed when the agent does not state one
pub const DEFAULT_CONFIDENCE: f32 = 0.80;

/// Appended to an agent's system prompt when reasoning mode is on
pub const REASONING_INSTRUCTIONS: &str = "REASONING MODE: ENABLED - Show your thinking step-by-step

When responding, structure your output as:

## Reasoning Chain
Step 1: [Understanding the request]
Step 2: [Analyzing available information]
Step 3: [Considering options]
Step 4: [Making recommendation]

## Sources Used
- [List knowledge referenced]

## Alternatives Considered
- Option A: [Description with pros/cons]
- Option B: [Description with pros/cons]
- Option C (Selected): [Why this was chosen]

## Confidence Score
[0-100]% confidence based on available data

## Main Output
[Your actual deliverable]";

/// The structured thinking an agent reported alongside its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTrace {
    pub chain: Vec<String>,
    pub alternatives: Vec<String>,
    pub sources: Vec<String>,
    /// 0.0 – 1.0
    pub confidence: f32,
}

/// Body of a `## <title>` section: everything after the header line up to
/// the next `\n## ` or the end of the text.
fn section<'a>(output: &'a str, title: &str) -> Option<&'a str> {
    let header = format!("## {}\n", title);
    let start = output.find(&header)? + header.len();
    let rest = &output[start..];
    let end = rest.find("\n## ").unwrap_or(rest.len());
    Some(&rest[..end])
}

fn bullets(body: &str) -> Vec<String> {
    body.lines()
        .filter(|l| l.trim().starts_with('-'))
        .map(|l| l.to_string())
        .collect()
}

/// Parse a reasoning trace. Returns `None` unless the output has a
/// `## Reasoning Chain` section.
pub fn parse_reasoning(output: &str) -> Option<ReasoningTrace> {
    if !output.contains("## Reasoning Chain") {
        return None;
    }

    let chain = section(output, "Reasoning Chain")
        .map(|body| {
            body.lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| l.to_string())
                .collect()
        })
        .unwrap_or_default();

    let alternatives = section(output, "Alternatives Considered").map(bullets).unwrap_or_default();
    let sources = section(output, "Sources Used").map(bullets).unwrap_or_default();

    let confidence = section(output, "Confidence Score")
        .and_then(|body| {
            let digits: String = body.chars().take_while(|c| c.is_ascii_digit()).collect();
            let rest = &body[digits.len()..];
            if digits.is_empty() || !rest.starts_with('%') {
                return None;
            }
            digits.parse::<u32>().ok()
        })
        .map(|pct| pct as f32 / 100.0)
        .unwrap_or(DEFAULT_CONFIDENCE);

    Some(ReasoningTrace { chain, alternatives, sources, confidence })
}

/// The deliverable under `## Main Output`, or the whole text if there is none
pub fn main_output(output: &str) -> &str {
    section(output, "Main Output").map(str::trim).unwrap_or(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "## Reasoning Chain
Step 1: Read the request

Step 2: Compare competitors
## Sources Used
- Prior market report
not a bullet
## Alternatives Considered
- Option A: premium pricing
- Option C (Selected): freemium
## Confidence Score
72% confidence based on available data
## Main Output
Go freemium.";

    #[test]
    fn test_parse_full_trace() {
        let trace = parse_reasoning(SAMPLE).unwrap();
        assert_eq!(trace.chain, vec!["Step 1: Read the request", "Step 2: Compare competitors"]);
        assert_eq!(trace.sources, vec!["- Prior market report"]);
        assert_eq!(trace.alternatives.len(), 2);
        assert!((trace.confidence - 0.72).abs() < f32::EPSILON);
        assert_eq!(main_output(SAMPLE), "Go freemium.");
    }

    #[test]
    fn test_no_reasoning_section() {
        assert!(parse_reasoning("Just an answer").is_none());
        assert_eq!(main_output("Just an answer"), "Just an answer");
    }

    #[test]
    fn test_confidence_defaults_when_unparseable() {
        let text = "## Reasoning Chain\nStep 1: x\n## Confidence Score\nhigh";
        let trace = parse_reasoning(text).unwrap();
        assert_eq!(trace.confidence, DEFAULT_CONFIDENCE);
        assert!(trace.alternatives.is_empty());
    }
}
