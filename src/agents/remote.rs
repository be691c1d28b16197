//! Remote agent functions
//!
//! Forwards a dispatch to the hosted agent function (`rag-agent` by
//! default) and hands its output back verbatim.

use super::{AgentInvoker, AgentOutput, AgentRequest, AgentTool};
use crate::error::{OrchestratorError, Result};
use crate::types::AgentId;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_FUNCTION: &str = "rag-agent";

#[derive(Debug, Serialize)]
struct FunctionRequest<'a> {
    agent_type: AgentId,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
    enabled_tools: &'a [AgentTool],
}

/// Invokes agents hosted as out-of-process functions over HTTP
#[derive(Clone)]
pub struct RemoteAgentInvoker {
    client: Arc<Client>,
    functions_url: String,
    function: String,
    token: Option<String>,
}

impl RemoteAgentInvoker {
    /// `timeout` bounds each dispatch; the workflow executor imposes none of its own
    pub fn new(functions_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: Arc::new(client),
            functions_url: functions_url.into().trim_end_matches('/').to_string(),
            function: DEFAULT_FUNCTION.to_string(),
            token: None,
        })
    }

    /// Call a different function than `rag-agent`
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    /// Bearer token sent with every call
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> String {
        self.endpoint_for(&self.function)
    }

    fn endpoint_for(&self, function: &str) -> String {
        format!("{}/{}", self.functions_url, function)
    }

    /// POST `body` to a function and return the raw success body. The error
    /// is the function's `{error}` message, or the status and body text.
    pub(crate) async fn post(
        &self,
        function: &str,
        body: &(impl Serialize + Sync),
    ) -> std::result::Result<String, String> {
        let mut req_builder = self.client.post(self.endpoint_for(function)).json(body);
        if let Some(token) = &self.token {
            req_builder = req_builder.bearer_auth(token);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("failed to read response: {}", e))?;

        if !status.is_success() {
            return Err(serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), crate::truncate_safe(&text, 200))));
        }
        Ok(text)
    }
}

#[async_trait]
impl AgentInvoker for RemoteAgentInvoker {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentOutput> {
        let agent = request.agent;
        let body = FunctionRequest {
            agent_type: agent,
            prompt: &request.prompt,
            conversation_id: request.conversation_id.as_deref(),
            enabled_tools: &request.enabled_tools,
        };

        debug!("Invoking {} via {}", agent, self.endpoint());

        let text = self.post(&self.function, &body).await.map_err(|message| {
            warn!("Agent {} call failed: {}", agent, message);
            OrchestratorError::agent_failed(agent, message)
        })?;

        parse_function_response(agent, &text)
    }
}

/// Split a function response into output, conversation id and metadata
pub fn parse_function_response(agent: AgentId, text: &str) -> Result<AgentOutput> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| OrchestratorError::agent_failed(agent, format!("malformed response: {}", e)))?;

    let Value::Object(mut fields) = value else {
        return Err(OrchestratorError::agent_failed(agent, "malformed response: expected a JSON object"));
    };

    let output = match fields.remove("output") {
        Some(Value::String(s)) => s,
        _ => return Err(OrchestratorError::agent_failed(agent, "malformed response: missing 'output'")),
    };
    let conversation_id = match fields.remove("conversation_id") {
        Some(Value::String(id)) => Some(id),
        _ => None,
    };

    Ok(AgentOutput {
        output,
        conversation_id,
        metadata: Value::Object(fields),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_wire_format() {
        let tools = [AgentTool::Calculator, AgentTool::DataAnalyzer];
        let body = FunctionRequest {
            agent_type: AgentId::MarketAnalyst,
            prompt: "pricing",
            conversation_id: None,
            enabled_tools: &tools,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["agent_type"], "market-analyst");
        assert_eq!(v["enabled_tools"], serde_json::json!(["calculator", "data_analyzer"]));
        assert!(v.get("conversation_id").is_none());
    }

    #[test]
    fn test_parse_function_response() {
        let text = r#"{"output": "done", "conversation_id": "c-1", "tool_usage": [], "memory": {"conversation_length": 2}}"#;
        let out = parse_function_response(AgentId::Content, text).unwrap();
        assert_eq!(out.output, "done");
        assert_eq!(out.conversation_id.as_deref(), Some("c-1"));
        assert_eq!(out.metadata["memory"]["conversation_length"], 2);
        assert!(out.metadata.get("output").is_none());
    }

    #[test]
    fn test_parse_function_response_malformed() {
        let err = parse_function_response(AgentId::Outreach, r#"{"result": "x"}"#).unwrap_err();
        assert!(matches!(err, OrchestratorError::AgentInvocationFailed { agent: AgentId::Outreach, .. }));
        assert!(parse_function_response(AgentId::Outreach, "[1,2]").is_err());
        assert!(parse_function_response(AgentId::Outreach, "<html>").is_err());
    }

    #[test]
    fn test_endpoint() {
        let invoker = RemoteAgentInvoker::new("https://fn.example.com/functions/v1/", Duration::from_secs(5))
            .unwrap()
            .with_function("intelligent-agent");
        assert_eq!(invoker.endpoint(), "https://fn.example.com/functions/v1/intelligent-agent");
    }
}
