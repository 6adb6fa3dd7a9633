//! Chat messages and the tool-calling conversation loop
//!
//! Messages use the OpenAI chat-completions shape so they can be sent to
//! the completion service and stored without conversion.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use esd_discrepancy_core::{DiscrepancyRegistry, DiscrepancyReport, ToolSet};

use crate::services::{CompletionError, CompletionRequest, CompletionService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant turn that only requests tool calls
    pub fn tool_request(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Nothing to send: no text and no tool calls
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().map_or(true, str::is_empty) && self.tool_calls.is_empty()
    }
}

/// A function call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: &Value) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as the wire format carries them
    #[serde(default)]
    pub arguments: String,
}

/// Drop messages with nothing in them
pub fn filter_empty(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    messages.into_iter().filter(|m| !m.is_empty()).collect()
}

/// Result of one chat turn
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    /// Messages produced during the turn: assistant replies and tool results
    pub messages: Vec<ChatMessage>,
    pub reports: Vec<DiscrepancyReport>,
}

/// Runs the completion/tool-execution loop for one user turn
pub struct Conversation<'a> {
    pub completion: &'a dyn CompletionService,
    pub registry: &'a RwLock<DiscrepancyRegistry>,
    pub tools: &'a ToolSet,
    pub system_prompt: &'a str,
    pub max_tool_rounds: u32,
}

impl Conversation<'_> {
    /// Send `history` to the model and execute any tool calls it makes
    ///
    /// Stops when the model answers without tool calls or after
    /// `max_tool_rounds` rounds of tool execution.
    pub async fn run(&self, history: &[ChatMessage]) -> Result<TurnOutcome, CompletionError> {
        let definitions: Vec<_> = self.tools.definitions().cloned().collect();
        let mut context = history.to_vec();
        let mut outcome = TurnOutcome::default();

        for round in 0..=self.max_tool_rounds {
            let reply = self
                .completion
                .complete(CompletionRequest {
                    system: self.system_prompt.to_string(),
                    messages: context.clone(),
                    tools: definitions.clone(),
                })
                .await?;

            let calls = reply.tool_calls.clone();
            context.push(reply.clone());
            outcome.messages.push(reply);

            if calls.is_empty() {
                return Ok(outcome);
            }

            for call in &calls {
                let result = self.execute(call, &mut outcome.reports).await;
                let message = ChatMessage::tool_result(&call.id, result.to_string());
                context.push(message.clone());
                outcome.messages.push(message);
            }

            if round == self.max_tool_rounds {
                tracing::warn!(
                    rounds = self.max_tool_rounds,
                    "Tool round limit reached; ending turn"
                );
            }
        }

        Ok(outcome)
    }

    async fn execute(&self, call: &ToolCall, reports: &mut Vec<DiscrepancyReport>) -> Value {
        let name = call.function.name.as_str();
        let arguments = if call.function.arguments.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&call.function.arguments) {
                Ok(arguments) => arguments,
                Err(e) => {
                    tracing::warn!(tool = name, error = %e, "Unparseable tool arguments");
                    return json!({
                        "status": "error",
                        "code": "INVALID_ARGUMENTS",
                        "message": format!("arguments are not valid JSON: {}", e),
                    });
                }
            }
        };

        let registry = self.registry.read().await;
        match self.tools.invoke(&registry, name, &arguments) {
            Ok(report) => {
                let value = json!(report);
                reports.push(report);
                value
            }
            Err(e) => {
                tracing::warn!(tool = name, code = e.code(), error = %e, "Tool call rejected");
                json!({ "status": "error", "code": e.code(), "message": e.to_string() })
            }
        }
    }
}
