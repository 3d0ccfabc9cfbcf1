//! Core answer-generation loop implementation.

use std::sync::Arc;

use thiserror::Error;

use crate::llm::{
    CompletionClient, ContentBlock, LlmError, MessageParam, MessagesRequest, Role, StopReason,
    ToolChoice, ToolDefinition,
};
use crate::tools::{ToolError, ToolManager};

use super::prompt::build_system_content;

/// Maximum number of tool-execution rounds per query. The call after the
/// final permitted round omits the tool parameters entirely, forcing a text
/// answer, so a query makes at most `MAX_TOOL_ROUNDS + 1` API calls.
const MAX_TOOL_ROUNDS: usize = 2;

/// Fixed output budget per completion call.
const MAX_TOKENS: u32 = 800;

/// Deterministic sampling for reproducible answers.
const TEMPERATURE: f32 = 0.0;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("model requested unknown tool: {0}")]
    UnknownTool(String),

    #[error("completion API returned no text content")]
    NoTextContent,
}

/// Drives multi-round exchanges with the completion API, executing tool
/// requests between rounds.
pub struct AnswerGenerator {
    client: Arc<dyn CompletionClient>,
    model: String,
}

impl AnswerGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, model: String) -> Self {
        Self { client, model }
    }

    /// Generate a final answer for `query`.
    ///
    /// Tool definitions and the dispatch target are optional and independent:
    /// definitions without a manager mean any tool-use response falls back to
    /// its leading text block.
    pub async fn generate(
        &self,
        query: &str,
        conversation_history: Option<&str>,
        tools: Option<&[ToolDefinition]>,
        tool_manager: Option<&ToolManager>,
    ) -> Result<String, GenerateError> {
        let system = build_system_content(conversation_history);
        let mut messages = vec![MessageParam::user_text(query)];
        let mut rounds = 0;

        loop {
            let offered_tools = if rounds < MAX_TOOL_ROUNDS { tools } else { None };

            let request = MessagesRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                max_tokens: MAX_TOKENS,
                temperature: TEMPERATURE,
                system: system.clone(),
                tools: offered_tools.map(|definitions| definitions.to_vec()),
                tool_choice: offered_tools.map(|_| ToolChoice::Auto),
            };

            let response = self.client.create_message(request).await?;

            let dispatch = match tool_manager {
                Some(manager)
                    if offered_tools.is_some()
                        && response.stop_reason == Some(StopReason::ToolUse) =>
                {
                    manager
                }
                // Terminal: no tool round to run. With no dispatch available a
                // mixed response resolves to its leading text block.
                _ => return Self::first_text(response.content),
            };

            messages.push(MessageParam {
                role: Role::Assistant,
                content: response.content.clone(),
            });

            let mut results = Vec::new();
            for block in &response.content {
                let ContentBlock::ToolUse { id, name, input } = block else {
                    continue;
                };
                tracing::debug!(tool = %name, round = rounds, "executing requested tool");

                let content = match dispatch.execute_tool(name, input.clone()).await {
                    Ok(output) => output,
                    Err(ToolError::UnknownTool(tool)) => {
                        return Err(GenerateError::UnknownTool(tool))
                    }
                    Err(err @ ToolError::Execution(_)) => {
                        tracing::warn!(tool = %name, error = %err, "tool execution failed");
                        format!("Tool execution error: {}", err)
                    }
                };
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content,
                });
            }

            messages.push(MessageParam {
                role: Role::User,
                content: results,
            });
            rounds += 1;
        }
    }

    fn first_text(content: Vec<ContentBlock>) -> Result<String, GenerateError> {
        content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                _ => None,
            })
            .ok_or(GenerateError::NoTextContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SYSTEM_PROMPT;
    use crate::llm::MessagesResponse;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedClient {
        responses: Mutex<VecDeque<MessagesResponse>>,
        requests: Mutex<Vec<MessagesRequest>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<MessagesResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<MessagesRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn create_message(
            &self,
            request: MessagesRequest,
        ) -> Result<MessagesResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::Api {
                    status: 500,
                    message: "script exhausted".to_string(),
                })
        }
    }

    fn text_response(text: &str) -> MessagesResponse {
        MessagesResponse {
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
            stop_reason: Some(StopReason::EndTurn),
        }
    }

    fn tool_response(id: &str, name: &str, input: Value) -> MessagesResponse {
        MessagesResponse {
            content: vec![ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input,
            }],
            stop_reason: Some(StopReason::ToolUse),
        }
    }

    struct StubTool {
        name: &'static str,
        outputs: Mutex<VecDeque<anyhow::Result<String>>>,
        calls: Mutex<Vec<Value>>,
    }

    impl StubTool {
        fn returning(name: &'static str, outputs: Vec<anyhow::Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                outputs: Mutex::new(outputs.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "stub"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, args: Value) -> anyhow::Result<String> {
            self.calls.lock().unwrap().push(args);
            self.outputs
                .lock()
                .unwrap()
                .pop_front()
                .expect("stub tool invoked more times than scripted")
        }
    }

    fn manager_with(tool: Arc<StubTool>) -> ToolManager {
        let mut manager = ToolManager::new();
        manager.register(tool);
        manager
    }

    fn definitions(manager: &ToolManager) -> Vec<ToolDefinition> {
        manager.definitions()
    }

    #[tokio::test]
    async fn direct_response_makes_one_call() {
        let client = ScriptedClient::new(vec![text_response("Hello!")]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());

        let answer = generator.generate("hi", None, None, None).await.unwrap();

        assert_eq!(answer, "Hello!");
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn base_params_always_included() {
        let client = ScriptedClient::new(vec![text_response("ok")]);
        let generator = AnswerGenerator::new(client.clone(), "test-model".to_string());

        generator.generate("q", None, None, None).await.unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.model, "test-model");
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_tokens, 800);
    }

    #[tokio::test]
    async fn tools_are_offered_with_auto_choice() {
        let client = ScriptedClient::new(vec![text_response("ok")]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());
        let manager = manager_with(StubTool::returning("search", vec![]));
        let defs = definitions(&manager);

        generator
            .generate("q", None, Some(&defs), Some(&manager))
            .await
            .unwrap();

        let value = serde_json::to_value(&client.requests()[0]).unwrap();
        assert_eq!(value["tools"], serde_json::to_value(&defs).unwrap());
        assert_eq!(value["tool_choice"], json!({"type": "auto"}));
    }

    #[tokio::test]
    async fn no_tools_means_no_tool_keys() {
        let client = ScriptedClient::new(vec![text_response("ok")]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());

        generator.generate("q", None, None, None).await.unwrap();

        let value = serde_json::to_value(&client.requests()[0]).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("tools"));
        assert!(!object.contains_key("tool_choice"));
    }

    #[tokio::test]
    async fn history_is_appended_to_system_prompt() {
        let client = ScriptedClient::new(vec![text_response("ok")]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());

        generator
            .generate("q", Some("User: hi\nAssistant: hello"), None, None)
            .await
            .unwrap();

        let request = &client.requests()[0];
        assert!(request.system.starts_with(SYSTEM_PROMPT));
        assert!(request
            .system
            .ends_with("\n\nPrevious conversation:\nUser: hi\nAssistant: hello"));
    }

    #[tokio::test]
    async fn absent_or_empty_history_uses_plain_system_prompt() {
        let client = ScriptedClient::new(vec![text_response("ok"), text_response("ok")]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());

        generator.generate("q", None, None, None).await.unwrap();
        generator.generate("q", Some(""), None, None).await.unwrap();

        for request in client.requests() {
            assert_eq!(request.system, SYSTEM_PROMPT);
        }
    }

    #[tokio::test]
    async fn tool_use_round_trip() {
        let client = ScriptedClient::new(vec![
            tool_response("t42", "search", json!({"query": "rag"})),
            text_response("Final answer"),
        ]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());
        let tool = StubTool::returning("search", vec![Ok("result_text".to_string())]);
        let manager = manager_with(tool.clone());
        let defs = definitions(&manager);

        let answer = generator
            .generate("q", None, Some(&defs), Some(&manager))
            .await
            .unwrap();

        assert_eq!(answer, "Final answer");
        assert_eq!(
            tool.calls.lock().unwrap().clone(),
            vec![json!({"query": "rag"})]
        );

        // The follow-up call ends with the echoed tool result.
        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        let last_message = requests[1].messages.last().unwrap();
        assert_eq!(last_message.role, Role::User);
        assert_eq!(
            last_message.content,
            vec![ContentBlock::ToolResult {
                tool_use_id: "t42".to_string(),
                content: "result_text".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn followup_call_after_first_round_still_offers_tools() {
        let client = ScriptedClient::new(vec![
            tool_response("t1", "search", json!({"query": "x"})),
            text_response("done"),
        ]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());
        let manager = manager_with(StubTool::returning("search", vec![Ok("res".to_string())]));
        let defs = definitions(&manager);

        generator
            .generate("q", None, Some(&defs), Some(&manager))
            .await
            .unwrap();

        let value = serde_json::to_value(&client.requests()[1]).unwrap();
        assert_eq!(value["tools"], serde_json::to_value(&defs).unwrap());
        assert_eq!(value["tool_choice"], json!({"type": "auto"}));
    }

    #[tokio::test]
    async fn two_rounds_then_forced_text_round() {
        let client = ScriptedClient::new(vec![
            tool_response("t1", "outline", json!({"course_name": "MCP"})),
            tool_response("t2", "search", json!({"query": "lesson 3"})),
            text_response("Combined answer"),
        ]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());
        let outline = StubTool::returning("outline", vec![Ok("outline data".to_string())]);
        let search = StubTool::returning("search", vec![Ok("content data".to_string())]);
        let mut manager = ToolManager::new();
        manager.register(outline.clone());
        manager.register(search.clone());
        let defs = definitions(&manager);

        let answer = generator
            .generate("q", None, Some(&defs), Some(&manager))
            .await
            .unwrap();

        assert_eq!(answer, "Combined answer");
        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(outline.calls.lock().unwrap().len(), 1);
        assert_eq!(search.calls.lock().unwrap().len(), 1);

        // Final forced round carries no tool parameters.
        let value = serde_json::to_value(&requests[2]).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("tools"));
        assert!(!object.contains_key("tool_choice"));

        // Accumulated sequence: user, assistant, user, assistant, user.
        let roles: Vec<Role> = requests[2]
            .messages
            .iter()
            .map(|message| message.role)
            .collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant, Role::User]
        );
    }

    #[tokio::test]
    async fn endless_tool_requests_are_bounded_to_three_calls() {
        let client = ScriptedClient::new(vec![
            tool_response("t1", "search", json!({})),
            tool_response("t2", "search", json!({})),
            tool_response("t3", "search", json!({})),
        ]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());
        let manager = manager_with(StubTool::returning(
            "search",
            vec![Ok("r1".to_string()), Ok("r2".to_string())],
        ));
        let defs = definitions(&manager);

        let result = generator
            .generate("q", None, Some(&defs), Some(&manager))
            .await;

        // The third response has no text block and its tool request is not
        // honored, so the loop terminates with NoTextContent.
        assert!(matches!(result, Err(GenerateError::NoTextContent)));
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn dispatch_failure_becomes_tool_result_text() {
        let client = ScriptedClient::new(vec![
            tool_response("t1", "search", json!({"query": "x"})),
            text_response("handled error"),
        ]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());
        let manager = manager_with(StubTool::returning(
            "search",
            vec![Err(anyhow::anyhow!("connection failed"))],
        ));
        let defs = definitions(&manager);

        let answer = generator
            .generate("q", None, Some(&defs), Some(&manager))
            .await
            .unwrap();

        assert_eq!(answer, "handled error");
        let requests = client.requests();
        let last_message = requests[1].messages.last().unwrap();
        assert_eq!(
            last_message.content,
            vec![ContentBlock::ToolResult {
                tool_use_id: "t1".to_string(),
                content: "Tool execution error: connection failed".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn unknown_tool_fails_loudly() {
        let client = ScriptedClient::new(vec![tool_response("t1", "nope", json!({}))]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());
        let manager = manager_with(StubTool::returning("search", vec![]));
        let defs = definitions(&manager);

        let result = generator
            .generate("q", None, Some(&defs), Some(&manager))
            .await;

        assert!(matches!(result, Err(GenerateError::UnknownTool(name)) if name == "nope"));
    }

    #[tokio::test]
    async fn tool_use_without_dispatch_returns_leading_text() {
        let client = ScriptedClient::new(vec![MessagesResponse {
            content: vec![
                ContentBlock::Text {
                    text: "fallback text".to_string(),
                },
                ContentBlock::ToolUse {
                    id: "t1".to_string(),
                    name: "search".to_string(),
                    input: json!({"q": "x"}),
                },
            ],
            stop_reason: Some(StopReason::ToolUse),
        }]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());
        let manager = manager_with(StubTool::returning("search", vec![]));
        let defs = definitions(&manager);

        let answer = generator
            .generate("q", None, Some(&defs), None)
            .await
            .unwrap();

        assert_eq!(answer, "fallback text");
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn no_tool_use_means_no_dispatch() {
        let client = ScriptedClient::new(vec![text_response("direct answer")]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());
        let tool = StubTool::returning("search", vec![]);
        let manager = manager_with(tool.clone());
        let defs = definitions(&manager);

        let answer = generator
            .generate("q", None, Some(&defs), Some(&manager))
            .await
            .unwrap();

        assert_eq!(answer, "direct answer");
        assert_eq!(client.requests().len(), 1);
        assert!(tool.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let client = ScriptedClient::new(vec![]);
        let generator = AnswerGenerator::new(client.clone(), "m".to_string());

        let result = generator.generate("q", None, None, None).await;

        assert!(matches!(
            result,
            Err(GenerateError::Llm(LlmError::Api { status: 500, .. }))
        ));
    }
}
