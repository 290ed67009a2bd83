use crate::config::ProviderConfig;
use crate::error::{Result, WorklogError};
use crate::prompts;
use crate::tool_registry::ToolRegistry;
use crate::types::{AgentEvent, Message, Role, ToolCall, ToolOutput, ToolSchema};

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolArgs, ChatCompletionToolType, CreateChatCompletionRequestArgs,
    FunctionObjectArgs,
};
use async_openai::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Maximum number of tool-calling iterations before we force a text response.
const MAX_TOOL_ITERATIONS: usize = 10;

/// Orchestrates LLM calls and tool execution for the chat assistant.
pub struct AgentLoop {
    client: Client<OpenAIConfig>,
    provider: ProviderConfig,
    tool_registry: Arc<ToolRegistry>,
}

impl AgentLoop {
    pub fn new(provider: ProviderConfig, tool_registry: Arc<ToolRegistry>) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_base(&provider.api_base)
            .with_api_key(
                provider
                    .api_key
                    .clone()
                    .unwrap_or_else(|| "not-needed".to_string()),
            );

        let client = Client::with_config(openai_config);
        Self {
            client,
            provider,
            tool_registry,
        }
    }

    /// Run the assistant for a single user turn. Takes the full message
    /// history and returns every message the turn produced (assistant
    /// tool-call turns, tool results, and the final text), sending streaming
    /// events to the channel along the way. Callers keep the whole
    /// transcript so follow-up questions can reference earlier tool output
    /// without re-fetching.
    pub async fn run(
        &self,
        messages: &[Message],
        event_tx: mpsc::UnboundedSender<AgentEvent>,
    ) -> Result<Vec<Message>> {
        let tool_schemas = self.tool_registry.schemas();

        // Running message list, extended with tool results as we go.
        let mut running_messages = self.build_openai_messages(messages)?;
        let mut transcript = Vec::new();
        let mut iteration = 0;

        loop {
            iteration += 1;
            if iteration > MAX_TOOL_ITERATIONS {
                warn!(
                    "Hit max tool iterations ({}), forcing text response",
                    MAX_TOOL_ITERATIONS
                );
                break;
            }

            debug!("Agent loop iteration {}", iteration);

            let request = self.build_request(&running_messages, &tool_schemas)?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| WorklogError::Provider(e.to_string()))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| WorklogError::Provider("No choices in response".into()))?;

            let assistant_msg = &choice.message;
            let content = assistant_msg.content.clone().unwrap_or_default();

            if let Some(tool_calls) = &assistant_msg.tool_calls {
                if !tool_calls.is_empty() {
                    if !content.is_empty() {
                        let _ = event_tx.send(AgentEvent::ContentChunk(content.clone()));
                    }

                    // Keep the assistant's tool-call turn in the running history.
                    let assistant_openai = ChatCompletionRequestAssistantMessageArgs::default()
                        .content(&*content)
                        .tool_calls(tool_calls.clone())
                        .build()
                        .map_err(|e| WorklogError::Provider(e.to_string()))?;
                    running_messages
                        .push(ChatCompletionRequestMessage::Assistant(assistant_openai));

                    let our_tool_calls: Vec<ToolCall> = tool_calls
                        .iter()
                        .map(|tc| ToolCall {
                            id: tc.id.clone(),
                            name: tc.function.name.clone(),
                            arguments: tc.function.arguments.clone(),
                        })
                        .collect();
                    transcript.push(Message::assistant_with_tool_calls(
                        content.clone(),
                        our_tool_calls.clone(),
                    ));

                    for tc in &our_tool_calls {
                        let _ = event_tx.send(AgentEvent::ToolCallStart {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                        });

                        // Invalid JSON arguments go back to the model as an
                        // error result rather than aborting the turn.
                        let output = match serde_json::from_str(&tc.arguments) {
                            Ok(args) => self.tool_registry.execute(&tc.name, &tc.id, args).await,
                            Err(e) => ToolOutput {
                                tool_call_id: tc.id.clone(),
                                content: format!("Invalid JSON arguments: {}", e),
                                is_error: true,
                            },
                        };

                        let _ = event_tx.send(AgentEvent::ToolResult(output.clone()));
                        transcript.push(Message::tool_result(
                            tc.id.as_str(),
                            output.content.as_str(),
                        ));

                        let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                            .tool_call_id(&tc.id)
                            .content(&*output.content)
                            .build()
                            .map_err(|e| WorklogError::Provider(e.to_string()))?;
                        running_messages.push(ChatCompletionRequestMessage::Tool(tool_msg));
                    }

                    // The model needs to process the tool results.
                    continue;
                }
            }

            // No tool calls, this is the final text response.
            if !content.is_empty() {
                let _ = event_tx.send(AgentEvent::ContentChunk(content.clone()));
            }

            let final_message = Message::assistant(&content);
            let _ = event_tx.send(AgentEvent::Done(final_message.clone()));
            transcript.push(final_message);
            return Ok(transcript);
        }

        let fallback = Message::assistant("[Assistant reached maximum tool iterations]");
        let _ = event_tx.send(AgentEvent::Done(fallback.clone()));
        transcript.push(fallback);
        Ok(transcript)
    }

    fn build_request(
        &self,
        running_messages: &[ChatCompletionRequestMessage],
        tool_schemas: &[ToolSchema],
    ) -> Result<async_openai::types::CreateChatCompletionRequest> {
        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.provider.model)
            .messages(running_messages.to_vec())
            .temperature(self.provider.temperature)
            .max_completion_tokens(self.provider.max_tokens);

        if !tool_schemas.is_empty() {
            let tools: Vec<_> = tool_schemas
                .iter()
                .map(|s| {
                    let func = FunctionObjectArgs::default()
                        .name(&s.name)
                        .description(&s.description)
                        .parameters(s.parameters.clone())
                        .build()
                        .map_err(|e| {
                            WorklogError::Schema(format!("function '{}': {}", s.name, e))
                        })?;
                    ChatCompletionToolArgs::default()
                        .r#type(ChatCompletionToolType::Function)
                        .function(func)
                        .build()
                        .map_err(|e| WorklogError::Schema(format!("tool '{}': {}", s.name, e)))
                })
                .collect::<Result<Vec<_>>>()?;
            request_builder.tools(tools);
        }

        request_builder
            .build()
            .map_err(|e| WorklogError::Provider(e.to_string()))
    }

    /// Convert our Message types to async-openai request messages, injecting
    /// the system prompt when the history doesn't carry one.
    fn build_openai_messages(
        &self,
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut result = Vec::new();

        let has_system = messages.iter().any(|m| m.role == Role::System);
        if !has_system {
            let sys_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(prompts::system_prompt())
                .build()
                .map_err(|e| WorklogError::Provider(e.to_string()))?;
            result.push(ChatCompletionRequestMessage::System(sys_msg));
        }

        for msg in messages {
            match msg.role {
                Role::System => {
                    let m = ChatCompletionRequestSystemMessageArgs::default()
                        .content(msg.content.as_str())
                        .build()
                        .map_err(|e| WorklogError::Provider(e.to_string()))?;
                    result.push(ChatCompletionRequestMessage::System(m));
                }
                Role::User => {
                    let m = ChatCompletionRequestUserMessageArgs::default()
                        .content(msg.content.as_str())
                        .build()
                        .map_err(|e| WorklogError::Provider(e.to_string()))?;
                    result.push(ChatCompletionRequestMessage::User(m));
                }
                Role::Assistant => {
                    let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                    builder.content(msg.content.as_str());
                    if let Some(tool_calls) = &msg.tool_calls {
                        let tc_openai: Vec<ChatCompletionMessageToolCall> = tool_calls
                            .iter()
                            .map(|tc| ChatCompletionMessageToolCall {
                                id: tc.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: async_openai::types::FunctionCall {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect();
                        builder.tool_calls(tc_openai);
                    }
                    let m = builder
                        .build()
                        .map_err(|e| WorklogError::Provider(e.to_string()))?;
                    result.push(ChatCompletionRequestMessage::Assistant(m));
                }
                Role::Tool => {
                    let m = ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(msg.tool_call_id.as_deref().unwrap_or(""))
                        .content(msg.content.as_str())
                        .build()
                        .map_err(|e| WorklogError::Provider(e.to_string()))?;
                    result.push(ChatCompletionRequestMessage::Tool(m));
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    fn test_loop() -> AgentLoop {
        AgentLoop::new(ProviderConfig::default(), Arc::new(ToolRegistry::new()))
    }

    #[test]
    fn test_system_prompt_injected_when_absent() {
        let agent = test_loop();
        let messages = vec![Message::user("what did I do today?")];
        let built = agent.build_openai_messages(&messages).unwrap();
        assert_eq!(built.len(), 2);
        assert!(matches!(built[0], ChatCompletionRequestMessage::System(_)));
    }

    #[test]
    fn test_system_prompt_not_duplicated() {
        let agent = test_loop();
        let messages = vec![Message::system("custom"), Message::user("hi")];
        let built = agent.build_openai_messages(&messages).unwrap();
        assert_eq!(built.len(), 2);
    }

    #[test]
    fn test_persisted_transcript_feeds_next_turn() {
        let agent = test_loop();
        // History as the REPL stores it after a tool-using turn, plus a
        // follow-up question referencing the fetched data.
        let messages = vec![
            Message::user("summarize today"),
            Message::assistant_with_tool_calls(
                "",
                vec![ToolCall {
                    id: "call_1".into(),
                    name: "get_work_data".into(),
                    arguments: "{}".into(),
                }],
            ),
            Message::tool_result("call_1", "{\"commits\": []}"),
            Message::assistant("Nothing landed today."),
            Message::user("and the browser history in that data?"),
        ];
        let built = agent.build_openai_messages(&messages).unwrap();
        // system + the five persisted messages
        assert_eq!(built.len(), 6);
        assert!(matches!(built[3], ChatCompletionRequestMessage::Tool(_)));
    }

    #[test]
    fn test_tool_history_roundtrips() {
        let agent = test_loop();
        let messages = vec![
            Message::user("summarize"),
            Message::assistant_with_tool_calls(
                "",
                vec![ToolCall {
                    id: "call_1".into(),
                    name: "get_work_data".into(),
                    arguments: "{}".into(),
                }],
            ),
            Message::tool_result("call_1", "{\"calendar\": []}"),
        ];
        let built = agent.build_openai_messages(&messages).unwrap();
        // system + user + assistant + tool
        assert_eq!(built.len(), 4);
        assert!(matches!(built[3], ChatCompletionRequestMessage::Tool(_)));
    }
}
