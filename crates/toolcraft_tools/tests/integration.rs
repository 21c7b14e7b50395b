//! Integration tests for the `toolcraft_tools` crate.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};
use toolcraft_models::{
    AssistantMessage, FinishReason, GenerationParams, Message, Model, ModelError, ModelResponse,
    ResponseOption, ToolInvocation, ToolParams, ToolUseMode, UsageStats,
};
use toolcraft_schema::{Arguments, Param, Signature, TypeDescriptor};
use toolcraft_tools::{
    FunctionTool, InvocationOutcome, JsonSchemaFlavor, RESPONSE_TOOL_NAME, RuntimeError,
    RuntimeOptions, Tool, ToolError, ToolFuture, ToolRegistry, Toolset, call_and_use_tools,
    invoke_tools, response_tool_for, tool, toolset,
};

// ─────────────────────────────────────────────────────────────────────
// 1. Tool trait manual impl
// ─────────────────────────────────────────────────────────────────────

struct ManualTool;

impl Tool for ManualTool {
    fn signature(&self) -> Signature {
        Signature::new("manual_tool")
            .with_doc("A manually implemented tool.")
            .param(Param::of::<String>("input").with_doc("Text to echo."))
    }

    fn execute(&self, args: Arguments) -> ToolFuture<'_> {
        Box::pin(async move {
            let input = args.get::<String>("input")?;
            Ok(json!({ "result": format!("echo: {input}") }))
        })
    }
}

#[tokio::test]
async fn manual_tool_signature_and_execute() {
    let mut registry = ToolRegistry::new();
    registry.register(ManualTool).unwrap();

    let schema = registry.schema("manual_tool").unwrap();
    assert_eq!(schema.summary(), Some("A manually implemented tool."));

    let result = registry
        .execute("manual_tool", &json!({"input": "test"}))
        .await
        .unwrap();
    assert_eq!(result["result"], "echo: test");
}

#[tokio::test]
async fn function_tool_wraps_a_closure() {
    let echo = FunctionTool::new(
        Signature::new("shout").param(Param::of::<String>("text")),
        |args: Arguments| async move {
            let text = args.get::<String>("text")?;
            Ok::<_, ToolError>(text.to_uppercase())
        },
    );

    let mut registry = ToolRegistry::new();
    registry.register(echo).unwrap();

    let result = registry
        .execute("shout", &json!({"text": "hey"}))
        .await
        .unwrap();
    assert_eq!(result, json!("HEY"));
}

// ─────────────────────────────────────────────────────────────────────
// 2. ToolRegistry
// ─────────────────────────────────────────────────────────────────────

#[test]
fn registry_register_get_has_names() {
    let mut registry = ToolRegistry::new();
    registry.register(ManualTool).unwrap();

    assert!(registry.has("manual_tool"));
    assert!(!registry.has("nonexistent"));
    assert!(registry.get("manual_tool").is_some());
    assert!(registry.get("nonexistent").is_none());
    assert_eq!(registry.names(), vec!["manual_tool"]);
    assert_eq!(registry.len(), 1);
}

#[test]
fn registry_definitions_follow_the_flavor() {
    let mut registry = ToolRegistry::new();
    registry.register(ManualTool).unwrap();

    let openai = registry.definitions(JsonSchemaFlavor::OpenAi);
    assert_eq!(openai.len(), 1);
    assert_eq!(openai[0]["name"], "manual_tool");
    assert_eq!(openai[0]["parameters"]["required"], json!(["input"]));
    assert_eq!(
        openai[0]["parameters"]["properties"]["input"]["description"],
        "Text to echo."
    );

    let anthropic = registry.definitions(JsonSchemaFlavor::Anthropic);
    assert_eq!(
        anthropic[0]["input_schema"],
        openai[0]["parameters"],
        "no nullable fields, so the dialects agree"
    );
}

#[test]
fn registry_builds_tool_params() {
    let mut registry = ToolRegistry::new();
    registry.register(ManualTool).unwrap();
    registry.register(get_time()).unwrap();

    let params = registry.tool_params(toolcraft_models::ToolUseMode::Force);
    assert_eq!(params.tools.len(), 2);
    assert!(params.get_tool("get_time").is_some());
}

// ─────────────────────────────────────────────────────────────────────
// 3. ToolRegistry errors
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn registry_unknown_tool_error() {
    let registry = ToolRegistry::new();
    let err = registry
        .execute("nonexistent", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::UnknownTool(ref name) if name == "nonexistent"));
    assert!(err.to_string().contains("unknown tool"), "got: {err}");
}

#[test]
fn registry_duplicate_registration_fails() {
    let mut registry = ToolRegistry::new();
    registry.register(ManualTool).unwrap();

    let err = registry.register(ManualTool).unwrap_err();
    assert!(matches!(err, ToolError::DuplicateTool(ref name) if name == "manual_tool"));
    assert!(err.to_string().contains("already registered"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn unsupported_parameter_type_fails_at_registration() {
    let opener = FunctionTool::new(
        Signature::new("open_socket").param(Param::new("socket", TypeDescriptor::named("Socket"))),
        |_args: Arguments| async move { Ok::<_, ToolError>(()) },
    );

    let mut registry = ToolRegistry::new();
    let err = registry.register(opener).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, ToolError::Registration(_)));
    assert!(message.contains("socket"), "got: {message}");
    assert!(message.contains("Socket"), "got: {message}");
    assert!(registry.is_empty());
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_handler() {
    let mut registry = ToolRegistry::new();
    registry.register(list_items()).unwrap();

    let err = registry
        .execute("list_items", &json!({"category": 5, "limit": "ten"}))
        .await
        .unwrap_err();

    let issues = err.validation_error().unwrap().issues();
    assert_eq!(issues.len(), 2);

    let message = err.to_string();
    assert!(message.starts_with("invalid arguments for `list_items`"));
    assert!(message.contains("category: expected string, got number"), "got: {message}");
    assert!(message.contains("limit: expected integer, got string"), "got: {message}");
}

// ─────────────────────────────────────────────────────────────────────
// 4. #[tool] standalone
// ─────────────────────────────────────────────────────────────────────

#[tool]
/// Greet someone by name.
async fn greet(
    /// The person's name.
    name: String,
) -> Result<String, ToolError> {
    Ok(format!("Hello, {}!", name))
}

#[tokio::test]
async fn tool_standalone_basic() {
    let signature = greet().signature();
    assert_eq!(signature.name, "greet");
    assert_eq!(signature.doc.as_deref(), Some("Greet someone by name."));
    assert_eq!(signature.params.len(), 1);
    assert_eq!(signature.params[0].doc.as_deref(), Some("The person's name."));

    let mut registry = ToolRegistry::new();
    registry.register(greet()).unwrap();
    let definitions = registry.definitions(JsonSchemaFlavor::OpenAi);
    let definition = &definitions[0];
    assert_eq!(definition["description"], "Greet someone by name.");
    assert_eq!(definition["parameters"]["required"], json!(["name"]));

    let result = registry
        .execute("greet", &json!({"name": "Alice"}))
        .await
        .unwrap();
    assert_eq!(result, json!("Hello, Alice!"));
}

#[tool]
/// Returns the current time.
async fn get_time() -> Result<String, ToolError> {
    Ok("2025-01-01T00:00:00Z".to_string())
}

#[tokio::test]
async fn tool_no_params() {
    let mut registry = ToolRegistry::new();
    registry.register(get_time()).unwrap();

    let definitions = registry.definitions(JsonSchemaFlavor::OpenAi);
    let definition = &definitions[0];
    assert!(definition["parameters"]["properties"].as_object().unwrap().is_empty());

    let result = registry.execute("get_time", &json!({})).await.unwrap();
    assert_eq!(result, json!("2025-01-01T00:00:00Z"));
}

#[tool]
/// List items with optional limit.
async fn list_items(
    /// Category to list.
    category: String,
    /// Maximum items to return.
    #[default(100)]
    limit: usize,
) -> Result<String, ToolError> {
    Ok(format!("{}: limit {}", category, limit))
}

#[tokio::test]
async fn tool_with_default() {
    let mut registry = ToolRegistry::new();
    registry.register(list_items()).unwrap();

    let definitions = registry.definitions(JsonSchemaFlavor::OpenAi);
    let parameters = &definitions[0]["parameters"];
    assert_eq!(parameters["required"], json!(["category"]));
    assert_eq!(parameters["properties"]["limit"]["default"], json!(100));

    let result = registry
        .execute("list_items", &json!({"category": "books"}))
        .await
        .unwrap();
    assert_eq!(result, json!("books: limit 100"));

    let result = registry
        .execute("list_items", &json!({"category": "books", "limit": 5}))
        .await
        .unwrap();
    assert_eq!(result, json!("books: limit 5"));
}

#[tool]
/// Search with optional filter.
async fn search(
    /// Search query.
    query: String,
    /// Optional filter.
    filter: Option<String>,
) -> Result<String, ToolError> {
    match filter {
        Some(f) => Ok(format!("query={}, filter={}", query, f)),
        None => Ok(format!("query={}", query)),
    }
}

#[tokio::test]
async fn tool_with_option() {
    let mut registry = ToolRegistry::new();
    registry.register(search()).unwrap();

    let definitions = registry.definitions(JsonSchemaFlavor::OpenAi);
    let parameters = &definitions[0]["parameters"];
    assert_eq!(parameters["required"], json!(["query"]));
    assert_eq!(
        parameters["properties"]["filter"]["type"],
        json!(["string", "null"])
    );

    let result = registry
        .execute("search", &json!({"query": "rust"}))
        .await
        .unwrap();
    assert_eq!(result, json!("query=rust"));

    let result = registry
        .execute("search", &json!({"query": "rust", "filter": null}))
        .await
        .unwrap();
    assert_eq!(result, json!("query=rust"));

    let result = registry
        .execute("search", &json!({"query": "rust", "filter": "recent"}))
        .await
        .unwrap();
    assert_eq!(result, json!("query=rust, filter=recent"));
}

#[tool(name = "weather_lookup", describe_return)]
/// Look up the forecast.
///
/// Uses the nearest station.
///
/// # Arguments
///
/// * `city` - City to look up.
async fn weather(city: String) -> Result<Vec<String>, ToolError> {
    Ok(vec![format!("{city}: sunny")])
}

#[tokio::test]
async fn tool_options_and_rustdoc_arguments() {
    let mut registry = ToolRegistry::new();
    registry.register(weather()).unwrap();

    let schema = registry.schema("weather_lookup").unwrap();
    assert_eq!(schema.summary(), Some("Look up the forecast."));
    assert_eq!(schema.long_description(), Some("Uses the nearest station."));
    assert!(schema.return_schema().is_some());

    let definition = schema.json_schema(JsonSchemaFlavor::OpenAi, false);
    assert_eq!(
        definition["parameters"]["properties"]["city"]["description"],
        "City to look up."
    );

    let result = registry
        .execute("weather_lookup", &json!({"city": "Oslo"}))
        .await
        .unwrap();
    assert_eq!(schema.validate_return(&result).unwrap(), json!(["Oslo: sunny"]));
}

// ─────────────────────────────────────────────────────────────────────
// 5. #[toolset]
// ─────────────────────────────────────────────────────────────────────

struct GreetingTools {
    prefix: String,
}

#[toolset]
impl GreetingTools {
    #[tool]
    /// Greet with a configurable prefix.
    async fn greet_with_config(
        &self,
        /// The person's name.
        name: String,
    ) -> Result<String, ToolError> {
        Ok(format!("{} {}!", self.prefix, name))
    }

    fn not_a_tool(&self) -> usize {
        self.prefix.len()
    }
}

#[tokio::test]
async fn toolset_with_captured_state() {
    let greeting = GreetingTools {
        prefix: "Hi".to_string(),
    };
    assert_eq!(greeting.not_a_tool(), 2);

    let tools = greeting.tools();
    assert_eq!(tools.len(), 1);
    let signature = tools[0].signature();
    assert_eq!(signature.name, "greet_with_config");
    assert_eq!(signature.params.len(), 1);

    let mut registry = ToolRegistry::new();
    registry
        .register_toolset(GreetingTools {
            prefix: "Hi".to_string(),
        })
        .unwrap();

    let result = registry
        .execute("greet_with_config", &json!({"name": "Bob"}))
        .await
        .unwrap();
    assert_eq!(result, json!("Hi Bob!"));
}

struct CounterTools {
    count: AtomicI32,
}

#[toolset]
impl CounterTools {
    #[tool]
    /// Increment a counter.
    async fn increment(
        &self,
        /// Amount to add.
        #[default(1)]
        amount: i32,
    ) -> Result<i32, ToolError> {
        Ok(self.count.fetch_add(amount, Ordering::SeqCst) + amount)
    }

    #[tool]
    /// Read the counter.
    async fn current(&self) -> i32 {
        self.count.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn toolset_with_mutable_captured_state() {
    let mut registry = ToolRegistry::new();
    registry
        .register_toolset(CounterTools {
            count: AtomicI32::new(0),
        })
        .unwrap();
    assert_eq!(registry.names(), vec!["increment", "current"]);

    let result = registry
        .execute("increment", &json!({"amount": 5}))
        .await
        .unwrap();
    assert_eq!(result, json!(5));

    let result = registry.execute("increment", &json!({})).await.unwrap();
    assert_eq!(result, json!(6));

    let result = registry.execute("current", &json!({})).await.unwrap();
    assert_eq!(result, json!(6));
}

// ─────────────────────────────────────────────────────────────────────
// 6. Invoking tool calls
// ─────────────────────────────────────────────────────────────────────

fn demo_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(greet()).unwrap();
    registry.register(list_items()).unwrap();
    registry
}

#[tokio::test]
async fn invoke_tools_reports_every_call_in_order() {
    let registry = demo_registry();
    let reply = AssistantMessage::tool_calls(vec![
        ToolInvocation::new("call_1", "greet", json!({"name": "Ada"})),
        ToolInvocation::new("call_2", "list_items", json!({"category": 1, "limit": -1})),
        ToolInvocation::new("call_3", "fly", json!({})),
    ]);

    let InvocationOutcome::Messages { messages, errors } =
        invoke_tools(&registry, &reply, None).await
    else {
        panic!("expected tool messages");
    };

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].invocation_id, "call_1");
    assert_eq!(messages[0].text(), "Hello, Ada!");

    let feedback = messages[1].text();
    assert!(feedback.contains("category: expected string, got number"), "got: {feedback}");
    assert!(feedback.contains("limit: -1 is out of range"), "got: {feedback}");

    assert_eq!(messages[2].text(), "unknown tool: fly");

    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], ToolError::Validation { .. }));
    assert!(matches!(errors[1], ToolError::UnknownTool(_)));
}

#[tokio::test]
async fn invoke_tools_stops_at_the_response_tool() {
    let registry = demo_registry();
    let response = response_tool_for::<Vec<String>>().unwrap().unwrap();
    let reply = AssistantMessage::tool_calls(vec![
        ToolInvocation::new("call_1", RESPONSE_TOOL_NAME, json!({"response": ["a", "b"]})),
        ToolInvocation::new("call_2", "greet", json!({"name": "never"})),
    ]);

    let outcome = invoke_tools(&registry, &reply, Some(&response)).await;
    assert_eq!(outcome.final_response(), Some(&json!(["a", "b"])));
}

#[tokio::test]
async fn invalid_response_is_sent_back_for_correction() {
    let registry = demo_registry();
    let response = response_tool_for::<Vec<String>>().unwrap().unwrap();
    let reply = AssistantMessage::tool_calls(vec![ToolInvocation::new(
        "call_1",
        RESPONSE_TOOL_NAME,
        json!({"response": "not a list"}),
    )]);

    let InvocationOutcome::Messages { messages, errors } =
        invoke_tools(&registry, &reply, Some(&response)).await
    else {
        panic!("an invalid response must not end the exchange");
    };

    assert_eq!(errors.len(), 1);
    assert!(messages[0].text().contains("response: expected array of string, got string"));
}

// ─────────────────────────────────────────────────────────────────────
// 7. Call-and-correct loop
// ─────────────────────────────────────────────────────────────────────

/// A model that replays canned replies and records every prompt it saw.
struct ScriptedModel {
    replies: Mutex<Vec<ResponseOption>>,
    prompts: Mutex<Vec<Vec<Message>>>,
    modes: Mutex<Vec<ToolUseMode>>,
}

impl ScriptedModel {
    fn new(replies: Vec<AssistantMessage>) -> Self {
        let mut replies: Vec<_> = replies
            .into_iter()
            .map(|message| ResponseOption {
                finish_reason: if message.has_tool_invocations() {
                    FinishReason::ToolCall
                } else {
                    FinishReason::Stop
                },
                message,
            })
            .collect();
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
            modes: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Model for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn context_length(&self) -> usize {
        8_192
    }

    async fn reply(
        &self,
        messages: &[Message],
        tools: &ToolParams,
        _params: &GenerationParams,
        _num_options: usize,
    ) -> Result<ModelResponse, ModelError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        self.modes.lock().unwrap().push(tools.tool_use_mode.clone());
        let option = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ModelError::ServiceUnavailable("script exhausted".into()))?;
        Ok(ModelResponse {
            response_options: vec![option],
            usage: UsageStats::default(),
        })
    }
}

fn respond(id: &str, response: serde_json::Value) -> AssistantMessage {
    AssistantMessage::tool_calls(vec![ToolInvocation::new(
        id,
        RESPONSE_TOOL_NAME,
        json!({ "response": response }),
    )])
}

#[tokio::test]
async fn invalid_output_is_corrected_on_retry() {
    let registry = demo_registry();
    let response = response_tool_for::<Vec<String>>().unwrap().unwrap();
    let model = ScriptedModel::new(vec![
        respond("call_1", json!("oops")),
        respond("call_2", json!(["a", "b"])),
    ]);

    let answer = call_and_use_tools(
        &model,
        vec![Message::user("list two letters")],
        &registry,
        Some(&response),
        &GenerationParams::default(),
        RuntimeOptions::default().max_retries_on_invalid_output(1),
    )
    .await
    .unwrap();

    assert_eq!(answer, json!(["a", "b"]));
    assert_eq!(*model.modes.lock().unwrap(), vec![ToolUseMode::Force; 2]);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    let Message::Tool(correction) = &prompts[1][2] else {
        panic!("expected the validation error as a tool message");
    };
    assert_eq!(correction.invocation_id, "call_1");
    assert!(correction
        .text()
        .contains("response: expected array of string, got string"));
}

#[tokio::test]
async fn exhausted_retries_return_the_validation_error() {
    let registry = demo_registry();
    let response = response_tool_for::<Vec<String>>().unwrap().unwrap();
    let model = ScriptedModel::new(vec![
        respond("call_1", json!(1)),
        respond("call_2", json!(2)),
        respond("call_3", json!(["never reached"])),
    ]);

    let err = call_and_use_tools(
        &model,
        vec![Message::user("list")],
        &registry,
        Some(&response),
        &GenerationParams::default(),
        RuntimeOptions::default().max_retries_on_invalid_output(1),
    )
    .await
    .unwrap_err();

    match err {
        RuntimeError::Tool(err) => assert!(err.validation_error().is_some()),
        other => panic!("expected a tool error, got {other:?}"),
    }
    assert_eq!(model.prompts().len(), 2);
}

#[tokio::test]
async fn tool_results_feed_the_next_turn() {
    let registry = demo_registry();
    let model = ScriptedModel::new(vec![
        AssistantMessage::tool_calls(vec![ToolInvocation::new(
            "call_1",
            "greet",
            json!({"name": "Ada"}),
        )]),
        AssistantMessage::text("Ada has been greeted."),
    ]);

    let answer = call_and_use_tools(
        &model,
        vec![Message::user("greet Ada")],
        &registry,
        None,
        &GenerationParams::default(),
        RuntimeOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(answer, json!("Ada has been greeted."));
    let Message::Tool(result) = &model.prompts()[1][2] else {
        panic!("expected the tool result");
    };
    assert_eq!(result.text(), "Hello, Ada!");
}

#[tokio::test]
async fn plain_text_is_refused_when_not_allowed() {
    let registry = demo_registry();
    let response = response_tool_for::<Vec<String>>().unwrap().unwrap();
    let model = ScriptedModel::new(vec![AssistantMessage::text("a, b")]);

    let err = call_and_use_tools(
        &model,
        vec![Message::user("list")],
        &registry,
        Some(&response),
        &GenerationParams::default(),
        RuntimeOptions::default().allow_plain_text_response(false),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RuntimeError::NoToolCalls));
}
