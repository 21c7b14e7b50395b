//! Conversation messages exchanged with a model.
//!
//! Every message renders through [`Display`](fmt::Display) in a tagged layout
//! that is convenient for logs and prompt debugging:
//!
//! ```text
//! [|user alice|]
//! What's the weather in Oslo?
//! [|assistant|]
//! <|call get_weather id="call_1"|>
//! {
//!   "city": "Oslo"
//! }
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const MESSAGE_TAG_OPEN: &str = "[|";
const MESSAGE_TAG_CLOSE: &str = "|]";
const BLOCK_TAG_OPEN: &str = "<|";
const BLOCK_TAG_CLOSE: &str = "|>";

// ─────────────────────
// Content
// ─────────────────────

/// Supported inline image formats.
#[expect(missing_docs, reason = "variants are self-explanatory format names")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMediaType {
    JPEG,
    PNG,
    GIF,
    WEBP,
}

impl ImageMediaType {
    /// Returns the MIME type, e.g. `image/png`.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::JPEG => "image/jpeg",
            Self::PNG => "image/png",
            Self::GIF => "image/gif",
            Self::WEBP => "image/webp",
        }
    }
}

/// An image attached to a user or tool message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ImageContent {
    /// An image the provider fetches itself.
    Url {
        /// Location of the image.
        url: String,
    },
    /// Inline base64-encoded image data.
    Base64 {
        /// Base64-encoded bytes.
        data: String,
        /// Image format.
        media_type: ImageMediaType,
    },
}

impl ImageContent {
    /// Creates an image referenced by URL.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    /// Creates an inline image by base64-encoding raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], media_type: ImageMediaType) -> Self {
        Self::Base64 {
            data: STANDARD.encode(bytes),
            media_type,
        }
    }

    /// Decodes inline image data. Returns `Ok(None)` for URL images.
    ///
    /// # Errors
    ///
    /// Returns a [`base64::DecodeError`] if the inline data is not valid base64.
    pub fn decode(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        match self {
            Self::Url { .. } => Ok(None),
            Self::Base64 { data, .. } => STANDARD.decode(data).map(Some),
        }
    }

    /// Returns the URL, or a `data:` URL for inline images.
    #[must_use]
    pub fn to_url(&self) -> String {
        match self {
            Self::Url { url } => url.clone(),
            Self::Base64 { data, media_type } => {
                format!("data:{};base64,{data}", media_type.mime_type())
            }
        }
    }
}

/// One block of user or tool message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    /// Plain text.
    Text(String),
    /// An image.
    Image(ImageContent),
}

impl From<&str> for ContentBlock {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ContentBlock {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<ImageContent> for ContentBlock {
    fn from(image: ImageContent) -> Self {
        Self::Image(image)
    }
}

impl fmt::Display for ContentBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Image(ImageContent::Url { url }) => {
                write!(f, "{BLOCK_TAG_OPEN}image url=\"{url}\"{BLOCK_TAG_CLOSE}")
            }
            Self::Image(ImageContent::Base64 { .. }) => {
                write!(f, "{BLOCK_TAG_OPEN}image{BLOCK_TAG_CLOSE}")
            }
        }
    }
}

fn write_header(f: &mut fmt::Formatter<'_>, role: &str, name: Option<&str>) -> fmt::Result {
    match name {
        Some(name) => write!(f, "{MESSAGE_TAG_OPEN}{role} {name}{MESSAGE_TAG_CLOSE}"),
        None => write!(f, "{MESSAGE_TAG_OPEN}{role}{MESSAGE_TAG_CLOSE}"),
    }
}

fn write_blocks(f: &mut fmt::Formatter<'_>, blocks: &[ContentBlock]) -> fmt::Result {
    for block in blocks {
        write!(f, "\n{block}")?;
    }
    Ok(())
}

// ─────────────────────
// Messages
// ─────────────────────

/// Instructions for the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessage {
    /// Optional participant name.
    pub name: Option<String>,
    /// The instructions.
    pub content: String,
}

impl fmt::Display for SystemMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_header(f, "system", self.name.as_deref())?;
        write!(f, "\n{}", self.content)
    }
}

/// A message from the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    /// Optional participant name.
    pub name: Option<String>,
    /// Text and image blocks, in order.
    pub content: Vec<ContentBlock>,
}

impl UserMessage {
    /// Creates a user message with a single text block.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            name: None,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Sets the participant name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a content block.
    #[must_use]
    pub fn with_block(mut self, block: impl Into<ContentBlock>) -> Self {
        self.content.push(block.into());
        self
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_header(f, "user", self.name.as_deref())?;
        write_blocks(f, &self.content)
    }
}

/// A tool call requested by the model.
///
/// `tool_args` is the JSON the model produced. It has not been validated;
/// evaluate it against the tool's schema before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Provider-assigned identifier linking the call to its result.
    pub invocation_id: String,
    /// Name of the tool to call.
    pub tool_name: String,
    /// Raw decoded arguments.
    pub tool_args: Value,
}

impl ToolInvocation {
    /// Creates a tool invocation.
    #[must_use]
    pub fn new(
        invocation_id: impl Into<String>,
        tool_name: impl Into<String>,
        tool_args: Value,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            tool_name: tool_name.into(),
            tool_args,
        }
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = serde_json::to_string_pretty(&self.tool_args).map_err(|_| fmt::Error)?;
        write!(
            f,
            "{BLOCK_TAG_OPEN}call {} id=\"{}\"{BLOCK_TAG_CLOSE}\n{args}",
            self.tool_name, self.invocation_id
        )
    }
}

/// A reply generated by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Optional participant name.
    pub name: Option<String>,
    /// Text content, if any.
    pub content: Option<String>,
    /// Tool calls, in the order the model made them.
    #[serde(default)]
    pub tool_invocations: Vec<ToolInvocation>,
}

impl AssistantMessage {
    /// Creates a plain text reply.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Creates a reply consisting of tool calls.
    #[must_use]
    pub fn tool_calls(tool_invocations: Vec<ToolInvocation>) -> Self {
        Self {
            tool_invocations,
            ..Self::default()
        }
    }

    /// Appends a tool call.
    #[must_use]
    pub fn with_invocation(mut self, invocation: ToolInvocation) -> Self {
        self.tool_invocations.push(invocation);
        self
    }

    /// Returns whether the model requested any tool calls.
    #[must_use]
    pub fn has_tool_invocations(&self) -> bool {
        !self.tool_invocations.is_empty()
    }
}

impl fmt::Display for AssistantMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_header(f, "assistant", self.name.as_deref())?;
        if let Some(content) = &self.content
            && !content.is_empty()
        {
            write!(f, "\n{content}")?;
        }
        for invocation in &self.tool_invocations {
            write!(f, "\n{invocation}")?;
        }
        Ok(())
    }
}

/// The result of a tool call, sent back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMessage {
    /// Identifier of the invocation this answers.
    pub invocation_id: String,
    /// Result blocks.
    pub tool_result: Vec<ContentBlock>,
}

impl ToolMessage {
    /// Creates a tool message with a single text result.
    #[must_use]
    pub fn new(invocation_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            tool_result: vec![ContentBlock::Text(result.into())],
        }
    }

    /// Returns the text blocks joined by newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.tool_result
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text(text) => Some(text.as_str()),
                ContentBlock::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for ToolMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = format!("id={}", self.invocation_id);
        write_header(f, "tool", Some(&name))?;
        write_blocks(f, &self.tool_result)
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// Instructions for the model.
    System(SystemMessage),
    /// Input from the user.
    User(UserMessage),
    /// Output from the model.
    Assistant(AssistantMessage),
    /// A tool result.
    Tool(ToolMessage),
}

impl Message {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(SystemMessage {
            name: None,
            content: content.into(),
        })
    }

    /// Creates a user message with text content.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::User(UserMessage::new(text))
    }

    /// Creates an assistant message with text content.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant(AssistantMessage::text(text))
    }

    /// Creates a tool result message.
    #[must_use]
    pub fn tool(invocation_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self::Tool(ToolMessage::new(invocation_id, result))
    }

    /// Returns the role name used in the rendered layout.
    #[must_use]
    pub fn role(&self) -> &'static str {
        match self {
            Self::System(_) => "system",
            Self::User(_) => "user",
            Self::Assistant(_) => "assistant",
            Self::Tool(_) => "tool",
        }
    }
}

impl From<SystemMessage> for Message {
    fn from(message: SystemMessage) -> Self {
        Self::System(message)
    }
}

impl From<UserMessage> for Message {
    fn from(message: UserMessage) -> Self {
        Self::User(message)
    }
}

impl From<AssistantMessage> for Message {
    fn from(message: AssistantMessage) -> Self {
        Self::Assistant(message)
    }
}

impl From<ToolMessage> for Message {
    fn from(message: ToolMessage) -> Self {
        Self::Tool(message)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System(message) => fmt::Display::fmt(message, f),
            Self::User(message) => fmt::Display::fmt(message, f),
            Self::Assistant(message) => fmt::Display::fmt(message, f),
            Self::Tool(message) => fmt::Display::fmt(message, f),
        }
    }
}
