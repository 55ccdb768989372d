//! Canonical chat payload shared by every provider adapter.

use indexmap::IndexMap;

/// Few-shot example exchanges: prior user prompt → prior assistant reply.
///
/// Insertion order is the order the exchanges are replayed to the model.
pub type Examples = IndexMap<String, String>;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One part of a multi-part user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text { text: String },
    /// Image given as an `http(s)` URL or a `data:` URL.
    Image { image: String },
    /// Arbitrary inline file as a `data:` URL. Only some primary providers
    /// accept it.
    File { data: String, media_type: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(image: impl Into<String>) -> Self {
        Self::Image {
            image: image.into(),
        }
    }

    /// Tag name used in "unsupported part" errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::File { .. } => "file",
        }
    }
}

/// Message content: plain text or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl From<String> for UserContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for UserContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<ContentPart>> for UserContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        Self::Parts(parts)
    }
}

impl UserContent {
    /// View the content as a list of parts (plain text becomes one text part).
    pub fn parts(&self) -> Vec<ContentPart> {
        match self {
            Self::Text(text) => vec![ContentPart::text(text.clone())],
            Self::Parts(parts) => parts.clone(),
        }
    }
}

/// A single message in the conversation sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: UserContent,
}

/// One logical completion request, identical for every provider tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: String,
    /// System prompt first, then alternating example turns, then the
    /// final user payload.
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn new(system: &str, examples: &Examples, user: UserContent) -> Self {
        let mut messages = Vec::with_capacity(2 + examples.len() * 2);
        messages.push(ChatMessage {
            role: Role::System,
            content: UserContent::Text(system.to_string()),
        });
        for (prompt, response) in examples {
            messages.push(ChatMessage {
                role: Role::User,
                content: UserContent::Text(prompt.clone()),
            });
            messages.push(ChatMessage {
                role: Role::Assistant,
                content: UserContent::Text(response.clone()),
            });
        }
        messages.push(ChatMessage {
            role: Role::User,
            content: user,
        });

        Self {
            system: system.to_string(),
            messages,
        }
    }
}

/// Split a `data:<media type>;base64,<payload>` URL.
///
/// Returns `None` for anything that is not a base64 data URL.
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let media_type = header.strip_suffix(";base64")?;
    Some((media_type, data))
}
