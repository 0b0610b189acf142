//! Chat message types shared by the LLM adapter, prompt builders, and memory.
//!
//! Roles: System (first in a prompt), User, Assistant. Phases build message
//! lists with the prompt builders; the memory store persists User/Assistant
//! turns by role string.

/// A single message in a model prompt or a stored conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Message {
    /// System prompt; placed first in the message list.
    System(String),
    /// User input (or an observation rendered back to the model).
    User(String),
    /// Model/agent reply.
    Assistant(String),
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Role string as persisted by the memory store ("system" | "user" | "assistant").
    pub fn role(&self) -> &'static str {
        match self {
            Message::System(_) => "system",
            Message::User(_) => "user",
            Message::Assistant(_) => "assistant",
        }
    }

    /// The message text, regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Message::System(s) | Message::User(s) | Message::Assistant(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Constructors produce the matching variant with content.
    #[test]
    fn constructors_produce_expected_variants() {
        assert!(matches!(Message::system("s"), Message::System(c) if c == "s"));
        assert!(matches!(Message::user("u"), Message::User(c) if c == "u"));
        assert!(matches!(Message::assistant("a"), Message::Assistant(c) if c == "a"));
    }

    /// **Scenario**: role() and content() expose role string and text for each variant.
    #[test]
    fn role_and_content_accessors() {
        let m = Message::user("how is the line doing?");
        assert_eq!(m.role(), "user");
        assert_eq!(m.content(), "how is the line doing?");
        assert_eq!(Message::system("x").role(), "system");
        assert_eq!(Message::assistant("y").role(), "assistant");
    }

    /// **Scenario**: Each variant round-trips through serde.
    #[test]
    fn serde_roundtrip() {
        for msg in [
            Message::system("sys"),
            Message::user("usr"),
            Message::assistant("ast"),
        ] {
            let json = serde_json::to_string(&msg).expect("serialize");
            let back: Message = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(msg, back);
        }
    }
}
