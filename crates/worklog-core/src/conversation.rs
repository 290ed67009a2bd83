use crate::types::Message;

/// In-memory chat history for one REPL session. History is ephemeral;
/// nothing is persisted between runs.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Drop all history (the `/clear` command).
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_clear() {
        let mut convo = Conversation::new();
        assert!(convo.is_empty());

        convo.push(Message::user("hello"));
        convo.push(Message::assistant("hi"));
        assert_eq!(convo.len(), 2);

        convo.clear();
        assert!(convo.is_empty());
    }
}
