//! Ordered, session-owned chat history.
//!
//! The transcript only ever grows at the end. The single exception is
//! [`Transcript::truncate`], which the conversation controller uses to roll
//! back the user message of a turn whose response never completed.

use crate::core::message::Message;

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Drop everything after the first `len` messages.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;

    #[test]
    fn push_preserves_order() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("one"));
        transcript.push(Message::assistant("two"));
        transcript.push(Message::user("three"));

        let contents: Vec<&str> = transcript.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
        assert_eq!(transcript.last().map(|m| m.role), Some(Role::User));
    }

    #[test]
    fn clear_resets_regardless_of_length() {
        let mut transcript = Transcript::new();
        for i in 0..50 {
            transcript.push(Message::user(format!("msg {i}")));
        }
        transcript.clear();
        assert!(transcript.is_empty());
        assert_eq!(transcript.len(), 0);
    }

    #[test]
    fn truncate_only_drops_the_tail() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("keep"));
        transcript.push(Message::assistant("keep too"));
        transcript.push(Message::user("rolled back"));

        transcript.truncate(2);

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[1].content, "keep too");
    }
}
