//! Application service run over an authenticated session.

use lineseal_proto::Identity;

/// Responds to decrypted client messages.
///
/// One instance is shared by every connection.
pub trait Service: Send + Sync + 'static {
    /// First message sent after authentication.
    fn greeting(&self, identity: &Identity) -> String;

    /// Reply to one client message.
    fn respond(&self, identity: &Identity, request: &str) -> String;
}

/// Counts words and characters of each message.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountService;

impl Service for WordCountService {
    fn greeting(&self, identity: &Identity) -> String {
        format!("Hello {identity}. Welcome to awesome word counter service.")
    }

    fn respond(&self, _identity: &Identity, request: &str) -> String {
        let (words, characters) = count(request);
        format!("Words: {words}, Characters: {characters}")
    }
}

/// Whitespace-separated words and Unicode scalar values in `text`.
pub fn count(text: &str) -> (usize, usize) {
    (text.split_whitespace().count(), text.chars().count())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn alice() -> Identity {
        Identity::parse("alice").unwrap()
    }

    #[test]
    fn greets_by_identity() {
        assert_eq!(
            WordCountService.greeting(&alice()),
            "Hello alice. Welcome to awesome word counter service."
        );
    }

    #[test]
    fn counts_words_and_characters() {
        assert_eq!(
            WordCountService.respond(&alice(), "the quick  brown fox"),
            "Words: 4, Characters: 20"
        );
    }

    #[test]
    fn empty_and_blank_messages_have_no_words() {
        assert_eq!(count(""), (0, 0));
        assert_eq!(count(" \t "), (0, 3));
    }

    #[test]
    fn characters_are_scalar_values() {
        assert_eq!(count("héllo wörld"), (2, 11));
    }

    proptest! {
        #[test]
        fn joined_words_are_counted(words in prop::collection::vec("[a-z]{1,8}", 0..20)) {
            let text = words.join(" ");

            prop_assert_eq!(count(&text), (words.len(), text.len()));
        }
    }
}
