//! Demo processing function

use hopper_core::domain::Message;
use tracing::info;

/// Split a multi-word message into one message per word
///
/// A single word is the end of the line and only gets logged. Non UTF-8
/// payloads are logged by size.
pub fn split_words(message: Message) -> anyhow::Result<Vec<Message>> {
    let Some(text) = message.as_str() else {
        info!(bytes = message.len(), "Binary message");
        return Ok(vec![]);
    };

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= 1 {
        info!(word = %text.trim(), "Word");
        return Ok(vec![]);
    }

    Ok(words.into_iter().map(Message::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_fans_out() {
        let out = split_words(Message::from("the quick  brown\tfox")).unwrap();
        let words: Vec<&str> = out.iter().filter_map(Message::as_str).collect();
        assert_eq!(words, vec!["the", "quick", "brown", "fox"]);
    }

    #[test]
    fn test_single_word_is_terminal() {
        assert!(split_words(Message::from("fox")).unwrap().is_empty());
        assert!(split_words(Message::from("  ")).unwrap().is_empty());
    }

    #[test]
    fn test_binary_payload_is_terminal() {
        let out = split_words(Message::from(vec![0xff, 0xfe, 0x00])).unwrap();
        assert!(out.is_empty());
    }
}
