//! Parser for OS/400 command replies.
//!
//! The server answers a CL command with the raw job log text. Each message
//! starts with its identifier (`CPF2105`, `CPC2191`, ...) and its text sits
//! at a fixed offset of 112 characters after the identifier, ending at the
//! first period. `CPI` messages are informational and dropped; any `CPF`
//! message means the command failed.

use crate::protocol::constants::*;
use crate::protocol::types::{CommandOutcome, CommandReplyEntry};
use regex::Regex;
use std::sync::OnceLock;

fn message_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("C[A-Z]{2}[0-9]{4}").expect("valid message code pattern"))
}

fn disallowed_chars_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            "[^a-zA-Z0-9 áàâäãåçéèêëíìîïñóòôöõúùûüýÿæœÁÀÂÄÃÅÇÉÈÊËÍÌÎÏÑÓÒÔÖÕÚÙÛÜÝŸÆŒ._'*/:-]",
        )
        .expect("valid description filter pattern")
    })
}

/// Text of the message whose identifier starts at byte `start`.
///
/// `None` if the reply ends before the description or the description has
/// no closing period.
fn extract_description(reply: &str, start: usize) -> Option<String> {
    let tail = &reply[start..];
    let (offset, _) = tail.char_indices().nth(MESSAGE_DESCRIPTION_OFFSET)?;
    let description = &tail[offset..];
    let end = description.find('.')?;
    Some(
        disallowed_chars_regex()
            .replace_all(&description[..end], "")
            .into_owned(),
    )
}

/// Classify an OS command reply and collect its messages.
///
/// Never fails: an unreadable message marks the outcome failed and keeps the
/// messages collected so far.
pub fn parse_command_reply(reply: &str) -> CommandOutcome {
    let mut messages = Vec::new();
    let mut succeeded = true;

    for m in message_code_regex().find_iter(reply) {
        let code = m.as_str();
        if !code.starts_with(MESSAGE_PREFIX_INFO) {
            match extract_description(reply, m.start()) {
                Some(description) => messages.push(CommandReplyEntry {
                    code: code.to_string(),
                    description,
                }),
                None => {
                    return CommandOutcome {
                        succeeded: false,
                        messages,
                    }
                }
            }
        }
        if code.starts_with(MESSAGE_PREFIX_FAILURE) {
            succeeded = false;
        }
    }

    CommandOutcome {
        succeeded,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A job log entry with its text at the fixed description offset.
    fn entry(code: &str, text: &str) -> String {
        format!("{}{}{}", code, " ".repeat(MESSAGE_DESCRIPTION_OFFSET - code.len()), text)
    }

    #[test]
    fn test_completion_message_succeeds() {
        let reply = entry("CPC2191", "Object MYOBJ in MYLIB type *FILE deleted. More text");
        let outcome = parse_command_reply(&reply);
        assert!(outcome.succeeded);
        assert_eq!(
            outcome.lines(),
            vec!["CPC2191 Object MYOBJ in MYLIB type *FILE deleted"]
        );
    }

    #[test]
    fn test_cpf_marks_failure() {
        let reply = entry("CPF1234", "Job 123456/QUSER/QZDASOINIT not found.");
        let outcome = parse_command_reply(&reply);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].code, "CPF1234");
        assert_eq!(
            outcome.messages[0].description,
            "Job 123456/QUSER/QZDASOINIT not found"
        );
    }

    #[test]
    fn test_cpi_messages_excluded() {
        let reply = format!(
            "{}{}",
            entry("CPI2417", "Job log not displayed or listed."),
            entry("CPI2416", "Informational only.")
        );
        let outcome = parse_command_reply(&reply);
        assert!(outcome.succeeded);
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn test_disallowed_characters_stripped() {
        let reply = entry("CPD0030", "Commande (CRTLIB) non trouvée dans la bibliothèque #QSYS!.");
        let outcome = parse_command_reply(&reply);
        assert_eq!(
            outcome.messages[0].description,
            "Commande CRTLIB non trouvée dans la bibliothèque QSYS"
        );
        assert!(outcome.succeeded);
    }

    #[test]
    fn test_missing_period_degrades_to_failure() {
        let reply = format!(
            "{}{}",
            entry("CPC2191", "Object deleted. "),
            entry("CPD0043", "no period here")
        );
        let outcome = parse_command_reply(&reply);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.lines(), vec!["CPC2191 Object deleted"]);
    }

    #[test]
    fn test_reply_shorter_than_offset() {
        let outcome = parse_command_reply("CPF9801 short");
        assert!(!outcome.succeeded);
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn test_empty_reply_succeeds() {
        let outcome = parse_command_reply("");
        assert!(outcome.succeeded);
        assert!(outcome.messages.is_empty());
    }
}
