//! @mention autocompletion against the known user-email list.

use std::sync::LazyLock;

use regex::Regex;

/// The mention being typed: `@` followed by word, dot or hyphen characters,
/// ending at the caret.
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\w.-]*)$").expect("mention pattern"));

/// A mention in progress: the query typed after `@` and the byte offset of
/// the `@` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionContext {
    pub query: String,
    pub start: usize,
}

/// Find the mention being typed immediately before the caret, if any.
///
/// `caret` is a byte offset into `text`; an offset that does not fall on a
/// character boundary yields `None`.
pub fn mention_at_caret(text: &str, caret: usize) -> Option<MentionContext> {
    let before = text.get(..caret)?;
    let captures = MENTION.captures(before)?;
    let query = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    Some(MentionContext {
        start: caret - query.len() - 1,
        query: query.to_string(),
    })
}

/// Emails containing the query, case-insensitively. An empty query matches
/// every known email.
pub fn mention_suggestions(emails: &[String], query: &str) -> Vec<String> {
    let query = query.to_lowercase();
    emails
        .iter()
        .filter(|email| email.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// Splice the chosen email over the mention being typed. Returns the new
/// text and the caret position immediately after the inserted `@email `.
///
/// Degrades to the unchanged text when the recorded offsets no longer fit.
pub fn apply_mention(
    text: &str,
    context: &MentionContext,
    caret: usize,
    email: &str,
) -> (String, usize) {
    let (Some(before), Some(after)) = (
        text.get(..context.start),
        text.get(caret.min(text.len())..),
    ) else {
        return (text.to_string(), caret);
    };
    let inserted = format!("{before}@{email} ");
    let new_caret = inserted.len();
    (format!("{inserted}{after}"), new_caret)
}
