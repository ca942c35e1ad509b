//! Completion for the tag entry of the add/edit dialogs.
//!
//! Words are delimited by single spaces, matching how the entry splits tags
//! before they are escaped. Offsets are byte offsets into the entry text.

use std::ops::Range;

/// Word under the cursor and its span in `text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentWord<'a> {
    pub word: &'a str,
    pub span: Range<usize>,
}

/// Find the space delimited word around `cursor`.
///
/// A cursor past the end or inside a multi-byte character is moved back to
/// the nearest character boundary.
pub fn current_word(text: &str, cursor: usize) -> CurrentWord<'_> {
    let mut cursor = cursor.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }

    let start = text[..cursor].rfind(' ').map_or(0, |i| i + 1);
    let end = text[cursor..].find(' ').map_or(text.len(), |i| cursor + i);

    CurrentWord {
        word: &text[start..end],
        span: start..end,
    }
}

/// Candidates containing `word`, compared against the lowercased candidate
pub fn filter<'c, S: AsRef<str>>(candidates: &'c [S], word: &str) -> Vec<&'c str> {
    candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|candidate| candidate.to_lowercase().contains(word))
        .collect()
}

/// Replace the word under `cursor` by `choice`.
///
/// Returns the new text and the new cursor, placed at the end of the text.
pub fn apply(text: &str, cursor: usize, choice: &str) -> (String, usize) {
    let span = current_word(text, cursor).span;
    let mut replaced = String::with_capacity(text.len() + choice.len());
    replaced.push_str(&text[..span.start]);
    replaced.push_str(choice);
    replaced.push_str(&text[span.end..]);
    let end = replaced.len();
    (replaced, end)
}

/// The popup shows while something matches and the last token is being typed
pub fn should_popup(text: &str, matches: usize) -> bool {
    let last_token = text.rsplit(' ').next().unwrap_or_default();
    matches > 0 && !last_token.is_empty()
}

/// Known tags of a database, ready to complete against
#[derive(Debug, Clone, Default)]
pub struct TagCompleter {
    candidates: Vec<String>,
}

impl TagCompleter {
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn matches(&self, text: &str, cursor: usize) -> Vec<&str> {
        filter(&self.candidates, current_word(text, cursor).word)
    }
}
