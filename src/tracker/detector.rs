//! Detects an in-progress mention candidate to the left of the caret.
//!
//! A candidate is a trigger character that is preceded by whitespace
//! (or sits at the very start of the text), followed by a run of non-whitespace chars
//! that extends all the way up to the caret.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::{
    config::WhitespaceClass,
    mention::{Caret, MentionAnnotation, MentionCandidate, MENTION_TRIGGER},
    utils,
};

/// Matches a trigger run that ends at the end of the haystack,
/// treating only ASCII whitespace as a separator.
static ASCII_TRIGGER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[ \t\n\x0B\x0C\r])(?P<mention>@[^ \t\n\x0B\x0C\r]*)$")
        .expect("Failed to compile ASCII mention trigger regex")
});

/// Matches a trigger run that ends at the end of the haystack,
/// treating any Unicode whitespace as a separator.
static UNICODE_TRIGGER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?P<mention>@\S*)$")
        .expect("Failed to compile Unicode mention trigger regex")
});

fn trigger_regex(whitespace: WhitespaceClass) -> &'static Regex {
    match whitespace {
        WhitespaceClass::Ascii => &ASCII_TRIGGER_REGEX,
        WhitespaceClass::Unicode => &UNICODE_TRIGGER_REGEX,
    }
}

/// Scans `text` up to the caret for an unterminated mention candidate.
///
/// Returns `None` if the caret position isn't known, if there is no candidate,
/// or if the candidate would start inside (or run into) a confirmed mention.
/// Placeholder annotations (those without a user) never block a candidate,
/// which allows a just-cancelled mention to be reopened.
///
/// A caret at index 0 scans the whole text.
pub fn detect_candidate(
    text: &str,
    annotations: &[MentionAnnotation],
    caret: Caret,
    whitespace: WhitespaceClass,
) -> Option<MentionCandidate> {
    let caret = caret.index()?;
    let text_len = utils::char_len(text);
    let window_end = if caret > 0 { caret.min(text_len) } else { text_len };
    let window = &text[..utils::char_to_byte_index(text, window_end)];

    let mention = trigger_regex(whitespace).captures(window)?.name("mention")?;
    let trigger = utils::byte_to_char_index(window, mention.start());
    let range = trigger..window_end;

    let blocking = annotations.iter()
        .filter(|a| a.is_confirmed())
        .find(|a| a.range.contains(&trigger) || a.overlaps(&range));
    if let Some(annotation) = blocking {
        trace!("Ignoring trigger at {trigger}: it lies within mention {} at {:?}", annotation.id, annotation.range);
        return None;
    }

    let query = mention.as_str()[MENTION_TRIGGER.len_utf8()..].to_owned();
    Some(MentionCandidate { range, query })
}
