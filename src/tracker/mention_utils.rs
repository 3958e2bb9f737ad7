//! Utilities for turning the mentions in a compose buffer into an outgoing message.

use std::collections::BTreeSet;

use crate::{
    buffer::MentionBuffer,
    mention::{MentionAnnotation, UserRef},
    utils,
};

/// Returns the confirmed mentions in the buffer, ordered by appearance,
/// skipping any that would overlap an earlier one.
fn confirmed_mentions<B: MentionBuffer + ?Sized>(buffer: &B) -> Vec<MentionAnnotation> {
    let mut annotations = buffer.annotations();
    annotations.sort_by_key(|a| (a.range.start, a.range.end));
    let mut last_end = 0;
    annotations.retain(|a| {
        let keep = a.is_confirmed() && !a.range.is_empty() && a.range.start >= last_end;
        if keep {
            last_end = a.range.end;
        }
        keep
    });
    annotations
}

/// Returns the users mentioned in the buffer, in the order in which they first appear.
///
/// Each user is listed only once, even if they are mentioned several times.
pub fn mentioned_users<B: MentionBuffer + ?Sized>(buffer: &B) -> Vec<UserRef> {
    let mut seen = BTreeSet::new();
    confirmed_mentions(buffer)
        .into_iter()
        .filter_map(|a| a.user)
        .filter(|user| seen.insert(user.clone()))
        .collect()
}

/// Renders the buffer's text with each confirmed mention rewritten by `format`.
///
/// `format` receives the mentioned user and the text the mention currently covers
/// (e.g., `"@Alice"`), and returns the text to emit in its place,
/// such as a Markdown link to the user. All other text is copied unchanged.
///
/// # Example
/// ```
/// use mention_tracker::{ComposeBuffer, MentionBuffer, UserRef, render_mentions};
///
/// let mut buffer = ComposeBuffer::new("hi @Alice!");
/// buffer.add_annotation(3..9, Some(UserRef::from(vec![0xAA]))).unwrap();
/// let rendered = render_mentions(&buffer, |user, text| format!("[{text}](user:{user})"));
/// assert_eq!(rendered, "hi [@Alice](user:aa)!");
/// ```
pub fn render_mentions<B, F>(buffer: &B, mut format: F) -> String
where
    B: MentionBuffer + ?Sized,
    F: FnMut(&UserRef, &str) -> String,
{
    let text = buffer.text();
    let mut rendered = String::with_capacity(text.len());
    let mut cursor = 0;
    for mention in confirmed_mentions(buffer) {
        let Some(user) = mention.user.as_ref() else { continue };
        rendered.push_str(utils::safe_substring_by_char_indices(text, &(cursor..mention.range.start)));
        let mention_text = utils::safe_substring_by_char_indices(text, &mention.range);
        rendered.push_str(&format(user, mention_text));
        cursor = mention.range.end;
    }
    rendered.push_str(utils::safe_substring_by_char_indices(text, &(cursor..usize::MAX)));
    rendered
}
