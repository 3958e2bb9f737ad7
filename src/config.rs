//! Configuration options for a [`MentionTracker`](crate::MentionTracker).

/// Which characters count as whitespace when deciding whether
/// a trigger character starts a new mention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WhitespaceClass {
    /// Only ASCII whitespace: space, `\t`, `\n`, `\x0B`, `\x0C`, and `\r`.
    #[default]
    Ascii,
    /// Any char with the Unicode `White_Space` property,
    /// e.g., a no-break space or an ideographic space.
    Unicode,
}

/// What to do when a mention is confirmed while no candidate is in progress.
///
/// This can happen if the picker UI races with a text change that
/// already closed the candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfirmFallback {
    /// Report the call as an error: [`TrackerError::NoPendingCandidate`](crate::TrackerError).
    #[default]
    Reject,
    /// Produce a zero-length mention at the very start of the buffer.
    ZeroLengthAtStart,
}

/// Options that control how a [`MentionTracker`](crate::MentionTracker) behaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackerConfig {
    pub whitespace: WhitespaceClass,
    pub confirm_fallback: ConfirmFallback,
}

impl TrackerConfig {
    pub fn with_whitespace(mut self, whitespace: WhitespaceClass) -> Self {
        self.whitespace = whitespace;
        self
    }

    pub fn with_confirm_fallback(mut self, confirm_fallback: ConfirmFallback) -> Self {
        self.confirm_fallback = confirm_fallback;
        self
    }
}
