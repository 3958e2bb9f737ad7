//! Error types for mention tracking.
//!
//! None of the tracker's policy decisions are errors (a stale mention is repaired,
//! an unknown caret skips detection). The only failures are edits rejected
//! by the host's text buffer, which indicate a programming error on the host side,
//! and confirming a mention when no candidate is pending.

use std::ops::Range;

use thiserror::Error;

use crate::mention::AnnotationId;

/// An edit that the text buffer refused to apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The given char range does not lie within the buffer's text.
    #[error("range {range:?} is out of bounds for a text of {len} chars")]
    OutOfBounds {
        range: Range<usize>,
        len: usize,
    },
    /// No annotation with the given handle is attached to the buffer.
    #[error("annotation {0} is not attached to this buffer")]
    UnknownAnnotation(AnnotationId),
    /// A confirmed mention may not overlap another confirmed mention.
    #[error("mention range {range:?} overlaps an existing mention")]
    Overlap {
        range: Range<usize>,
    },
    /// The buffer does not accept edits.
    #[error("the text buffer is read-only")]
    ReadOnly,
}

/// An error returned by a [`MentionTracker`](crate::MentionTracker) operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The host's text buffer rejected an edit requested by the tracker.
    #[error("text buffer rejected an edit: {0}")]
    Buffer(#[from] BufferError),
    /// A mention was confirmed while no candidate was in progress.
    #[error("no mention candidate is pending confirmation")]
    NoPendingCandidate,
}
