//! The core data types shared by the mention tracker and its collaborators.

use std::{fmt, ops::Range};

/// The character that opens a mention, e.g., `@alice`.
pub const MENTION_TRIGGER: char = '@';

/// An opaque, stable reference to a user that can be mentioned.
///
/// The tracker never interprets these bytes; it only compares them
/// and hands them back to the host once a mention is confirmed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserRef(Box<[u8]>);

impl UserRef {
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for UserRef {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl From<Vec<u8>> for UserRef {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }
}

impl AsRef<[u8]> for UserRef {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserRef(0x{self})")
    }
}


/// A handle to an annotation attached to a text buffer.
///
/// Handles are assigned by the buffer and are never reused by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}


/// A snapshot of a mention annotation attached to the text buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionAnnotation {
    /// The buffer's handle for this annotation.
    pub id: AnnotationId,
    /// The mentioned user, or `None` for a placeholder
    /// left behind by a cancelled candidate.
    pub user: Option<UserRef>,
    /// The char range this annotation currently covers in the buffer.
    pub range: Range<usize>,
    /// The length of `range` when this annotation was attached.
    pub recorded_len: usize,
}

impl MentionAnnotation {
    /// Returns the length of the text this annotation currently covers.
    pub fn actual_len(&self) -> usize {
        self.range.len()
    }

    /// Returns `true` if this annotation refers to a specific user.
    pub fn is_confirmed(&self) -> bool {
        self.user.is_some()
    }

    /// Returns `true` if the text under this annotation was edited
    /// since the annotation was attached.
    pub fn is_stale(&self) -> bool {
        self.actual_len() != self.recorded_len
    }

    /// Returns `true` if this annotation's range overlaps the given range.
    ///
    /// Empty ranges never overlap anything.
    pub fn overlaps(&self, other: &Range<usize>) -> bool {
        !self.range.is_empty()
            && !other.is_empty()
            && self.range.start < other.end
            && other.start < self.range.end
    }
}


/// An in-progress mention that has not yet been bound to a user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionCandidate {
    /// The char range from the trigger character up to the caret.
    pub range: Range<usize>,
    /// The text typed after the trigger character, case preserved.
    pub query: String,
}


/// The mention state published to the contact picker UI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MentionState {
    /// No mention is in progress; the picker should be closed.
    #[default]
    None,
    /// A mention candidate is open; the picker should be filtered by the given query.
    Filtering(String),
    /// The user just picked a contact for the current candidate.
    ///
    /// This is a one-shot event: the next text change moves the state
    /// back to `None` or `Filtering`.
    Completed {
        user: UserRef,
        range: Range<usize>,
    },
}


/// A user that can be mentioned, as offered by the contact picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contact {
    pub user: UserRef,
    pub display_name: String,
}

impl Contact {
    pub fn new(user: impl Into<UserRef>, display_name: impl Into<String>) -> Self {
        Self { user: user.into(), display_name: display_name.into() }
    }

    /// Returns the short form of this contact's name used as mention text:
    /// the first word of the display name.
    ///
    /// If the display name is blank, this returns an empty string.
    pub fn short_name(&self) -> &str {
        let trimmed = self.display_name.trim();
        trimmed.split_whitespace().next().unwrap_or(trimmed)
    }
}


/// A mention that was just confirmed by the user,
/// which the host should attach to its text buffer as an annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmedMention {
    pub user: UserRef,
    pub range: Range<usize>,
}


/// The position of the caret in the compose buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Caret {
    /// The widget has not reported a selection yet.
    NoSelection,
    /// The caret position is not known, e.g., during initial layout.
    Unknown,
    /// The caret sits before the char at the given index.
    At(usize),
}

impl Caret {
    /// Converts a raw platform selection index into a `Caret`.
    ///
    /// `-1` means that there is no selection yet;
    /// any other negative value means that the caret is unknown.
    pub fn from_raw(raw: isize) -> Self {
        match raw {
            -1 => Caret::NoSelection,
            r if r < 0 => Caret::Unknown,
            r => Caret::At(r as usize),
        }
    }

    /// Returns the caret's char index, if known.
    pub fn index(self) -> Option<usize> {
        match self {
            Caret::At(index) => Some(index),
            Caret::NoSelection | Caret::Unknown => None,
        }
    }
}
