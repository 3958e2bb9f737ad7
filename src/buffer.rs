//! The text buffer that owns the compose text and the mention annotations over it.
//!
//! The tracker never owns the buffer: the host's text widget implements [`MentionBuffer`]
//! and the tracker reads from and edits it through that trait only.
//! [`ComposeBuffer`] is a plain in-memory implementation for hosts
//! that do not have a native widget of their own, and for tests.

use std::ops::Range;

use crate::{
    errors::BufferError,
    mention::{AnnotationId, MentionAnnotation, UserRef},
    utils,
};

/// The interface a text widget must expose to the mention tracker.
///
/// All ranges are char ranges into the buffer's current text.
pub trait MentionBuffer {
    /// Returns the current text content of the buffer.
    fn text(&self) -> &str;

    /// Returns a snapshot of all annotations attached to the buffer,
    /// ordered by their appearance in the text.
    ///
    /// Each annotation's `range` must reflect where its text currently is,
    /// i.e., after all edits made so far.
    fn annotations(&self) -> Vec<MentionAnnotation>;

    /// Attaches a new annotation over the given range.
    ///
    /// The annotation's recorded length is the length of `range`.
    fn add_annotation(&mut self, range: Range<usize>, user: Option<UserRef>) -> Result<AnnotationId, BufferError>;

    /// Detaches the given annotation without touching the text under it.
    fn remove_annotation(&mut self, id: AnnotationId) -> Result<(), BufferError>;

    /// Replaces the given annotation with a new one over `range`,
    /// recording the new range's length.
    fn replace_annotation(
        &mut self,
        old: AnnotationId,
        range: Range<usize>,
        user: Option<UserRef>,
    ) -> Result<AnnotationId, BufferError> {
        self.remove_annotation(old)?;
        self.add_annotation(range, user)
    }

    /// Deletes the text in the given range.
    fn delete_range(&mut self, range: Range<usize>) -> Result<(), BufferError>;

    /// Replaces the text in the given range with `text`.
    fn replace_text(&mut self, range: Range<usize>, text: &str) -> Result<(), BufferError>;
}


/// An in-memory compose buffer whose annotations move with the text they decorate.
///
/// Annotations are exclusive at both ends: text inserted exactly at an annotation's
/// start or end is not part of that annotation, while text inserted strictly inside
/// grows it. Deleting text shrinks any annotation that covered it.
#[derive(Clone, Debug, Default)]
pub struct ComposeBuffer {
    text: String,
    /// The length of `text` in chars.
    len: usize,
    annotations: Vec<MentionAnnotation>,
    next_id: u64,
    read_only: bool,
}

impl ComposeBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            len: utils::char_len(&text),
            text,
            ..Default::default()
        }
    }

    /// Returns the length of the text in chars.
    pub fn char_len(&self) -> usize {
        self.len
    }

    /// Makes this buffer reject (or accept) all further text edits.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Inserts `text` at the given char index.
    pub fn insert(&mut self, at: usize, text: &str) -> Result<(), BufferError> {
        self.apply_edit(at..at, text)
    }

    /// Appends `text` to the end of the buffer.
    pub fn push_str(&mut self, text: &str) -> Result<(), BufferError> {
        self.apply_edit(self.len..self.len, text)
    }

    /// Returns the text currently covered by the given annotation.
    pub fn annotated_text(&self, id: AnnotationId) -> Option<&str> {
        self.annotations.iter()
            .find(|a| a.id == id)
            .map(|a| utils::safe_substring_by_char_indices(&self.text, &a.range))
    }

    fn check_bounds(&self, range: &Range<usize>) -> Result<(), BufferError> {
        if range.start > range.end || range.end > self.len {
            return Err(BufferError::OutOfBounds { range: range.clone(), len: self.len });
        }
        Ok(())
    }

    /// Ensures that a confirmed mention over `range` would not overlap
    /// any other confirmed mention except the one being replaced.
    fn check_overlap(
        &self,
        range: &Range<usize>,
        user: Option<&UserRef>,
        replacing: Option<AnnotationId>,
    ) -> Result<(), BufferError> {
        if user.is_none() {
            return Ok(());
        }
        let overlaps = self.annotations.iter()
            .filter(|a| a.is_confirmed() && Some(a.id) != replacing)
            .any(|a| a.overlaps(range));
        if overlaps {
            return Err(BufferError::Overlap { range: range.clone() });
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> AnnotationId {
        self.next_id += 1;
        AnnotationId(self.next_id)
    }

    /// Replaces the chars in `range` with `inserted` and moves all annotations
    /// such that they keep covering the same text.
    fn apply_edit(&mut self, range: Range<usize>, inserted: &str) -> Result<(), BufferError> {
        if self.read_only {
            return Err(BufferError::ReadOnly);
        }
        self.check_bounds(&range)?;

        let removed = range.len();
        let inserted_len = utils::char_len(inserted);
        self.text = utils::safe_replace_by_char_indices(&self.text, &range, inserted);
        self.len = self.len - removed + inserted_len;

        let map_deleted = |pos: usize| {
            if pos <= range.start {
                pos
            } else if pos >= range.end {
                pos - removed
            } else {
                range.start
            }
        };
        let at = range.start;
        for annotation in &mut self.annotations {
            let mut start = map_deleted(annotation.range.start);
            let mut end = map_deleted(annotation.range.end);
            if inserted_len > 0 {
                if at <= start {
                    start += inserted_len;
                    end += inserted_len;
                } else if at < end {
                    end += inserted_len;
                }
            }
            annotation.range = start..end;
        }
        Ok(())
    }
}

impl MentionBuffer for ComposeBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn annotations(&self) -> Vec<MentionAnnotation> {
        let mut annotations = self.annotations.clone();
        annotations.sort_by_key(|a| (a.range.start, a.range.end, a.id));
        annotations
    }

    fn add_annotation(&mut self, range: Range<usize>, user: Option<UserRef>) -> Result<AnnotationId, BufferError> {
        self.check_bounds(&range)?;
        self.check_overlap(&range, user.as_ref(), None)?;
        let id = self.allocate_id();
        self.annotations.push(MentionAnnotation {
            id,
            user,
            recorded_len: range.len(),
            range,
        });
        Ok(id)
    }

    fn remove_annotation(&mut self, id: AnnotationId) -> Result<(), BufferError> {
        let index = self.annotations.iter()
            .position(|a| a.id == id)
            .ok_or(BufferError::UnknownAnnotation(id))?;
        self.annotations.remove(index);
        Ok(())
    }

    fn replace_annotation(
        &mut self,
        old: AnnotationId,
        range: Range<usize>,
        user: Option<UserRef>,
    ) -> Result<AnnotationId, BufferError> {
        let index = self.annotations.iter()
            .position(|a| a.id == old)
            .ok_or(BufferError::UnknownAnnotation(old))?;
        self.check_bounds(&range)?;
        self.check_overlap(&range, user.as_ref(), Some(old))?;
        let id = self.allocate_id();
        self.annotations[index] = MentionAnnotation {
            id,
            user,
            recorded_len: range.len(),
            range,
        };
        Ok(id)
    }

    fn delete_range(&mut self, range: Range<usize>) -> Result<(), BufferError> {
        self.apply_edit(range, "")
    }

    fn replace_text(&mut self, range: Range<usize>, text: &str) -> Result<(), BufferError> {
        self.apply_edit(range, text)
    }
}
