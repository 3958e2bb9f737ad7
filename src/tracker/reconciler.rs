//! Reconciles the mention annotations in a text buffer with the text they currently cover.
//!
//! After every edit, each annotation whose length no longer matches the length
//! it was attached with is either cut back to its canonical `@ShortName` form
//! or dropped along with its text.
//!
//! Annotations are always visited from the rightmost to the leftmost,
//! such that deleting text for one annotation never moves the range
//! of an annotation that has yet to be visited.

use std::ops::Range;

use tracing::debug;

use crate::{
    buffer::MentionBuffer,
    display_name_cache::DisplayNames,
    errors::BufferError,
    mention::{AnnotationId, Caret, MentionAnnotation, MENTION_TRIGGER},
    utils,
};

/// A repair that the reconciler applied to the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    /// A confirmed mention was cut back to `@ShortName`,
    /// and the trailing text in `removed` was deleted.
    ///
    /// The annotation was replaced, so it now has a new handle.
    NameCut {
        old: AnnotationId,
        new: AnnotationId,
        removed: Range<usize>,
    },
    /// A confirmed mention was detached and its text in `removed` was deleted.
    Dropped {
        annotation: AnnotationId,
        removed: Range<usize>,
    },
    /// A stale placeholder was detached; no text was deleted.
    PlaceholderDropped {
        annotation: AnnotationId,
    },
}

/// The outcome of one reconciliation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    /// The confirmed mentions that remain in the buffer, ordered by appearance.
    /// Placeholders are never included.
    pub annotations: Vec<MentionAnnotation>,
    /// The repairs applied during this pass, in the order they were applied.
    pub actions: Vec<ReconcileAction>,
    /// The caret position after accounting for all deleted text.
    pub caret: Caret,
    /// Whether any mention was cut back to its canonical form during this pass.
    pub name_cut: bool,
}

/// Recomputes which annotations in `buffer` are still valid,
/// repairing the buffer through its [`MentionBuffer`] interface.
///
/// `caret` is the caret position before reconciliation; the returned caret
/// has been moved left to account for any text deleted before it.
pub fn reconcile<B, N>(buffer: &mut B, names: &N, caret: Caret) -> Result<Reconciliation, BufferError>
where
    B: MentionBuffer + ?Sized,
    N: DisplayNames + ?Sized,
{
    let mut snapshot = buffer.annotations();
    snapshot.sort_by(|a, b| b.range.start.cmp(&a.range.start));

    let mut caret = caret;
    let mut actions = Vec::new();
    let mut name_cut = false;

    for annotation in snapshot {
        let text = buffer.text();
        let range = utils::clamp_range(&annotation.range, utils::char_len(text));
        if range.len() == annotation.recorded_len {
            continue;
        }

        let Some(user) = annotation.user else {
            debug!("Dropping stale placeholder annotation {} at {range:?}", annotation.id);
            buffer.remove_annotation(annotation.id)?;
            actions.push(ReconcileAction::PlaceholderDropped { annotation: annotation.id });
            continue;
        };

        let occupied = utils::safe_substring_by_char_indices(text, &range);
        let canonical = names.short_display_name(&user)
            .map(|name| format!("{MENTION_TRIGGER}{name}"));
        match canonical {
            Some(canonical) if occupied.starts_with(&canonical)
                && range.len() > utils::char_len(&canonical) =>
            {
                let kept = range.start..range.start + utils::char_len(&canonical);
                let removed = kept.end..range.end;
                debug!("Cutting mention {} of user {user} back to {canonical:?}, removing {removed:?}", annotation.id);
                let new = buffer.replace_annotation(annotation.id, kept, Some(user))?;
                buffer.delete_range(removed.clone())?;
                caret = shift_caret(caret, &removed);
                name_cut = true;
                actions.push(ReconcileAction::NameCut { old: annotation.id, new, removed });
            }
            _ => {
                debug!("Dropping mention {} of user {user}, removing {range:?}", annotation.id);
                buffer.remove_annotation(annotation.id)?;
                buffer.delete_range(range.clone())?;
                caret = shift_caret(caret, &range);
                actions.push(ReconcileAction::Dropped { annotation: annotation.id, removed: range });
            }
        }
    }

    // Re-query the buffer, as repairs to the left have moved the ranges
    // of mentions that were already visited.
    let annotations = buffer.annotations()
        .into_iter()
        .filter(MentionAnnotation::is_confirmed)
        .collect();

    Ok(Reconciliation { annotations, actions, caret, name_cut })
}

/// Moves a caret that sits after the start of a removed range
/// to the left by the number of removed chars, but never before the range's start.
fn shift_caret(caret: Caret, removed: &Range<usize>) -> Caret {
    match caret {
        Caret::At(index) if index > removed.start => {
            Caret::At(index.saturating_sub(removed.len()).max(removed.start))
        }
        other => other,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::ComposeBuffer,
        display_name_cache::DisplayNameCache,
        mention::{Contact, UserRef},
    };

    fn bob() -> UserRef {
        UserRef::from(vec![0xBB])
    }

    fn alice() -> UserRef {
        UserRef::from(vec![0xAA])
    }

    fn names() -> DisplayNameCache {
        let mut cache = DisplayNameCache::new();
        cache.insert(Contact::new(bob(), "Bob Jones"));
        cache.insert(Contact::new(alice(), "Alice"));
        cache
    }

    #[test]
    fn test_unchanged_annotations_are_kept_and_idempotent() {
        let mut buffer = ComposeBuffer::new("hey @Bob and @Alice");
        buffer.add_annotation(4..8, Some(bob())).unwrap();
        buffer.add_annotation(13..19, Some(alice())).unwrap();
        buffer.push_str("!").unwrap();

        let first = reconcile(&mut buffer, &names(), Caret::At(20)).unwrap();
        assert!(first.actions.is_empty());
        assert!(!first.name_cut);
        assert_eq!(first.caret, Caret::At(20));
        assert_eq!(first.annotations.len(), 2);

        let second = reconcile(&mut buffer, &names(), Caret::At(20)).unwrap();
        assert_eq!(second, first);
        assert_eq!(buffer.text(), "hey @Bob and @Alice!");
    }

    #[test]
    fn test_name_cut_exact_boundary() {
        let mut buffer = ComposeBuffer::new("hey @Bob!");
        let id = buffer.add_annotation(4..8, Some(bob())).unwrap();
        // Typing inside the mention grows it to 10 chars: "@Bobxxxxxb".
        buffer.insert(7, "bxxxxx").unwrap();
        assert_eq!(buffer.text(), "hey @Bobxxxxxb!");
        assert_eq!(buffer.annotations()[0].actual_len(), 10);

        let result = reconcile(&mut buffer, &names(), Caret::At(13)).unwrap();
        assert!(result.name_cut);
        assert_eq!(buffer.text(), "hey @Bob!");
        assert_eq!(result.annotations.len(), 1);
        assert_eq!(result.annotations[0].range, 4..8);
        assert_eq!(result.annotations[0].recorded_len, 4);
        assert_eq!(result.caret, Caret::At(8));
        let ReconcileAction::NameCut { old, removed, .. } = &result.actions[0] else {
            panic!("expected a name cut, got {:?}", result.actions);
        };
        assert_eq!(*old, id);
        assert_eq!(removed.len(), 6);
    }

    #[test]
    fn test_shortened_mention_is_dropped_with_its_text() {
        let mut buffer = ComposeBuffer::new("hey @Bob");
        buffer.add_annotation(4..8, Some(bob())).unwrap();
        // Backspace at the end of the mention.
        buffer.delete_range(7..8).unwrap();

        let result = reconcile(&mut buffer, &names(), Caret::At(7)).unwrap();
        assert!(!result.name_cut);
        assert_eq!(buffer.text(), "hey ");
        assert!(result.annotations.is_empty());
        assert!(buffer.annotations().is_empty());
        assert_eq!(result.caret, Caret::At(4));
        assert_eq!(
            result.actions,
            vec![ReconcileAction::Dropped { annotation: result_id(&result), removed: 4..7 }],
        );
    }

    fn result_id(result: &Reconciliation) -> AnnotationId {
        match &result.actions[0] {
            ReconcileAction::Dropped { annotation, .. } => *annotation,
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_caret_after_dropped_mention_shifts_left() {
        let mut buffer = ComposeBuffer::new("@Bob says hi");
        buffer.add_annotation(0..4, Some(bob())).unwrap();
        buffer.delete_range(1..2).unwrap();
        assert_eq!(buffer.text(), "@ob says hi");

        let result = reconcile(&mut buffer, &names(), Caret::At(11)).unwrap();
        assert_eq!(buffer.text(), " says hi");
        assert_eq!(result.caret, Caret::At(8));
    }

    #[test]
    fn test_longer_mention_without_cached_name_is_dropped() {
        let stranger = UserRef::from(vec![0x01]);
        let mut buffer = ComposeBuffer::new("@Zed ok");
        buffer.add_annotation(0..4, Some(stranger.clone())).unwrap();
        buffer.insert(2, "ee").unwrap();

        let cache = names();
        let result = reconcile(&mut buffer, &cache, Caret::At(4)).unwrap();
        assert!(!result.name_cut);
        assert_eq!(buffer.text(), " ok");
        assert_eq!(result.caret, Caret::At(0));
        // The missing name was requested so that the host can fetch it.
        assert!(cache.take_requested().contains(&stranger));
    }

    #[test]
    fn test_longer_mention_not_matching_name_is_dropped() {
        let mut buffer = ComposeBuffer::new("@Bob");
        buffer.add_annotation(0..4, Some(bob())).unwrap();
        buffer.insert(2, "x").unwrap();
        assert_eq!(buffer.text(), "@Bxob");

        let result = reconcile(&mut buffer, &names(), Caret::At(3)).unwrap();
        assert!(!result.name_cut);
        assert_eq!(buffer.text(), "");
        assert_eq!(result.caret, Caret::At(0));
    }

    #[test]
    fn test_stale_placeholder_is_dropped_without_text_edit() {
        let mut buffer = ComposeBuffer::new("@al ");
        buffer.add_annotation(0..3, None).unwrap();
        buffer.insert(2, "i").unwrap();

        let result = reconcile(&mut buffer, &names(), Caret::At(3)).unwrap();
        assert_eq!(buffer.text(), "@ail ");
        assert!(buffer.annotations().is_empty());
        assert!(matches!(result.actions.as_slice(), [ReconcileAction::PlaceholderDropped { .. }]));
        assert_eq!(result.caret, Caret::At(3));
    }

    #[test]
    fn test_fresh_placeholder_is_not_reported() {
        let mut buffer = ComposeBuffer::new("@al");
        buffer.add_annotation(0..3, None).unwrap();
        let result = reconcile(&mut buffer, &names(), Caret::At(3)).unwrap();
        assert!(result.actions.is_empty());
        assert!(result.annotations.is_empty());
        assert_eq!(buffer.annotations().len(), 1);
    }

    #[test]
    fn test_two_stale_mentions_repaired_right_to_left() {
        let mut buffer = ComposeBuffer::new("@Bob @Alice ");
        buffer.add_annotation(0..4, Some(bob())).unwrap();
        buffer.add_annotation(5..11, Some(alice())).unwrap();
        buffer.insert(3, "bb").unwrap();
        buffer.insert(12, "ex").unwrap();
        assert_eq!(buffer.text(), "@Bobbb @Alicexe ");

        let result = reconcile(&mut buffer, &names(), Caret::At(16)).unwrap();
        assert_eq!(buffer.text(), "@Bob @Alice ");
        assert_eq!(result.caret, Caret::At(12));
        let ranges: Vec<_> = result.annotations.iter().map(|a| a.range.clone()).collect();
        assert_eq!(ranges, vec![0..4, 5..11]);
        assert!(result.annotations.iter().all(|a| !a.is_stale()));

        // Alice (rightmost) must have been repaired first.
        let removed: Vec<_> = result.actions.iter()
            .map(|action| match action {
                ReconcileAction::NameCut { removed, .. } => removed.clone(),
                other => panic!("unexpected action {other:?}"),
            })
            .collect();
        assert_eq!(removed, vec![13..15, 4..6]);
    }

    #[test]
    fn test_two_adjacent_shortened_mentions_both_dropped() {
        let mut buffer = ComposeBuffer::new("@Bob@Alice");
        buffer.add_annotation(0..4, Some(bob())).unwrap();
        buffer.add_annotation(4..10, Some(alice())).unwrap();
        buffer.delete_range(3..5).unwrap();
        assert_eq!(buffer.text(), "@BoAlice");

        let result = reconcile(&mut buffer, &names(), Caret::At(3)).unwrap();
        assert_eq!(buffer.text(), "");
        assert!(result.annotations.is_empty());
        assert_eq!(result.caret, Caret::At(0));
        assert_eq!(result.actions.len(), 2);
    }

    #[test]
    fn test_unknown_caret_is_left_alone() {
        let mut buffer = ComposeBuffer::new("@Bob");
        buffer.add_annotation(0..4, Some(bob())).unwrap();
        buffer.delete_range(3..4).unwrap();
        let result = reconcile(&mut buffer, &names(), Caret::Unknown).unwrap();
        assert_eq!(result.caret, Caret::Unknown);
        assert_eq!(buffer.text(), "");
    }

    #[test]
    fn test_read_only_buffer_surfaces_error() {
        let mut buffer = ComposeBuffer::new("@Bob");
        buffer.add_annotation(0..4, Some(bob())).unwrap();
        buffer.delete_range(3..4).unwrap();
        buffer.set_read_only(true);
        assert_eq!(
            reconcile(&mut buffer, &names(), Caret::At(3)),
            Err(BufferError::ReadOnly),
        );
    }
}
