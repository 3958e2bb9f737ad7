//! The mention tracker keeps the mentions in a compose buffer consistent
//! while the user edits it, and tells the contact picker UI what to show.
//!
//! The host owns both the tracker and the text buffer, and calls
//! [`MentionTracker::on_text_changed()`] synchronously after every edit.
//! Each call runs to completion before the next edit is handled.

use eyeball::Subscriber;
use tracing::{debug, trace, warn};

use crate::{
    buffer::MentionBuffer,
    config::{ConfirmFallback, TrackerConfig},
    display_name_cache::DisplayNames,
    errors::TrackerError,
    mention::{AnnotationId, Caret, ConfirmedMention, Contact, MentionCandidate, MentionState, MENTION_TRIGGER},
    utils,
};

pub mod detector;
pub mod mention_utils;
pub mod publisher;
pub mod reconciler;

use self::{publisher::StatePublisher, reconciler::Reconciliation};

/// The outcome of handling one text change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChange {
    /// What the reconciler found and repaired.
    pub reconciliation: Reconciliation,
    /// The mention candidate found to the left of the caret, if any.
    ///
    /// This is always `None` if detection was skipped for this change.
    pub candidate: Option<MentionCandidate>,
}

impl TextChange {
    /// Returns the caret position after all repairs were applied.
    pub fn caret(&self) -> Caret {
        self.reconciliation.caret
    }
}

/// A mention that was confirmed and written into the buffer by
/// [`MentionTracker::commit_mention()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedMention {
    /// The handle of the annotation attached over the mention text.
    pub annotation: AnnotationId,
    /// The char range of the `@ShortName` text in the buffer.
    pub range: std::ops::Range<usize>,
    /// Where the caret should be placed: just after the mention and its trailing space.
    pub caret: Caret,
}

/// Tracks mention annotations and the in-progress mention candidate for one compose buffer.
#[derive(Debug, Default)]
pub struct MentionTracker {
    config: TrackerConfig,
    /// The mention currently being typed, which hasn't been bound to a user yet.
    ongoing: Option<MentionCandidate>,
    publisher: StatePublisher,
}

impl MentionTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            ongoing: None,
            publisher: StatePublisher::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Returns the most recently published mention state.
    pub fn state(&self) -> &MentionState {
        self.publisher.get()
    }

    /// Returns the mention currently being typed, if any.
    pub fn ongoing_candidate(&self) -> Option<&MentionCandidate> {
        self.ongoing.as_ref()
    }

    /// Returns a subscriber that observes every future change of the mention state.
    ///
    /// Only the latest state is retained: a slow subscriber skips intermediate states.
    pub fn subscribe(&self) -> Subscriber<MentionState> {
        self.publisher.subscribe()
    }

    /// Handles an edit to the buffer's text.
    ///
    /// This must be called synchronously after every edit, with the caret position
    /// *before* any repairs. It does the following:
    /// 1. Reconciles all mention annotations with the current text, cutting back or
    ///    dropping stale mentions through the buffer's interface.
    /// 2. Unless a mention was cut back or the caret is not known, looks for
    ///    a mention candidate to the left of the (adjusted) caret.
    /// 3. Publishes `Filtering` if a candidate was found, or `None` otherwise.
    pub fn on_text_changed<B, N>(
        &mut self,
        buffer: &mut B,
        names: &N,
        caret: Caret,
    ) -> Result<TextChange, TrackerError>
    where
        B: MentionBuffer + ?Sized,
        N: DisplayNames + ?Sized,
    {
        let reconciliation = reconciler::reconcile(buffer, names, caret)?;

        if reconciliation.name_cut {
            debug!("A mention was cut back to its canonical name; skipping candidate detection.");
            return Ok(TextChange { reconciliation, candidate: None });
        }
        if reconciliation.caret.index().is_none() {
            trace!("Caret is {:?}; skipping candidate detection.", reconciliation.caret);
            return Ok(TextChange { reconciliation, candidate: None });
        }

        let candidate = detector::detect_candidate(
            buffer.text(),
            &reconciliation.annotations,
            reconciliation.caret,
            self.config.whitespace,
        );
        if let Some(state) = publisher::next_state(candidate.as_ref(), false) {
            self.publisher.publish(state);
        }
        self.ongoing = candidate.clone();
        Ok(TextChange { reconciliation, candidate })
    }

    /// Confirms the ongoing candidate as a mention of the given contact.
    ///
    /// This publishes [`MentionState::Completed`] and returns the mention that
    /// the host should attach to its buffer as an annotation.
    /// The candidate's text is left as is; see [`Self::commit_mention()`]
    /// to also replace it with the contact's name.
    ///
    /// If there is no ongoing candidate, the configured [`ConfirmFallback`] applies.
    pub fn confirm(&mut self, contact: &Contact) -> Result<ConfirmedMention, TrackerError> {
        let range = match self.ongoing.take() {
            Some(candidate) => candidate.range,
            None => match self.config.confirm_fallback {
                ConfirmFallback::Reject => {
                    warn!("Tried to confirm a mention of user {} with no candidate in progress", contact.user);
                    return Err(TrackerError::NoPendingCandidate);
                }
                ConfirmFallback::ZeroLengthAtStart => {
                    warn!("Confirming a mention of user {} with no candidate in progress; using an empty range at 0", contact.user);
                    0..0
                }
            },
        };
        self.publisher.publish_completed(contact.user.clone(), range.clone());
        Ok(ConfirmedMention { user: contact.user.clone(), range })
    }

    /// Confirms the ongoing candidate and writes the mention into the buffer.
    ///
    /// The candidate's text is replaced with `@ShortName ` (note the trailing space),
    /// and a mention annotation is attached over `@ShortName`.
    /// The returned caret position is just after the trailing space.
    pub fn commit_mention<B>(&mut self, buffer: &mut B, contact: &Contact) -> Result<CommittedMention, TrackerError>
    where
        B: MentionBuffer + ?Sized,
    {
        let confirmed = self.confirm(contact)?;
        let name = match contact.short_name() {
            "" => contact.user.to_string(),
            name => name.to_owned(),
        };
        let mention_text = format!("{MENTION_TRIGGER}{name}");
        let start = confirmed.range.start;
        buffer.replace_text(confirmed.range, &format!("{mention_text} "))?;

        let range = start..start + utils::char_len(&mention_text);
        let annotation = buffer.add_annotation(range.clone(), Some(confirmed.user))?;
        debug!("Committed mention {annotation} of {mention_text:?} at {range:?}");
        Ok(CommittedMention {
            annotation,
            caret: Caret::At(range.end + 1),
            range,
        })
    }

    /// Cancels the ongoing candidate, e.g., because the user dismissed the picker.
    ///
    /// Publishes [`MentionState::None`] and returns the cancelled candidate, if any.
    /// The host may mark the candidate's range with a placeholder annotation
    /// (one without a user); such placeholders never block the mention from being reopened.
    pub fn cancel(&mut self) -> Option<MentionCandidate> {
        self.publisher.publish(MentionState::None);
        self.ongoing.take()
    }
}
