//! Publishes the mention state that drives the contact picker UI.
//!
//! The state is a single, always-current value: observers only ever see
//! the latest state, and setting the same state twice publishes nothing.

use std::ops::Range;

use eyeball::{Observable, Subscriber};
use tracing::trace;

use crate::mention::{MentionCandidate, MentionState, UserRef};

/// Derives the state to publish after a reconciliation pass.
///
/// Returns `None` if nothing should be published, which is the case
/// when the pass cut a mention back to its canonical name:
/// a repair must never reopen or refilter the picker.
pub fn next_state(detected: Option<&MentionCandidate>, name_cut: bool) -> Option<MentionState> {
    if name_cut {
        return None;
    }
    Some(match detected {
        Some(candidate) => MentionState::Filtering(candidate.query.clone()),
        None => MentionState::None,
    })
}

/// Holds the latest [`MentionState`] and notifies subscribers when it changes.
pub struct StatePublisher {
    state: Observable<MentionState>,
}

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatePublisher")
            .field("state", Observable::<MentionState>::get(&self.state))
            .finish()
    }
}

impl StatePublisher {
    pub fn new() -> Self {
        Self { state: Observable::new(MentionState::None) }
    }

    /// Returns the most recently published state.
    pub fn get(&self) -> &MentionState {
        Observable::get(&self.state)
    }

    /// Returns a subscriber that observes every future state change.
    pub fn subscribe(&self) -> Subscriber<MentionState> {
        Observable::subscribe(&self.state)
    }

    /// Publishes the given state unless it equals the current state.
    ///
    /// Returns `true` if the state was published.
    pub fn publish(&mut self, state: MentionState) -> bool {
        let published = Observable::set_if_not_eq(&mut self.state, state).is_some();
        if published {
            trace!("Published mention state {:?}", Observable::get(&self.state));
        }
        published
    }

    /// Publishes a `Completed` event, even if an identical one was just published,
    /// since every confirmation is a distinct event for the picker.
    pub fn publish_completed(&mut self, user: UserRef, range: Range<usize>) {
        trace!("Published completed mention of user {user} at {range:?}");
        Observable::set(&mut self.state, MentionState::Completed { user, range });
    }
}


#[cfg(test)]
mod tests {
    use futures_util::FutureExt;

    use super::*;

    #[test]
    fn test_next_state() {
        let candidate = MentionCandidate { range: 3..6, query: "al".into() };
        assert_eq!(next_state(Some(&candidate), false), Some(MentionState::Filtering("al".into())));
        assert_eq!(next_state(None, false), Some(MentionState::None));
        assert_eq!(next_state(Some(&candidate), true), None);
        assert_eq!(next_state(None, true), None);
    }

    #[test]
    fn test_publish_skips_redundant_states() {
        let mut publisher = StatePublisher::new();
        let mut subscriber = publisher.subscribe();
        assert_eq!(publisher.get(), &MentionState::None);

        assert!(!publisher.publish(MentionState::None));
        assert_eq!(subscriber.next().now_or_never(), None);

        assert!(publisher.publish(MentionState::Filtering("a".into())));
        assert!(!publisher.publish(MentionState::Filtering("a".into())));
        assert_eq!(subscriber.next().now_or_never(), Some(Some(MentionState::Filtering("a".into()))));
        assert_eq!(subscriber.next().now_or_never(), None);
    }

    #[test]
    fn test_subscriber_sees_only_latest_state() {
        let mut publisher = StatePublisher::new();
        let mut subscriber = publisher.subscribe();
        publisher.publish(MentionState::Filtering("a".into()));
        publisher.publish(MentionState::Filtering("al".into()));
        assert_eq!(subscriber.next().now_or_never(), Some(Some(MentionState::Filtering("al".into()))));
    }

    #[test]
    fn test_completed_is_always_published() {
        let mut publisher = StatePublisher::new();
        let mut subscriber = publisher.subscribe();
        let user = UserRef::from(vec![0xAA]);
        publisher.publish_completed(user.clone(), 0..0);
        assert!(subscriber.next().now_or_never().is_some());
        publisher.publish_completed(user.clone(), 0..0);
        assert_eq!(
            subscriber.next().now_or_never(),
            Some(Some(MentionState::Completed { user, range: 0..0 })),
        );
    }
}
