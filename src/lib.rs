//! Tracks `@`-mentions of users while a message is being composed.
//!
//! A [`MentionTracker`] is driven by the host's text widget, which implements
//! [`MentionBuffer`] and calls [`MentionTracker::on_text_changed()`] after every edit.
//! The tracker keeps confirmed mentions consistent with the text they cover,
//! and publishes a [`MentionState`] that drives the contact picker UI.

/// Char-index helpers for working with UTF-8 text.
pub mod utils;
pub mod errors;
/// Core mention types: users, annotations, candidates, and states.
pub mod mention;
pub mod config;
/// The text buffer interface and an in-memory implementation.
pub mod buffer;
pub mod display_name_cache;
pub mod tracker;

pub use buffer::{ComposeBuffer, MentionBuffer};
pub use config::{ConfirmFallback, TrackerConfig, WhitespaceClass};
pub use display_name_cache::{
    ContactDirectory, DisplayNameCache, DisplayNameUpdate, DisplayNameUpdater, DisplayNames,
};
pub use errors::{BufferError, TrackerError};
pub use mention::{
    AnnotationId, Caret, ConfirmedMention, Contact, MentionAnnotation, MentionCandidate,
    MentionState, UserRef, MENTION_TRIGGER,
};
pub use tracker::{
    mention_utils::{mentioned_users, render_mentions},
    CommittedMention, MentionTracker, TextChange,
};
