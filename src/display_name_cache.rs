//! A cache of user display names, indexed by user reference.
//!
//! The cache itself is only accessible from the UI thread that owns the compose buffer,
//! because the mention tracker must be able to look up a name during a text change
//! without ever blocking. Other threads (e.g., a network task that fetched a profile)
//! submit new names through a [`DisplayNameUpdater`], and the UI thread applies them
//! by calling [`DisplayNameCache::process_pending_updates()`].

use std::{
    cell::RefCell,
    collections::{btree_map::Entry, BTreeMap, BTreeSet},
    sync::Arc,
};

use crossbeam_queue::SegQueue;
use tracing::{trace, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::mention::{Contact, UserRef};

/// A synchronous, non-blocking lookup of a user's short display name.
pub trait DisplayNames {
    /// Returns the short display name of the given user, if it is already known.
    ///
    /// Implementations must not block; if the name is not cached, return `None`.
    fn short_display_name(&self, user: &UserRef) -> Option<String>;
}

/// A directory of contacts that the mention picker UI can search.
pub trait ContactDirectory: DisplayNames {
    /// Returns all known contacts whose display name matches the partial name
    /// typed after the trigger character.
    fn resolve_by_partial_name(&self, query: &str) -> Vec<Contact>;
}


/// An update to the display name cache, submitted from any thread.
#[derive(Clone, Debug)]
pub enum DisplayNameUpdate {
    /// A user's display name was fetched or changed.
    Loaded(Contact),
    /// A user is no longer known, e.g., they left the conversation.
    Removed(UserRef),
}

impl DisplayNameUpdate {
    /// Returns the user reference associated with this update.
    pub fn user(&self) -> &UserRef {
        match self {
            DisplayNameUpdate::Loaded(contact) => &contact.user,
            DisplayNameUpdate::Removed(user) => user,
        }
    }

    fn apply_to_cache(self, cache: &mut BTreeMap<UserRef, DisplayNameCacheEntry>) {
        match self {
            DisplayNameUpdate::Loaded(contact) => match cache.entry(contact.user.clone()) {
                Entry::Occupied(mut entry) => {
                    *entry.get_mut() = DisplayNameCacheEntry::Loaded(contact);
                }
                Entry::Vacant(entry) => {
                    entry.insert(DisplayNameCacheEntry::Loaded(contact));
                }
            },
            DisplayNameUpdate::Removed(user) => {
                if cache.remove(&user).is_none() {
                    warn!("Display name cache had no entry for removed user {user}");
                }
            }
        }
    }
}


/// A cloneable handle used to submit display name updates from any thread.
#[derive(Clone, Debug, Default)]
pub struct DisplayNameUpdater {
    pending: Arc<SegQueue<DisplayNameUpdate>>,
}

impl DisplayNameUpdater {
    /// Enqueues a new display name update, to be applied by the UI thread
    /// the next time it processes pending updates.
    pub fn enqueue(&self, update: DisplayNameUpdate) {
        self.pending.push(update);
    }
}


#[derive(Debug)]
enum DisplayNameCacheEntry {
    /// The name was looked up but isn't known yet;
    /// the host has been (or will be) asked to fetch it.
    Requested,
    /// The name has been loaded.
    Loaded(Contact),
}


/// A cache of user display names owned by the UI thread.
#[derive(Debug, Default)]
pub struct DisplayNameCache {
    entries: RefCell<BTreeMap<UserRef, DisplayNameCacheEntry>>,
    /// Users that were looked up but missing, which the host should fetch.
    requested: RefCell<BTreeSet<UserRef>>,
    updater: DisplayNameUpdater,
}

impl DisplayNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that other threads can use to submit updates to this cache.
    pub fn updater(&self) -> DisplayNameUpdater {
        self.updater.clone()
    }

    /// Inserts a contact into the cache right away, from the UI thread.
    pub fn insert(&mut self, contact: Contact) {
        DisplayNameUpdate::Loaded(contact).apply_to_cache(self.entries.get_mut());
    }

    /// Applies all pending updates that were submitted through a [`DisplayNameUpdater`].
    ///
    /// Returns the number of updates that were applied.
    pub fn process_pending_updates(&mut self) -> usize {
        let entries = self.entries.get_mut();
        let mut count = 0;
        while let Some(update) = self.updater.pending.pop() {
            trace!("Applying display name update for user {}", update.user());
            update.apply_to_cache(entries);
            count += 1;
        }
        count
    }

    /// Returns the set of users whose names were looked up but not found,
    /// clearing that set. The host should fetch those names and submit them
    /// as [`DisplayNameUpdate::Loaded`].
    pub fn take_requested(&self) -> BTreeSet<UserRef> {
        std::mem::take(&mut *self.requested.borrow_mut())
    }

    /// Invokes the given closure with the cached contact for the given user
    /// if it exists in the cache, otherwise marks that user as requested.
    pub fn with_contact<F, R>(&self, user: &UserRef, f: F) -> Option<R>
    where
        F: FnOnce(&Contact) -> R,
    {
        let mut entries = self.entries.borrow_mut();
        match entries.entry(user.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                DisplayNameCacheEntry::Loaded(contact) => Some(f(contact)),
                DisplayNameCacheEntry::Requested => None,
            },
            Entry::Vacant(entry) => {
                entry.insert(DisplayNameCacheEntry::Requested);
                self.requested.borrow_mut().insert(user.clone());
                None
            }
        }
    }
}

impl DisplayNames for DisplayNameCache {
    fn short_display_name(&self, user: &UserRef) -> Option<String> {
        self.with_contact(user, |contact| contact.short_name().to_owned())
            .filter(|name| !name.is_empty())
    }
}

impl ContactDirectory for DisplayNameCache {
    fn resolve_by_partial_name(&self, query: &str) -> Vec<Contact> {
        let entries = self.entries.borrow();
        let mut matches: Vec<Contact> = entries.values()
            .filter_map(|entry| match entry {
                DisplayNameCacheEntry::Loaded(contact) => Some(contact),
                DisplayNameCacheEntry::Requested => None,
            })
            .filter(|contact| display_name_matches(&contact.display_name, query))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.display_name.cmp(&b.display_name).then_with(|| a.user.cmp(&b.user)));
        matches
    }
}

/// Returns `true` if any word of the display name starts with the query,
/// ignoring ASCII case.
fn display_name_matches(display_name: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty()
        || display_name.split_whitespace().any(|word| grapheme_starts_with(word, query, true))
}

/// Checks if `haystack` starts with `needle`, comparing whole grapheme clusters
/// such that a needle never matches half of an emoji sequence or a combined char.
fn grapheme_starts_with(haystack: &str, needle: &str, case_insensitive: bool) -> bool {
    let mut haystack_graphemes = haystack.graphemes(true);
    for n_grapheme in needle.graphemes(true) {
        let Some(h_grapheme) = haystack_graphemes.next() else {
            return false;
        };
        let grapheme_matches = if case_insensitive && h_grapheme.is_ascii() && n_grapheme.is_ascii() {
            h_grapheme.eq_ignore_ascii_case(n_grapheme)
        } else {
            h_grapheme == n_grapheme
        };
        if !grapheme_matches {
            return false;
        }
    }
    true
}
