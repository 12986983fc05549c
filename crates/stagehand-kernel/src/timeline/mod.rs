//! Timeline Module
//!
//! A single-threaded schedule of `(due, effect)` entries. Entries are ordered by due
//! time and then by insertion, so two effects scheduled for the same instant fire in
//! the order they were scheduled.
//!
//! Every entry records who owns it. Scene-owned entries belong to a [`Generation`];
//! starting a new generation purges the entries of every older one, and any stale
//! entry that still reaches [`Timeline::pop_due`] is dropped instead of returned.
//! Conversation-owned entries survive generation changes.

use crate::clock::Millis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scene-entry counter. Bumped every time a scene is entered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation after this one
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Owner of a scheduled entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// Choreography of one scene entry; superseded by the next entry
    Scene(Generation),
    /// Conversation replies; never superseded
    Conversation,
}

/// A scheduled effect
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<E> {
    /// Virtual time at which the effect is due
    pub due: Millis,
    /// Who scheduled it
    pub owner: Owner,
    /// The effect itself
    pub effect: E,
}

/// Counters describing what the timeline has done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStats {
    /// Entries ever scheduled
    pub scheduled: u64,
    /// Entries handed out by `pop_due`
    pub fired: u64,
    /// Entries removed when a newer generation began
    pub purged: u64,
    /// Stale entries discarded at fire time
    pub stale_dropped: u64,
}

/// Generation-aware schedule of pending effects
#[derive(Debug, Clone)]
pub struct Timeline<E> {
    entries: BTreeMap<(Millis, u64), Entry<E>>,
    seq: u64,
    now: Millis,
    current: Generation,
    stats: TimelineStats,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            seq: 0,
            now: 0,
            current: Generation::default(),
            stats: TimelineStats::default(),
        }
    }
}

impl<E> Timeline<E> {
    /// Create an empty timeline at time zero
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical "now": the time relative delays are measured from
    #[inline]
    #[must_use]
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Move logical time forward. Never moves it backwards.
    #[inline]
    pub fn advance_to(&mut self, at: Millis) {
        self.now = self.now.max(at);
    }

    /// Generation currently allowed to fire
    #[inline]
    #[must_use]
    pub fn current_generation(&self) -> Generation {
        self.current
    }

    /// Start a new generation and purge scene entries of all older ones
    pub fn begin_generation(&mut self) -> Generation {
        self.current = self.current.next();
        let current = self.current;
        let before = self.entries.len();
        self.entries.retain(|_, entry| match entry.owner {
            Owner::Scene(generation) => generation == current,
            Owner::Conversation => true,
        });
        let purged = (before - self.entries.len()) as u64;
        self.stats.purged += purged;
        if purged > 0 {
            tracing::debug!(generation = %current, purged, "purged superseded timeline entries");
        }
        current
    }

    /// Schedule an effect at an absolute time. Times in the past are clamped to now.
    pub fn schedule_at(&mut self, due: Millis, owner: Owner, effect: E) {
        let due = due.max(self.now);
        let key = (due, self.seq);
        self.seq += 1;
        self.stats.scheduled += 1;
        self.entries.insert(key, Entry { due, owner, effect });
    }

    /// Schedule an effect `delay` milliseconds after now
    #[inline]
    pub fn schedule_in(&mut self, delay: Millis, owner: Owner, effect: E) {
        self.schedule_at(self.now.saturating_add(delay), owner, effect);
    }

    /// Due time of the earliest pending entry
    #[inline]
    #[must_use]
    pub fn next_due(&self) -> Option<Millis> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest entry due at or before `limit`
    ///
    /// Logical time moves to the popped entry's due time. Stale scene entries are
    /// skipped and counted.
    pub fn pop_due(&mut self, limit: Millis) -> Option<Entry<E>> {
        loop {
            let key = *self.entries.keys().next()?;
            if key.0 > limit {
                return None;
            }
            let entry = self.entries.remove(&key)?;
            self.advance_to(entry.due);
            if self.is_stale(entry.owner) {
                self.stats.stale_dropped += 1;
                tracing::debug!(due = entry.due, "dropped stale timeline entry");
                continue;
            }
            self.stats.fired += 1;
            return Some(entry);
        }
    }

    /// Whether an entry with this owner may no longer fire
    #[inline]
    #[must_use]
    pub fn is_stale(&self, owner: Owner) -> bool {
        matches!(owner, Owner::Scene(generation) if generation != self.current)
    }

    /// Latest due time among pending entries with the given owner
    #[must_use]
    pub fn last_due_for(&self, owner: Owner) -> Option<Millis> {
        self.entries
            .values()
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.due)
            .max()
    }

    /// Remove and return every pending entry with the given owner, in due order
    ///
    /// Used to re-plan work whose timing depended on entries that were purged.
    pub fn take_owned(&mut self, owner: Owner) -> Vec<Entry<E>> {
        let keys: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.owner == owner)
            .map(|(key, _)| *key)
            .collect();
        keys.into_iter()
            .filter_map(|key| self.entries.remove(&key))
            .collect()
    }

    /// Pending entries
    pub fn iter(&self) -> impl Iterator<Item = &Entry<E>> {
        self.entries.values()
    }

    /// Number of pending entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counters
    #[inline]
    #[must_use]
    pub fn stats(&self) -> TimelineStats {
        self.stats
    }
}
