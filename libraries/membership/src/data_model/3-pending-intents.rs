//! # PendingIntents
//! Bookkeeping for ids that have remote writes in flight.
//!
//! Overlapping writes to the same id (say a follow and an unfollow clicked in quick succession) can settle in any order.
//! The policy is "last intent wins":
//! 1. Every optimistic write gets a sequence number. The newest one for an id is its latest intent.
//! 2. Only the latest intent decides the local value when it settles. An older write settling later never clobbers it.
//! 3. Each id remembers the last value the server accepted (`confirmed`). If the latest intent fails, the id goes back to that value.
//! 4. Once the latest intent has failed, older writes that still settle move the id to whatever the server then confirms.
//!
//! An id is tracked only while at least one write for it is in flight.
//!
//! While a fetch is in flight, writes the server accepts are also remembered by id. The fetched list may have been read
//! before they landed, so they are laid over it when it arrives.

use std::collections::HashMap;
use std::hash::Hash;

use crate::data_model::MembershipSet;

#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingIntent {
    latest: u64,
    desired: bool,
    in_flight: usize,
    confirmed: bool,
    latest_failed: bool,
}

/// What the settlement of one write means for the local value of its id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The latest intent was accepted. The local value already reflects it.
    Committed,
    /// A newer intent owns the id.
    Superseded,
    /// The latest intent failed. Set the id to the contained value.
    RollBack(bool),
    /// The latest intent already failed, and an older write settled after it. Set the id to the contained value.
    FollowServer(bool),
    /// Nothing is known about the write, e.g. the intents were cleared while it was in flight.
    Untracked,
}

#[derive(Clone, Debug)]
pub struct PendingIntents<Id> {
    intents: HashMap<Id, PendingIntent>,
    next_sequence: u64,
    /// `Some` while a fetch is in flight.
    accepted_during_fetch: Option<HashMap<Id, bool>>,
}

impl<Id> Default for PendingIntents<Id> {
    fn default() -> Self {
        Self {
            intents: HashMap::new(),
            next_sequence: 1,
            accepted_during_fetch: None,
        }
    }
}

impl<Id: Eq + Hash + Clone> PendingIntents<Id> {
    /// Records a new optimistic write and returns its sequence number.
    /// `current` is the local value of the id right before the write.
    pub fn begin(&mut self, id: Id, desired: bool, current: bool) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let intent = self.intents.entry(id).or_insert(PendingIntent {
            latest: sequence,
            desired,
            in_flight: 0,
            confirmed: current,
            latest_failed: false,
        });
        intent.latest = sequence;
        intent.desired = desired;
        intent.in_flight += 1;
        intent.latest_failed = false;

        sequence
    }

    pub fn settle(&mut self, id: &Id, sequence: u64, desired: bool, succeeded: bool) -> Resolution {
        if succeeded && let Some(accepted) = &mut self.accepted_during_fetch {
            accepted.insert(id.clone(), desired);
        }

        let Some(intent) = self.intents.get_mut(id) else {
            return Resolution::Untracked;
        };

        intent.in_flight = intent.in_flight.saturating_sub(1);
        if succeeded {
            intent.confirmed = desired;
        }

        let resolution = if sequence == intent.latest {
            if succeeded {
                Resolution::Committed
            } else {
                intent.latest_failed = true;
                Resolution::RollBack(intent.confirmed)
            }
        } else if intent.latest_failed {
            Resolution::FollowServer(intent.confirmed)
        } else {
            Resolution::Superseded
        };

        if intent.in_flight == 0 {
            self.intents.remove(id);
        }

        resolution
    }

    pub fn is_pending(&self, id: &Id) -> bool {
        self.intents.contains_key(id)
    }

    /// Starts remembering accepted writes. Overlapping fetches share one record, which the newest of them takes.
    pub fn fetch_started(&mut self) {
        self.accepted_during_fetch.get_or_insert_with(HashMap::new);
    }

    /// Writes the server accepted since the oldest fetch still in flight began, with the value each one set.
    pub fn take_accepted_during_fetch(&mut self) -> HashMap<Id, bool> {
        self.accepted_during_fetch.take().unwrap_or_default()
    }

    /// A freshly fetched membership list is the best knowledge of what the server holds.
    pub fn refresh_confirmed(&mut self, fetched: &MembershipSet<Id>) {
        for (id, intent) in self.intents.iter_mut() {
            intent.confirmed = fetched.contains(id);
        }
    }

    /// Latest intents that have not failed. These still belong in the local view.
    pub fn live_intents(&self) -> impl Iterator<Item = (&Id, bool)> {
        self.intents
            .iter()
            .filter(|(_, intent)| !intent.latest_failed)
            .map(|(id, intent)| (id, intent.desired))
    }

    pub fn clear(&mut self) {
        self.intents.clear();
        self.accepted_during_fetch = None;
    }
}
