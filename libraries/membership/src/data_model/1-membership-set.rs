//! # MembershipSet
//! The local view of a membership relation: the ids the current user is believed to be related to.
//! It is unordered and holds each id at most once. It says nothing about what the server holds; that is tracked by the store.

use std::collections::HashSet;
use std::hash::Hash;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipSet<Id: Eq + Hash> {
    members: HashSet<Id>,
}

impl<Id: Eq + Hash> Default for MembershipSet<Id> {
    fn default() -> Self {
        Self {
            members: HashSet::new(),
        }
    }
}

impl<Id: Eq + Hash> MembershipSet<Id> {
    pub fn contains(&self, id: &Id) -> bool {
        self.members.contains(id)
    }

    /// Sets whether `id` is a member. Returns the value it had before.
    pub fn set(&mut self, id: Id, member: bool) -> bool {
        if member {
            !self.members.insert(id)
        } else {
            self.members.remove(&id)
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Id> {
        self.members.iter()
    }
}

impl<Id: Eq + Hash + Ord + Clone> MembershipSet<Id> {
    pub fn sorted(&self) -> Vec<Id> {
        let mut ids: Vec<Id> = self.members.iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl<Id: Eq + Hash> FromIterator<Id> for MembershipSet<Id> {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
