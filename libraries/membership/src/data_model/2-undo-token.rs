//! # UndoToken
//! The optimistic half of a toggle hands back an undo token. It records which id was written, the value written, the value it replaced,
//! and the sequence number of the write. Settling consumes the token, so every optimistic write is committed or reverted at most once.

#[must_use = "an undo token must be settled with `commit_or_revert`, otherwise the write stays pending"]
#[derive(Debug, PartialEq, Eq)]
pub struct UndoToken<Id> {
    pub(crate) id: Id,
    pub(crate) desired: bool,
    pub(crate) previous: bool,
    pub(crate) sequence: u64,
}

impl<Id> UndoToken<Id> {
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// The membership value the caller asked for.
    pub fn desired(&self) -> bool {
        self.desired
    }

    /// The membership value the id had locally right before the write.
    pub fn previous(&self) -> bool {
        self.previous
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
