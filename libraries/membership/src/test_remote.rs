//! An in-memory remote for tests. Writes succeed unless told otherwise, and can be held open with gates
//! so tests decide the order in which responses arrive.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};

use futures::channel::oneshot;

use crate::{MembershipRemote, RemoteError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Fetch,
    Add(u32),
    Remove(u32),
}

#[derive(Default)]
pub(crate) struct FakeRemote {
    pub server: RefCell<BTreeSet<u32>>,
    pub calls: RefCell<Vec<Call>>,
    fetch_error: RefCell<Option<RemoteError>>,
    write_errors: RefCell<HashMap<u32, RemoteError>>,
    fetch_gates: RefCell<VecDeque<oneshot::Receiver<Result<Vec<u32>, RemoteError>>>>,
    write_gates: RefCell<VecDeque<oneshot::Receiver<Result<(), RemoteError>>>>,
}

impl FakeRemote {
    pub fn with_members(ids: impl IntoIterator<Item = u32>) -> Self {
        let remote = Self::default();
        remote.server.borrow_mut().extend(ids);
        remote
    }

    pub fn fail_fetch(&self, error: RemoteError) {
        *self.fetch_error.borrow_mut() = Some(error);
    }

    pub fn clear_fetch_failure(&self) {
        self.fetch_error.borrow_mut().take();
    }

    pub fn fail_writes_for(&self, id: u32, error: RemoteError) {
        self.write_errors.borrow_mut().insert(id, error);
    }

    /// The next fetch to be polled waits for the returned sender and answers with what it sends.
    pub fn gate_next_fetch(&self) -> oneshot::Sender<Result<Vec<u32>, RemoteError>> {
        let (sender, receiver) = oneshot::channel();
        self.fetch_gates.borrow_mut().push_back(receiver);
        sender
    }

    /// The next write to be polled waits for the returned sender and answers with what it sends.
    /// Gates are handed out in the order the writes are first polled.
    pub fn gate_next_write(&self) -> oneshot::Sender<Result<(), RemoteError>> {
        let (sender, receiver) = oneshot::channel();
        self.write_gates.borrow_mut().push_back(receiver);
        sender
    }

    async fn write(&self, id: u32, add: bool) -> Result<(), RemoteError> {
        self.calls
            .borrow_mut()
            .push(if add { Call::Add(id) } else { Call::Remove(id) });

        let gate = self.write_gates.borrow_mut().pop_front();
        let result = match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(RemoteError::Request("gate dropped".to_string()))),
            None => match self.write_errors.borrow().get(&id) {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            },
        };

        if result.is_ok() {
            let mut server = self.server.borrow_mut();
            if add {
                server.insert(id);
            } else {
                server.remove(&id);
            }
        }
        result
    }
}

impl MembershipRemote for FakeRemote {
    type Id = u32;

    async fn fetch_membership(&self) -> Result<Vec<u32>, RemoteError> {
        self.calls.borrow_mut().push(Call::Fetch);

        let gate = self.fetch_gates.borrow_mut().pop_front();
        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Err(RemoteError::Request("gate dropped".to_string())));
        }

        if let Some(error) = self.fetch_error.borrow().clone() {
            return Err(error);
        }
        Ok(self.server.borrow().iter().copied().collect())
    }

    async fn add_membership(&self, id: &u32) -> Result<(), RemoteError> {
        self.write(*id, true).await
    }

    async fn remove_membership(&self, id: &u32) -> Result<(), RemoteError> {
        self.write(*id, false).await
    }
}
