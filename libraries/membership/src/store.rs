use std::cell::RefCell;
use std::sync::Arc;

use crate::data_model::{
    DirtyState, DirtyTracker, ListenerKey, LoadState, MembershipSet, PendingIntents, Resolution,
    UndoToken,
};
use crate::{FetchError, MembershipRemote, MutationError, RemoteError};

/// How a successful remote write was settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// The write was the latest intent for its id, or was applied after the latest one failed.
    Committed,
    /// A newer toggle for the same id owns its local value.
    Superseded,
    /// The store was torn down before the write settled.
    Discarded,
}

/// What listeners and readers see.
#[derive(Debug, Clone)]
struct LocalView<Id: Eq + std::hash::Hash> {
    members: MembershipSet<Id>,
    load_state: LoadState,
}

impl<Id: Eq + std::hash::Hash> Default for LocalView<Id> {
    fn default() -> Self {
        Self {
            members: MembershipSet::default(),
            load_state: LoadState::default(),
        }
    }
}

struct StoreState<Id: Eq + std::hash::Hash> {
    view: DirtyTracker<LocalView<Id>>,
    pending: PendingIntents<Id>,
    listeners: slotmap::SlotMap<slotmap::DefaultKey, Arc<dyn Fn(ListenerKey)>>,
    /// Bumped by every fetch. Only the response to the newest fetch is applied.
    fetch_generation: u64,
    torn_down: bool,
}

/// A local set of ids kept in sync with a [`MembershipRemote`].
///
/// Toggles are applied locally right away and then written to the remote. If the write fails the id is rolled back
/// and the error is handed to the caller, who decides whether to retry or tell the user. Nothing is retried here.
pub struct MembershipStore<Remote: MembershipRemote> {
    remote: Remote,
    // we never hold a borrow across an .await. by avoiding this, we guarantee the absence of "borrow while locked" panics
    state: RefCell<StoreState<Remote::Id>>,
}

impl<Remote: MembershipRemote> MembershipStore<Remote> {
    pub fn new(remote: Remote) -> Self {
        Self {
            remote,
            state: RefCell::new(StoreState {
                view: DirtyTracker::default(),
                pending: PendingIntents::default(),
                listeners: Default::default(),
                fetch_generation: 0,
                torn_down: false,
            }),
        }
    }

    pub fn remote(&self) -> &Remote {
        &self.remote
    }

    // =======
    // loading
    // =======

    /// Fetches the authoritative membership list and replaces the local set with it.
    ///
    /// `loading` is set before this returns. Failures are recorded in [`LoadState::last_fetch_error`] and leave the set as it was.
    pub fn initialize(&self) -> impl Future<Output = ()> + '_ {
        self.initialize_as(None)
    }

    pub fn refresh(&self) -> impl Future<Output = ()> + '_ {
        self.initialize_as(None)
    }

    pub fn initialize_as(&self, modifier: Option<ListenerKey>) -> impl Future<Output = ()> + '_ {
        let generation = {
            let _flusher = FlushLater::new(self);
            let mut state = self.state.borrow_mut();
            if state.torn_down {
                None
            } else {
                state.fetch_generation += 1;
                state.pending.fetch_started();
                state.view.store_mut(modifier).load_state.mark_fetch_started();
                Some(state.fetch_generation)
            }
        };

        async move {
            let Some(generation) = generation else {
                log::warn!("Ignoring membership fetch on a torn down store");
                return;
            };

            let result = self.remote.fetch_membership().await;

            let _flusher = FlushLater::new(self);
            let mut state = self.state.borrow_mut();
            if state.torn_down {
                log::debug!("Discarding membership fetch that settled after teardown");
                return;
            }
            if state.fetch_generation != generation {
                log::debug!("Discarding membership fetch {generation}, a newer one is in flight");
                return;
            }
            state.apply_fetch(result, modifier);
        }
    }

    // =======
    // toggling
    // =======

    /// Sets the membership of `id` to `desired`.
    ///
    /// The local set reflects `desired` as soon as this returns. The remote write happens when the returned future is
    /// awaited. Dropping the future without awaiting it abandons the write and leaves the id pending.
    pub fn toggle(
        &self,
        id: Remote::Id,
        desired: bool,
    ) -> impl Future<Output = Result<(), MutationError>> + '_ {
        self.toggle_as(id, desired, None)
    }

    /// Like [`toggle`](Self::toggle), but the optimistic write does not notify `modifier`.
    pub fn toggle_as(
        &self,
        id: Remote::Id,
        desired: bool,
        modifier: Option<ListenerKey>,
    ) -> impl Future<Output = Result<(), MutationError>> + '_ {
        let token = self.apply_local(id, desired, modifier);
        self.confirm(token)
    }

    /// The optimistic half of a toggle. The returned token must be passed to [`commit_or_revert`](Self::commit_or_revert).
    pub fn apply_local(
        &self,
        id: Remote::Id,
        desired: bool,
        modifier: Option<ListenerKey>,
    ) -> UndoToken<Remote::Id> {
        let _flusher = FlushLater::new(self);
        let mut state = self.state.borrow_mut();
        let state = &mut *state;

        let previous = state.view.store().members.contains(&id);
        let sequence = state.pending.begin(id.clone(), desired, previous);
        if previous != desired {
            state.view.store_mut(modifier).members.set(id.clone(), desired);
        }
        log::debug!("Optimistically set {id:?} to {desired} (write #{sequence})");

        UndoToken {
            id,
            desired,
            previous,
            sequence,
        }
    }

    /// Sends the remote write for `token` and settles it.
    pub async fn confirm(&self, token: UndoToken<Remote::Id>) -> Result<(), MutationError> {
        let result = if token.desired {
            self.remote.add_membership(&token.id).await
        } else {
            self.remote.remove_membership(&token.id).await
        };
        self.commit_or_revert(token, result).map(|_| ())
    }

    /// The settling half of a toggle. On failure the id is rolled back and the error is returned.
    pub fn commit_or_revert(
        &self,
        token: UndoToken<Remote::Id>,
        result: Result<(), RemoteError>,
    ) -> Result<Settlement, MutationError> {
        let _flusher = FlushLater::new(self);
        let mut state = self.state.borrow_mut();

        if state.torn_down {
            log::debug!(
                "Discarding write #{} for {:?} that settled after teardown",
                token.sequence,
                token.id
            );
            return match result {
                Ok(()) => Ok(Settlement::Discarded),
                Err(error) => Err(MutationError::new(&token, error, false)),
            };
        }

        let state = &mut *state;
        let resolution =
            state
                .pending
                .settle(&token.id, token.sequence, token.desired, result.is_ok());

        let target = match resolution {
            Resolution::Committed | Resolution::Superseded => None,
            Resolution::RollBack(value) | Resolution::FollowServer(value) => Some(value),
            Resolution::Untracked => result.is_err().then_some(token.previous),
        };
        if let Some(value) = target
            && state.view.store().members.contains(&token.id) != value
        {
            state.view.store_mut(None).members.set(token.id.clone(), value);
        }

        match result {
            Ok(()) => Ok(match resolution {
                Resolution::Superseded => Settlement::Superseded,
                _ => Settlement::Committed,
            }),
            Err(error) => {
                let rolled_back =
                    matches!(resolution, Resolution::RollBack(_) | Resolution::Untracked);
                log::warn!(
                    "Write #{} setting {:?} to {} failed: {error}{}",
                    token.sequence,
                    token.id,
                    token.desired,
                    if rolled_back { ", rolled back" } else { "" }
                );
                Err(MutationError::new(&token, error, rolled_back))
            }
        }
    }

    // =======
    // reading
    // =======

    pub fn is_member(&self, id: &Remote::Id) -> bool {
        self.state.borrow().view.store().members.contains(id)
    }

    /// The current members, sorted.
    pub fn members(&self) -> Vec<Remote::Id> {
        self.state.borrow().view.store().members.sorted()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().view.store().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().view.store().members.is_empty()
    }

    /// True while a remote write for `id` has not settled.
    pub fn is_pending(&self, id: &Remote::Id) -> bool {
        self.state.borrow().pending.is_pending(id)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().view.store().load_state.loading
    }

    pub fn fetch_error(&self) -> Option<FetchError> {
        self.state
            .borrow()
            .view
            .store()
            .load_state
            .last_fetch_error
            .clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.state.borrow().view.store().load_state.clone()
    }

    pub fn loaded_at_least_once(&self) -> bool {
        self.state.borrow().view.loaded_at_least_once()
    }

    // =======
    // listeners and lifecycle
    // =======

    /// The listener is invoked after every change to the members or the load state.
    pub fn subscribe(&self, listener: impl Fn(ListenerKey) + 'static) -> ListenerKey {
        let key = self.state.borrow_mut().listeners.insert(Arc::new(listener));
        ListenerKey(key)
    }

    pub fn unsubscribe(&self, key: ListenerKey) {
        self.state.borrow_mut().listeners.remove(key.0);
    }

    /// Called when the owning UI goes away. Responses that settle afterwards are discarded and listeners are dropped.
    pub fn teardown(&self) {
        let mut state = self.state.borrow_mut();
        state.torn_down = true;
        state.listeners.clear();
        state.pending.clear();
        // a fetch still in flight will be discarded
        state.view.store_mut(None).load_state.loading = false;
        log::debug!("Membership store torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.borrow().torn_down
    }

    /// Flush pending notifications safely, avoiding RefCell re-borrows during callbacks.
    fn flush_notifications(&self) {
        // do it like this to avoid holding the borrow while we call the callbacks
        let notifications = self.state.borrow_mut().drain_due_notifications();
        // listeners commonly read the store again, which borrows it
        for notification in notifications {
            notification();
        }
    }
}

impl<Id: Eq + std::hash::Hash + Clone + std::fmt::Debug + 'static> StoreState<Id> {
    fn apply_fetch(
        &mut self,
        result: Result<Vec<Id>, RemoteError>,
        modifier: Option<ListenerKey>,
    ) {
        let accepted = self.pending.take_accepted_during_fetch();
        match result {
            Ok(ids) => {
                let mut fetched: MembershipSet<Id> = ids.into_iter().collect();
                // the list may have been read before these writes landed
                for (id, member) in accepted {
                    fetched.set(id, member);
                }
                self.pending.refresh_confirmed(&fetched);

                let mut view = self.view.store_mut(modifier);
                view.members = fetched;
                // writes still in flight may not be reflected in the list yet
                for (id, desired) in self.pending.live_intents() {
                    view.members.set(id.clone(), desired);
                }
                view.load_state.mark_fetch_finished(None);
                let count = view.members.len();

                self.view.mark_loaded(modifier);
                log::info!("Loaded membership list with {count} members");
            }
            Err(error) => {
                log::error!("Error fetching membership list: {error}");
                self.view
                    .store_mut(modifier)
                    .load_state
                    .mark_fetch_finished(Some(FetchError::from(error)));
            }
        }
    }

    fn drain_due_notifications(&mut self) -> Vec<Box<dyn FnOnce()>> {
        let exclude_key = match self.view.take_dirty_state() {
            DirtyState::Clean => return Vec::new(),
            DirtyState::DirtyExcept(key) => Some(key),
            DirtyState::DirtyAll => None,
        };

        let mut notifications: Vec<Box<dyn FnOnce()>> = Vec::new();
        for (key, listener) in self.listeners.iter() {
            let listener_key = ListenerKey(key);
            if exclude_key == Some(listener_key) {
                continue;
            }
            let listener = listener.clone();
            notifications.push(Box::new(move || listener(listener_key)));
        }
        notifications
    }
}

/// Flushes listeners when dropped, so no code path forgets to notify them.
struct FlushLater<'a, Remote: MembershipRemote> {
    store: &'a MembershipStore<Remote>,
}

impl<'a, Remote: MembershipRemote> FlushLater<'a, Remote> {
    fn new(store: &'a MembershipStore<Remote>) -> Self {
        Self { store }
    }
}

impl<Remote: MembershipRemote> Drop for FlushLater<'_, Remote> {
    fn drop(&mut self) {
        self.store.flush_notifications();
    }
}
