//! Single state container for the client.
//!
//! State is only ever changed by dispatching an [`Action`]; the reducer is a
//! pure function `(AppState, Action) -> AppState`. Readers take snapshots or
//! run selectors, and can subscribe to be woken on every change.
//!
//! Fetches are tagged with a per-operation [`Ticket`]. A response is only
//! applied if no newer request (or reset) for the same operation has written
//! the slice since, so a slow stale response cannot overwrite fresher data.
//! A newer request that fails or is ignored writes nothing and so does not
//! invalidate an older one.

use crate::actions::Action;
use crate::models::{Profile, Transaction};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Root client state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub completed_transactions: Vec<Transaction>,
    pub profile: Option<Profile>,
    pub auth_error: bool,
}

/// Pure reducer.
pub fn reduce(state: AppState, action: Action) -> AppState {
    match action {
        Action::GetCompletedTransactions(completed_transactions) => AppState {
            completed_transactions,
            ..state
        },

        Action::RemoveCompletedTransactions => AppState {
            completed_transactions: Vec::new(),
            ..state
        },

        Action::GetProfile(profile) => AppState {
            profile: Some(profile),
            ..state
        },

        Action::RemoveProfile => AppState {
            profile: None,
            ..state
        },

        // Only the display name changes; nothing to rename without a profile
        Action::UpdateProfileName(name) => AppState {
            profile: state.profile.map(|profile| Profile { name, ..profile }),
            ..state
        },

        Action::AuthError(auth_error) => AppState { auth_error, ..state },
    }
}

/// Server-backed slices that are fetched asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Profile,
    CompletedTransactions,
}

impl Operation {
    fn index(self) -> usize {
        match self {
            Operation::Profile => 0,
            Operation::CompletedTransactions => 1,
        }
    }

    /// Operation whose slice an action writes, if it is a fetched slice.
    fn of(action: &Action) -> Option<Self> {
        match action {
            Action::GetProfile(_) | Action::RemoveProfile => Some(Operation::Profile),
            Action::GetCompletedTransactions(_) | Action::RemoveCompletedTransactions => {
                Some(Operation::CompletedTransactions)
            }
            Action::UpdateProfileName(_) | Action::AuthError(_) => None,
        }
    }
}

/// Generation marker handed out when a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    operation: Operation,
    generation: u64,
}

impl Ticket {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

/// Per-operation counters: the last ticket handed out and the newest
/// generation that actually wrote the slice.
#[derive(Default)]
struct Generations {
    issued: AtomicU64,
    applied: AtomicU64,
}

struct Inner {
    state: watch::Sender<AppState>,
    generations: [Generations; 2],
}

/// Cloneable handle to the shared state container.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self {
            inner: Arc::new(Inner {
                state,
                generations: Default::default(),
            }),
        }
    }

    /// Snapshot of the whole state.
    pub fn state(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    /// Runs a selector against the current state without cloning it.
    pub fn select<R>(&self, selector: impl FnOnce(&AppState) -> R) -> R {
        selector(&self.inner.state.borrow())
    }

    /// Receiver woken after every applied action.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.inner.state.subscribe()
    }

    /// Applies `action` unconditionally.
    ///
    /// Reset actions also invalidate any in-flight fetch of their slice.
    pub fn dispatch(&self, action: Action) {
        let reset = matches!(
            action,
            Action::RemoveProfile | Action::RemoveCompletedTransactions
        );
        tracing::debug!("Dispatching {}", action.kind());

        self.inner.state.send_modify(|state| {
            if reset {
                if let Some(operation) = Operation::of(&action) {
                    let generation = self.issue(operation);
                    self.mark_applied(operation, generation);
                }
            }
            *state = reduce(std::mem::take(state), action);
        });
    }

    /// Starts a fetch of `operation`.
    pub fn begin(&self, operation: Operation) -> Ticket {
        Ticket {
            operation,
            generation: self.issue(operation),
        }
    }

    /// True if no newer fetch or reset has written the ticket's slice.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.inner.generations[ticket.operation.index()]
            .applied
            .load(Ordering::SeqCst)
            < ticket.generation
    }

    /// Applies `action` only if `ticket` is still current.
    ///
    /// The check and the write happen under the same lock, so a reset racing
    /// with the response is never overwritten. Returns whether it applied.
    pub fn dispatch_if_current(&self, ticket: Ticket, action: Action) -> bool {
        let kind = action.kind();

        let applied = self.inner.state.send_if_modified(|state| {
            if !self.is_current(ticket) {
                return false;
            }
            self.mark_applied(ticket.operation, ticket.generation);
            *state = reduce(std::mem::take(state), action);
            true
        });

        if applied {
            tracing::debug!("Dispatched {}", kind);
        } else {
            tracing::info!("Dropped stale {} response", kind);
        }
        applied
    }

    fn issue(&self, operation: Operation) -> u64 {
        self.inner.generations[operation.index()]
            .issued
            .fetch_add(1, Ordering::SeqCst)
            + 1
    }

    fn mark_applied(&self, operation: Operation, generation: u64) {
        self.inner.generations[operation.index()]
            .applied
            .fetch_max(generation, Ordering::SeqCst);
    }
}

// Selectors

pub fn select_profile(state: &AppState) -> Option<&Profile> {
    state.profile.as_ref()
}

pub fn select_completed_transactions(state: &AppState) -> &[Transaction] {
    &state.completed_transactions
}

pub fn select_auth_error(state: &AppState) -> bool {
    state.auth_error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{ProfileDto, TransactionDto};

    fn profile(id: i64, name: &str) -> Profile {
        Profile::from_dto(ProfileDto {
            customer_detail_id: id,
            name: name.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn transaction(id: i64) -> Transaction {
        Transaction::from_dto(TransactionDto {
            booking_detail_id: id,
            ..Default::default()
        })
    }

    #[test]
    fn test_remove_actions_reset_slices() {
        let state = AppState {
            completed_transactions: vec![transaction(1), transaction(2)],
            profile: Some(profile(1, "Ana")),
            auth_error: true,
        };

        let state = reduce(state, Action::RemoveCompletedTransactions);
        assert!(state.completed_transactions.is_empty());
        assert!(state.profile.is_some());

        let state = reduce(state, Action::RemoveProfile);
        assert!(state.profile.is_none());

        let state = reduce(state, Action::AuthError(false));
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn test_update_profile_name_only_touches_name() {
        let before = profile(7, "Old");
        let state = reduce(
            AppState {
                profile: Some(before.clone()),
                ..Default::default()
            },
            Action::UpdateProfileName("New".to_string()),
        );

        let after = state.profile.unwrap();
        assert_eq!(after.name, "New");
        assert_eq!(Profile { name: "Old".to_string(), ..after }, before);
    }

    #[test]
    fn test_update_profile_name_without_profile_is_noop() {
        let state = reduce(AppState::default(), Action::UpdateProfileName("X".to_string()));
        assert!(state.profile.is_none());
    }

    #[test]
    fn test_get_completed_transactions_replaces_list() {
        let state = AppState {
            completed_transactions: vec![transaction(1), transaction(2)],
            ..Default::default()
        };
        let state = reduce(state, Action::GetCompletedTransactions(vec![transaction(3)]));
        assert_eq!(state.completed_transactions.len(), 1);
        assert_eq!(state.completed_transactions[0].booking_detail_id, 3);
    }

    #[test]
    fn test_newer_request_wins() {
        let store = Store::new();
        let older = store.begin(Operation::Profile);
        let newer = store.begin(Operation::Profile);

        assert!(store.dispatch_if_current(newer, Action::GetProfile(profile(2, "new"))));
        assert!(!store.dispatch_if_current(older, Action::GetProfile(profile(1, "old"))));

        assert_eq!(store.select(|s| s.profile.as_ref().map(|p| p.customer_detail_id)), Some(2));
    }

    #[test]
    fn test_older_response_applies_when_newer_wrote_nothing() {
        let store = Store::new();
        let older = store.begin(Operation::Profile);
        let _failed = store.begin(Operation::Profile);

        assert!(store.is_current(older));
        assert!(store.dispatch_if_current(older, Action::GetProfile(profile(1, "good"))));
        assert_eq!(
            store.select(|s| s.profile.as_ref().map(|p| p.name.clone())),
            Some("good".to_string())
        );
    }

    #[test]
    fn test_in_order_responses_both_apply() {
        let store = Store::new();
        let first = store.begin(Operation::CompletedTransactions);
        let second = store.begin(Operation::CompletedTransactions);

        assert!(store.dispatch_if_current(
            first,
            Action::GetCompletedTransactions(vec![transaction(1)])
        ));
        assert!(store.dispatch_if_current(
            second,
            Action::GetCompletedTransactions(vec![transaction(2)])
        ));
        assert_eq!(
            store.select(|s| s.completed_transactions[0].booking_detail_id),
            2
        );
    }

    #[test]
    fn test_reset_invalidates_in_flight_fetch() {
        let store = Store::new();
        let ticket = store.begin(Operation::CompletedTransactions);
        store.dispatch(Action::RemoveCompletedTransactions);

        assert!(!store.dispatch_if_current(
            ticket,
            Action::GetCompletedTransactions(vec![transaction(9)])
        ));
        assert!(store.select(|s| select_completed_transactions(s).is_empty()));
    }

    #[test]
    fn test_operations_are_tracked_independently() {
        let store = Store::new();
        let profile_ticket = store.begin(Operation::Profile);
        store.begin(Operation::CompletedTransactions);
        assert!(store.is_current(profile_ticket));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = Store::new();
        let mut rx = store.subscribe();

        store.dispatch(Action::AuthError(true));
        rx.changed().await.unwrap();
        assert!(select_auth_error(&rx.borrow_and_update()));
    }
}
