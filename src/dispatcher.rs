use crate::actions::Action;
use crate::api_client::ApiClient;
use crate::dto::Envelope;
use crate::errors::ApiError;
use crate::models::{Profile, Transaction};
use crate::store::{Operation, Store, Ticket};

/// What a successful network round-trip did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Exactly one state-update message was applied.
    Applied,
    /// A newer response or a reset already wrote the slice; nothing was applied.
    Stale,
    /// The backend answered without the `"success"` marker; nothing was applied.
    Ignored { status: Option<String> },
}

/// Pairs each network call with one state-update message.
#[derive(Clone)]
pub struct Dispatcher {
    client: ApiClient,
    store: Store,
}

impl Dispatcher {
    pub fn new(client: ApiClient, store: Store) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Fetches the profile and emits `GET_PROFILE`.
    pub async fn fetch_profile(&self) -> Result<Dispatch, ApiError> {
        let ticket = self.store.begin(Operation::Profile);
        let envelope = self.client.fetch_profile().await?;

        self.apply(ticket, envelope, |dto| {
            Profile::from_dto(dto).map(Action::GetProfile).map_err(|e| {
                tracing::error!("Profile payload rejected: {}", e);
                ApiError::invalid_payload()
            })
        })
    }

    /// Fetches bookings with `booking_status` and emits `GET_COMPLETED_TRANSACTIONS`.
    pub async fn fetch_completed_transactions(
        &self,
        booking_status: &str,
    ) -> Result<Dispatch, ApiError> {
        let ticket = self.store.begin(Operation::CompletedTransactions);
        let envelope = self.client.fetch_transactions(booking_status).await?;

        self.apply(ticket, envelope, |items| {
            let transactions: Vec<Transaction> =
                items.into_iter().map(Transaction::from_dto).collect();
            tracing::info!(
                "Fetched {} '{}' transactions",
                transactions.len(),
                booking_status
            );
            Ok(Action::GetCompletedTransactions(transactions))
        })
    }

    pub fn remove_profile(&self) {
        self.store.dispatch(Action::RemoveProfile);
    }

    pub fn remove_completed_transactions(&self) {
        self.store.dispatch(Action::RemoveCompletedTransactions);
    }

    pub fn update_profile_name(&self, name: impl Into<String>) {
        self.store.dispatch(Action::UpdateProfileName(name.into()));
    }

    pub fn set_auth_error(&self, flag: bool) {
        self.store.dispatch(Action::AuthError(flag));
    }

    fn apply<T>(
        &self,
        ticket: Ticket,
        envelope: Envelope<T>,
        to_action: impl FnOnce(T) -> Result<Action, ApiError>,
    ) -> Result<Dispatch, ApiError> {
        if !envelope.is_success() {
            tracing::warn!(
                "{:?} response without success marker (status: {:?}); state left unchanged",
                ticket.operation(),
                envelope.status
            );
            return Ok(Dispatch::Ignored {
                status: envelope.status,
            });
        }

        let data = envelope.data.ok_or_else(|| {
            tracing::error!("{:?} success response carried no data", ticket.operation());
            ApiError::invalid_payload()
        })?;
        let action = to_action(data)?;

        if self.store.dispatch_if_current(ticket, action) {
            Ok(Dispatch::Applied)
        } else {
            Ok(Dispatch::Stale)
        }
    }
}
