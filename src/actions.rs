//! State-update messages.
//!
//! Every change to [`AppState`](crate::store::AppState) is described by one
//! of these values and applied by the reducer in `store`.

use crate::models::{Profile, Transaction};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the completed-transactions list wholesale.
    GetCompletedTransactions(Vec<Transaction>),

    /// Reset the completed-transactions list to empty.
    RemoveCompletedTransactions,

    /// Replace the loaded profile.
    GetProfile(Profile),

    /// Clear the loaded profile.
    RemoveProfile,

    /// Change the profile's display name without a re-fetch.
    UpdateProfileName(String),

    /// Flag (or clear) a rejected session.
    AuthError(bool),
}

impl Action {
    /// Tag of the message, as logged.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::GetCompletedTransactions(_) => "GET_COMPLETED_TRANSACTIONS",
            Action::RemoveCompletedTransactions => "REMOVE_COMPLETED_TRANSACTIONS",
            Action::GetProfile(_) => "GET_PROFILE",
            Action::RemoveProfile => "REMOVE_PROFILE",
            Action::UpdateProfileName(_) => "UPDATE_PROFILE_NAME",
            Action::AuthError(_) => "AUTH_ERROR",
        }
    }
}
