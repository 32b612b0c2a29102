//! Rider Client Library
//!
//! Client-side core of the rider app: REST access to the backend, mapping of
//! wire DTOs into domain records, a single message-driven state container,
//! the push-notification bridge, and the controllers screens are built on.
//!
//! # Modules
//!
//! - `actions`: State-update messages.
//! - `api_client`: REST backend client.
//! - `config`: Configuration management.
//! - `controller`: Screen controllers (splash, profile, completed rides).
//! - `dispatcher`: Network call + state-update pairing.
//! - `dto`: Wire shapes.
//! - `errors`: Error taxonomy.
//! - `models`: Core data models.
//! - `notifications`: Push-notification bridge.
//! - `storage`: Persisted local values.
//! - `store`: State container, reducer and selectors.

pub mod actions;
pub mod api_client;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod dto;
pub mod errors;
pub mod models;
pub mod notifications;
pub mod storage;
pub mod store;
