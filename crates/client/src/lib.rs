//! Client side of the vault API
//!
//! [`ApiClient`] signs and posts typed requests through a [`Transport`],
//! maps server exceptions to [`ApiError`], and keeps the logged-in
//! [`common::session::Session`] that decodes the secrets it receives.

mod api;
mod config;
mod error;
mod transport;

pub use api::{ApiClient, ADD_SECRET_ENDPOINT, GET_SECRET_ENDPOINT, LIST_SECRETS_ENDPOINT};
pub use config::{generate_device_id, ClientConfig, DEFAULT_BASE_URL, DEFAULT_CLIENT_IDENTIFIER};
pub use error::ApiError;
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
