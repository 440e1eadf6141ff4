use http::StatusCode;

use common::codec::CodecError;
use common::crypto::KeyError;
use common::resolver::DecryptError;

use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    /// Exception document returned by the server
    #[error("{message}")]
    Server { message: String, kind: String },
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("decrypt error: {0}")]
    Decrypt(#[from] DecryptError),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("no default group known; list secrets first")]
    NoDefaultGroup,
}

impl ApiError {
    /// Machine-readable exception type reported by the server, if any
    pub fn exception_type(&self) -> Option<&str> {
        match self {
            ApiError::Server { kind, .. } => Some(kind),
            _ => None,
        }
    }
}
