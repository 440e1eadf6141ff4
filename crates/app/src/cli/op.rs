use std::error::Error;
use std::path::PathBuf;

use url::Url;

use client::{ApiClient, ApiError, HttpTransport, TransportError};
use common::prelude::SecretKey;

use crate::state::{AppState, StateError};

/// Client type every remote operation runs against
pub type VaultClient = ApiClient<HttpTransport, SecretKey>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to create HTTP client: {0}")]
    Transport(#[from] TransportError),
}

/// Everything a command shares
#[derive(Debug, Clone)]
pub struct OpContext {
    /// Base URL overriding the config file, if given
    pub remote: Option<Url>,
    /// Optional custom config path (defaults to ~/.vault)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(remote: Option<Url>, config_path: Option<PathBuf>) -> Self {
        Self {
            remote,
            config_path,
        }
    }

    /// Load the on-disk state and open a session with the stored key
    pub fn client(&self) -> Result<VaultClient, SessionError> {
        let state = AppState::load(self.config_path.clone())?;
        let key = state.load_key()?;

        let mut config = state.config.client.clone();
        if let Some(remote) = &self.remote {
            config.base_url = remote.clone();
        }

        let mut client = ApiClient::new(config, HttpTransport::new()?);
        client.open_session(&state.config.username, key);
        Ok(client)
    }
}

/// Error shared by the commands that talk to the server
#[derive(Debug, thiserror::Error)]
pub enum RemoteOpError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            tracing::debug!(command = stringify!($variant), "running command");
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
