use std::path::PathBuf;

use clap::Args;
use url::Url;

use crate::state::{read_key_file, AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Account name to sign requests as
    #[arg(long)]
    pub username: String,

    /// Server base URL (defaults to the hosted service)
    #[arg(long)]
    pub base_url: Option<Url>,

    /// Import an existing key description instead of generating one
    #[arg(long)]
    pub key_file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig::new(&self.username);
        if let Some(url) = self.base_url.clone().or_else(|| ctx.remote.clone()) {
            config.client.base_url = url;
        }

        let key = self.key_file.as_deref().map(read_key_file).transpose()?;
        let imported = key.is_some();
        let state = AppState::init(ctx.config_path.clone(), config, key)?;

        Ok(format!(
            "Initialized vault directory at: {}\n\
             - Username: {}\n\
             - Key: {} ({})\n\
             - Config: {}\n\
             - Server: {}\n\
             - Device: {}",
            state.vault_dir.display(),
            state.config.username,
            state.key_path.display(),
            if imported { "imported" } else { "generated" },
            state.config_path.display(),
            state.config.client.base_url,
            state.config.client.device_id,
        ))
    }
}
