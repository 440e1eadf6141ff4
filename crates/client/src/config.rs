use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.vaultapp.xyz/mitro-core/api/";
pub const DEFAULT_CLIENT_IDENTIFIER: &str = "vault-cli";
/// Random bytes in a device id
pub const DEVICE_ID_SIZE: usize = 16;

/// Where and as whom the client talks to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    #[serde(default = "default_client_identifier")]
    pub client_identifier: String,
    #[serde(default = "generate_device_id")]
    pub device_id: String,
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("hardcoded URL must parse")
}

fn default_client_identifier() -> String {
    DEFAULT_CLIENT_IDENTIFIER.to_string()
}

/// Fresh device id: random bytes in URL-safe base64
pub fn generate_device_id() -> String {
    let mut buff = [0u8; DEVICE_ID_SIZE];
    getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
    URL_SAFE_NO_PAD.encode(buff)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            client_identifier: default_client_identifier(),
            device_id: generate_device_id(),
        }
    }
}

impl ClientConfig {
    /// Full URL of an API endpoint such as `/GetSecret`
    pub fn endpoint(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(endpoint.trim_start_matches('/'))
    }
}
