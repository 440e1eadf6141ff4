use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use common::codec::{self, from_slice, WireStruct};
use common::crypto::CryptoKey;
use common::session::Session;
use common::types::{
    AddSecretRequest, AddSecretResponse, GetSecretRequest, GetSecretResponse,
    ListMySecretsAndGroupKeysRequest, ListMySecretsAndGroupKeysResponse, Secret,
    SecretClientData, SecretCriticalData, ServerException, SignedRequest,
};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::transport::{Transport, TransportResponse};

pub const LIST_SECRETS_ENDPOINT: &str = "/ListMySecretsAndGroupKeys";
pub const GET_SECRET_ENDPOINT: &str = "/GetSecret";
pub const ADD_SECRET_ENDPOINT: &str = "/AddSecret";

/// Hostname sent with secrets added by hand
const MANUAL_HOSTNAME: &str = "none";

/// Turn a server reply into a typed response or an error
fn parse_response<R: WireStruct>(response: TransportResponse) -> Result<R, ApiError> {
    if let Ok(exception) = from_slice::<ServerException>(&response.body) {
        if let Some(kind) = exception.exception_type {
            let message = exception
                .user_visible_error
                .or(exception.raw_message)
                .unwrap_or_else(|| kind.clone());
            tracing::warn!(kind = %kind, "server exception: {}", message);
            return Err(ApiError::Server { message, kind });
        }
    }

    if !response.is_success() {
        return Err(ApiError::HttpStatus(
            response.status,
            String::from_utf8_lossy(&response.body).into_owned(),
        ));
    }

    Ok(from_slice(&response.body)?)
}

/// Client for the vault API
///
/// Holds at most one [`Session`]. Every request is serialized with the JSON
/// codec, wrapped in a [`SignedRequest`] signed by the user key, and posted
/// through the transport.
pub struct ApiClient<T, K> {
    config: ClientConfig,
    transport: T,
    session: Option<Session<K>>,
}

impl<T: Transport, K: CryptoKey> ApiClient<T, K> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            session: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start a session for a user whose key is already unlocked
    pub fn open_session(&mut self, username: &str, user_key: K) {
        if self.is_logged_in() {
            self.logout();
        }
        tracing::debug!(username, "opening session");
        self.session = Some(Session::new(username, user_key));
    }

    /// Drop the session along with every decrypted key and plaintext
    pub fn logout(&mut self) {
        if let Some(mut session) = self.session.take() {
            tracing::debug!(username = session.username(), "logging out");
            session.logout();
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session<K>> {
        self.session.as_ref()
    }

    fn session_mut(&mut self) -> Result<&mut Session<K>, ApiError> {
        self.session.as_mut().ok_or(ApiError::NotLoggedIn)
    }

    fn username(&self) -> Result<String, ApiError> {
        self.session
            .as_ref()
            .map(|session| session.username().to_string())
            .ok_or(ApiError::NotLoggedIn)
    }

    /// Serialize `request`, sign it and post it to `endpoint`
    pub async fn sign_and_post<Req: WireStruct, Resp: WireStruct>(
        &self,
        endpoint: &str,
        request: &Req,
    ) -> Result<Resp, ApiError> {
        let session = self.session.as_ref().ok_or(ApiError::NotLoggedIn)?;

        let request_json = codec::to_string(request)?;
        let signature = STANDARD.encode(session.user_key().sign(request_json.as_bytes()));
        let envelope = SignedRequest {
            client_identifier: Some(self.config.client_identifier.clone()),
            identity: Some(session.username().to_string()),
            request: Some(request_json),
            signature: Some(signature),
        };
        let body = codec::to_vec(&envelope)?;

        let url = self.config.endpoint(endpoint)?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        tracing::debug!(%url, request = Req::NAME, "posting signed request");
        let response = self.transport.post(&url, &headers, body).await?;
        parse_response(response)
    }

    /// List the user's secrets and groups, decoding every secret
    ///
    /// Also records the personal group for adding secrets and keeps the
    /// group map for later [`ApiClient::get_secret`] calls. The first secret
    /// that fails to decode fails the whole listing.
    pub async fn list_secrets(&mut self) -> Result<ListMySecretsAndGroupKeysResponse, ApiError> {
        let request = ListMySecretsAndGroupKeysRequest {
            device_id: Some(self.config.device_id.clone()),
            my_user_id: Some(self.username()?),
        };
        let mut response: ListMySecretsAndGroupKeysResponse =
            self.sign_and_post(LIST_SECRETS_ENDPOINT, &request).await?;

        let groups = response.groups.clone().unwrap_or_default();
        let session = self.session_mut()?;
        session.update_default_group(&groups);
        session.set_groups(groups);

        if let Some(secrets) = response.secret_to_path.as_mut() {
            session.decode_all(secrets)?;
            tracing::debug!(count = secrets.len(), "decoded secrets");
        }
        Ok(response)
    }

    /// Fetch one secret and decode it against the last listing's groups
    pub async fn get_secret(
        &mut self,
        secret_id: i32,
        group_id: i32,
        include_critical_data: bool,
    ) -> Result<Secret, ApiError> {
        let request = GetSecretRequest {
            device_id: Some(self.config.device_id.clone()),
            user_id: Some(self.username()?),
            secret_id: Some(secret_id),
            group_id: Some(group_id),
            include_critical_data: Some(include_critical_data),
        };
        let response: GetSecretResponse = self.sign_and_post(GET_SECRET_ENDPOINT, &request).await?;

        let mut secret = response.secret.unwrap_or_default();
        self.session_mut()?.decode_secret(&mut secret)?;
        Ok(secret)
    }

    /// Add a login secret to the personal group
    pub async fn add_password(
        &mut self,
        title: &str,
        login_url: &str,
        username: &str,
        password: &str,
    ) -> Result<AddSecretResponse, ApiError> {
        let client_data = SecretClientData {
            kind: Some("manual".to_string()),
            title: Some(title.to_string()),
            login_url: Some(login_url.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        };
        let critical_data = SecretCriticalData {
            password: Some(password.to_string()),
            ..Default::default()
        };
        self.add_secret(&client_data, &critical_data).await
    }

    /// Add a secure note to the personal group
    pub async fn add_note(&mut self, title: &str, note: &str) -> Result<AddSecretResponse, ApiError> {
        let client_data = SecretClientData {
            kind: Some("note".to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        };
        let critical_data = SecretCriticalData {
            note: Some(note.to_string()),
            ..Default::default()
        };
        self.add_secret(&client_data, &critical_data).await
    }

    async fn add_secret(
        &mut self,
        client_data: &SecretClientData,
        critical_data: &SecretCriticalData,
    ) -> Result<AddSecretResponse, ApiError> {
        let session = self.session.as_ref().ok_or(ApiError::NotLoggedIn)?;
        let group = session.default_group().ok_or(ApiError::NoDefaultGroup)?;

        let encrypted_client_data = group.key.encrypt_text(&codec::to_string(client_data)?)?;
        let encrypted_critical_data = group.key.encrypt_text(&codec::to_string(critical_data)?)?;

        let request = AddSecretRequest {
            device_id: Some(self.config.device_id.clone()),
            my_user_id: Some(session.username().to_string()),
            hostname: Some(MANUAL_HOSTNAME.to_string()),
            owner_group_id: Some(group.id),
            encrypted_client_data: Some(encrypted_client_data),
            encrypted_critical_data: Some(encrypted_critical_data),
        };
        self.sign_and_post(ADD_SECRET_ENDPOINT, &request).await
    }
}
