//! Integration tests for ApiClient against a scripted transport

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::HeaderMap;
use http::StatusCode;
use url::Url;

use client::{ApiClient, ApiError, ClientConfig, Transport, TransportError, TransportResponse};
use common::codec::{from_slice, to_string, to_vec};
use common::crypto::{CryptoKey, SecretKey};
use common::types::{
    AddSecretRequest, AddSecretResponse, GetSecretResponse, GroupInfo, GroupMap,
    ListMySecretsAndGroupKeysRequest, ListMySecretsAndGroupKeysResponse, Secret,
    SecretClientData, SecretCriticalData, SignedRequest,
};

/// Replays canned responses and records every request
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<TransportResponse>>,
    requests: Mutex<Vec<(Url, Vec<u8>)>>,
}

impl ScriptedTransport {
    fn reply(&self, status: StatusCode, body: Vec<u8>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(TransportResponse { status, body });
    }

    fn last_request(&self) -> (Url, SignedRequest) {
        let requests = self.requests.lock().unwrap();
        let (url, body) = requests.last().cloned().unwrap();
        (url, from_slice(&body).unwrap())
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn post(
        &self,
        url: &Url,
        _headers: &HeaderMap,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push((url.clone(), body));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Connection("no scripted reply".to_string()))
    }
}

struct Server {
    user: SecretKey,
    personal: SecretKey,
    team: SecretKey,
    groups: GroupMap,
}

fn server() -> Server {
    let user = SecretKey::generate();
    let personal = SecretKey::generate();
    let team = SecretKey::generate();
    let group = |id: i32, name: &str, parent: &SecretKey, key: &SecretKey| GroupInfo {
        group_id: Some(id),
        auto_delete: Some(false),
        name: Some(name.to_string()),
        encrypted_private_key: Some(parent.encrypt_text(&key.to_json()).unwrap()),
    };
    let groups = GroupMap::from([
        (5, group(5, "", &user, &personal)),
        (9, group(9, "ops", &personal, &team)),
    ]);
    Server {
        user,
        personal,
        team,
        groups,
    }
}

fn sealed_secret(id: i32, path: Vec<i32>, key: &SecretKey, title: &str, password: &str) -> Secret {
    let client = SecretClientData {
        kind: Some("manual".to_string()),
        title: Some(title.to_string()),
        ..Default::default()
    };
    let critical = SecretCriticalData {
        password: Some(password.to_string()),
        ..Default::default()
    };
    Secret {
        secret_id: Some(id),
        group_id_path: Some(path),
        encrypted_client_data: Some(key.encrypt_text(&to_string(&client).unwrap()).unwrap()),
        encrypted_critical_data: Some(key.encrypt_text(&to_string(&critical).unwrap()).unwrap()),
        ..Default::default()
    }
}

fn listing(server: &Server) -> Vec<u8> {
    let response = ListMySecretsAndGroupKeysResponse {
        transaction_id: Some("tx1".to_string()),
        my_user_id: Some("alice@example.com".to_string()),
        secret_to_path: Some(BTreeMap::from([
            (1, sealed_secret(1, vec![5], &server.personal, "mail", "hunter2")),
            (2, sealed_secret(2, vec![5, 9], &server.team, "prod-db", "s3cret")),
        ])),
        groups: Some(server.groups.clone()),
        ..Default::default()
    };
    to_vec(&response).unwrap()
}

fn client(server: &Server) -> ApiClient<ScriptedTransport, SecretKey> {
    let config = ClientConfig {
        base_url: Url::parse("https://vault.test/api/").unwrap(),
        client_identifier: "vault-tests".to_string(),
        device_id: "device-1".to_string(),
    };
    let mut client = ApiClient::new(config, ScriptedTransport::default());
    client.open_session("alice@example.com", server.user.clone());
    client
}

#[tokio::test]
async fn test_list_secrets_signs_and_decodes() {
    let server = server();
    let mut client = client(&server);
    client.transport().reply(StatusCode::OK, listing(&server));

    let response = client.list_secrets().await.unwrap();
    let secrets = response.secret_to_path.unwrap();
    assert_eq!(secrets[&1].display_title(), Some("mail"));
    assert_eq!(secrets[&2].display_title(), Some("prod-db"));
    assert_eq!(
        secrets[&2].critical_data.as_ref().unwrap().password.as_deref(),
        Some("s3cret")
    );

    let (url, envelope) = client.transport().last_request();
    assert_eq!(url.as_str(), "https://vault.test/api/ListMySecretsAndGroupKeys");
    assert_eq!(envelope.client_identifier.as_deref(), Some("vault-tests"));
    assert_eq!(envelope.identity.as_deref(), Some("alice@example.com"));

    let request_json = envelope.request.unwrap();
    let signature = STANDARD.decode(envelope.signature.unwrap()).unwrap();
    server
        .user
        .public()
        .verify(request_json.as_bytes(), &signature)
        .unwrap();
    let request: ListMySecretsAndGroupKeysRequest = from_slice(request_json.as_bytes()).unwrap();
    assert_eq!(request.device_id.as_deref(), Some("device-1"));

    let session = client.session().unwrap();
    assert_eq!(session.default_group().map(|g| g.id), Some(5));
    assert_eq!(session.groups().len(), 2);
}

#[tokio::test]
async fn test_get_secret_uses_listing_groups() {
    let server = server();
    let mut client = client(&server);
    client.transport().reply(StatusCode::OK, listing(&server));
    client.list_secrets().await.unwrap();

    let reply = GetSecretResponse {
        transaction_id: Some("tx2".to_string()),
        secret: Some(sealed_secret(2, vec![5, 9], &server.team, "prod-db", "rotated")),
        ..Default::default()
    };
    client.transport().reply(StatusCode::OK, to_vec(&reply).unwrap());

    let secret = client.get_secret(2, 9, true).await.unwrap();
    assert_eq!(
        secret.critical_data.unwrap().password.as_deref(),
        Some("rotated")
    );
}

#[tokio::test]
async fn test_add_note_encrypts_for_personal_group() {
    let server = server();
    let mut client = client(&server);
    client.transport().reply(StatusCode::OK, listing(&server));
    client.list_secrets().await.unwrap();

    let reply = AddSecretResponse {
        secret_id: Some(77),
        ..Default::default()
    };
    client.transport().reply(StatusCode::OK, to_vec(&reply).unwrap());
    let added = client.add_note("wifi", "correct horse").await.unwrap();
    assert_eq!(added.secret_id, Some(77));

    let (url, envelope) = client.transport().last_request();
    assert_eq!(url.path(), "/api/AddSecret");
    let request: AddSecretRequest = from_slice(envelope.request.unwrap().as_bytes()).unwrap();
    assert_eq!(request.owner_group_id, Some(5));
    assert_eq!(request.hostname.as_deref(), Some("none"));

    let client_json = server
        .personal
        .decrypt_text(&request.encrypted_client_data.unwrap())
        .unwrap();
    let client_data: SecretClientData = from_slice(client_json.as_bytes()).unwrap();
    assert_eq!(client_data.kind.as_deref(), Some("note"));
    assert_eq!(client_data.title.as_deref(), Some("wifi"));

    let critical_json = server
        .personal
        .decrypt_text(&request.encrypted_critical_data.unwrap())
        .unwrap();
    let critical: SecretCriticalData = from_slice(critical_json.as_bytes()).unwrap();
    assert_eq!(critical.note.as_deref(), Some("correct horse"));
}

#[tokio::test]
async fn test_add_password_requires_default_group() {
    let server = server();
    let mut client = client(&server);
    let result = client
        .add_password("mail", "https://mail.example.com", "alice", "pw")
        .await;
    assert!(matches!(result, Err(ApiError::NoDefaultGroup)));
    assert!(client.transport().requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_server_exception_surfaces_kind() {
    let server = server();
    let mut client = client(&server);
    client.transport().reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        br#"{"exceptionId":"x","userVisibleError":"Invalid signature","exceptionType":"InvalidRequestException"}"#.to_vec(),
    );

    let err = client.list_secrets().await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid signature");
    assert_eq!(err.exception_type(), Some("InvalidRequestException"));
}

#[tokio::test]
async fn test_decode_failure_fails_listing() {
    let server = server();
    let mut client = client(&server);
    let mut response: ListMySecretsAndGroupKeysResponse = from_slice(&listing(&server)).unwrap();
    response
        .secret_to_path
        .as_mut()
        .unwrap()
        .insert(3, sealed_secret(3, vec![404], &server.team, "orphan", "x"));
    client.transport().reply(StatusCode::OK, to_vec(&response).unwrap());

    let err = client.list_secrets().await.unwrap_err();
    assert!(matches!(err, ApiError::Decrypt(_)));
}

#[tokio::test]
async fn test_logout_requires_new_session() {
    let server = server();
    let mut client = client(&server);
    client.transport().reply(StatusCode::OK, listing(&server));
    client.list_secrets().await.unwrap();
    assert!(client.is_logged_in());

    client.logout();
    assert!(!client.is_logged_in());
    assert!(client.session().is_none());
    assert!(matches!(
        client.list_secrets().await,
        Err(ApiError::NotLoggedIn)
    ));

    client.open_session("alice@example.com", server.user.clone());
    let session = client.session().unwrap();
    assert!(session.keys().is_empty());
    assert!(session.default_group().is_none());
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let server = server();
    let mut client = client(&server);
    assert!(matches!(
        client.list_secrets().await,
        Err(ApiError::Transport(TransportError::Connection(_)))
    ));
}
