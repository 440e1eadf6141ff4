//! Request and response records exchanged with the vault server
//!
//! Field names on the wire are camelCase. Every field is optional: the
//! server omits what it does not know, and the client only sends what it
//! sets.

use std::collections::BTreeMap;

use crate::wire_struct;

/// Group metadata keyed by group id
pub type GroupMap = BTreeMap<i32, GroupInfo>;

wire_struct! {
    /// A node in the ownership hierarchy
    ///
    /// An empty name marks the caller's personal group.
    pub struct GroupInfo {
        pub group_id: i32 => "groupId",
        pub auto_delete: bool => "autoDelete",
        pub name: String => "name",
        /// Key description sealed for the parent group, or for the user
        pub encrypted_private_key: String => "encryptedPrivateKey",
    }
}

impl GroupInfo {
    /// Whether this is the caller's personal group
    pub fn is_personal(&self) -> bool {
        self.name.as_deref().map_or(true, str::is_empty)
    }
}

wire_struct! {
    /// Display metadata of a secret, sealed as `encryptedClientData`
    pub struct SecretClientData {
        /// `manual`, `note` or `auto`
        pub kind: String => "type",
        pub login_url: String => "loginUrl",
        pub username: String => "username",
        pub username_field: String => "usernameField",
        pub password_field: String => "passwordField",
        pub title: String => "title",
    }
}

wire_struct! {
    /// The sensitive half of a secret, sealed as `encryptedCriticalData`
    pub struct SecretCriticalData {
        pub password: String => "password",
        pub note: String => "note",
    }
}

wire_struct! {
    pub struct Secret {
        pub secret_id: i32 => "secretId",
        pub hostname: String => "hostname",
        pub encrypted_client_data: String => "encryptedClientData",
        pub encrypted_critical_data: String => "encryptedCriticalData",
        pub groups: Vec<i32> => "groups",
        pub hidden_groups: Vec<i32> => "hiddenGroups",
        pub users: Vec<String> => "users",
        pub icons: Vec<String> => "icons",
        pub group_names: BTreeMap<i32, String> => "groupNames",
        pub title: String => "title",
        /// Root-to-leaf chain of groups whose keys open this secret
        pub group_id_path: Vec<i32> => "groupIdPath",
        pub client_data: SecretClientData => "clientData",
        pub critical_data: SecretCriticalData => "criticalData",
    }
}

impl Secret {
    /// Title from the decoded client data, falling back to the listing's
    pub fn display_title(&self) -> Option<&str> {
        self.client_data
            .as_ref()
            .and_then(|data| data.title.as_deref())
            .or(self.title.as_deref())
    }
}

wire_struct! {
    pub struct ListMySecretsAndGroupKeysRequest {
        pub device_id: String => "deviceId",
        pub my_user_id: String => "myUserId",
    }
}

wire_struct! {
    pub struct ListMySecretsAndGroupKeysResponse {
        pub transaction_id: String => "transactionId",
        pub device_id: String => "deviceId",
        pub my_user_id: String => "myUserId",
        pub secret_to_path: BTreeMap<i32, Secret> => "secretToPath",
        pub groups: GroupMap => "groups",
        pub autocomplete_users: Vec<String> => "autocompleteUsers",
    }
}

wire_struct! {
    pub struct GetSecretRequest {
        pub device_id: String => "deviceId",
        pub user_id: String => "userId",
        pub secret_id: i32 => "secretId",
        pub group_id: i32 => "groupId",
        pub include_critical_data: bool => "includeCriticalData",
    }
}

wire_struct! {
    pub struct GetSecretResponse {
        pub transaction_id: String => "transactionId",
        pub device_id: String => "deviceId",
        pub secret: Secret => "secret",
    }
}

wire_struct! {
    pub struct AddSecretRequest {
        pub device_id: String => "deviceId",
        pub my_user_id: String => "myUserId",
        pub hostname: String => "hostname",
        pub owner_group_id: i32 => "ownerGroupId",
        pub encrypted_client_data: String => "encryptedClientData",
        pub encrypted_critical_data: String => "encryptedCriticalData",
    }
}

wire_struct! {
    pub struct AddSecretResponse {
        pub transaction_id: String => "transactionId",
        pub device_id: String => "deviceId",
        pub secret_id: i32 => "secretId",
    }
}

wire_struct! {
    /// Envelope every request travels in
    pub struct SignedRequest {
        pub client_identifier: String => "clientIdentifier",
        pub identity: String => "identity",
        /// The serialized inner request
        pub request: String => "request",
        /// Base64 signature over `request`
        pub signature: String => "signature",
    }
}

wire_struct! {
    /// Error document returned instead of a response
    pub struct ServerException {
        pub exception_id: String => "exceptionId",
        pub stack_trace_string: String => "stackTraceString",
        pub raw_message: String => "rawMessage",
        pub user_visible_error: String => "userVisibleError",
        pub exception_type: String => "exceptionType",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{from_slice, to_string};

    #[test]
    fn test_listing_response_parses() {
        let body = br#"{
            "transactionId": "t1",
            "deviceId": "d1",
            "myUserId": "alice@example.com",
            "secretToPath": {
                "12": {
                    "secretId": 12,
                    "hostname": "mail.example.com",
                    "encryptedClientData": "AAAA",
                    "groupIdPath": [3, 7],
                    "groupNames": {"3": "alice", "7": "team"},
                    "clientData": null
                }
            },
            "groups": {
                "3": {"groupId": 3, "autoDelete": false, "name": "", "encryptedPrivateKey": "k3"},
                "7": {"groupId": 7, "autoDelete": false, "name": "team", "encryptedPrivateKey": "k7"},
            },
            "autocompleteUsers": ["bob@example.com"]
        }"#;

        let response: ListMySecretsAndGroupKeysResponse = from_slice(body).unwrap();
        let secrets = response.secret_to_path.unwrap();
        let secret = &secrets[&12];
        assert_eq!(secret.group_id_path, Some(vec![3, 7]));
        assert_eq!(secret.group_names.as_ref().unwrap()[&7], "team");
        assert_eq!(secret.client_data, None);

        let groups = response.groups.unwrap();
        assert!(groups[&3].is_personal());
        assert!(!groups[&7].is_personal());
        assert_eq!(groups[&7].encrypted_private_key.as_deref(), Some("k7"));
    }

    #[test]
    fn test_request_serializes_set_fields_only() {
        let request = GetSecretRequest {
            device_id: Some("dev".into()),
            secret_id: Some(12),
            include_critical_data: Some(true),
            ..Default::default()
        };
        assert_eq!(
            to_string(&request).unwrap(),
            r#"{"deviceId":"dev","secretId":12,"includeCriticalData":true}"#
        );
    }

    #[test]
    fn test_display_title_prefers_client_data() {
        let mut secret = Secret {
            title: Some("listing".into()),
            ..Default::default()
        };
        assert_eq!(secret.display_title(), Some("listing"));

        secret.client_data = Some(SecretClientData {
            title: Some("decoded".into()),
            ..Default::default()
        });
        assert_eq!(secret.display_title(), Some("decoded"));
    }
}
