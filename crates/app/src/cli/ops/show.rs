use clap::Args;

use common::prelude::Secret;

use crate::cli::op::RemoteOpError;

#[derive(Args, Debug, Clone)]
pub struct Show {
    /// Id of the secret to fetch
    pub secret_id: i32,

    /// Group the secret is shared with
    pub group_id: i32,

    /// Also fetch and print the password or note
    #[arg(long)]
    pub critical: bool,
}

/// Render the decoded fields of a secret, skipping absent ones
pub fn format_secret(secret: &Secret) -> String {
    let mut lines = Vec::new();
    if let Some(id) = secret.secret_id {
        lines.push(format!("id:       {}", id));
    }
    if let Some(title) = secret.display_title() {
        lines.push(format!("title:    {}", title));
    }
    if let Some(data) = &secret.client_data {
        if let Some(kind) = &data.kind {
            lines.push(format!("type:     {}", kind));
        }
        if let Some(url) = &data.login_url {
            lines.push(format!("url:      {}", url));
        }
        if let Some(username) = &data.username {
            lines.push(format!("username: {}", username));
        }
    }
    if let Some(data) = &secret.critical_data {
        if let Some(password) = &data.password {
            lines.push(format!("password: {}", password));
        }
        if let Some(note) = &data.note {
            lines.push(format!("note:     {}", note));
        }
    }
    lines.join("\n")
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Show {
    type Error = RemoteOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client()?;
        // the listing carries the group keys the secret is resolved against
        client.list_secrets().await?;
        let secret = client
            .get_secret(self.secret_id, self.group_id, self.critical)
            .await?;
        client.logout();

        Ok(format_secret(&secret))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::prelude::{SecretClientData, SecretCriticalData};

    #[test]
    fn test_format_note() {
        let secret = Secret {
            secret_id: Some(9),
            client_data: Some(SecretClientData {
                kind: Some("note".to_string()),
                title: Some("wifi".to_string()),
                ..Default::default()
            }),
            critical_data: Some(SecretCriticalData {
                note: Some("correct horse".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            format_secret(&secret),
            "id:       9\ntitle:    wifi\ntype:     note\nnote:     correct horse"
        );
    }
}
