use std::collections::BTreeMap;

use clap::Args;

use common::prelude::Secret;

use crate::cli::op::RemoteOpError;

#[derive(Args, Debug, Clone)]
pub struct List;

/// One line per secret: id, owning group and title
pub fn format_listing(secrets: &BTreeMap<i32, Secret>) -> String {
    if secrets.is_empty() {
        return "No secrets found".to_string();
    }
    secrets
        .iter()
        .map(|(id, secret)| {
            let group = secret
                .group_id_path
                .as_ref()
                .and_then(|path| path.last())
                .map(|g| g.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{}\t{}\t{}",
                id,
                group,
                secret.display_title().unwrap_or("(untitled)")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait::async_trait]
impl crate::cli::op::Op for List {
    type Error = RemoteOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client()?;
        let response = client.list_secrets().await?;
        client.logout();

        Ok(format_listing(
            &response.secret_to_path.unwrap_or_default(),
        ))
    }
}
