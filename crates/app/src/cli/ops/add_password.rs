use clap::Args;

use crate::cli::op::RemoteOpError;

#[derive(Args, Debug, Clone)]
pub struct AddPassword {
    /// Title shown in listings
    pub title: String,

    /// Login page the credentials belong to
    #[arg(long)]
    pub url: String,

    /// Login name
    #[arg(long)]
    pub username: String,

    /// Password, stored encrypted
    #[arg(long)]
    pub password: String,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for AddPassword {
    type Error = RemoteOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client()?;
        client.list_secrets().await?;
        let response = client
            .add_password(&self.title, &self.url, &self.username, &self.password)
            .await?;
        client.logout();

        Ok(match response.secret_id {
            Some(id) => format!("Added password {} (id: {})", self.title, id),
            None => format!("Added password {}", self.title),
        })
    }
}
