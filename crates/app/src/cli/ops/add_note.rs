use clap::Args;

use crate::cli::op::RemoteOpError;

#[derive(Args, Debug, Clone)]
pub struct AddNote {
    /// Title shown in listings
    pub title: String,

    /// Note body, stored encrypted
    pub note: String,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for AddNote {
    type Error = RemoteOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client()?;
        // learns the personal group the note is encrypted for
        client.list_secrets().await?;
        let response = client.add_note(&self.title, &self.note).await?;
        client.logout();

        Ok(match response.secret_id {
            Some(id) => format!("Added note {} (id: {})", self.title, id),
            None => format!("Added note {}", self.title),
        })
    }
}
