use async_trait::async_trait;

use crate::domain::models::EmailMessage;

#[async_trait]
pub trait MailTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()>;
}
