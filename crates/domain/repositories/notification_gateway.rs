use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::notifications::PushMessage;

#[automock]
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send_single_user(&self, message: &PushMessage) -> Result<()>;
}
