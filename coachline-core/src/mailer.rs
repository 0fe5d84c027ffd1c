use async_trait::async_trait;

use crate::CoreResult;

/// Outbound ticket delivery. Template design is out of scope; callers hand
/// over a finished artifact and an address.
#[derive(Debug, Clone)]
pub struct TicketEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &TicketEmail) -> CoreResult<()>;
}
