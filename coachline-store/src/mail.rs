use async_trait::async_trait;
use coachline_core::mailer::{Mailer, TicketEmail};
use coachline_core::CoreResult;

/// Mailer that records the delivery instead of sending it. Stands in until
/// a real transport is wired up; the trait keeps callers unaware.
#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &TicketEmail) -> CoreResult<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            attachment = %email.attachment_name,
            bytes = email.attachment.len(),
            "Ticket email delivered"
        );
        Ok(())
    }
}
