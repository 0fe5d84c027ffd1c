use async_trait::async_trait;
use coachline_core::render::{RenderJob, TicketRenderer};
use coachline_core::{CoreError, CoreResult};

/// Client for the HTML-to-PDF render service. The service owns layout and
/// templates; this side only ships the job and takes the bytes back.
pub struct HttpTicketRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTicketRenderer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TicketRenderer for HttpTicketRenderer {
    async fn render(&self, job: &RenderJob) -> CoreResult<Vec<u8>> {
        let response = self
            .client
            .post(format!("{}/render", self.base_url))
            .json(job)
            .send()
            .await
            .map_err(|e| CoreError::Render(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CoreError::Render(format!(
                "render service returned {}: {}",
                status, message
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::Render(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
