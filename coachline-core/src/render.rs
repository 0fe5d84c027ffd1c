use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{BookingRecord, PassengerFareLine, TicketType};
use crate::CoreResult;

/// Rendering hints passed through from the HTTP surface to the render
/// collaborator. The core never interprets them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderOptions {
    pub thermal: bool,
    pub paper: Option<String>,
    pub width: Option<u32>,
}

/// Everything the HTML-to-PDF engine needs for one artifact.
///
/// `passenger_index`/`leg` are set when a multi-artifact bundle renders one
/// PDF per passenger and leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    pub pnr: String,
    pub ticket_type: TicketType,
    pub booking: BookingRecord,
    pub fares: Vec<PassengerFareLine>,
    pub options: RenderOptions,
    pub passenger_index: Option<usize>,
    pub leg: Option<u8>,
}

#[async_trait]
pub trait TicketRenderer: Send + Sync {
    /// Produce PDF bytes for the job. The caller validates the result before
    /// caching or serving it.
    async fn render(&self, job: &RenderJob) -> CoreResult<Vec<u8>>;
}
