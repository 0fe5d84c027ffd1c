use std::sync::Arc;

use coachline_core::mailer::Mailer;
use coachline_core::repository::PurchaseStore;
use coachline_core::upstream::CoachApi;
use coachline_reservation::{PnrMapper, ReservationRegistry};
use coachline_ticket::TicketService;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ReservationRegistry>,
    pub mapper: Arc<PnrMapper>,
    pub tickets: Arc<TicketService>,
    pub purchases: Arc<dyn PurchaseStore>,
    pub upstream: Arc<dyn CoachApi>,
    pub mailer: Arc<dyn Mailer>,
    /// Hold window used when a reserve request does not pick one.
    pub default_hold_seconds: i64,
}
