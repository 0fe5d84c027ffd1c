use std::sync::Arc;

use coachline_core::models::{BookingStatus, TicketType};
use coachline_core::repository::{BookingStore, PurchaseStore};
use coachline_core::{CoreError, CoreResult};
use serde_json::Value;

/// Status tokens that mark a purchase as gone through.
pub const COMPLETED_STATUS_TOKENS: [&str; 9] = [
    "completed",
    "complete",
    "booked",
    "confirmed",
    "success",
    "succeeded",
    "paid",
    "purchase_completed",
    "payment_completed",
];

pub fn is_completed_status(status: &str) -> bool {
    COMPLETED_STATUS_TOKENS
        .iter()
        .any(|token| status.eq_ignore_ascii_case(token))
}

/// Decides whether a PNR warrants a final or a hold artifact, from a
/// prioritized set of signals: the relational purchase-completion record,
/// then the nested provider booking, then the document-store snapshot.
pub struct TicketTypeResolver {
    purchases: Arc<dyn PurchaseStore>,
    bookings: Arc<dyn BookingStore>,
}

impl TicketTypeResolver {
    pub fn new(purchases: Arc<dyn PurchaseStore>, bookings: Arc<dyn BookingStore>) -> Self {
        Self { purchases, bookings }
    }

    pub async fn resolve(&self, pnr: &str) -> CoreResult<TicketType> {
        // 1. Persisted purchase-completion record
        let purchase = self
            .purchases
            .get(pnr)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        if let Some(purchase) = &purchase {
            if !purchase.items.is_empty() || !purchase.tickets.is_empty() {
                return Ok(TicketType::Final);
            }
            if purchase
                .status
                .as_deref()
                .map(is_completed_status)
                .unwrap_or(false)
            {
                return Ok(TicketType::Final);
            }
        }

        let booking = self
            .bookings
            .get(pnr)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        if let Some(booking) = &booking {
            // 2. Nested provider booking with a non-empty ticket list
            if let Some(provider_booking) = &booking.provider_booking {
                if has_tickets(provider_booking) {
                    return Ok(TicketType::Final);
                }
            }

            // 3. Document-store snapshot, same status-token check
            if booking.status == BookingStatus::Paid {
                return Ok(TicketType::Final);
            }
            if let Some(status) = booking
                .provider_booking
                .as_ref()
                .and_then(|b| b.get("status"))
                .and_then(Value::as_str)
            {
                if is_completed_status(status) {
                    return Ok(TicketType::Final);
                }
            }
        }

        Ok(TicketType::Hold)
    }
}

fn has_tickets(provider_booking: &Value) -> bool {
    provider_booking
        .get("tickets")
        .and_then(Value::as_array)
        .map(|tickets| !tickets.is_empty())
        .unwrap_or(false)
}
