use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CoreError, CoreResult};

/// Upstream-accepted hold window, in seconds. Values outside this range are
/// rejected before any outbound call.
pub const MIN_HOLD_SECONDS: i64 = 30;
pub const MAX_HOLD_SECONDS: i64 = 900;

/// Fixed payment method code the upstream expects on every pay call.
pub const PAYMENT_METHOD: &str = "AGENT_CREDIT";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequest {
    pub trip_id: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub passenger_count: u32,
    pub passengers: Vec<Value>,
    pub hold_seconds: i64,
}

impl ReserveRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if self.trip_id.trim().is_empty() {
            return Err(CoreError::Validation("trip_id is required".to_string()));
        }
        if self.origin.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(CoreError::Validation(
                "origin and destination stops are required".to_string(),
            ));
        }
        if self.departure_date.trim().is_empty() {
            return Err(CoreError::Validation("departure_date is required".to_string()));
        }
        if self.passenger_count < 1 {
            return Err(CoreError::Validation(
                "at least one passenger is required".to_string(),
            ));
        }
        if self.hold_seconds < MIN_HOLD_SECONDS || self.hold_seconds > MAX_HOLD_SECONDS {
            return Err(CoreError::Validation(format!(
                "hold_seconds must be within [{}, {}], got {}",
                MIN_HOLD_SECONDS, MAX_HOLD_SECONDS, self.hold_seconds
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveResponse {
    pub reservation_id: String,
    pub lease_seconds: i64,
    pub seat_ids: Vec<String>,
    pub raw: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,
    pub amount: f64,
    pub method: String,
    pub raw: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintResult {
    pub tickets: Vec<Value>,
    pub raw: Value,
}

/// The four-operation contract of the coach reservation API.
#[async_trait]
pub trait CoachApi: Send + Sync {
    async fn reserve(&self, request: &ReserveRequest) -> CoreResult<ReserveResponse>;

    async fn pay(
        &self,
        reservation_id: &str,
        amount: f64,
        method: &str,
    ) -> CoreResult<PaymentResult>;

    async fn print(&self, reservation_id: &str) -> CoreResult<PrintResult>;

    async fn cancel(&self, reservation_id: &str) -> CoreResult<Value>;
}
