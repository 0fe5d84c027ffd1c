use async_trait::async_trait;
use coachline_core::upstream::{
    CoachApi, PaymentResult, PrintResult, ReserveRequest, ReserveResponse,
};
use coachline_core::{CoreError, CoreResult};
use serde_json::{json, Value};
use uuid::Uuid;

/// HTTP client for the coach reservation API. Transport details stay here;
/// callers only see the four-operation contract.
pub struct HttpCoachApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCoachApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> CoreResult<Value> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::Upstream {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CoreError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| CoreError::Upstream {
            status: status.as_u16(),
            message: format!("unreadable response body: {}", e),
        })
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl CoachApi for HttpCoachApi {
    async fn reserve(&self, request: &ReserveRequest) -> CoreResult<ReserveResponse> {
        // Reject bad input before any outbound call.
        request.validate()?;

        let raw = self
            .post("/reservations", &serde_json::to_value(request).map_err(|e| {
                CoreError::Internal(e.to_string())
            })?)
            .await?;

        Ok(ReserveResponse {
            reservation_id: raw
                .get("reservation_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            lease_seconds: raw.get("lease_seconds").and_then(Value::as_i64).unwrap_or(0),
            seat_ids: string_list(raw.get("seat_ids")),
            raw,
        })
    }

    async fn pay(
        &self,
        reservation_id: &str,
        amount: f64,
        method: &str,
    ) -> CoreResult<PaymentResult> {
        if amount <= 0.0 {
            return Err(CoreError::Validation(format!(
                "payment amount must be positive, got {}",
                amount
            )));
        }

        let raw = self
            .post(
                "/payments",
                &json!({
                    "reservation_id": reservation_id,
                    "amount": amount,
                    "method": method,
                }),
            )
            .await?;

        Ok(PaymentResult {
            success: raw.get("success").and_then(Value::as_bool).unwrap_or(false),
            amount: raw.get("amount").and_then(Value::as_f64).unwrap_or(amount),
            method: method.to_string(),
            raw,
        })
    }

    async fn print(&self, reservation_id: &str) -> CoreResult<PrintResult> {
        let raw = self
            .post("/print", &json!({"reservation_id": reservation_id}))
            .await?;

        let tickets = raw
            .get("tickets")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(PrintResult { tickets, raw })
    }

    async fn cancel(&self, reservation_id: &str) -> CoreResult<Value> {
        self.post("/cancel", &json!({"reservation_id": reservation_id}))
            .await
    }
}

/// Deterministic in-process stand-in for the upstream API, used in dev
/// wiring and tests.
#[derive(Default)]
pub struct MockCoachApi;

#[async_trait]
impl CoachApi for MockCoachApi {
    async fn reserve(&self, request: &ReserveRequest) -> CoreResult<ReserveResponse> {
        request.validate()?;

        let reservation_id = format!("RSV-{}", &Uuid::new_v4().simple().to_string()[..8]);
        let seat_ids: Vec<String> = (1..=request.passenger_count)
            .map(|n| format!("{}A", n))
            .collect();
        let raw = json!({
            "reservation_id": reservation_id,
            "lease_seconds": request.hold_seconds,
            "seat_ids": seat_ids,
        });

        Ok(ReserveResponse {
            reservation_id,
            lease_seconds: request.hold_seconds,
            seat_ids,
            raw,
        })
    }

    async fn pay(
        &self,
        reservation_id: &str,
        amount: f64,
        method: &str,
    ) -> CoreResult<PaymentResult> {
        if amount <= 0.0 {
            return Err(CoreError::Validation(format!(
                "payment amount must be positive, got {}",
                amount
            )));
        }

        Ok(PaymentResult {
            success: true,
            amount,
            method: method.to_string(),
            raw: json!({
                "success": true,
                "reservation_id": reservation_id,
                "amount": amount,
                "method": method,
            }),
        })
    }

    async fn print(&self, reservation_id: &str) -> CoreResult<PrintResult> {
        let tickets = vec![json!({
            "ticket_no": format!("TKT-{}", reservation_id),
            "reservation_id": reservation_id,
        })];
        let raw = json!({"tickets": tickets.clone()});
        Ok(PrintResult { tickets, raw })
    }

    async fn cancel(&self, reservation_id: &str) -> CoreResult<Value> {
        Ok(json!({"cancelled": true, "reservation_id": reservation_id}))
    }
}
