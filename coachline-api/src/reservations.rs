use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use coachline_core::identifier::BookingRef;
use coachline_core::models::{
    BookingPatch, ContactInfo, PurchaseRecord, Reservation, ReservationPatch, ReservationStatus,
    TripSnapshot,
};
use coachline_core::upstream::{PaymentResult, ReserveRequest, PAYMENT_METHOD};
use coachline_reservation::PnrMapper;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub trip_id: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_trip_id: Option<String>,
    pub return_departure_date: Option<String>,
    pub passengers: Vec<Value>,
    pub hold_seconds: Option<i64>,
    pub contact: Option<ContactInfo>,
    pub total: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateReservationResponse {
    pub pnr: String,
    pub reservation_id: String,
    pub status: ReservationStatus,
    pub lease_seconds: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub seat_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub reservation_id: String,
    pub pnr: Option<String>,
    pub status: ReservationStatus,
    pub trip: Option<TripSnapshot>,
    pub passenger_count: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub printed_at: Option<DateTime<Utc>>,
}

impl ReservationResponse {
    fn from_record(record: Reservation, pnr: Option<String>) -> Self {
        Self {
            reservation_id: record.reservation_id,
            pnr,
            status: record.status,
            trip: record.trip,
            passenger_count: record.passenger_count,
            created_at: record.created_at,
            expires_at: record.expires_at,
            paid_at: record.paid_at,
            printed_at: record.printed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PayReservationRequest {
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct PayReservationResponse {
    pub reservation_id: String,
    pub pnr: Option<String>,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct PrintReservationResponse {
    pub reservation_id: String,
    pub tickets: Vec<Value>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/reservations
/// Reserve seats upstream, register the lease, mint a PNR and persist the
/// mapping.
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<CreateReservationRequest>,
) -> Result<Json<CreateReservationResponse>, AppError> {
    let reserve = ReserveRequest {
        trip_id: request.trip_id.clone(),
        origin: request.origin.clone(),
        destination: request.destination.clone(),
        departure_date: request.departure_date.clone(),
        passenger_count: request.passengers.len() as u32,
        passengers: request.passengers.clone(),
        hold_seconds: request.hold_seconds.unwrap_or(state.default_hold_seconds),
    };
    // Reject before any upstream call.
    reserve.validate()?;

    let reserved = state.upstream.reserve(&reserve).await?;

    let trip = TripSnapshot {
        trip_id: request.trip_id,
        origin: request.origin,
        destination: request.destination,
        departure_date: request.departure_date,
        return_trip_id: request.return_trip_id,
        return_departure_date: request.return_departure_date,
    };

    let record = state
        .registry
        .upsert(
            &reserved.reservation_id,
            ReservationPatch {
                trip: Some(trip.clone()),
                passenger_count: Some(reserve.passenger_count),
                passengers: Some(request.passengers.clone()),
                seat_ids: Some(reserved.seat_ids.clone()),
                lease_seconds: Some(reserved.lease_seconds),
                ..Default::default()
            },
        )
        .await?;

    let pnr = PnrMapper::generate_pnr();
    state
        .mapper
        .upsert_mapping(
            &pnr,
            &reserved.reservation_id,
            BookingPatch {
                trip: Some(trip),
                passengers: Some(request.passengers),
                contact: request.contact,
                total: request.total,
                currency: request.currency,
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(CreateReservationResponse {
        pnr,
        reservation_id: reserved.reservation_id,
        status: record.status,
        lease_seconds: reserved.lease_seconds,
        expires_at: record.expires_at,
        seat_ids: reserved.seat_ids,
    }))
}

/// GET /v1/reservations
/// List all reservations, newest first, statuses re-derived.
pub async fn list_reservations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    let records = state.registry.list().await?;
    Ok(Json(
        records
            .into_iter()
            .map(|record| ReservationResponse::from_record(record, None))
            .collect(),
    ))
}

/// GET /v1/reservations/{reference}
/// Accepts a PNR or a raw reservation id interchangeably.
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<ReservationResponse>, AppError> {
    let (reservation_id, pnr) = resolve_reference(&state, &reference).await?;

    let record = state
        .registry
        .get(&reservation_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("reservation {}", reference)))?;

    Ok(Json(ReservationResponse::from_record(record, pnr)))
}

/// POST /v1/reservations/{reference}/pay
/// Pay upstream, record the result, and persist the purchase-completion
/// record that flips ticket resolution to `final`.
pub async fn pay_reservation(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(request): Json<PayReservationRequest>,
) -> Result<Json<PayReservationResponse>, AppError> {
    if request.amount <= 0.0 {
        return Err(AppError::ValidationError(format!(
            "payment amount must be positive, got {}",
            request.amount
        )));
    }

    let (reservation_id, pnr) = resolve_reference(&state, &reference).await?;

    let payment = state
        .upstream
        .pay(&reservation_id, request.amount, PAYMENT_METHOD)
        .await?;

    // The raw result is stored for audit even on failure. Records that
    // predate the registry are tolerated.
    match state.registry.mark_paid(&reservation_id, &payment).await {
        Ok(_) => {}
        Err(coachline_reservation::RegistryError::NotFound(_)) => {
            tracing::warn!("Payment recorded for unregistered reservation {}", reservation_id);
        }
        Err(e) => return Err(e.into()),
    }

    if payment.success {
        if let Some(pnr) = &pnr {
            state.mapper.mark_paid(pnr, &payment).await?;
            complete_purchase(&state, pnr, &reservation_id, &payment).await;
        }
    }

    Ok(Json(PayReservationResponse {
        reservation_id,
        pnr,
        success: payment.success,
    }))
}

/// POST /v1/reservations/{reference}/cancel
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<StatusCode, AppError> {
    let (reservation_id, _pnr) = resolve_reference(&state, &reference).await?;

    state.upstream.cancel(&reservation_id).await?;
    state.registry.mark_cancelled(&reservation_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/reservations/{reference}/print
pub async fn print_reservation(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<PrintReservationResponse>, AppError> {
    let (reservation_id, _pnr) = resolve_reference(&state, &reference).await?;

    let printed = state.upstream.print(&reservation_id).await?;
    state
        .registry
        .upsert(
            &reservation_id,
            ReservationPatch {
                last_print: Some(printed.raw.clone()),
                printed_at: Some(Utc::now()),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(PrintReservationResponse {
        reservation_id,
        tickets: printed.tickets,
    }))
}

/// Normalize a caller-supplied reference to (reservation id, PNR if known).
/// Unresolved references pass through verbatim as reservation ids so older
/// records stay usable.
async fn resolve_reference(
    state: &AppState,
    reference: &str,
) -> Result<(String, Option<String>), AppError> {
    let classified = state.mapper.classify(reference).await?;
    match &classified {
        BookingRef::Pnr(pnr) => {
            let reservation_id = state
                .mapper
                .reservation_id_for(&classified)
                .await?
                .ok_or_else(|| {
                    AppError::NotFoundError(format!("no reservation linked to PNR {}", pnr))
                })?;
            Ok((reservation_id, Some(pnr.clone())))
        }
        BookingRef::ReservationId(id) => {
            let pnr = state.mapper.resolve_pnr_for_reservation(id).await?;
            Ok((id.clone(), pnr))
        }
        BookingRef::Unresolved(raw) => Ok((raw.clone(), None)),
    }
}

/// Persist the purchase-completion record after a successful payment; the
/// print call fetches the ticket payloads when the upstream has them ready.
/// Both steps are best-effort: the payment already went through.
async fn complete_purchase(
    state: &AppState,
    pnr: &str,
    reservation_id: &str,
    payment: &PaymentResult,
) {
    let tickets = match state.upstream.print(reservation_id).await {
        Ok(printed) => {
            let _ = state
                .registry
                .upsert(
                    reservation_id,
                    ReservationPatch {
                        last_print: Some(printed.raw.clone()),
                        printed_at: Some(Utc::now()),
                        ..Default::default()
                    },
                )
                .await;
            printed.tickets
        }
        Err(e) => {
            tracing::warn!("Print after payment failed for {}: {}", reservation_id, e);
            Vec::new()
        }
    };

    let record = PurchaseRecord {
        pnr: pnr.to_string(),
        status: Some("purchase_completed".to_string()),
        total: Some(payment.amount),
        currency: None,
        items: Vec::new(),
        tickets,
        adult_price: None,
        adult_count: None,
        child_price: None,
        child_count: None,
        completed_at: Some(Utc::now()),
    };
    if let Err(e) = state.purchases.put(&record).await {
        tracing::warn!("Failed to persist purchase record for {}: {}", pnr, e);
    }
}
