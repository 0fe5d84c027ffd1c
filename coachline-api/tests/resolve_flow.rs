use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use coachline_api::{app, AppState};
use coachline_core::render::{RenderJob, TicketRenderer};
use coachline_core::upstream::CoachApi;
use coachline_core::CoreResult;
use coachline_reservation::{MirrorWriter, PnrMapper, ReservationRegistry};
use coachline_store::artifact_repo::StoreArtifactCache;
use coachline_store::index_repo::StoreBookingIndex;
use coachline_store::purchase_repo::StorePurchaseRepository;
use coachline_store::{
    DbClient, InMemoryBookingStore, InMemoryReservationStore, LogMailer, MockCoachApi,
};
use coachline_ticket::TicketService;
use serde_json::{json, Value};
use tower::ServiceExt;

struct StubRenderer;

#[async_trait]
impl TicketRenderer for StubRenderer {
    async fn render(&self, job: &RenderJob) -> CoreResult<Vec<u8>> {
        let mut bytes = format!("%PDF-1.4\n{:?} {}", job.ticket_type, job.pnr).into_bytes();
        bytes.resize(1024, b' ');
        Ok(bytes)
    }
}

async fn test_app() -> Router {
    let db = DbClient::open_in_memory().await.unwrap();

    let bookings = Arc::new(InMemoryBookingStore::new());
    let reservations = Arc::new(InMemoryReservationStore::new());
    let purchases = Arc::new(StorePurchaseRepository::new(db.clone()));
    let artifacts = Arc::new(StoreArtifactCache::new(db.clone()));
    let index = Arc::new(StoreBookingIndex::new(db));

    let mirror = MirrorWriter::spawn(index, 16);
    let registry = Arc::new(ReservationRegistry::new(reservations));
    let mapper = Arc::new(PnrMapper::new(bookings.clone(), mirror));
    let upstream: Arc<dyn CoachApi> = Arc::new(MockCoachApi);

    let tickets = Arc::new(TicketService::new(
        bookings,
        purchases.clone(),
        artifacts,
        Arc::new(StubRenderer),
        "http://tickets.test".to_string(),
        "coachline".to_string(),
    ));

    app(AppState {
        registry,
        mapper,
        tickets,
        purchases,
        upstream,
        mailer: Arc::new(LogMailer),
        default_hold_seconds: 600,
    })
}

fn reservation_body() -> Value {
    json!({
        "trip_id": "T-100",
        "origin": "Tallinn",
        "destination": "Riga",
        "departure_date": "2026-09-01",
        "passengers": [{"name": "Mari", "category": "adult"}],
        "hold_seconds": 300,
        "total": 29.0,
        "contact": {"name": "Mari", "email": "mari@example.test", "phone": null}
    })
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_booking(app: &Router) -> (String, String) {
    let (status, body) = post_json(app, "/v1/reservations", reservation_body()).await;
    assert_eq!(status, StatusCode::OK);
    (
        body["pnr"].as_str().unwrap().to_string(),
        body["reservation_id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_reservation_yields_pnr_and_lease() {
    let app = test_app().await;

    let (status, body) = post_json(&app, "/v1/reservations", reservation_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "RESERVED");
    assert_eq!(body["lease_seconds"], 300);
    assert_eq!(body["pnr"].as_str().unwrap().len(), 6);
    assert!(body["reservation_id"].as_str().unwrap().starts_with("RSV-"));
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_out_of_range_hold_is_rejected_with_400() {
    let app = test_app().await;

    let mut body = reservation_body();
    body["hold_seconds"] = json!(10);
    let (status, _body) = post_json(&app, "/v1/reservations", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unpaid_booking_serves_hold_pdf_with_exact_headers() {
    let app = test_app().await;
    let (pnr, _reservation_id) = create_booking(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/v1/tickets/{}", pnr))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap(),
        &format!("inline; filename=\"hold-{}.pdf\"", pnr)
    );

    let declared_length: usize = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.len(), declared_length);
    assert!(bytes.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_payment_then_regen_upgrades_to_final() {
    let app = test_app().await;
    let (pnr, _reservation_id) = create_booking(&app).await;

    // First resolution caches a hold ticket.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/v1/tickets/{}", pnr))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) =
        post_json(&app, &format!("/v1/reservations/{}/pay", pnr), json!({"amount": 29.0})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // Without regen the cached hold still wins the precedence read until a
    // final artifact exists; with regen the resolver re-runs and sees the
    // purchase record.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/v1/tickets/{}?regen=true&download=true", pnr))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap(),
        &format!("attachment; filename=\"final-{}.pdf\"", pnr)
    );
}

#[tokio::test]
async fn test_pay_accepts_reservation_id_too() {
    let app = test_app().await;
    let (_pnr, reservation_id) = create_booking(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/v1/reservations/{}/pay", reservation_id),
        json!({"amount": 29.0}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["reservation_id"].as_str().unwrap(), reservation_id);
    // The reverse lookup recovers the PNR from the reservation id.
    assert!(body["pnr"].is_string());
}

#[tokio::test]
async fn test_unknown_pnr_is_404() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/tickets/ZZZZZZ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_reservation_is_terminal() {
    let app = test_app().await;
    let (pnr, reservation_id) = create_booking(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/reservations/{}/cancel", pnr))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/v1/reservations/{}", reservation_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "CANCELLED");
}
