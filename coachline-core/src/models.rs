use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Effective reservation status.
///
/// `Paid` and `Cancelled` are sticky terminal flags set explicitly by the
/// caller; `Reserved` and `Expired` are recomputed from the lease on every
/// read (see `status::derive_status`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Reserved,
    Paid,
    Cancelled,
    Expired,
}

/// Denormalized trip fields, enough to render a ticket without re-querying
/// the upstream API. A populated return leg marks the booking as round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSnapshot {
    pub trip_id: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_trip_id: Option<String>,
    pub return_departure_date: Option<String>,
}

impl TripSnapshot {
    pub fn is_round_trip(&self) -> bool {
        self.return_trip_id.is_some() || self.return_departure_date.is_some()
    }
}

/// One record per upstream reservation. Never physically deleted; retained
/// for audit and listing after expiry or cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: String,
    pub status: ReservationStatus,
    pub trip: Option<TripSnapshot>,
    pub passenger_count: u32,
    /// Free-form passenger records exactly as the upstream sent them.
    pub passengers: Vec<Value>,
    pub seat_ids: Vec<String>,
    pub lease_seconds: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_payment: Option<Value>,
    pub last_print: Option<Value>,
    pub printed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn new(reservation_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            reservation_id,
            status: ReservationStatus::Reserved,
            trip: None,
            passenger_count: 0,
            passengers: Vec::new(),
            seat_ids: Vec::new(),
            lease_seconds: 0,
            created_at,
            expires_at: None,
            last_payment: None,
            last_print: None,
            printed_at: None,
            paid_at: None,
            cancelled_at: None,
        }
    }
}

/// Partial update merged into a `Reservation` by the registry. Absent fields
/// leave the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationPatch {
    pub status: Option<ReservationStatus>,
    pub trip: Option<TripSnapshot>,
    pub passenger_count: Option<u32>,
    pub passengers: Option<Vec<Value>>,
    pub seat_ids: Option<Vec<String>>,
    pub lease_seconds: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_payment: Option<Value>,
    pub last_print: Option<Value>,
    pub printed_at: Option<DateTime<Utc>>,
}

/// Mapping status between PNR creation and payment confirmation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    AwaitingPayment,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Document-store booking record, keyed by PNR. This is the system of record
/// joining what the traveler typed to what the upstream API understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub pnr: String,
    pub reservation_id: Option<String>,
    pub trip: Option<TripSnapshot>,
    pub passengers: Vec<Value>,
    pub contact: Option<ContactInfo>,
    pub status: BookingStatus,
    pub total: Option<f64>,
    pub currency: String,
    pub booked_by: Option<String>,
    /// Nested provider booking object, when the upstream returned one.
    /// A non-empty `tickets` array in here is a print-ready signal.
    pub provider_booking: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl BookingRecord {
    pub fn new(pnr: String, created_at: DateTime<Utc>) -> Self {
        Self {
            pnr,
            reservation_id: None,
            trip: None,
            passengers: Vec::new(),
            contact: None,
            status: BookingStatus::AwaitingPayment,
            total: None,
            currency: "EUR".to_string(),
            booked_by: None,
            provider_booking: None,
            created_at,
            updated_at: created_at,
            paid_at: None,
        }
    }

    /// Merge a patch into this record. Same-PNR re-runs refresh fields
    /// instead of creating duplicates.
    pub fn apply(&mut self, patch: &BookingPatch, now: DateTime<Utc>) {
        if let Some(reservation_id) = &patch.reservation_id {
            self.reservation_id = Some(reservation_id.clone());
        }
        if let Some(trip) = &patch.trip {
            self.trip = Some(trip.clone());
        }
        if let Some(passengers) = &patch.passengers {
            self.passengers = passengers.clone();
        }
        if let Some(contact) = &patch.contact {
            self.contact = Some(contact.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(total) = patch.total {
            self.total = Some(total);
        }
        if let Some(currency) = &patch.currency {
            self.currency = currency.clone();
        }
        if let Some(booked_by) = &patch.booked_by {
            self.booked_by = Some(booked_by.clone());
        }
        if let Some(provider_booking) = &patch.provider_booking {
            self.provider_booking = Some(provider_booking.clone());
        }
        if let Some(paid_at) = patch.paid_at {
            self.paid_at = Some(paid_at);
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingPatch {
    pub reservation_id: Option<String>,
    pub trip: Option<TripSnapshot>,
    pub passengers: Option<Vec<Value>>,
    pub contact: Option<ContactInfo>,
    pub status: Option<BookingStatus>,
    pub total: Option<f64>,
    pub currency: Option<String>,
    pub booked_by: Option<String>,
    pub provider_booking: Option<Value>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Denormalized projection of a booking mirrored into the relational store
/// for fast lookup and reporting. Best-effort; the document store stays
/// authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingIndexRow {
    pub pnr: String,
    pub reservation_id: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<String>,
    pub total: Option<f64>,
    pub status: BookingStatus,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl BookingIndexRow {
    pub fn project(booking: &BookingRecord) -> Self {
        Self {
            pnr: booking.pnr.clone(),
            reservation_id: booking.reservation_id.clone(),
            origin: booking.trip.as_ref().map(|t| t.origin.clone()),
            destination: booking.trip.as_ref().map(|t| t.destination.clone()),
            departure_date: booking.trip.as_ref().map(|t| t.departure_date.clone()),
            total: booking.total,
            status: booking.status,
            updated_at: booking.updated_at,
            paid_at: booking.paid_at,
        }
    }
}

/// Purchase-completion record persisted in the relational store once payment
/// went through. Its presence (with tickets or a completed status) is the
/// strongest "final ticket" signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub pnr: String,
    pub status: Option<String>,
    pub total: Option<f64>,
    pub currency: Option<String>,
    pub items: Vec<PurchaseItem>,
    pub tickets: Vec<Value>,
    pub adult_price: Option<f64>,
    pub adult_count: Option<u32>,
    pub child_price: Option<f64>,
    pub child_count: Option<u32>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One priced line item of an upstream purchase, ideally one per passenger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

/// Fare category after normalization. Anything that is not recognizably a
/// child fare counts as adult.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FareCategory {
    Adult,
    Child,
}

/// Derived per-passenger money line. Produced fresh on each allocation
/// request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerFareLine {
    pub passenger_index: usize,
    pub category: FareCategory,
    pub unit_price: f64,
    pub line_total: f64,
    pub currency: String,
}

/// Which printable artifact a booking currently warrants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketType {
    Hold,
    Final,
}

impl TicketType {
    pub fn opposite(self) -> Self {
        match self {
            TicketType::Hold => TicketType::Final,
            TicketType::Final => TicketType::Hold,
        }
    }

    pub fn artifact_kind(self) -> ArtifactKind {
        match self {
            TicketType::Hold => ArtifactKind::Hold,
            TicketType::Final => ArtifactKind::Final,
        }
    }
}

/// Cache key component: what kind of rendered blob is stored under a PNR.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Hold,
    Final,
    FinalZip,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Hold => "hold",
            ArtifactKind::Final => "final",
            ArtifactKind::FinalZip => "final_zip",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ArtifactKind::Hold | ArtifactKind::Final => "pdf",
            ArtifactKind::FinalZip => "zip",
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, ArtifactKind::Hold | ArtifactKind::Final)
    }
}

/// Relational artifact row, keyed by PNR, one payload column per kind.
#[derive(Debug, Clone, Default)]
pub struct ArtifactRecord {
    pub pnr: String,
    pub hold_pdf: Option<Vec<u8>>,
    pub hold_updated_at: Option<DateTime<Utc>>,
    pub final_pdf: Option<Vec<u8>>,
    pub final_updated_at: Option<DateTime<Utc>>,
    pub final_zip: Option<Vec<u8>>,
    pub final_zip_updated_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub booked_by: Option<String>,
}

impl ArtifactRecord {
    pub fn payload(&self, kind: ArtifactKind) -> Option<&[u8]> {
        match kind {
            ArtifactKind::Hold => self.hold_pdf.as_deref(),
            ArtifactKind::Final => self.final_pdf.as_deref(),
            ArtifactKind::FinalZip => self.final_zip.as_deref(),
        }
    }
}

/// Metadata written alongside every artifact payload.
#[derive(Debug, Clone, Default)]
pub struct ArtifactMeta {
    pub url: Option<String>,
    pub booked_by: Option<String>,
}
