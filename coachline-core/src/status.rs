use chrono::{DateTime, Duration, Utc};

use crate::models::{Reservation, ReservationStatus};

/// Derive the effective status of a reservation at `now`.
///
/// Order matters: `Paid` and `Cancelled` are terminal and returned unchanged.
/// Only then is the lease checked, so a payment recorded after the lease ran
/// out still wins (payment received just in time).
pub fn derive_status(record: &Reservation, now: DateTime<Utc>) -> ReservationStatus {
    match record.status {
        ReservationStatus::Paid | ReservationStatus::Cancelled => record.status,
        _ => match record.expires_at {
            Some(expires_at) if now >= expires_at => ReservationStatus::Expired,
            _ => match record.status {
                ReservationStatus::Expired => ReservationStatus::Expired,
                _ => ReservationStatus::Reserved,
            },
        },
    }
}

/// Lease durations are upstream input; negative values collapse to zero.
pub fn normalize_lease(seconds: i64) -> i64 {
    seconds.max(0)
}

/// Expiry is creation plus lease, but only for a positive lease.
pub fn lease_expiry(created_at: DateTime<Utc>, lease_seconds: i64) -> Option<DateTime<Utc>> {
    if lease_seconds > 0 {
        Some(created_at + Duration::seconds(lease_seconds))
    } else {
        None
    }
}
