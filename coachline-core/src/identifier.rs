use serde::{Deserialize, Serialize};

/// What a caller-supplied booking reference turned out to be.
///
/// Flows handed "whatever the traveler typed" resolve it through the mapper
/// first; `Unresolved` keeps older records usable by passing the raw string
/// through as a reservation id instead of hard-failing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingRef {
    Pnr(String),
    ReservationId(String),
    Unresolved(String),
}

impl BookingRef {
    /// The raw string as supplied by the caller.
    pub fn raw(&self) -> &str {
        match self {
            BookingRef::Pnr(value)
            | BookingRef::ReservationId(value)
            | BookingRef::Unresolved(value) => value,
        }
    }

    pub fn pnr(&self) -> Option<&str> {
        match self {
            BookingRef::Pnr(value) => Some(value),
            _ => None,
        }
    }
}
