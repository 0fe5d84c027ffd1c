use coachline_core::models::{
    BookingRecord, FareCategory, PassengerFareLine, PurchaseRecord,
};
use serde_json::Value;

/// Everything the allocator can draw on: the known total, the passenger
/// snapshot, and whatever pricing shapes the upstream purchase exposed.
#[derive(Debug, Clone, Default)]
pub struct FareContext {
    pub total: f64,
    pub currency: String,
    pub passengers: Vec<Value>,
    /// One priced upstream line item each, raw (possibly cents).
    pub items: Vec<f64>,
    pub adult_unit: Option<f64>,
    pub child_unit: Option<f64>,
    pub round_trip: bool,
}

impl FareContext {
    pub fn from_booking(booking: &BookingRecord, purchase: Option<&PurchaseRecord>) -> Self {
        let total = purchase
            .and_then(|p| p.total)
            .or(booking.total)
            .unwrap_or(0.0);
        Self {
            total,
            currency: booking.currency.clone(),
            passengers: booking.passengers.clone(),
            items: purchase
                .map(|p| p.items.iter().filter_map(|i| i.price).collect())
                .unwrap_or_default(),
            adult_unit: purchase.and_then(|p| p.adult_price),
            child_unit: purchase.and_then(|p| p.child_price),
            round_trip: booking
                .trip
                .as_ref()
                .map(|t| t.is_round_trip())
                .unwrap_or(false),
        }
    }

    fn passenger_count(&self) -> usize {
        self.passengers.len().max(1)
    }
}

/// Which pricing signal won the allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FareBasis {
    PerPassenger,
    PerItem,
    CategoryWeighted,
    EvenSplit,
}

#[derive(Debug, Clone)]
pub struct FareBreakdown {
    pub lines: Vec<PassengerFareLine>,
    /// True when `lines` carry per-leg display figures for a round trip.
    pub per_leg: bool,
    pub basis: FareBasis,
}

impl FareBreakdown {
    pub fn sum(&self) -> f64 {
        self.lines.iter().map(|l| l.line_total).sum()
    }
}

/// Allocate the known total across the passenger list, trying pricing
/// signals in priority order: explicit per-passenger prices, per-item
/// prices, category-weighted units, even split.
pub fn allocate(ctx: &FareContext) -> FareBreakdown {
    let n = ctx.passenger_count();

    let (mut amounts, basis): (Vec<f64>, FareBasis) = if let Some(prices) = direct_prices(ctx) {
        // Already granular truth; used directly, never rescaled.
        (prices.iter().map(|p| round2(*p)).collect(), FareBasis::PerPassenger)
    } else if let Some(items) = item_prices(ctx, n) {
        (scale_to_total(&items, ctx.total), FareBasis::PerItem)
    } else if let Some(weights) = category_weights(ctx, n) {
        (scale_to_total(&weights, ctx.total), FareBasis::CategoryWeighted)
    } else {
        (scale_to_total(&vec![1.0; n], ctx.total), FareBasis::EvenSplit)
    };

    let mut per_leg = false;
    if ctx.round_trip {
        per_leg = true;
        if !amounts_are_per_leg(&amounts, ctx.total, n) {
            // Whole-trip figures: halve for per-leg display.
            for amount in amounts.iter_mut() {
                *amount = round2(*amount / 2.0);
            }
        }
    }

    let lines = amounts
        .iter()
        .enumerate()
        .map(|(index, amount)| {
            let category = passenger_category(ctx.passengers.get(index));
            let unit_price = match basis {
                FareBasis::CategoryWeighted => {
                    let adult = ctx.adult_unit.unwrap_or(0.0);
                    match category {
                        FareCategory::Adult => round2(adult),
                        FareCategory::Child => round2(ctx.child_unit.unwrap_or(adult)),
                    }
                }
                _ => *amount,
            };
            PassengerFareLine {
                passenger_index: index,
                category,
                unit_price,
                line_total: *amount,
                currency: ctx.currency.clone(),
            }
        })
        .collect();

    FareBreakdown { lines, per_leg, basis }
}

/// Decide whether computed per-passenger figures already represent one leg.
/// Doubling must land closer to the known total than the figures themselves,
/// within an absolute tolerance that grows with the passenger count so small
/// bookings do not false-positive.
fn amounts_are_per_leg(amounts: &[f64], total: f64, n: usize) -> bool {
    let sum: f64 = amounts.iter().sum();
    let tolerance = (n as f64 * 0.05).max(0.05);
    let doubled_gap = (2.0 * sum - total).abs();
    let plain_gap = (sum - total).abs();
    doubled_gap <= tolerance && doubled_gap < plain_gap
}

fn direct_prices(ctx: &FareContext) -> Option<Vec<f64>> {
    if ctx.passengers.is_empty() {
        return None;
    }
    ctx.passengers.iter().map(passenger_price).collect()
}

fn item_prices(ctx: &FareContext, n: usize) -> Option<Vec<f64>> {
    if ctx.items.is_empty() || ctx.items.len() != n {
        return None;
    }
    Some(
        ctx.items
            .iter()
            .map(|value| normalize_item_price(*value, ctx.total))
            .collect(),
    )
}

fn category_weights(ctx: &FareContext, n: usize) -> Option<Vec<f64>> {
    let adult = ctx.adult_unit?;
    // No special child discount assumed when child pricing is absent.
    let child = ctx.child_unit.unwrap_or(adult);
    Some(
        (0..n)
            .map(|index| match passenger_category(ctx.passengers.get(index)) {
                FareCategory::Adult => adult,
                FareCategory::Child => child,
            })
            .collect(),
    )
}

/// Upstream item prices do not declare their unit. A value is treated as
/// cents when it dwarfs the known total (more than 5x) or is four digits
/// while the total is not. Documented heuristic behavior; some
/// currency/amount combinations are inherently ambiguous.
fn normalize_item_price(value: f64, total: f64) -> f64 {
    if total > 0.0 && value > total * 5.0 {
        return value / 100.0;
    }
    if value >= 1000.0 && total < 1000.0 {
        return value / 100.0;
    }
    value
}

/// Scale a weight vector so the rounded outputs sum exactly to `total`;
/// rounding drift lands on the last line.
fn scale_to_total(weights: &[f64], total: f64) -> Vec<f64> {
    let sum: f64 = weights.iter().sum();
    if sum.abs() < f64::EPSILON {
        let even = vec![1.0; weights.len().max(1)];
        return scale_to_total(&even, total);
    }

    let scale = total / sum;
    let mut amounts: Vec<f64> = weights.iter().map(|w| round2(w * scale)).collect();
    let drift = round2(total - amounts.iter().sum::<f64>());
    if let Some(last) = amounts.last_mut() {
        *last = round2(*last + drift);
    }
    amounts
}

fn passenger_price(passenger: &Value) -> Option<f64> {
    ["price", "fare", "retail_price"]
        .iter()
        .find_map(|key| value_as_f64(passenger.get(*key)?))
}

fn passenger_category(passenger: Option<&Value>) -> FareCategory {
    let raw = passenger.and_then(|p| {
        ["category", "fare_type", "passenger_type", "type"]
            .iter()
            .find_map(|key| p.get(*key).and_then(Value::as_str))
    });
    classify_category(raw)
}

/// Child/youth/teen/student tokens count as child; everything else,
/// including unknown or blank, counts as adult.
pub fn classify_category(raw: Option<&str>) -> FareCategory {
    match raw {
        Some(value) => {
            let lowered = value.to_lowercase();
            if ["child", "youth", "teen", "student"]
                .iter()
                .any(|token| lowered.contains(token))
            {
                FareCategory::Child
            } else {
                FareCategory::Adult
            }
        }
        None => FareCategory::Adult,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
