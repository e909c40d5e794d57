//! Rental pricing.
//!
//! Pure tier arithmetic shared by the booking flow and by quote
//! estimation, so the number a user sees before confirming matches the
//! number the transaction charges.

use crate::domain::article::PriceSchedule;
use crate::shared::format::format_amount;
use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

/// Pricing failures, all surfaced before any store access
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PricingError {
    #[error("end of the rental range precedes its start")]
    InvalidDateRange,

    #[error("no applicable price tier for the requested range")]
    NoPricingAvailable,
}

/// A computed charge plus its tier composition for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub amount: f64,
    pub breakdown: String,
}

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

fn ceil_div(num: i64, den: i64) -> i64 {
    (num + den - 1) / den
}

/// Compute the charge for renting over `[from, to]`.
///
/// Elapsed time is rounded up to whole days and whole hours; tiers are
/// tried in strict order weekly → daily → hourly. A weekly charge bills
/// whole weeks at the week rate and any leftover days at the day rate
/// when one exists; there is no hourly fallback for the leftover.
/// Absent or non-positive rates mean the tier is not offered.
pub fn quote(
    from: NaiveDateTime,
    to: NaiveDateTime,
    schedule: &PriceSchedule,
) -> Result<Quote, PricingError> {
    if to < from {
        return Err(PricingError::InvalidDateRange);
    }

    let ms = (to - from).num_milliseconds();
    let days = ceil_div(ms, MS_PER_DAY);
    let hours = ceil_div(ms, MS_PER_HOUR);

    if days >= 7 {
        if let Some(week_rate) = schedule.week_rate() {
            let weeks = days / 7;
            let mut amount = weeks as f64 * week_rate;
            let mut breakdown = format!("{}wk × {}€", weeks, format_amount(week_rate));

            let remainder = days - weeks * 7;
            if remainder > 0 {
                if let Some(day_rate) = schedule.day_rate() {
                    amount += remainder as f64 * day_rate;
                    breakdown.push_str(&format!(" + {}d × {}€", remainder, format_amount(day_rate)));
                }
            }

            breakdown.push_str(&format!(" = {}€", format_amount(amount)));
            return Ok(Quote { amount, breakdown });
        }
    }

    if days >= 1 {
        if let Some(day_rate) = schedule.day_rate() {
            let amount = days as f64 * day_rate;
            let breakdown = format!(
                "{}d × {}€ = {}€",
                days,
                format_amount(day_rate),
                format_amount(amount)
            );
            return Ok(Quote { amount, breakdown });
        }
    }

    if let Some(hour_rate) = schedule.hour_rate() {
        let amount = hours as f64 * hour_rate;
        let breakdown = format!(
            "{}h × {}€ = {}€",
            hours,
            format_amount(hour_rate),
            format_amount(amount)
        );
        return Ok(Quote { amount, breakdown });
    }

    Err(PricingError::NoPricingAvailable)
}
