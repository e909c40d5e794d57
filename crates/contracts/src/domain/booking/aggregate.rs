use crate::domain::common::AggregateId;
use crate::domain::user::UserId;
use crate::shared::dates::{self, flex_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Booking id type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub Uuid);

impl BookingId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for BookingId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(BookingId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Closed-interval overlap at calendar-day granularity: `[a_from, a_to]`
/// and `[b_from, b_to]` conflict iff they share at least one day.
pub fn ranges_overlap(
    a_from: NaiveDate,
    a_to: NaiveDate,
    b_from: NaiveDate,
    b_to: NaiveDate,
) -> bool {
    a_from <= b_to && a_to >= b_from
}

/// A date-ranged reservation of an article, embedded in the article
/// document. Created exactly once by the booking transaction; `rating`
/// is mutated elsewhere, `amount` never.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,

    /// Renter (user.id)
    #[serde(rename = "userId")]
    pub user_id: UserId,

    /// First rented day, inclusive
    #[serde(rename = "dateFrom", with = "flex_date")]
    pub date_from: NaiveDate,

    /// Last rented day, inclusive
    #[serde(rename = "dateTo", with = "flex_date")]
    pub date_to: NaiveDate,

    pub rating: i32,

    /// Charge computed at creation time
    pub amount: f64,
}

impl Booking {
    pub fn new_for_insert(
        user_id: UserId,
        date_from: NaiveDate,
        date_to: NaiveDate,
        amount: f64,
    ) -> Self {
        Self {
            id: BookingId::new_v4(),
            user_id,
            date_from,
            date_to,
            rating: 0,
            amount,
        }
    }

    /// Does `[from, to]` share at least one day with this booking?
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        ranges_overlap(from, to, self.date_from, self.date_to)
    }

    /// Inclusive date range of a raw booking entry, tolerating both wire
    /// date shapes. None when either bound fails to normalize; such
    /// entries never block, whatever else they contain.
    pub fn range_of(entry: &Value) -> Option<(NaiveDate, NaiveDate)> {
        let from = dates::date_from_value(entry.get("dateFrom")?)?;
        let to = dates::date_from_value(entry.get("dateTo")?)?;
        Some((from, to))
    }

    /// Decode a raw booking list, dropping entries that do not normalize
    /// to the expected shape. Callers that write the list back must keep
    /// the raw entries, not this filtered view.
    pub fn decode_list(raw: &[Value]) -> Vec<Booking> {
        raw.iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect()
    }
}

/// serde helper for embedded booking lists: tolerant on read (malformed
/// entries are skipped), plain list on write.
pub mod lenient_list {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(bookings: &[Booking], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(bookings)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Booking>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<Value>::deserialize(deserializer).unwrap_or_default();
        Ok(Booking::decode_list(&raw))
    }
}
