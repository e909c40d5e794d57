use crate::domain::booking::aggregate::{lenient_list, Booking};
use crate::domain::common::AggregateId;
use crate::domain::user::UserId;
use crate::enums::Category;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Article id type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleId(pub Uuid);

impl ArticleId {
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

impl AggregateId for ArticleId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ArticleId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Physical condition of the listed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    LikeNew,
    Used,
}

/// The three optional rental tiers of an article. Absent or
/// non-positive rates mean the tier is not offered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSchedule {
    #[serde(rename = "pricePerHour", default, skip_serializing_if = "Option::is_none")]
    pub price_per_hour: Option<f64>,

    #[serde(rename = "pricePerDay", default, skip_serializing_if = "Option::is_none")]
    pub price_per_day: Option<f64>,

    #[serde(rename = "pricePerWeek", default, skip_serializing_if = "Option::is_none")]
    pub price_per_week: Option<f64>,
}

impl PriceSchedule {
    fn offered(rate: Option<f64>) -> Option<f64> {
        rate.filter(|r| *r > 0.0)
    }

    pub fn hour_rate(&self) -> Option<f64> {
        Self::offered(self.price_per_hour)
    }
    pub fn day_rate(&self) -> Option<f64> {
        Self::offered(self.price_per_day)
    }
    pub fn week_rate(&self) -> Option<f64> {
        Self::offered(self.price_per_week)
    }

    pub fn has_any_tier(&self) -> bool {
        self.hour_rate().is_some() || self.day_rate().is_some() || self.week_rate().is_some()
    }

    /// Duck-typed read of the tier fields from a raw document; anything
    /// that is not a number means the tier is not offered.
    pub fn from_fields(fields: &serde_json::Map<String, serde_json::Value>) -> Self {
        let rate = |key: &str| fields.get(key).and_then(serde_json::Value::as_f64);
        Self {
            price_per_hour: rate("pricePerHour"),
            price_per_day: rate("pricePerDay"),
            price_per_week: rate("pricePerWeek"),
        }
    }
}

/// A rentable listing (aggregate). The embedded `bookings` list is the
/// source of truth for overlap checks; it is only ever mutated through
/// the booking transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,

    /// Listing owner (user.id)
    #[serde(rename = "ownerId")]
    pub owner_id: UserId,

    pub name: String,

    pub category: Category,

    pub condition: Condition,

    /// Ratings left by past renters
    #[serde(default)]
    pub ratings: Vec<i32>,

    /// Malformed entries are tolerated on read and preserved on write
    #[serde(default, with = "lenient_list")]
    pub bookings: Vec<Booking>,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(flatten)]
    pub schedule: PriceSchedule,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

impl Article {
    #[allow(clippy::too_many_arguments)]
    pub fn new_for_insert(
        owner_id: UserId,
        name: String,
        category: Category,
        condition: Condition,
        schedule: PriceSchedule,
    ) -> Self {
        Self {
            id: ArticleId::new_v4(),
            owner_id,
            name,
            category,
            condition,
            ratings: Vec::new(),
            bookings: Vec::new(),
            images: Vec::new(),
            schedule,
            latitude: None,
            longitude: None,
            brand: None,
        }
    }

    pub fn update(&mut self, dto: &ArticleDto) {
        self.name = dto.name.clone();
        self.condition = dto.condition;
        self.images = dto.images.clone();
        self.schedule = dto.schedule.clone();
        self.latitude = dto.latitude;
        self.longitude = dto.longitude;
        self.brand = dto.brand.clone();
    }

    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        Some(self.ratings.iter().sum::<i32>() as f64 / self.ratings.len() as f64)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name must not be empty".into());
        }
        for rate in [
            self.schedule.price_per_hour,
            self.schedule.price_per_day,
            self.schedule.price_per_week,
        ]
        .into_iter()
        .flatten()
        {
            if rate < 0.0 {
                return Err("Price tiers must not be negative".into());
            }
        }
        if self.latitude.is_some() != self.longitude.is_some() {
            return Err("Latitude and longitude must be set together".into());
        }
        Ok(())
    }
}

// =============================================================================
// DTO
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDto {
    pub id: Option<String>,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    pub name: String,
    pub category: Category,
    pub condition: Condition,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub schedule: PriceSchedule,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub brand: Option<String>,
}
