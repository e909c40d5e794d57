use crate::domain::article::aggregate::Article;
use crate::domain::booking::aggregate::Booking;
use crate::enums::Category;
use serde::{Deserialize, Serialize};

/// Request body for creating a booking. Dates are raw strings so that
/// range problems surface as the domain's own error, not as a decode
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub category: Category,
    #[serde(rename = "articleId")]
    pub article_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "dateFrom")]
    pub date_from: String,
    #[serde(rename = "dateTo")]
    pub date_to: String,
}

/// Request body for a price estimate, no booking is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub category: Category,
    #[serde(rename = "articleId")]
    pub article_id: String,
    #[serde(rename = "dateFrom")]
    pub date_from: String,
    #[serde(rename = "dateTo")]
    pub date_to: String,
}

/// An article paired with one of the caller's bookings on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasedItem {
    pub article: Article,
    pub booking: Booking,
}
