use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::domain::booking::BookingError;
use crate::AppContext;
use contracts::domain::article::ArticleId;
use contracts::domain::booking::{Booking, CreateBookingRequest, PricingError, Quote, QuoteRequest};
use contracts::domain::common::AggregateId;
use contracts::domain::user::UserId;

type ErrorReply = (StatusCode, Json<serde_json::Value>);

/// Domain errors stay recoverable at the client: it gets a status it
/// can branch on and a message it can show.
fn reply(err: BookingError) -> ErrorReply {
    let status = match &err {
        BookingError::Pricing(PricingError::InvalidDateRange) => StatusCode::BAD_REQUEST,
        BookingError::Pricing(PricingError::NoPricingAvailable) => StatusCode::BAD_REQUEST,
        BookingError::ArticleNotFound => StatusCode::NOT_FOUND,
        BookingError::BookingConflict => StatusCode::CONFLICT,
        BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "booking request failed");
    }
    (status, Json(json!({ "error": err.to_string() })))
}

/// POST /api/bookings
pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, ErrorReply> {
    let article_id = match ArticleId::from_string(&req.article_id) {
        Ok(id) => id,
        Err(_) => return Err(reply(BookingError::ArticleNotFound)),
    };
    let user_id = match UserId::from_string(&req.user_id) {
        Ok(id) => id,
        Err(e) => {
            return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": e }))));
        }
    };
    match ctx
        .bookings
        .create(req.category, article_id, user_id, &req.date_from, &req.date_to)
        .await
    {
        Ok(booking) => Ok(Json(booking)),
        Err(e) => Err(reply(e)),
    }
}

/// POST /api/bookings/quote
pub async fn quote(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<Quote>, ErrorReply> {
    let article_id = match ArticleId::from_string(&req.article_id) {
        Ok(id) => id,
        Err(_) => return Err(reply(BookingError::ArticleNotFound)),
    };
    match ctx
        .bookings
        .estimate(req.category, article_id, &req.date_from, &req.date_to)
        .await
    {
        Ok(quote) => Ok(Json(quote)),
        Err(e) => Err(reply(e)),
    }
}
