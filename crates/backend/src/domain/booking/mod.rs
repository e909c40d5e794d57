pub mod repository;
pub mod service;

pub use repository::BookingRepository;
pub use service::BookingService;

use crate::store::StoreError;
use contracts::domain::booking::PricingError;
use thiserror::Error;

/// Booking failures. Everything except `Store` is recoverable at the
/// caller: adjust the input and try again. A failed call leaves both
/// the article and the user document untouched.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("article not found")]
    ArticleNotFound,

    #[error("the article is already booked inside the requested range")]
    BookingConflict,

    #[error("transaction failed: {0}")]
    Store(#[from] StoreError),
}
