pub mod aggregate;
pub mod dto;
pub mod pricing;

pub use aggregate::{Booking, BookingId};
pub use dto::{CreateBookingRequest, PurchasedItem, QuoteRequest};
pub use pricing::{quote, PricingError, Quote};
