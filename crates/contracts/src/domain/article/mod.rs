pub mod aggregate;

pub use aggregate::{Article, ArticleDto, ArticleId, Condition, PriceSchedule};
