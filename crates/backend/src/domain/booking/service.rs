use super::{BookingError, BookingRepository};
use crate::domain::article::ArticleRepository;
use crate::domain::user::UserRepository;
use crate::store::{DocumentStore, StoreError};
use chrono::NaiveTime;
use contracts::domain::article::ArticleId;
use contracts::domain::booking::{pricing, Booking, BookingId, PurchasedItem, Quote};
use contracts::domain::common::AggregateId;
use contracts::domain::user::UserId;
use contracts::enums::Category;
use contracts::shared::dates;
use std::collections::HashSet;
use std::sync::Arc;

pub struct BookingService<S: DocumentStore> {
    repo: BookingRepository<S>,
    articles: ArticleRepository<S>,
    users: UserRepository<S>,
}

fn internal(e: anyhow::Error) -> BookingError {
    BookingError::Store(StoreError::Backend(e.to_string()))
}

impl<S: DocumentStore> BookingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            repo: BookingRepository::new(Arc::clone(&store)),
            articles: ArticleRepository::new(Arc::clone(&store)),
            users: UserRepository::new(store),
        }
    }

    /// Book an article for `[date_from, date_to]`, both ends inclusive.
    ///
    /// Date parsing and a pre-flight quote run before the transaction
    /// opens, so unbookable requests fail without touching the store.
    /// The transaction recomputes the authoritative amount itself.
    pub async fn create(
        &self,
        category: Category,
        article_id: ArticleId,
        user_id: UserId,
        date_from: &str,
        date_to: &str,
    ) -> Result<Booking, BookingError> {
        let from = dates::parse_date(date_from).ok_or(pricing::PricingError::InvalidDateRange)?;
        let to = dates::parse_date(date_to).ok_or(pricing::PricingError::InvalidDateRange)?;
        if to < from {
            return Err(pricing::PricingError::InvalidDateRange.into());
        }

        let article = self
            .articles
            .get_by_id(category, &article_id)
            .await
            .map_err(internal)?
            .ok_or(BookingError::ArticleNotFound)?;
        pricing::quote(
            from.and_time(NaiveTime::MIN),
            to.and_time(NaiveTime::MIN),
            &article.schedule,
        )?;

        let booking = self
            .repo
            .create(category, &article_id, &user_id, from, to)
            .await?;
        tracing::info!(
            booking = %booking.id.as_string(),
            article = %article_id.as_string(),
            amount = booking.amount,
            "booking created"
        );
        Ok(booking)
    }

    /// Price a range without creating anything. Accepts datetimes as
    /// well as dates, so sub-day ranges quote against the hourly tier.
    pub async fn estimate(
        &self,
        category: Category,
        article_id: ArticleId,
        date_from: &str,
        date_to: &str,
    ) -> Result<Quote, BookingError> {
        let from =
            dates::parse_datetime(date_from).ok_or(pricing::PricingError::InvalidDateRange)?;
        let to = dates::parse_datetime(date_to).ok_or(pricing::PricingError::InvalidDateRange)?;

        let article = self
            .articles
            .get_by_id(category, &article_id)
            .await
            .map_err(internal)?
            .ok_or(BookingError::ArticleNotFound)?;

        Ok(pricing::quote(from, to, &article.schedule)?)
    }

    /// Every (article, booking) pair behind the user's purchase ids,
    /// newest first.
    pub async fn purchases(&self, user_id: &UserId) -> Result<Vec<PurchasedItem>, BookingError> {
        let user = match self.users.get_by_id(user_id).await.map_err(internal)? {
            Some(user) => user,
            None => return Ok(Vec::new()),
        };
        if user.purchases.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<BookingId> = user.purchases.iter().copied().collect();

        let mut items = Vec::new();
        for category in Category::all() {
            for article in self
                .articles
                .list_by_category(category)
                .await
                .map_err(internal)?
            {
                for booking in &article.bookings {
                    if wanted.contains(&booking.id) {
                        items.push(PurchasedItem {
                            article: article.clone(),
                            booking: booking.clone(),
                        });
                    }
                }
            }
        }
        items.sort_by(|a, b| b.booking.date_from.cmp(&a.booking.date_from));
        Ok(items)
    }
}
