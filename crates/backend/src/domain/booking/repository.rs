use super::BookingError;
use crate::store::{
    paths, run_transaction, DocumentStore, DocumentTransaction, Fields, StoreError, TxnFuture,
    WriteOp,
};
use chrono::{NaiveDate, NaiveTime};
use contracts::domain::article::{ArticleId, PriceSchedule};
use contracts::domain::booking::aggregate::ranges_overlap;
use contracts::domain::booking::{pricing, Booking};
use contracts::domain::common::AggregateId;
use contracts::domain::user::UserId;
use contracts::enums::Category;
use serde_json::Value;
use std::sync::Arc;

pub struct BookingRepository<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> BookingRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a booking atomically.
    ///
    /// Inside one transaction: re-read the article, reject any overlap
    /// with the bookings on record, price the range against the schedule
    /// as read here (not the caller's snapshot), append the booking and
    /// link its id into the renter's purchases. All of it commits
    /// together or not at all; on contention the body re-runs against
    /// fresh state, so a conflicting booking that lands between attempts
    /// is still caught.
    pub async fn create(
        &self,
        category: Category,
        article_id: &ArticleId,
        user_id: &UserId,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Booking, BookingError> {
        let article_path = paths::article(category, article_id);
        let user_path = paths::user(user_id);
        let user_id = *user_id;

        run_transaction(self.store.as_ref(), move |txn: &mut S::Txn| {
            let article_path = article_path.clone();
            let user_path = user_path.clone();
            Box::pin(async move {
                let fields = txn
                    .get(&article_path)
                    .await?
                    .ok_or(BookingError::ArticleNotFound)?;

                // The raw list is written back as-is plus the new entry:
                // entries that fail to normalize are non-blocking for the
                // overlap check but must survive the write.
                let raw: Vec<Value> = match fields.get("bookings") {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                for entry in &raw {
                    if let Some((from, to)) = Booking::range_of(entry) {
                        if ranges_overlap(date_from, date_to, from, to) {
                            return Err(BookingError::BookingConflict);
                        }
                    }
                }

                // Authoritative charge, from the transactionally-read
                // schedule. A concurrent price edit is either observed
                // here or invalidates this read set at commit.
                let schedule = PriceSchedule::from_fields(&fields);
                let quote = pricing::quote(
                    date_from.and_time(NaiveTime::MIN),
                    date_to.and_time(NaiveTime::MIN),
                    &schedule,
                )?;

                let booking = Booking::new_for_insert(user_id, date_from, date_to, quote.amount);
                let encoded = serde_json::to_value(&booking)
                    .map_err(|e| StoreError::Backend(format!("encode booking: {}", e)))?;

                let mut bookings = raw;
                bookings.push(encoded);
                let mut update = Fields::new();
                update.insert("bookings".to_string(), Value::Array(bookings));

                txn.stage(WriteOp::Update {
                    path: article_path.clone(),
                    fields: update,
                });
                txn.stage(WriteOp::ArrayUnion {
                    path: user_path.clone(),
                    field: "purchases".to_string(),
                    values: vec![Value::String(booking.id.as_string())],
                });

                Ok(booking)
            }) as TxnFuture<'_, Result<Booking, BookingError>>
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::ArticleRepository;
    use crate::domain::user::UserRepository;
    use crate::store::MemoryStore;
    use contracts::domain::article::{Article, Condition};
    use contracts::domain::user::UserProfile;
    use serde_json::json;

    struct Fixture {
        store: Arc<MemoryStore>,
        bookings: BookingRepository<MemoryStore>,
        articles: ArticleRepository<MemoryStore>,
        users: UserRepository<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        Fixture {
            bookings: BookingRepository::new(Arc::clone(&store)),
            articles: ArticleRepository::new(Arc::clone(&store)),
            users: UserRepository::new(Arc::clone(&store)),
            store,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn article(schedule: PriceSchedule) -> Article {
        Article::new_for_insert(
            UserId::new_v4(),
            "Cortacésped".into(),
            Category::Jardineria,
            Condition::Used,
            schedule,
        )
    }

    fn daily(rate: f64) -> PriceSchedule {
        PriceSchedule {
            price_per_hour: None,
            price_per_day: Some(rate),
            price_per_week: None,
        }
    }

    async fn seed_renter(fx: &Fixture) -> UserProfile {
        let renter =
            UserProfile::new_for_insert("Marta".into(), "marta@example.com".into(), vec![]);
        fx.users.upsert(&renter).await.unwrap();
        renter
    }

    #[tokio::test]
    async fn test_create_appends_booking_and_links_purchase() {
        let fx = fixture();
        let renter = seed_renter(&fx).await;
        let a = article(daily(15.0));
        fx.articles.upsert(&a).await.unwrap();

        let booking = fx
            .bookings
            .create(a.category, &a.id, &renter.id, d(2024, 6, 10), d(2024, 6, 13))
            .await
            .unwrap();
        assert_eq!(booking.amount, 45.0);
        assert_eq!(booking.rating, 0);

        // both documents reference the booking
        let stored = fx
            .articles
            .get_by_id(a.category, &a.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.bookings.len(), 1);
        assert_eq!(stored.bookings[0].id, booking.id);

        let profile = fx.users.get_by_id(&renter.id).await.unwrap().unwrap();
        assert_eq!(profile.purchases, vec![booking.id]);
    }

    #[tokio::test]
    async fn test_overlap_is_rejected_and_nothing_is_written() {
        let fx = fixture();
        let renter = seed_renter(&fx).await;
        let a = article(daily(15.0));
        fx.articles.upsert(&a).await.unwrap();

        fx.bookings
            .create(a.category, &a.id, &renter.id, d(2024, 6, 10), d(2024, 6, 15))
            .await
            .unwrap();

        // one shared day (6/14-6/15) is a conflict
        let err = fx
            .bookings
            .create(a.category, &a.id, &renter.id, d(2024, 6, 14), d(2024, 6, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::BookingConflict));

        let stored = fx
            .articles
            .get_by_id(a.category, &a.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.bookings.len(), 1);
        let profile = fx.users.get_by_id(&renter.id).await.unwrap().unwrap();
        assert_eq!(profile.purchases.len(), 1);

        // the adjacent range right after the booking is fine
        fx.bookings
            .create(a.category, &a.id, &renter.id, d(2024, 6, 16), d(2024, 6, 20))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_existing_bookings_with_timestamp_dates_still_block() {
        let fx = fixture();
        let renter = seed_renter(&fx).await;
        let a = article(daily(15.0));
        fx.articles.upsert(&a).await.unwrap();

        // a booking written by another client, dates as epoch millis
        let mut fields = Fields::new();
        fields.insert(
            "bookings".into(),
            json!([{
                "id": contracts::domain::booking::BookingId::new_v4().as_string(),
                "userId": UserId::new_v4().as_string(),
                "dateFrom": 1_717_977_600_000i64, // 2024-06-10
                "dateTo": 1_718_409_600_000i64,   // 2024-06-15
                "rating": 0,
                "amount": 75.0,
            }]),
        );
        fx.store
            .write(WriteOp::Update {
                path: paths::article(a.category, &a.id),
                fields,
            })
            .await
            .unwrap();

        let err = fx
            .bookings
            .create(a.category, &a.id, &renter.id, d(2024, 6, 14), d(2024, 6, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::BookingConflict));
    }

    #[tokio::test]
    async fn test_malformed_entries_are_skipped_but_preserved() {
        let fx = fixture();
        let renter = seed_renter(&fx).await;
        let a = article(daily(10.0));
        fx.articles.upsert(&a).await.unwrap();

        let mut fields = Fields::new();
        fields.insert(
            "bookings".into(),
            json!(["garbage", { "dateFrom": { "seconds": 3 } }]),
        );
        fx.store
            .write(WriteOp::Update {
                path: paths::article(a.category, &a.id),
                fields,
            })
            .await
            .unwrap();

        fx.bookings
            .create(a.category, &a.id, &renter.id, d(2024, 6, 10), d(2024, 6, 12))
            .await
            .unwrap();

        let raw = fx
            .store
            .get(&paths::article(a.category, &a.id))
            .await
            .unwrap()
            .unwrap();
        let list = raw["bookings"].as_array().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], json!("garbage"));
    }

    #[tokio::test]
    async fn test_entries_with_good_dates_block_even_when_otherwise_malformed() {
        let fx = fixture();
        let renter = seed_renter(&fx).await;
        let a = article(daily(10.0));
        fx.articles.upsert(&a).await.unwrap();

        // a legacy entry: normalizable dates, everything else missing
        let mut fields = Fields::new();
        fields.insert(
            "bookings".into(),
            json!([{ "dateFrom": "2024-06-10", "dateTo": "2024-06-15" }]),
        );
        fx.store
            .write(WriteOp::Update {
                path: paths::article(a.category, &a.id),
                fields,
            })
            .await
            .unwrap();

        let err = fx
            .bookings
            .create(a.category, &a.id, &renter.id, d(2024, 6, 12), d(2024, 6, 13))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::BookingConflict));
    }

    #[tokio::test]
    async fn test_missing_article_aborts_cleanly() {
        let fx = fixture();
        let renter = seed_renter(&fx).await;
        let err = fx
            .bookings
            .create(
                Category::Cocina,
                &ArticleId::new_v4(),
                &renter.id,
                d(2024, 6, 10),
                d(2024, 6, 12),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::ArticleNotFound));

        let profile = fx.users.get_by_id(&renter.id).await.unwrap().unwrap();
        assert!(profile.purchases.is_empty());
    }

    #[tokio::test]
    async fn test_unpriceable_schedule_aborts_with_no_pricing() {
        let fx = fixture();
        let renter = seed_renter(&fx).await;
        let a = article(PriceSchedule::default());
        fx.articles.upsert(&a).await.unwrap();

        let err = fx
            .bookings
            .create(a.category, &a.id, &renter.id, d(2024, 6, 10), d(2024, 6, 12))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Pricing(pricing::PricingError::NoPricingAvailable)
        ));

        let stored = fx
            .articles
            .get_by_id(a.category, &a.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.bookings.is_empty());
        let profile = fx.users.get_by_id(&renter.id).await.unwrap().unwrap();
        assert!(profile.purchases.is_empty());
    }

    #[tokio::test]
    async fn test_amount_follows_the_schedule_read_in_the_transaction() {
        let fx = fixture();
        let renter = seed_renter(&fx).await;
        let mut a = article(daily(10.0));
        fx.articles.upsert(&a).await.unwrap();

        let first = fx
            .bookings
            .create(a.category, &a.id, &renter.id, d(2024, 6, 1), d(2024, 6, 3))
            .await
            .unwrap();
        assert_eq!(first.amount, 20.0);

        // owner edits the price between bookings
        a.schedule.price_per_day = Some(25.0);
        fx.articles.upsert(&a).await.unwrap();

        let second = fx
            .bookings
            .create(a.category, &a.id, &renter.id, d(2024, 7, 1), d(2024, 7, 3))
            .await
            .unwrap();
        assert_eq!(second.amount, 50.0);
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_creates_have_one_winner() {
        let fx = fixture();
        let renter_a = seed_renter(&fx).await;
        let renter_b =
            UserProfile::new_for_insert("Berta".into(), "berta@example.com".into(), vec![]);
        fx.users.upsert(&renter_b).await.unwrap();

        let a = article(daily(15.0));
        fx.articles.upsert(&a).await.unwrap();

        let first = fx.bookings.create(
            a.category,
            &a.id,
            &renter_a.id,
            d(2024, 6, 10),
            d(2024, 6, 15),
        );
        let second = fx.bookings.create(
            a.category,
            &a.id,
            &renter_b.id,
            d(2024, 6, 12),
            d(2024, 6, 18),
        );
        let (r1, r2) = tokio::join!(first, second);

        let winners = [r1.is_ok(), r2.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(winners, 1);
        let loser = if r1.is_ok() { r2 } else { r1 };
        assert!(matches!(loser.unwrap_err(), BookingError::BookingConflict));

        let stored = fx
            .articles
            .get_by_id(a.category, &a.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.bookings.len(), 1);
    }
}
