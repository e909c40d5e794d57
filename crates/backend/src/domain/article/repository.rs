use crate::store::{paths, DocumentStore, Fields, WriteOp};
use contracts::domain::article::{Article, ArticleId};
use contracts::domain::common::AggregateId;
use contracts::enums::Category;
use serde_json::Value;
use std::sync::Arc;

pub struct ArticleRepository<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> ArticleRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Documents that do not decode are skipped, not fatal: one bad
    /// listing must not hide a whole category.
    fn decode(id: &str, fields: Fields) -> Option<Article> {
        match serde_json::from_value(Value::Object(fields)) {
            Ok(article) => Some(article),
            Err(e) => {
                tracing::warn!(id, error = %e, "skipping malformed article document");
                None
            }
        }
    }

    pub async fn list_by_category(&self, category: Category) -> anyhow::Result<Vec<Article>> {
        let docs = self.store.list(&paths::articles(category)).await?;
        Ok(docs
            .into_iter()
            .filter_map(|(id, fields)| Self::decode(&id, fields))
            .collect())
    }

    pub async fn get_by_id(
        &self,
        category: Category,
        id: &ArticleId,
    ) -> anyhow::Result<Option<Article>> {
        let fields = self.store.get(&paths::article(category, id)).await?;
        Ok(fields.and_then(|f| Self::decode(&id.as_string(), f)))
    }

    /// Merge write of the listing fields. The `bookings` list is owned
    /// by the booking transaction and is never rewritten from a
    /// possibly-stale snapshot here.
    pub async fn upsert(&self, article: &Article) -> anyhow::Result<()> {
        let mut fields = match serde_json::to_value(article)? {
            Value::Object(fields) => fields,
            _ => anyhow::bail!("article did not serialize to an object"),
        };
        fields.remove("bookings");
        self.store
            .write(WriteOp::SetMerge {
                path: paths::article(article.category, &article.id),
                fields,
            })
            .await?;
        Ok(())
    }

    pub async fn delete(&self, category: Category, id: &ArticleId) -> anyhow::Result<()> {
        self.store.delete(&paths::article(category, id)).await?;
        Ok(())
    }

    /// Resolve ids whose category is unknown by probing every category
    /// partition; first hit wins. Missing ids are silently dropped.
    pub async fn get_by_ids(&self, ids: &[ArticleId]) -> anyhow::Result<Vec<Article>> {
        let mut found = Vec::new();
        for id in ids {
            for category in Category::all() {
                if let Some(article) = self.get_by_id(category, id).await? {
                    found.push(article);
                    break;
                }
            }
        }
        Ok(found)
    }
}
