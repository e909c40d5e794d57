use crate::store::{paths, DocumentStore, WriteOp};
use contracts::domain::article::ArticleId;
use contracts::domain::common::AggregateId;
use contracts::domain::user::{UserId, UserProfile};
use serde_json::Value;
use std::sync::Arc;

pub struct UserRepository<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> UserRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn get_by_id(&self, id: &UserId) -> anyhow::Result<Option<UserProfile>> {
        match self.store.get(&paths::user(id)).await? {
            Some(fields) => {
                let profile = serde_json::from_value(Value::Object(fields))
                    .map_err(|e| anyhow::anyhow!("malformed user document {}: {}", id.as_string(), e))?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    /// Merge write of the profile fields. The link arrays (`purchases`,
    /// `favorites`, `articles`) are maintained exclusively through
    /// union/remove writes and are never replaced from a snapshot.
    pub async fn upsert(&self, user: &UserProfile) -> anyhow::Result<()> {
        let mut fields = match serde_json::to_value(user)? {
            Value::Object(fields) => fields,
            _ => anyhow::bail!("user did not serialize to an object"),
        };
        for owned in ["purchases", "favorites", "articles"] {
            fields.remove(owned);
        }
        self.store
            .write(WriteOp::SetMerge {
                path: paths::user(&user.id),
                fields,
            })
            .await?;
        Ok(())
    }

    pub async fn set_favorite(
        &self,
        user_id: &UserId,
        article_id: &ArticleId,
        active: bool,
    ) -> anyhow::Result<()> {
        let path = paths::user(user_id);
        let values = vec![Value::String(article_id.as_string())];
        let op = if active {
            WriteOp::ArrayUnion {
                path,
                field: "favorites".into(),
                values,
            }
        } else {
            WriteOp::ArrayRemove {
                path,
                field: "favorites".into(),
                values,
            }
        };
        self.store.write(op).await?;
        Ok(())
    }

    /// Link a published article to its owner
    pub async fn add_article(&self, user_id: &UserId, article_id: &ArticleId) -> anyhow::Result<()> {
        self.store
            .write(WriteOp::ArrayUnion {
                path: paths::user(user_id),
                field: "articles".into(),
                values: vec![Value::String(article_id.as_string())],
            })
            .await?;
        Ok(())
    }
}
