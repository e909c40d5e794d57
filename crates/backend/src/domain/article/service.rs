use super::repository::ArticleRepository;
use crate::domain::user::UserRepository;
use crate::store::DocumentStore;
use contracts::domain::article::{Article, ArticleDto, ArticleId};
use contracts::domain::common::AggregateId;
use contracts::domain::user::UserId;
use contracts::enums::Category;
use std::sync::Arc;

pub struct ArticleService<S: DocumentStore> {
    repo: ArticleRepository<S>,
    users: UserRepository<S>,
}

impl<S: DocumentStore> ArticleService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            repo: ArticleRepository::new(Arc::clone(&store)),
            users: UserRepository::new(store),
        }
    }

    pub async fn create(&self, dto: ArticleDto) -> anyhow::Result<ArticleId> {
        let owner = UserId::from_string(&dto.owner_id).map_err(|e| anyhow::anyhow!(e))?;

        let mut article = Article::new_for_insert(
            owner,
            dto.name.trim().to_string(),
            dto.category,
            dto.condition,
            dto.schedule.clone(),
        );
        article.images = dto.images.clone();
        article.latitude = dto.latitude;
        article.longitude = dto.longitude;
        article.brand = dto.brand.clone();

        article
            .validate()
            .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

        self.repo.upsert(&article).await?;
        // link the listing to its owner
        self.users.add_article(&owner, &article.id).await?;

        Ok(article.id)
    }

    pub async fn update(&self, dto: ArticleDto) -> anyhow::Result<()> {
        let id = dto
            .id
            .as_ref()
            .and_then(|s| ArticleId::from_string(s).ok())
            .ok_or_else(|| anyhow::anyhow!("Invalid ID"))?;

        let mut article = self
            .repo
            .get_by_id(dto.category, &id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Not found"))?;

        article.update(&dto);

        article
            .validate()
            .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

        self.repo.upsert(&article).await
    }

    pub async fn delete(&self, category: Category, id: &ArticleId) -> anyhow::Result<()> {
        self.repo.delete(category, id).await
    }

    pub async fn get_by_id(
        &self,
        category: Category,
        id: &ArticleId,
    ) -> anyhow::Result<Option<Article>> {
        self.repo.get_by_id(category, id).await
    }

    pub async fn list_by_category(&self, category: Category) -> anyhow::Result<Vec<Article>> {
        self.repo.list_by_category(category).await
    }

    pub async fn get_by_ids(&self, ids: &[ArticleId]) -> anyhow::Result<Vec<Article>> {
        self.repo.get_by_ids(ids).await
    }
}
