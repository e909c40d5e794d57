use super::repository::UserRepository;
use crate::domain::article::ArticleRepository;
use crate::store::DocumentStore;
use contracts::domain::article::{Article, ArticleId};
use contracts::domain::common::AggregateId;
use contracts::domain::user::{UserDto, UserId, UserProfile};
use std::sync::Arc;

pub struct UserService<S: DocumentStore> {
    repo: UserRepository<S>,
    articles: ArticleRepository<S>,
}

impl<S: DocumentStore> UserService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            repo: UserRepository::new(Arc::clone(&store)),
            articles: ArticleRepository::new(store),
        }
    }

    pub async fn create(&self, dto: UserDto) -> anyhow::Result<UserId> {
        let profile = UserProfile::new_for_insert(dto.name, dto.email, dto.preferences);
        profile
            .validate()
            .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
        self.repo.upsert(&profile).await?;
        Ok(profile.id)
    }

    pub async fn update(&self, dto: UserDto) -> anyhow::Result<()> {
        let id = dto
            .id
            .as_ref()
            .and_then(|s| UserId::from_string(s).ok())
            .ok_or_else(|| anyhow::anyhow!("Invalid ID"))?;

        let mut profile = self
            .repo
            .get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Not found"))?;

        profile.name = dto.name;
        profile.email = dto.email;
        profile.preferences = dto.preferences;
        profile.new_user = false;

        profile
            .validate()
            .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

        self.repo.upsert(&profile).await
    }

    pub async fn get_by_id(&self, id: &UserId) -> anyhow::Result<Option<UserProfile>> {
        self.repo.get_by_id(id).await
    }

    /// Flip the favorite state of an article for this user and return
    /// the new state (true = now a favorite).
    pub async fn toggle_favorite(
        &self,
        user_id: &UserId,
        article_id: &ArticleId,
    ) -> anyhow::Result<bool> {
        let user = self
            .repo
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Not found"))?;
        let activate = !user.is_favorite(article_id);
        self.repo.set_favorite(user_id, article_id, activate).await?;
        Ok(activate)
    }

    /// The user's favorited articles, resolved across category partitions
    pub async fn favorites(&self, user_id: &UserId) -> anyhow::Result<Vec<Article>> {
        let user = match self.repo.get_by_id(user_id).await? {
            Some(user) => user,
            None => return Ok(Vec::new()),
        };
        if user.favorites.is_empty() {
            return Ok(Vec::new());
        }
        self.articles.get_by_ids(&user.favorites).await
    }
}
