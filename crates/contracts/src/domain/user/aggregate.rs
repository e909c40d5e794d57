use crate::domain::article::aggregate::ArticleId;
use crate::domain::booking::aggregate::BookingId;
use crate::domain::common::AggregateId;
use crate::enums::Category;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User id type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for UserId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(UserId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// A marketplace user. `purchases` is a secondary index over booking
/// ids, maintained in the same transaction that creates a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,

    pub name: String,

    pub email: String,

    /// Preferred categories, drives home-screen ordering
    #[serde(default)]
    pub preferences: Vec<Category>,

    /// Favorited article ids
    #[serde(default)]
    pub favorites: Vec<ArticleId>,

    /// Articles published by this user
    #[serde(default)]
    pub articles: Vec<ArticleId>,

    /// Booking ids created by this user, set semantics
    #[serde(default)]
    pub purchases: Vec<BookingId>,

    #[serde(rename = "newUser", default)]
    pub new_user: bool,
}

impl UserProfile {
    pub fn new_for_insert(name: String, email: String, preferences: Vec<Category>) -> Self {
        Self {
            id: UserId::new_v4(),
            name,
            email,
            preferences,
            favorites: Vec::new(),
            articles: Vec::new(),
            purchases: Vec::new(),
            new_user: true,
        }
    }

    pub fn is_favorite(&self, article_id: &ArticleId) -> bool {
        self.favorites.contains(article_id)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name must not be empty".into());
        }
        if !self.email.contains('@') {
            return Err("Email address is not valid".into());
        }
        Ok(())
    }
}

// =============================================================================
// DTO
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub preferences: Vec<Category>,
}
