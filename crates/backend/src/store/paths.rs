//! Typed paths into the document tree.
//!
//! Layout: `articles/{category}/items/{articleId}` for listings,
//! partitioned by category, and a flat `users/{userId}` collection.

use contracts::domain::article::ArticleId;
use contracts::domain::common::AggregateId;
use contracts::domain::user::UserId;
use contracts::enums::Category;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Item collection of one category partition
pub fn articles(category: Category) -> CollectionPath {
    CollectionPath(format!("articles/{}/items", category.doc_id()))
}

/// One article document
pub fn article(category: Category, id: &ArticleId) -> DocumentPath {
    articles(category).doc(&id.as_string())
}

/// The user collection
pub fn users() -> CollectionPath {
    CollectionPath("users".to_string())
}

/// One user document
pub fn user(id: &UserId) -> DocumentPath {
    users().doc(&id.as_string())
}
