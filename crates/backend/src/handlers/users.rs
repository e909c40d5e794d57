use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::AppContext;
use contracts::domain::article::{Article, ArticleId};
use contracts::domain::booking::PurchasedItem;
use contracts::domain::common::AggregateId;
use contracts::domain::user::{UserDto, UserId, UserProfile};

fn parse_user_id(raw: &str) -> Result<UserId, StatusCode> {
    UserId::from_string(raw).map_err(|_| StatusCode::BAD_REQUEST)
}

/// GET /api/users/:id
pub async fn get_by_id(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, StatusCode> {
    let id = parse_user_id(&id)?;
    match ctx.users.get_by_id(&id).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/users
pub async fn upsert(
    State(ctx): State<Arc<AppContext>>,
    Json(dto): Json<UserDto>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let result = if dto.id.is_some() {
        ctx.users
            .update(dto)
            .await
            .map(|_| uuid::Uuid::nil().to_string())
    } else {
        ctx.users.create(dto).await.map(|id| id.as_string())
    };
    match result {
        Ok(id) => Ok(Json(json!({ "id": id }))),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/users/:id/favorites/:article_id/toggle
pub async fn toggle_favorite(
    State(ctx): State<Arc<AppContext>>,
    Path((id, article_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let id = parse_user_id(&id)?;
    let article_id = ArticleId::from_string(&article_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match ctx.users.toggle_favorite(&id, &article_id).await {
        Ok(active) => Ok(Json(json!({ "favorite": active }))),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /api/users/:id/favorites
pub async fn favorites(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Article>>, StatusCode> {
    let id = parse_user_id(&id)?;
    match ctx.users.favorites(&id).await {
        Ok(v) => Ok(Json(v)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /api/users/:id/purchases
pub async fn purchases(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PurchasedItem>>, StatusCode> {
    let id = parse_user_id(&id)?;
    match ctx.bookings.purchases(&id).await {
        Ok(v) => Ok(Json(v)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
