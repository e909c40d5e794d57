use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::AppContext;
use contracts::domain::article::{Article, ArticleDto, ArticleId};
use contracts::domain::common::AggregateId;
use contracts::enums::Category;

fn parse_category(raw: &str) -> Result<Category, StatusCode> {
    Category::from_input(raw).ok_or(StatusCode::BAD_REQUEST)
}

fn parse_article_id(raw: &str) -> Result<ArticleId, StatusCode> {
    ArticleId::from_string(raw).map_err(|_| StatusCode::BAD_REQUEST)
}

/// GET /api/articles/:category
pub async fn list_by_category(
    State(ctx): State<Arc<AppContext>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Article>>, StatusCode> {
    let category = parse_category(&category)?;
    match ctx.articles.list_by_category(category).await {
        Ok(v) => Ok(Json(v)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /api/articles/:category/:id
pub async fn get_by_id(
    State(ctx): State<Arc<AppContext>>,
    Path((category, id)): Path<(String, String)>,
) -> Result<Json<Article>, StatusCode> {
    let category = parse_category(&category)?;
    let id = parse_article_id(&id)?;
    match ctx.articles.get_by_id(category, &id).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/articles
pub async fn upsert(
    State(ctx): State<Arc<AppContext>>,
    Json(dto): Json<ArticleDto>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let result = if dto.id.is_some() {
        ctx.articles
            .update(dto)
            .await
            .map(|_| uuid::Uuid::nil().to_string())
    } else {
        ctx.articles.create(dto).await.map(|id| id.as_string())
    };
    match result {
        Ok(id) => Ok(Json(json!({ "id": id }))),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// DELETE /api/articles/:category/:id
pub async fn delete(
    State(ctx): State<Arc<AppContext>>,
    Path((category, id)): Path<(String, String)>,
) -> Result<(), StatusCode> {
    let category = parse_category(&category)?;
    let id = parse_article_id(&id)?;
    match ctx.articles.delete(category, &id).await {
        Ok(()) => Ok(()),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[derive(Debug, Deserialize)]
pub struct ByIdsRequest {
    pub ids: Vec<String>,
}

/// POST /api/articles/by-ids
pub async fn by_ids(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<ByIdsRequest>,
) -> Result<Json<Vec<Article>>, StatusCode> {
    let mut ids = Vec::with_capacity(req.ids.len());
    for raw in &req.ids {
        ids.push(parse_article_id(raw)?);
    }
    match ctx.articles.get_by_ids(&ids).await {
        Ok(v) => Ok(Json(v)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
