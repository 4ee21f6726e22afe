//! Saved article (bookmark) API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SaveArticleRequest {
    #[validate(length(min = 1, max = 128))]
    pub article_id: String,
}

/// List the caller's bookmarks (all rows for admins)
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let (saved, total) = state
        .saved_article_service
        .list(Some(&auth), pagination.offset(), pagination.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        saved,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get a bookmark by compound ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let saved = state.saved_article_service.get(Some(&auth), &id).await?;
    Ok(Json(SuccessResponse::new(saved)))
}

/// Bookmark an article for the caller
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SaveArticleRequest>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    let saved = state
        .saved_article_service
        .save(&auth, &input.article_id)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(saved))))
}

/// Remove a bookmark
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.saved_article_service.delete(Some(&auth), &id).await?;
    Ok(Json(MessageResponse::new("Saved article removed")))
}
