//! Article API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::{ArticleFilter, CreateArticleInput, UpdateArticleInput};
use crate::error::Result;
use crate::middleware::auth::{AuthUser, OptionalAuth};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
/// List articles visible to the caller
pub async fn list(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Query(pagination): Query<PaginationQuery>,
    Query(filter): Query<ArticleFilter>,
) -> Result<impl IntoResponse> {
    let (articles, total) = state
        .article_service
        .list(auth.as_ref(), &filter, pagination.offset(), pagination.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        articles,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get article by ID
pub async fn get(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let article = state.article_service.get(auth.as_ref(), &id).await?;
    Ok(Json(SuccessResponse::new(article)))
}

/// Create article
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateArticleInput>,
) -> Result<impl IntoResponse> {
    let article = state.article_service.create(Some(&auth), input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(article))))
}

/// Update article
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateArticleInput>,
) -> Result<impl IntoResponse> {
    let article = state
        .article_service
        .update(Some(&auth), &id, input)
        .await?;
    Ok(Json(SuccessResponse::new(article)))
}

/// Delete article
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.article_service.delete(Some(&auth), &id).await?;
    Ok(Json(MessageResponse::new("Article deleted")))
}
