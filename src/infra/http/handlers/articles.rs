use axum::Json;
use axum::extract::{Path, Query, State, rejection::QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use pressroom_api_types::{
    ArticleListQuery, ArticlePage, ArticleView, BatchDeleteRequest, BatchDeleteResponse,
    CreateArticleRequest, LikeCountResponse,
};

use crate::application::{
    articles::CreateArticleCommand, error::AppError, pagination::PaginationState,
};
use crate::infra::http::{error::ApiError, state::HttpState};

pub async fn list_articles(
    State(state): State<HttpState>,
) -> Result<Json<Vec<ArticleView>>, ApiError> {
    let articles = state.articles.list_all().await?;
    Ok(Json(articles))
}

pub async fn list_articles_page(
    State(state): State<HttpState>,
    query: Result<Query<ArticleListQuery>, QueryRejection>,
) -> Result<Json<ArticlePage>, ApiError> {
    let Query(query) =
        query.map_err(|err| ApiError::bad_request("invalid query", Some(err.body_text())))?;

    let page = PaginationState::resolve(
        query.page,
        query.page_size,
        query.order.as_deref(),
        state.page_limits,
    )
    .map_err(AppError::from)?;

    let listing = state
        .articles
        .list_paginated(&page, query.keyword.as_deref())
        .await?;
    Ok(Json(listing))
}

pub async fn get_article(
    State(state): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleView>, ApiError> {
    let article = state.articles.get_by_id(id).await?;
    Ok(Json(article))
}

pub async fn create_article(
    State(state): State<HttpState>,
    Json(payload): Json<CreateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let article = state
        .articles
        .create(CreateArticleCommand {
            title: payload.title,
            content: payload.content,
            preview: payload.preview,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn batch_delete_articles(
    State(state): State<HttpState>,
    Json(payload): Json<BatchDeleteRequest>,
) -> Result<Json<BatchDeleteResponse>, ApiError> {
    let mode = payload.mode();
    let deleted = state.articles.batch_delete(&payload.ids, mode).await?;
    Ok(Json(BatchDeleteResponse { deleted, mode }))
}

pub async fn like_article(
    State(state): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<Json<LikeCountResponse>, ApiError> {
    let likes = state.likes.like(id).await?;
    Ok(Json(LikeCountResponse {
        article_id: id,
        likes,
    }))
}

pub async fn article_likes(
    State(state): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<Json<LikeCountResponse>, ApiError> {
    let likes = state.likes.likes(id).await?;
    Ok(Json(LikeCountResponse {
        article_id: id,
        likes,
    }))
}
