/*
 * Responsibility
 * - /movies 系 CRUD handler
 * - permission の検証は route_layer 側で済んでいる。handler は AuthCtx を受け取るだけ
 * - 不正 body: 作成は 422, 更新は 400 / 存在しない id は 404
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde_json::{Value, json};

use crate::{
    api::{
        dto::movies::{
            CreateMovieRequest, MovieEnvelope, MovieResponse, MoviesResponse, UpdateMovieRequest,
        },
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    repos::movie_repo,
    state::AppState,
};

pub async fn list_movies(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
) -> Result<Json<MoviesResponse>, AppError> {
    let rows = movie_repo::list(&state.db).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound);
    }

    Ok(Json(MoviesResponse {
        success: true,
        movies: rows.into_iter().map(MovieResponse::from).collect(),
    }))
}

pub async fn create_movie(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    payload: Result<Json<CreateMovieRequest>, JsonRejection>,
) -> Result<Json<MovieEnvelope>, AppError> {
    let Json(req) = payload.map_err(|e| {
        tracing::debug!(error = %e, "create movie: unreadable body");
        AppError::Unprocessable("invalid json")
    })?;
    let movie = req.validate().map_err(AppError::Unprocessable)?;

    let row = movie_repo::create(&state.db, &movie.title, movie.release_date).await?;
    tracing::info!(subject = ctx.subject(), movie_id = row.id, "movie created");

    Ok(Json(MovieEnvelope {
        success: true,
        movie: vec![row.into()],
    }))
}

pub async fn update_movie(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateMovieRequest>, JsonRejection>,
) -> Result<Json<MovieEnvelope>, AppError> {
    let Path(id) = id.map_err(|_| AppError::NotFound)?;
    let Json(req) = payload.map_err(|_| AppError::BadRequest("invalid json"))?;
    let changes = req.validate().map_err(AppError::BadRequest)?;

    let row = movie_repo::update(
        &state.db,
        id,
        changes.title.as_deref(),
        changes.release_date,
    )
    .await?
    .ok_or(AppError::NotFound)?;
    tracing::info!(subject = ctx.subject(), movie_id = id, "movie updated");

    Ok(Json(MovieEnvelope {
        success: true,
        movie: vec![row.into()],
    }))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id.map_err(|_| AppError::NotFound)?;

    if !movie_repo::delete(&state.db, id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(subject = ctx.subject(), movie_id = id, "movie deleted");

    Ok(Json(json!({ "success": true, "deleted": id })))
}
