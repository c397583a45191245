/*
 * Responsibility
 * - /actors 系 CRUD handler (movies と同じ status 規約)
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
        dto::actors::{
            ActorEnvelope, ActorResponse, ActorsResponse, CreateActorRequest, UpdateActorRequest,
        },
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    repos::actor_repo,
    state::AppState,
};

pub async fn list_actors(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
) -> Result<Json<ActorsResponse>, AppError> {
    let rows = actor_repo::list(&state.db).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound);
    }

    Ok(Json(ActorsResponse {
        success: true,
        actors: rows.into_iter().map(ActorResponse::from).collect(),
    }))
}

pub async fn create_actor(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    payload: Result<Json<CreateActorRequest>, JsonRejection>,
) -> Result<Json<ActorEnvelope>, AppError> {
    let Json(req) = payload.map_err(|_| AppError::Unprocessable("invalid json"))?;
    let actor = req.validate().map_err(AppError::Unprocessable)?;

    let row = actor_repo::create(&state.db, &actor.name, actor.age, &actor.gender).await?;
    tracing::info!(subject = ctx.subject(), actor_id = row.id, "actor created");

    Ok(Json(ActorEnvelope {
        success: true,
        actor: vec![row.into()],
    }))
}

pub async fn update_actor(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateActorRequest>, JsonRejection>,
) -> Result<Json<ActorEnvelope>, AppError> {
    let Path(id) = id.map_err(|_| AppError::NotFound)?;
    let Json(req) = payload.map_err(|_| AppError::BadRequest("invalid json"))?;
    let changes = req.validate().map_err(AppError::BadRequest)?;

    let row = actor_repo::update(
        &state.db,
        id,
        changes.name.as_deref(),
        changes.age,
        changes.gender.as_deref(),
    )
    .await?
    .ok_or(AppError::NotFound)?;
    tracing::info!(subject = ctx.subject(), actor_id = id, "actor updated");

    Ok(Json(ActorEnvelope {
        success: true,
        actor: vec![row.into()],
    }))
}

pub async fn delete_actor(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id.map_err(|_| AppError::NotFound)?;

    if !actor_repo::delete(&state.db, id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(subject = ctx.subject(), actor_id = id, "actor deleted");

    Ok(Json(json!({ "success": true, "deleted": id })))
}
