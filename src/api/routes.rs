/*
 * Responsibility
 * - URL 構造を定義
 * - /health (guard なし), /movies, /actors
 * - operation ごとの要求 permission を route_layer で宣言する
 */
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::api::handlers::{
    actors::{create_actor, delete_actor, list_actors, update_actor},
    health::health,
    movies::{create_movie, delete_movie, list_movies, update_movie},
};
use crate::middleware::auth::guard;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let gate = &state.gate;
    let p = &state.permissions;

    Router::new()
        .route("/health", get(health))
        .route(
            "/movies",
            guard(get(list_movies), gate, &p.view_movies)
                .merge(guard(post(create_movie), gate, &p.add_movie)),
        )
        .route(
            "/movies/{id}",
            guard(patch(update_movie), gate, &p.edit_movie)
                .merge(guard(delete(delete_movie), gate, &p.delete_movie)),
        )
        .route(
            "/actors",
            guard(get(list_actors), gate, &p.view_actors)
                .merge(guard(post(create_actor), gate, &p.add_actor)),
        )
        .route(
            "/actors/{id}",
            guard(patch(update_actor), gate, &p.edit_actor)
                .merge(guard(delete(delete_actor), gate, &p.delete_actor)),
        )
}
