//! Bearer token 検証 → permission 認可 → AuthCtx を extensions に入れる
//!
//! route ごとに要求 permission が異なるため、Router 全体ではなく
//! `MethodRouter::route_layer` で operation 単位に掛ける。
//!
//! ```ignore
//! let list = guard(get(list_movies), &state.gate, &state.permissions.view_movies);
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{AuthorizationGate, Permission};

#[derive(Clone)]
struct PermissionGuard {
    gate: Arc<AuthorizationGate>,
    permission: Permission,
}

/// `route` を `permission` で保護する。
/// メソッドが一致しない場合 route_layer は実行されないため 405 は認証より先に返る。
pub fn guard<S>(
    route: MethodRouter<S>,
    gate: &Arc<AuthorizationGate>,
    permission: &Permission,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let guard = PermissionGuard {
        gate: Arc::clone(gate),
        permission: permission.clone(),
    };
    route.route_layer(middleware::from_fn_with_state(guard, permission_middleware))
}

async fn permission_middleware(
    State(guard): State<PermissionGuard>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = match guard.gate.authorize(&guard.permission, req.headers()).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                code = err.code(),
                stage = if err.is_authorization_failure() { "authorize" } else { "verify" },
                status = err.status().as_u16(),
                permission = %guard.permission,
                method = %req.method(),
                path = %req.uri().path(),
                "request rejected"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(
        subject = claims.subject(),
        issuer = claims.issuer(),
        expires_at = %claims.expires_at(),
        client = ?claims.extra("azp"),
        permission = %guard.permission,
        "authorized"
    );
    req.extensions_mut().insert(AuthCtx::new(claims));

    Ok(next.run(req).await)
}
