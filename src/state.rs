/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db: PgPool, gate: AuthorizationGate, permissions: operation ごとの要求 permission
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::config::OperationPermissions;
use crate::services::auth::AuthorizationGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub gate: Arc<AuthorizationGate>,
    pub permissions: Arc<OperationPermissions>,
}

impl AppState {
    pub fn new(
        db: sqlx::PgPool,
        gate: Arc<AuthorizationGate>,
        permissions: OperationPermissions,
    ) -> Self {
        Self {
            db,
            gate,
            permissions: Arc::new(permissions),
        }
    }
}
