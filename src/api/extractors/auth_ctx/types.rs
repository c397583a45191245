/*
 * Responsibility
 * - Handler から見える「認可済みコンテキスト」の型
 * - middleware が検証・認可して request extensions に格納し、handler はこの型だけを受け取る
 */
use crate::services::auth::TokenClaims;

/// 認可済みのリクエストに付与されるコンテキスト
///
/// `claims` は署名・exp・iss・aud 検証と permission チェックを通過したもの。
#[derive(Debug, Clone)]
pub struct AuthCtx {
    claims: TokenClaims,
}

impl AuthCtx {
    pub fn new(claims: TokenClaims) -> Self {
        Self { claims }
    }

    pub fn subject(&self) -> &str {
        self.claims.subject()
    }
}
