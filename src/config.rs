/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、Auth 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 各 operation が要求する permission もここで外部から受け取る
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::services::auth::{Permission, verifier::is_asymmetric};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Permission required by each protected operation.
#[derive(Debug, Clone)]
pub struct OperationPermissions {
    pub view_movies: Permission,
    pub add_movie: Permission,
    pub edit_movie: Permission,
    pub delete_movie: Permission,
    pub view_actors: Permission,
    pub add_actor: Permission,
    pub edit_actor: Permission,
    pub delete_actor: Permission,
}

impl Default for OperationPermissions {
    fn default() -> Self {
        Self {
            view_movies: "view:movies".into(),
            add_movie: "add:movie".into(),
            edit_movie: "edit:movie".into(),
            delete_movie: "delete:movie".into(),
            view_actors: "view:actors".into(),
            add_actor: "add:actor".into(),
            edit_actor: "edit:actor".into(),
            delete_actor: "delete:actor".into(),
        }
    }
}

impl OperationPermissions {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |key: &str, default: Permission| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(Permission::new)
                .unwrap_or(default)
        };

        Self {
            view_movies: read("PERMISSION_VIEW_MOVIES", defaults.view_movies),
            add_movie: read("PERMISSION_ADD_MOVIE", defaults.add_movie),
            edit_movie: read("PERMISSION_EDIT_MOVIE", defaults.edit_movie),
            delete_movie: read("PERMISSION_DELETE_MOVIE", defaults.delete_movie),
            view_actors: read("PERMISSION_VIEW_ACTORS", defaults.view_actors),
            add_actor: read("PERMISSION_ADD_ACTOR", defaults.add_actor),
            edit_actor: read("PERMISSION_EDIT_ACTOR", defaults.edit_actor),
            delete_actor: read("PERMISSION_DELETE_ACTOR", defaults.delete_actor),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    // Only asymmetric algorithms are accepted.
    pub algorithm: Algorithm,
    pub jwks_url: Url,
    // None: fetch once for the process lifetime
    pub jwks_ttl: Option<Duration>,
    pub jwks_timeout: Duration,
    pub jwks_refresh_cooldown: Duration,
    pub refresh_on_unknown_key: bool,
    pub leeway_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth: AuthConfig,
    pub permissions: OperationPermissions,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            auth: AuthConfig::from_env()?,
            permissions: OperationPermissions::from_env(),
        })
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let issuer =
            std::env::var("AUTH_ISSUER").map_err(|_| ConfigError::Missing("AUTH_ISSUER"))?;

        let audience =
            std::env::var("AUTH_AUDIENCE").map_err(|_| ConfigError::Missing("AUTH_AUDIENCE"))?;

        let algorithm = parse_algorithm(
            &std::env::var("AUTH_ALGORITHM").unwrap_or_else(|_| "RS256".to_string()),
        )?;

        // Default: the issuer's well-known JWKS document.
        let jwks_url = match std::env::var("AUTH_JWKS_URL") {
            Ok(url) => Url::parse(&url).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URL"))?,
            Err(_) => default_jwks_url(&issuer)?,
        };

        let jwks_ttl = match env_u64("AUTH_JWKS_TTL_SECONDS", 600) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let jwks_timeout = Duration::from_secs(env_u64("AUTH_JWKS_TIMEOUT_SECONDS", 5).max(1));
        let jwks_refresh_cooldown =
            Duration::from_secs(env_u64("AUTH_JWKS_REFRESH_COOLDOWN_SECONDS", 30));

        let refresh_on_unknown_key = std::env::var("AUTH_REFRESH_ON_UNKNOWN_KEY")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off"))
            .unwrap_or(true);

        let leeway_seconds = env_u64("ACCESS_TOKEN_LEEWAY_SECONDS", 0);

        Ok(Self {
            issuer,
            audience,
            algorithm,
            jwks_url,
            jwks_ttl,
            jwks_timeout,
            jwks_refresh_cooldown,
            refresh_on_unknown_key,
            leeway_seconds,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    let algorithm =
        Algorithm::from_str(value.trim()).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHM"))?;
    if !is_asymmetric(algorithm) {
        return Err(ConfigError::Invalid("AUTH_ALGORITHM"));
    }
    Ok(algorithm)
}

fn default_jwks_url(issuer: &str) -> Result<Url, ConfigError> {
    let mut base = Url::parse(issuer).map_err(|_| ConfigError::Invalid("AUTH_ISSUER"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(".well-known/jwks.json")
        .map_err(|_| ConfigError::Invalid("AUTH_ISSUER"))
}
