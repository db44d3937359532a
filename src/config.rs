use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub seed_path: Option<PathBuf>,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub from_email: String,
    pub jwt: JwtConfig,
}

fn is_serverless_env() -> bool {
    ["VERCEL", "VERCEL_URL", "AWS_LAMBDA_FUNCTION_NAME"]
        .iter()
        .any(|key| std::env::var_os(key).is_some())
}

/// Where the user document lives. Env override first; serverless platforms
/// only allow writes under /tmp, so the bundled document acts as a seed there.
fn resolve_data_paths() -> (PathBuf, Option<PathBuf>) {
    if let Ok(path) = std::env::var("STAFFDESK_DB_PATH") {
        return (PathBuf::from(path), None);
    }
    let bundled = PathBuf::from("data/users.json");
    if is_serverless_env() {
        return (PathBuf::from("/tmp/users.json"), Some(bundled));
    }
    (bundled, None)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let (data_path, seed_path) = resolve_data_paths();
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "staffdesk".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "staffdesk-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        Ok(Self {
            data_path,
            seed_path,
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static/img/uploads")),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            from_email: std::env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "no-reply@staffdesk.local".into()),
            jwt,
        })
    }
}
