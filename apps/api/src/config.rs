use anyhow::{bail, Context, Result};

pub const DEFAULT_BUCKET: &str = "neostudio-conversations";
pub const DEFAULT_NEO_RPC_URL: &str = "https://testnet1.neo.org:20332";

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:80",
    "http://127.0.0.1:80",
    "http://frontend:80",
    "http://frontend",
];

/// Which object backend the conversation store runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    S3,
    Memory,
    None,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::S3 => "s3",
            StorageKind::Memory => "memory",
            StorageKind::None => "none",
        }
    }

    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(StorageKind::S3),
            "memory" => Ok(StorageKind::Memory),
            "none" | "disabled" => Ok(StorageKind::None),
            other => bail!("STORAGE_BACKEND must be one of s3, memory, none (got '{other}')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub storage_backend: StorageKind,
    pub s3_bucket: String,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub neo_rpc_url: String,
    /// `Some("")` is kept distinct from `None` so the speech handler can
    /// tell an empty key apart from a missing one.
    pub elevenlabs_api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            storage_backend: StorageKind::parse(
                &std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "s3".to_string()),
            )?,
            s3_bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
            s3_endpoint: optional_env("S3_ENDPOINT"),
            s3_region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
            neo_rpc_url: std::env::var("NEO_RPC_URL")
                .unwrap_or_else(|_| DEFAULT_NEO_RPC_URL.to_string()),
            elevenlabs_api_key: std::env::var("ELEVENLABS_API_KEY").ok(),
            cors_origins: parse_origins(std::env::var("CORS_ORIGINS").ok().as_deref()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// S3 settings are usable only when endpoint and both credentials are present.
    pub fn s3_settings(&self) -> Option<S3Settings<'_>> {
        Some(S3Settings {
            endpoint: self.s3_endpoint.as_deref()?,
            region: &self.s3_region,
            access_key_id: self.aws_access_key_id.as_deref()?,
            secret_access_key: self.aws_secret_access_key.as_deref()?,
        })
    }
}

pub struct S3Settings<'a> {
    pub endpoint: &'a str,
    pub region: &'a str,
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_origins(raw: Option<&str>) -> Vec<String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(list) => list
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect(),
        None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
    }
}
