// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Signing secret used when `SECRET_KEY` is not provided.
/// Only suitable for local development.
pub const DEFAULT_SECRET_KEY: &str = "dev-secret-key";

/// Number of exams listed on the admin dashboard.
pub const RECENT_EXAMS_LIMIT: i64 = 5;

/// Password shared by the seeded sample accounts.
pub const SAMPLE_PASSWORD: &str = "password123";

#[derive(Debug, Clone)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub secret_key: String,
    pub session_ttl_secs: u64,
    pub server_addr: String,
    pub seed_sample_data: bool,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let mongo_uri = env::var("MONGO_URI").expect("MONGO_URI environment variable not set");

        let mongo_database =
            env::var("MONGO_DATABASE").unwrap_or_else(|_| "online_exam".to_string());

        let secret_key = env::var("SECRET_KEY").unwrap_or_else(|_| DEFAULT_SECRET_KEY.to_string());

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let seed_sample_data = env::var("SEED_SAMPLE_DATA")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            mongo_uri,
            mongo_database,
            secret_key,
            session_ttl_secs,
            server_addr,
            seed_sample_data,
            rust_log,
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }
}
