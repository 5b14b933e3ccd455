//! Runtime settings read from the environment (and `.env` through dotenvy).

use std::env;

use anyhow::{Context, bail};

pub const DEFAULT_API: &str = "http://localhost:3000/api/v1";

#[derive(Clone, Debug)]
pub struct AdminConfig {
    /// Base URL of the backend REST API, including its version prefix.
    pub api_base_url: String,
    pub address: String,
    pub port: u16,
    /// Glob handed to Tera.
    pub templates: String,
    /// Signing key material for the session cookie; at least 64 bytes.
    pub session_secret: Option<String>,
}

impl AdminConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            Err(_) => 8080,
        };

        let session_secret = env::var("SESSION_SECRET").ok();
        if let Some(secret) = &session_secret {
            if secret.len() < 64 {
                bail!("SESSION_SECRET must be at least 64 bytes long");
            }
        }

        Ok(Self {
            api_base_url: env::var("API").unwrap_or_else(|_| DEFAULT_API.to_string()),
            address: env::var("ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            templates: env::var("TEMPLATES").unwrap_or_else(|_| "templates/**/*.html".to_string()),
            session_secret,
        })
    }
}
