use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEFAULT_IDENTITY_URL: &str = "https://api.clerk.com/v1";

#[derive(Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub identity_url: String,
    pub identity_key: String,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = get("SHUTTER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("SHUTTER_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("SHUTTER_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("SHUTTER_HOST must be an IP address")?;

        let session_secret = get("SHUTTER_SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("SHUTTER_SESSION_SECRET is unset or still a placeholder");
        }

        let identity_key = get("SHUTTER_IDENTITY_KEY").unwrap_or_default();
        if identity_key.is_empty() {
            bail!("SHUTTER_IDENTITY_KEY is unset");
        }

        Ok(Self {
            addr,
            db_path: get("SHUTTER_DB_PATH")
                .unwrap_or_else(|| "shutter.db".into())
                .into(),
            session_secret,
            identity_url: get("SHUTTER_IDENTITY_URL").unwrap_or_else(|| DEFAULT_IDENTITY_URL.into()),
            identity_key,
            cors_origin: get("SHUTTER_CORS_ORIGIN").filter(|v| !v.is_empty()),
        })
    }
}
