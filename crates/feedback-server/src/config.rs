use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::TimeDelta;
use tracing::info;

use feedback_api::auth::HashCost;

/// Session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["secret", "change-me", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub session_ttl: TimeDelta,
    pub secure_cookies: bool,
    pub hash_cost: HashCost,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let session_secret = env::var("FEEDBACK_SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("FEEDBACK_SESSION_SECRET is unset or still a placeholder; set it in .env");
        }

        let defaults = HashCost::default();
        Ok(Self {
            host: env::var("FEEDBACK_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("FEEDBACK_PORT", 3000)?,
            db_path: env::var("FEEDBACK_DB_PATH")
                .unwrap_or_else(|_| "feedback.db".into())
                .into(),
            session_secret,
            session_ttl: session_ttl(parse_or("FEEDBACK_SESSION_TTL_HOURS", 24)?)?,
            secure_cookies: parse_or("FEEDBACK_SECURE_COOKIES", false)?,
            hash_cost: HashCost {
                memory_kib: parse_or("FEEDBACK_ARGON2_MEMORY_KIB", defaults.memory_kib)?,
                iterations: parse_or("FEEDBACK_ARGON2_ITERATIONS", defaults.iterations)?,
                parallelism: parse_or("FEEDBACK_ARGON2_PARALLELISM", defaults.parallelism)?,
            },
        })
    }
}

fn session_ttl(hours: i64) -> Result<TimeDelta> {
    match TimeDelta::try_hours(hours) {
        Some(ttl) if hours > 0 => Ok(ttl),
        _ => bail!("FEEDBACK_SESSION_TTL_HOURS must be a positive number of hours, got {hours}"),
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("invalid {key} value: {raw:?}")),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
