use std::env;
use std::str::FromStr;
use std::time::Duration;

use analysis_service_cli::ai::{GeminiConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use analysis_service_cli::store::StoreLimits;
use analysis_service_cli::MAX_ANALYSIS_DEPTH;
use thiserror::Error;

/// Largest accepted upload request body.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub frontend_url: String,
    pub allowed_origins: Vec<String>,
    pub gemini: GeminiConfig,
    pub store_limits: StoreLimits,
    pub max_analysis_depth: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let gemini = GeminiConfig::new(api_key)
            .with_model(var("GEMINI_MODEL", DEFAULT_MODEL))
            .with_base_url(var("GEMINI_API_BASE", DEFAULT_API_BASE));

        let defaults = StoreLimits::default();
        let ttl_secs = positive(&lookup, "JOB_TTL_SECONDS", defaults.ttl.as_secs())?;
        let store_limits = StoreLimits {
            ttl: Duration::from_secs(ttl_secs),
            capacity: positive(&lookup, "JOB_CAPACITY", defaults.capacity as u64)? as usize,
        };

        let allowed_origins = var("ALLOWED_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            port: number(&lookup, "PORT", 8000)?,
            frontend_url: var("FRONTEND_URL", "http://localhost:3000"),
            allowed_origins,
            gemini,
            store_limits,
            max_analysis_depth: MAX_ANALYSIS_DEPTH,
        })
    }
}

fn number<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}

fn positive<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match number(lookup, name, default)? {
        0 => Err(ConfigError::Zero(name)),
        value => Ok(value),
    }
}
