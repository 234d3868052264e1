//! Server configuration, read from `ENROUTE_*` environment variables.
//!
//! `main` loads `./.env.local` first, so the variables can live there during
//! local development.

use std::{fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{Context, anyhow};
use enroute_tracking::geometry::DistanceMode;
use tracing::Level;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_EVIDENCE_BUCKET: &str = "bypass-evidence";
pub const DEFAULT_MAX_EVIDENCE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    /// Process-local collaborators, optionally seeded from a JSON file.
    Memory { seed_file: Option<PathBuf> },
    /// Hosted backend reached over HTTPS.
    Rest {
        base_url: String,
        api_key: String,
        evidence_bucket: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_level: Level,
    pub backend: BackendConfig,
    pub distance_mode: DistanceMode,
    pub max_evidence_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: Level::INFO,
            backend: BackendConfig::Memory { seed_file: None },
            distance_mode: DistanceMode::Vertex,
            max_evidence_bytes: DEFAULT_MAX_EVIDENCE_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("ENROUTE_BACKEND")
            .as_deref()
            .map(str::trim)
            .unwrap_or("memory")
        {
            "memory" => BackendConfig::Memory {
                seed_file: lookup("ENROUTE_SEED_FILE").map(PathBuf::from),
            },
            "rest" => BackendConfig::Rest {
                base_url: lookup("ENROUTE_BACKEND_URL")
                    .context("ENROUTE_BACKEND_URL is required for the rest backend")?,
                api_key: lookup("ENROUTE_BACKEND_KEY")
                    .context("ENROUTE_BACKEND_KEY is required for the rest backend")?,
                evidence_bucket: lookup("ENROUTE_EVIDENCE_BUCKET")
                    .unwrap_or_else(|| DEFAULT_EVIDENCE_BUCKET.to_string()),
            },
            other => {
                return Err(anyhow!(
                    "Invalid ENROUTE_BACKEND value {other:?}, expected \"memory\" or \"rest\""
                ));
            }
        };

        Ok(Self {
            bind_addr: parse_var(&lookup, "ENROUTE_BIND_ADDR", DEFAULT_BIND_ADDR)?,
            log_level: parse_var(&lookup, "ENROUTE_LOG_LEVEL", "info")?,
            backend,
            distance_mode: parse_var(&lookup, "ENROUTE_DISTANCE_MODE", "vertex")?,
            max_evidence_bytes: parse_var(
                &lookup,
                "ENROUTE_MAX_EVIDENCE_BYTES",
                &DEFAULT_MAX_EVIDENCE_BYTES.to_string(),
            )?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: &str) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| default.to_string());

    value
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value {value:?}: {e}"))
}
