use std::{fs::File, io::BufReader, sync::Arc};

use anyhow::Context;
use enroute_backend::rest_backend::{RestBackend, RestBackendParams};
use enroute_tracking::{
    memory::{InMemoryBackend, Seed},
    store::{Authenticator, TrackingBackend},
    tracker::RouteTracker,
};
use tracing::{info, warn};

use crate::config::{BackendConfig, Config};

pub struct AppState {
    pub tracker: RouteTracker,
    pub authenticator: Arc<dyn Authenticator>,
    pub config: Config,
}

impl AppState {
    pub fn new<B>(backend: Arc<B>, config: Config) -> Self
    where
        B: TrackingBackend + 'static,
    {
        Self {
            tracker: RouteTracker::new(backend.clone(), config.distance_mode),
            authenticator: backend,
            config,
        }
    }

    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        match &config.backend {
            BackendConfig::Memory { seed_file } => {
                let seed = match seed_file {
                    Some(path) => {
                        let file = File::open(path)
                            .with_context(|| format!("Failed to open seed file {:?}", path))?;
                        serde_json::from_reader(BufReader::new(file))
                            .with_context(|| format!("Failed to parse seed file {:?}", path))?
                    }
                    None => {
                        warn!("Memory backend started without a seed file, no orders are known");
                        Seed::default()
                    }
                };

                info!(
                    "Using memory backend with {} orders and {} sessions",
                    seed.orders.len(),
                    seed.sessions.len()
                );

                Ok(Self::new(Arc::new(InMemoryBackend::from_seed(seed)), config))
            }
            BackendConfig::Rest {
                base_url,
                api_key,
                evidence_bucket,
            } => {
                info!("Using rest backend at {}", base_url);

                let backend = RestBackend::new(RestBackendParams {
                    base_url: base_url.clone(),
                    api_key: api_key.clone(),
                    evidence_bucket: evidence_bucket.clone(),
                });

                Ok(Self::new(Arc::new(backend), config))
            }
        }
    }
}
