//! Shared wiring for every command

use crate::OutputFormat;
use anyhow::{Context as _, Result};
use ausflug_api_client::{Destination, SupabaseClient};
use ausflug_core::config::{AppConfig, Config};
use ausflug_core::kv::{FileStore, KeyValueStore};
use ausflug_proximity::platform::{
    ChannelLocationService, DestinationSource, LocationUpdateOptions, LogNotifier,
};
use ausflug_proximity::{
    LocationSettingsStore, NotifiedStore, ProximityPipeline, SystemClock, TrackingController,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Stores, configuration and output preferences for one invocation
pub struct Context {
    pub config: AppConfig,
    pub format: OutputFormat,
    pub settings: Arc<LocationSettingsStore>,
    pub notified: Arc<NotifiedStore>,
    /// Device position, fed from command arguments or stdin
    pub location: Arc<ChannelLocationService>,
    destinations_file: Option<PathBuf>,
}

impl Context {
    pub fn new(
        config: Config,
        data_dir: Option<PathBuf>,
        destinations_file: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<Self> {
        let config = config.schema;
        let dir = data_dir.unwrap_or_else(|| config.storage.resolve_data_dir());
        let store: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::new(&dir)
                .with_context(|| format!("Opening data directory {}", dir.display()))?,
        );
        debug!(data_dir = %dir.display(), "Using data directory");

        Ok(Self {
            settings: Arc::new(LocationSettingsStore::new(store.clone())),
            notified: Arc::new(NotifiedStore::new(store, Arc::new(SystemClock))),
            location: Arc::new(ChannelLocationService::new()),
            config,
            format,
            destinations_file,
        })
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Destination catalog: the JSON file if given, Supabase otherwise
    pub fn destination_source(&self) -> Result<Arc<dyn DestinationSource>> {
        match &self.destinations_file {
            Some(path) => Ok(Arc::new(JsonFileSource { path: path.clone() })),
            None => {
                let client = SupabaseClient::new()
                    .context("Configuring Supabase client (or pass --destinations-file)")?;
                Ok(Arc::new(client))
            }
        }
    }

    /// Pipeline announcing through `notifier`
    pub fn pipeline(&self, notifier: Arc<LogNotifier>) -> Result<Arc<ProximityPipeline>> {
        Ok(Arc::new(ProximityPipeline::new(
            self.settings.clone(),
            self.notified.clone(),
            self.destination_source()?,
            notifier,
        )))
    }

    pub fn location_options(&self) -> LocationUpdateOptions {
        LocationUpdateOptions::from(&self.config)
    }

    /// Tracking controller over the configured task, announcing through `notifier`
    pub fn controller(&self, notifier: Arc<LogNotifier>) -> Result<Arc<TrackingController>> {
        let controller = TrackingController::new(
            self.config.tracking.task_name.clone(),
            self.pipeline(notifier.clone())?,
            self.location.clone(),
            notifier,
        )
        .with_options(self.location_options());
        Ok(Arc::new(controller))
    }
}

/// Destinations from a JSON array of `ausfluege` rows, re-read on every call
struct JsonFileSource {
    path: PathBuf,
}

#[async_trait]
impl DestinationSource for JsonFileSource {
    async fn all_destinations(&self) -> ausflug_proximity::Result<Vec<Destination>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ausflug_core::Error::from(e).with_context(format!("Reading {}", self.path.display()))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
