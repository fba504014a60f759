//! Database module - AppState and storage backends
//!
//! - `sequence` - document number counters
//! - `records` - business record rows

pub mod records;
pub mod sequence;

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::notify::{self, Notifier};
use crate::numbering::{SequenceAllocator, SequenceStore};
use crate::records::{RecordBackend, RecordRepository};
use crate::render::{AssetStore, DocumentRenderer};

use records::{MemoryRecordBackend, PgRecordBackend};
use sequence::{MemorySequenceStore, PgSequenceStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub allocator: SequenceAllocator,
    pub records: RecordRepository,
    pub renderer: DocumentRenderer,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let config = AppConfig::from_env()?;
        Self::new_with_config(config).await
    }

    pub async fn new_with_config(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .timeout(Duration::from_secs(30))
            .user_agent("rps-calibration-server/0.3")
            .build()?;
        let notifier = notify::from_config(&config, http_client);

        let Some(database_url) = config.database_url.clone() else {
            log::warn!("DATABASE_URL is not set; records and counters are kept in memory only");
            return Ok(Self::from_parts(
                config,
                Arc::new(MemorySequenceStore::new()),
                Arc::new(MemoryRecordBackend::new()),
                notifier,
            ));
        };

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(900))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("Connected to Postgres and applied migrations");

        Ok(Self::from_parts(
            config,
            Arc::new(PgSequenceStore::new(pool.clone())),
            Arc::new(PgRecordBackend::new(pool)),
            notifier,
        ))
    }

    /// State backed entirely by in-process stores, with dispatch disabled.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(
            config,
            Arc::new(MemorySequenceStore::new()),
            Arc::new(MemoryRecordBackend::new()),
            Arc::new(notify::DisabledNotifier),
        )
    }

    pub fn from_parts(
        config: AppConfig,
        sequences: Arc<dyn SequenceStore>,
        records: Arc<dyn RecordBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let assets = AssetStore::new(config.logo_path(), config.footer_path());
        Self {
            config: Arc::new(config),
            allocator: SequenceAllocator::new(sequences),
            records: RecordRepository::new(records),
            renderer: DocumentRenderer::new(assets),
            notifier,
        }
    }
}
