//! Application state: the loaded catalog and the one calendar session.
//!
//! This module owns:
//!   - the lesson catalog (read-only after startup)
//!   - the calendar session behind an async `RwLock`
//!
//! Startup order matters: config, then catalog (fatal on failure), then the
//! progress store and session.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::calendar::{CalendarState, UnlockPolicy};
use crate::catalog::{CatalogError, ContentCatalog};
use crate::config::{AppConfig, ConfigError};
use crate::progress::{FileProgressStore, MemoryProgressStore, ProgressStore};

#[derive(Debug, Error)]
pub enum StartupError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Catalog(#[from] CatalogError),
}

#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<ContentCatalog>,
  pub calendar: Arc<RwLock<CalendarState>>,
}

impl AppState {
  /// Build state from config: load the catalog, open the progress file, start the session.
  #[instrument(level = "info", skip_all)]
  pub async fn from_config(cfg: &AppConfig) -> Result<Self, StartupError> {
    let policy = cfg.unlock_policy()?;
    let catalog = Arc::new(ContentCatalog::load(&cfg.catalog_path).await?);

    let store: Box<dyn ProgressStore> = if cfg.persist_progress {
      let store = FileProgressStore::new(&cfg.progress_path);
      info!(target: "regex_advent", progress = %store.path().display(), ?policy, "Progress store ready");
      Box::new(store)
    } else {
      info!(target: "regex_advent", ?policy, "Progress kept in memory only");
      Box::new(MemoryProgressStore::new())
    };

    Ok(Self::with_store(catalog, store, policy))
  }

  pub fn with_store(
    catalog: Arc<ContentCatalog>,
    store: Box<dyn ProgressStore>,
    policy: UnlockPolicy,
  ) -> Self {
    let calendar = CalendarState::new(catalog.clone(), store, policy);
    Self {
      catalog,
      calendar: Arc::new(RwLock::new(calendar)),
    }
  }
}
