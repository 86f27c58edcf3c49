//! Application state: the live level table, the experience ledger and the grant policy.
//!
//! The level table is swapped as a whole. Readers clone the inner `Arc` and compute
//! against that snapshot, so an admin replacement never leaves a request looking at a
//! half-updated table.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::config::{load_config_from_env, GrantPolicy, ProgressionConfig};
use crate::domain::Level;
use crate::error::{ConfigError, ProgressionResult};
use crate::ledger::ExperienceLedger;
use crate::levels::LevelTable;
use crate::seeds::seed_levels;

#[derive(Clone)]
pub struct AppState {
    pub levels: Arc<RwLock<Arc<LevelTable>>>,
    pub ledger: ExperienceLedger,
    pub policy: GrantPolicy,
}

impl AppState {
    /// Build state from env. An invalid configured level table stops startup.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, ConfigError> {
        let cfg = load_config_from_env()?;
        Self::new(cfg)
    }

    #[instrument(level = "info", skip_all)]
    pub fn new(cfg: ProgressionConfig) -> Result<Self, ConfigError> {
        let (levels, origin) = if cfg.levels.is_empty() {
            (seed_levels(), "seed")
        } else {
            (cfg.levels, "config")
        };
        let table = LevelTable::new(levels)?;

        for l in table.levels() {
            info!(target: "levels", level = l.level, xp_required = l.xp_required, title = %l.title, "Level loaded");
        }
        info!(target: "levels", %origin, count = table.len(), "Startup level table validated");

        Ok(Self {
            levels: Arc::new(RwLock::new(Arc::new(table))),
            ledger: ExperienceLedger::new(),
            policy: cfg.policy,
        })
    }

    /// Snapshot of the live table.
    pub async fn level_table(&self) -> Arc<LevelTable> {
        self.levels.read().await.clone()
    }

    /// Validate a candidate table and swap it in. The live table is untouched on failure.
    #[instrument(level = "info", skip(self, levels), fields(count = levels.len()))]
    pub async fn replace_levels(&self, levels: Vec<Level>) -> ProgressionResult<Arc<LevelTable>> {
        let table = match LevelTable::new(levels) {
            Ok(t) => Arc::new(t),
            Err(e) => {
                warn!(target: "levels", error = %e, "Rejected level table replacement");
                return Err(e);
            }
        };
        *self.levels.write().await = table.clone();
        info!(target: "levels", count = table.len(), "Level table replaced");
        Ok(table)
    }
}
