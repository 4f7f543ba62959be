//! HTTP backend for lexiloot.
//!
//! Wraps the engine in a single `RwLock` so every write operation runs as
//! one critical section, and adds the process concerns around it: the axum
//! API, SQLite write-through persistence, the fulfillment worker, and
//! operation metrics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::info;

use lexiloot_engine::{
    default_inventory, Engine, EngineState, FulfillmentOutcome, NullSink, StateSink,
};
use lexiloot_types::{
    EngineError, InventoryEntry, LedgerEntry, RedemptionRecord, RewardMethod, RoundStatus,
    RoundView, UserProfile, DEFAULT_FULFILLMENT_DELAY_MS,
};

mod api;
pub use api::Api;

mod fulfillment;
pub use fulfillment::FulfillmentJob;

mod metrics;
pub use metrics::{HttpMetrics, HttpMetricsSnapshot};

mod persistence;
pub use persistence::Persistence;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// SQLite path; `None` keeps all state in memory.
    pub db_path: Option<PathBuf>,
    pub fulfillment_delay: Duration,
    /// Fixed word-selection seed for replayable runs.
    pub deterministic_seed: Option<u64>,
    /// Gift-card codes to stock on top of whatever the store already holds.
    pub extra_inventory: Vec<InventoryEntry>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            fulfillment_delay: Duration::from_millis(DEFAULT_FULFILLMENT_DELAY_MS),
            deterministic_seed: None,
            extra_inventory: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub accounts: usize,
    pub rounds: usize,
    pub ledger_entries: usize,
    pub redemptions: usize,
    pub inventory_available: usize,
    pub persistence_enabled: bool,
    pub version: &'static str,
}

pub struct Service {
    pub config: ServiceConfig,
    engine: RwLock<Engine>,
    metrics: HttpMetrics,
    persistence: Option<Persistence>,
    fulfillment: mpsc::UnboundedSender<FulfillmentJob>,
}

impl Service {
    /// Assembles the whole backend: loads persisted state (if any), stocks
    /// the default inventory into an empty store, spawns the fulfillment
    /// worker, and re-enqueues redemptions a previous process left pending.
    /// Must run inside a tokio runtime.
    pub fn build(config: ServiceConfig) -> anyhow::Result<Arc<Self>> {
        let (persistence, state) = match &config.db_path {
            Some(path) => {
                let (persistence, state) = Persistence::load_and_start(path)?;
                (Some(persistence), state)
            }
            None => (None, EngineState::default()),
        };
        let sink: Box<dyn StateSink> = match &persistence {
            Some(persistence) => Box::new(persistence.sink()),
            None => Box::new(NullSink),
        };
        let mut engine = match config.deterministic_seed {
            Some(seed) => Engine::seeded(state, sink, seed),
            None => Engine::from_state(state, sink),
        };
        if engine.state().inventory.is_empty() {
            engine.stock_inventory(default_inventory());
        }
        if !config.extra_inventory.is_empty() {
            engine.stock_inventory(config.extra_inventory.clone());
        }
        let pending = engine.pending_redemption_ids();

        let (job_sender, job_receiver) = mpsc::unbounded_channel();
        let delay = config.fulfillment_delay;
        let service = Arc::new(Self {
            config,
            engine: RwLock::new(engine),
            metrics: HttpMetrics::default(),
            persistence,
            fulfillment: job_sender,
        });
        fulfillment::spawn(Arc::clone(&service), job_receiver, delay);
        for redemption_id in pending {
            info!(%redemption_id, "re-enqueueing unsettled redemption");
            service.enqueue_fulfillment(&redemption_id);
        }
        Ok(service)
    }

    fn enqueue_fulfillment(&self, redemption_id: &str) {
        let _ = self.fulfillment.send(FulfillmentJob {
            redemption_id: redemption_id.to_string(),
        });
    }

    /// Blocks until all enqueued persistence writes hit disk. No-op for
    /// memory-only deployments.
    pub async fn flush(&self) {
        if let Some(persistence) = &self.persistence {
            persistence.flush().await;
        }
    }

    pub fn metrics(&self) -> &HttpMetrics {
        &self.metrics
    }

    pub async fn bootstrap(&self, user_id: &str) -> Result<UserProfile, EngineError> {
        let result = self.engine.write().await.bootstrap(user_id);
        match &result {
            Ok(_) => {
                self.metrics.inc_accounts_bootstrapped();
                // The welcome grant must be durable before the caller sees it.
                self.flush().await;
            }
            Err(err) => self.metrics.note_reject(err),
        }
        result
    }

    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, EngineError> {
        let result = self.engine.read().await.profile(user_id);
        if let Err(err) = &result {
            self.metrics.note_reject(err);
        }
        result
    }

    pub async fn ledger_of(&self, user_id: &str) -> Vec<LedgerEntry> {
        self.engine.read().await.ledger_of(user_id)
    }

    pub async fn create_round(&self, user_id: &str) -> Result<RoundView, EngineError> {
        let result = self.engine.write().await.create_round(user_id);
        match &result {
            Ok(_) => self.metrics.inc_rounds_created(),
            Err(err) => self.metrics.note_reject(err),
        }
        result
    }

    pub async fn authorize_round(
        &self,
        round_id: &str,
        ad_unit_id: &str,
        event_id: &str,
        user_id: &str,
    ) -> Result<RoundView, EngineError> {
        let result = self
            .engine
            .write()
            .await
            .authorize_round(round_id, ad_unit_id, event_id, user_id);
        match &result {
            Ok(_) => self.metrics.inc_rounds_authorized(),
            Err(err) => self.metrics.note_reject(err),
        }
        result
    }

    pub async fn submit_guess(
        &self,
        round_id: &str,
        guess: &str,
        credential: &str,
        user_id: &str,
    ) -> Result<RoundView, EngineError> {
        let result = self
            .engine
            .write()
            .await
            .submit_guess(round_id, guess, credential, user_id);
        match &result {
            Ok(view) => {
                self.metrics.inc_guesses_submitted();
                match view.status {
                    RoundStatus::Won => self.metrics.inc_rounds_won(),
                    RoundStatus::Lost => self.metrics.inc_rounds_lost(),
                    _ => {}
                }
            }
            Err(err) => self.metrics.note_reject(err),
        }
        result
    }

    pub async fn request_redemption(
        &self,
        user_id: &str,
        method: RewardMethod,
    ) -> Result<RedemptionRecord, EngineError> {
        let result = self.engine.write().await.request_redemption(user_id, method);
        match &result {
            Ok(record) => {
                self.metrics.inc_redemptions_requested();
                self.enqueue_fulfillment(&record.id);
            }
            Err(err) => self.metrics.note_reject(err),
        }
        result
    }

    pub async fn list_redemptions(&self, user_id: &str) -> Vec<RedemptionRecord> {
        self.engine.read().await.list_redemptions(user_id)
    }

    /// Settles one redemption immediately. Called by the fulfillment worker
    /// after its delay; exposed so tests and operators can settle without
    /// waiting.
    pub async fn fulfill_now(&self, redemption_id: &str) -> FulfillmentOutcome {
        let outcome = self.engine.write().await.fulfill_redemption(redemption_id);
        if matches!(outcome, FulfillmentOutcome::Fulfilled { .. }) {
            self.metrics.inc_redemptions_fulfilled();
        }
        outcome
    }

    pub async fn health_status(&self) -> HealthStatus {
        let engine = self.engine.read().await;
        let state = engine.state();
        HealthStatus {
            healthy: true,
            accounts: state.accounts.len(),
            rounds: state.rounds.len(),
            ledger_entries: state.ledger.len(),
            redemptions: state.redemptions.len(),
            inventory_available: state.inventory.iter().filter(|entry| !entry.used).count(),
            persistence_enabled: self.persistence.is_some(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
