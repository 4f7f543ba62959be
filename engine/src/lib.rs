//! Transaction core for the lexiloot backend.
//!
//! The engine is a synchronous state machine over one owned [`EngineState`]:
//! account bootstrap, round lifecycle (ad gate, guesses), the append-only
//! coin ledger, and redemption processing. It holds no locks of its own;
//! callers serialize access (the server wraps it in a single `RwLock`), so
//! each operation executes as one critical section.
//!
//! Every mutation is mirrored to an injected [`StateSink`] so persistence
//! lives behind a seam instead of inside the core.

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use lexiloot_types::{
    AdCompletionEvent, GameRound, InventoryEntry, LedgerEntry, RedemptionRecord, UserAccount,
};

mod account;
mod rounds;
mod scorer;
mod state;
mod wallet;

pub use scorer::score_guess;
pub use state::{default_inventory, EngineState};
pub use wallet::FulfillmentOutcome;

/// Write-through seam for persistence. The engine calls the sink after each
/// mutation, in mutation order; implementations must not block the caller.
pub trait StateSink: Send + Sync {
    fn account(&self, _account: &UserAccount) {}
    fn ledger_entry(&self, _entry: &LedgerEntry) {}
    fn round(&self, _round: &GameRound) {}
    fn ad_event(&self, _event: &AdCompletionEvent) {}
    fn redemption(&self, _record: &RedemptionRecord) {}
    fn inventory_entry(&self, _entry: &InventoryEntry) {}
}

/// Sink for memory-only deployments and tests.
pub struct NullSink;

impl StateSink for NullSink {}

pub struct Engine {
    state: EngineState,
    rng: StdRng,
    sink: Box<dyn StateSink>,
}

impl Engine {
    pub fn new(sink: Box<dyn StateSink>) -> Self {
        Self::from_state(EngineState::default(), sink)
    }

    pub fn from_state(state: EngineState, sink: Box<dyn StateSink>) -> Self {
        Self {
            state,
            rng: StdRng::from_entropy(),
            sink,
        }
    }

    /// Deterministic word selection for replayable tests.
    pub fn seeded(state: EngineState, sink: Box<dyn StateSink>, seed: u64) -> Self {
        Self {
            state,
            rng: StdRng::seed_from_u64(seed),
            sink,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Adds gift-card codes to the inventory, skipping ids already present.
    pub fn stock_inventory(&mut self, entries: Vec<InventoryEntry>) {
        for entry in entries {
            if self.state.inventory.iter().any(|have| have.id == entry.id) {
                continue;
            }
            self.sink.inventory_entry(&entry);
            self.state.inventory.push(entry);
        }
    }

    /// Ids of redemptions still awaiting fulfillment, oldest first. Used at
    /// startup to re-enqueue work that a previous process never settled.
    pub fn pending_redemption_ids(&self) -> Vec<String> {
        self.state
            .redemptions
            .iter()
            .filter(|record| record.status == lexiloot_types::RedemptionStatus::Pending)
            .map(|record| record.id.clone())
            .collect()
    }
}

pub(crate) fn fresh_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}
