use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use lexiloot_types::EngineError;

/// Operation counters for the HTTP surface.
#[derive(Default)]
pub struct HttpMetrics {
    requests: AtomicU64,
    accounts_bootstrapped: AtomicU64,
    rounds_created: AtomicU64,
    rounds_authorized: AtomicU64,
    guesses_submitted: AtomicU64,
    rounds_won: AtomicU64,
    rounds_lost: AtomicU64,
    redemptions_requested: AtomicU64,
    redemptions_fulfilled: AtomicU64,
    reject_unauthorized: AtomicU64,
    reject_not_found: AtomicU64,
    reject_duplicate_event: AtomicU64,
    reject_insufficient_balance: AtomicU64,
    reject_invalid_input: AtomicU64,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct HttpMetricsSnapshot {
    pub requests: u64,
    pub accounts_bootstrapped: u64,
    pub rounds_created: u64,
    pub rounds_authorized: u64,
    pub guesses_submitted: u64,
    pub rounds_won: u64,
    pub rounds_lost: u64,
    pub redemptions_requested: u64,
    pub redemptions_fulfilled: u64,
    pub reject_unauthorized: u64,
    pub reject_not_found: u64,
    pub reject_duplicate_event: u64,
    pub reject_insufficient_balance: u64,
    pub reject_invalid_input: u64,
}

impl HttpMetrics {
    pub fn snapshot(&self) -> HttpMetricsSnapshot {
        HttpMetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            accounts_bootstrapped: self.accounts_bootstrapped.load(Ordering::Relaxed),
            rounds_created: self.rounds_created.load(Ordering::Relaxed),
            rounds_authorized: self.rounds_authorized.load(Ordering::Relaxed),
            guesses_submitted: self.guesses_submitted.load(Ordering::Relaxed),
            rounds_won: self.rounds_won.load(Ordering::Relaxed),
            rounds_lost: self.rounds_lost.load(Ordering::Relaxed),
            redemptions_requested: self.redemptions_requested.load(Ordering::Relaxed),
            redemptions_fulfilled: self.redemptions_fulfilled.load(Ordering::Relaxed),
            reject_unauthorized: self.reject_unauthorized.load(Ordering::Relaxed),
            reject_not_found: self.reject_not_found.load(Ordering::Relaxed),
            reject_duplicate_event: self.reject_duplicate_event.load(Ordering::Relaxed),
            reject_insufficient_balance: self.reject_insufficient_balance.load(Ordering::Relaxed),
            reject_invalid_input: self.reject_invalid_input.load(Ordering::Relaxed),
        }
    }

    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_accounts_bootstrapped(&self) {
        self.accounts_bootstrapped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rounds_created(&self) {
        self.rounds_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rounds_authorized(&self) {
        self.rounds_authorized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_guesses_submitted(&self) {
        self.guesses_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rounds_won(&self) {
        self.rounds_won.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rounds_lost(&self) {
        self.rounds_lost.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_redemptions_requested(&self) {
        self.redemptions_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_redemptions_fulfilled(&self) {
        self.redemptions_fulfilled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_reject(&self, error: &EngineError) {
        let counter = match error {
            EngineError::Unauthorized => &self.reject_unauthorized,
            EngineError::NotFound { .. } => &self.reject_not_found,
            EngineError::DuplicateEvent { .. } => &self.reject_duplicate_event,
            EngineError::InsufficientBalance { .. } => &self.reject_insufficient_balance,
            EngineError::InvalidInput { .. } => &self.reject_invalid_input,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
