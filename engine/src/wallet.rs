use tracing::{info, warn};

use lexiloot_types::{
    EngineError, LedgerEntry, LedgerReason, RedemptionRecord, RedemptionStatus, RewardMethod,
    REDEMPTION_COST_COINS, REDEMPTION_VALUE_USD,
};

use crate::state::now_ms;
use crate::{fresh_id, Engine};

/// What the fulfillment step did with a redemption id. Only `Fulfilled`
/// mutates anything; the other outcomes exist so duplicate triggers and
/// starved inventory stay observable without becoming caller errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    Fulfilled { code: String },
    OutOfStock,
    AlreadySettled,
    UnknownRecord,
}

impl Engine {
    /// Derived balance: the fold over the user's ledger entries. There is
    /// no cached field to drift from this.
    pub fn balance_of(&self, user_id: &str) -> i64 {
        self.state
            .ledger
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.delta)
            .sum()
    }

    /// The user's ledger entries, newest first.
    pub fn ledger_of(&self, user_id: &str) -> Vec<LedgerEntry> {
        self.state
            .ledger
            .iter()
            .rev()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect()
    }

    pub(crate) fn append_ledger(
        &mut self,
        user_id: &str,
        delta: i64,
        reason: LedgerReason,
    ) -> LedgerEntry {
        let entry = LedgerEntry {
            id: fresh_id("lg"),
            user_id: user_id.to_string(),
            delta,
            reason: reason.code(),
            created_at_ms: now_ms(),
        };
        self.sink.ledger_entry(&entry);
        self.state.ledger.push(entry.clone());
        entry
    }

    /// Checks balance and debits it as one unit (callers hold the write
    /// side of the engine lock for the whole call, so two requests can
    /// never both pass the check against the same stale fold). Returns the
    /// record in `Pending`; settlement is always asynchronous.
    pub fn request_redemption(
        &mut self,
        user_id: &str,
        method: RewardMethod,
    ) -> Result<RedemptionRecord, EngineError> {
        let balance = self.balance_of(user_id);
        if balance < REDEMPTION_COST_COINS {
            return Err(EngineError::InsufficientBalance {
                balance,
                cost: REDEMPTION_COST_COINS,
            });
        }
        self.append_ledger(
            user_id,
            -REDEMPTION_COST_COINS,
            LedgerReason::RewardRedemption(method),
        );
        let record = RedemptionRecord {
            id: fresh_id("wd"),
            user_id: user_id.to_string(),
            method,
            coins_spent: REDEMPTION_COST_COINS,
            value_usd: REDEMPTION_VALUE_USD,
            status: RedemptionStatus::Pending,
            gift_card_code: None,
            created_at_ms: now_ms(),
        };
        self.sink.redemption(&record);
        self.state.redemptions.push(record.clone());
        info!(user_id, redemption_id = %record.id, method = method.as_str(), "redemption requested");
        Ok(record)
    }

    /// Settles a pending redemption against the first unused inventory
    /// entry of its method: the entry is marked used and the record flipped
    /// to `Sent` together, so a code can never be allocated twice. No-ops
    /// on anything not `Pending`, which makes duplicate triggers harmless.
    /// With no stock the record simply stays pending.
    pub fn fulfill_redemption(&mut self, redemption_id: &str) -> FulfillmentOutcome {
        let Some(record_index) = self
            .state
            .redemptions
            .iter()
            .position(|record| record.id == redemption_id)
        else {
            return FulfillmentOutcome::UnknownRecord;
        };
        if self.state.redemptions[record_index].status != RedemptionStatus::Pending {
            return FulfillmentOutcome::AlreadySettled;
        }
        let method = self.state.redemptions[record_index].method;
        let Some(entry_index) = self
            .state
            .inventory
            .iter()
            .position(|entry| entry.method == method && !entry.used)
        else {
            warn!(redemption_id, method = method.as_str(), "no unused gift card in inventory; redemption stays pending");
            return FulfillmentOutcome::OutOfStock;
        };

        self.state.inventory[entry_index].used = true;
        let code = self.state.inventory[entry_index].code.clone();
        let record = &mut self.state.redemptions[record_index];
        record.status = RedemptionStatus::Sent;
        record.gift_card_code = Some(code.clone());
        let record_snapshot = record.clone();
        let entry_snapshot = self.state.inventory[entry_index].clone();
        self.sink.inventory_entry(&entry_snapshot);
        self.sink.redemption(&record_snapshot);
        info!(redemption_id, method = method.as_str(), "redemption fulfilled");
        FulfillmentOutcome::Fulfilled { code }
    }

    /// The user's redemption records, newest first.
    pub fn list_redemptions(&self, user_id: &str) -> Vec<RedemptionRecord> {
        self.state
            .redemptions
            .iter()
            .rev()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect()
    }
}
