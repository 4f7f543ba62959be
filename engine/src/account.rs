use lexiloot_types::{
    EngineError, LedgerReason, UserAccount, UserProfile, WELCOME_BONUS_COINS,
};
use tracing::info;

use crate::Engine;

impl Engine {
    /// First-seen provisioning plus welcome grant, idempotent per user id:
    /// re-invocation for a known id never appends a second bonus. Always
    /// returns the account merged with the freshly folded balance.
    pub fn bootstrap(&mut self, user_id: &str) -> Result<UserProfile, EngineError> {
        if user_id.trim().is_empty() {
            return Err(EngineError::invalid_input("user id must not be empty"));
        }
        if !self.state.accounts.contains_key(user_id) {
            let account = UserAccount::new(user_id);
            info!(user_id, username = %account.username, "provisioning account");
            self.sink.account(&account);
            self.state
                .accounts
                .insert(user_id.to_string(), account);
            self.append_ledger(user_id, WELCOME_BONUS_COINS, LedgerReason::WelcomeBonus);
        }
        self.profile(user_id)
    }

    pub fn profile(&self, user_id: &str) -> Result<UserProfile, EngineError> {
        let account = self.state.accounts.get(user_id).ok_or(EngineError::NotFound {
            kind: "user",
            id: user_id.to_string(),
        })?;
        Ok(UserProfile::from_account(account, self.balance_of(user_id)))
    }

    /// Bumps lifetime play counters on a terminal round outcome. Guesses
    /// from ids that never bootstrapped leave no account to update.
    pub(crate) fn record_round_outcome(&mut self, user_id: &str, won: bool) {
        if let Some(account) = self.state.accounts.get_mut(user_id) {
            account.games_played += 1;
            if won {
                account.wins += 1;
            }
            let snapshot = account.clone();
            self.sink.account(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, NullSink};

    fn engine() -> Engine {
        Engine::seeded(Default::default(), Box::new(NullSink), 7)
    }

    #[test]
    fn bootstrap_grants_welcome_bonus_once() {
        let mut engine = engine();
        for _ in 0..5 {
            let profile = engine.bootstrap("anon_4f2k9x").unwrap();
            assert_eq!(profile.balance, WELCOME_BONUS_COINS);
        }
        let welcome_entries = engine
            .state()
            .ledger
            .iter()
            .filter(|entry| entry.user_id == "anon_4f2k9x" && entry.reason == "WELCOME_BONUS")
            .count();
        assert_eq!(welcome_entries, 1);
    }

    #[test]
    fn bootstrap_rejects_empty_user_id() {
        let mut engine = engine();
        assert!(matches!(
            engine.bootstrap("  "),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn fresh_account_has_zero_stats() {
        let mut engine = engine();
        let profile = engine.bootstrap("anon_stats").unwrap();
        assert_eq!(profile.games_played, 0);
        assert_eq!(profile.wins, 0);
        assert!(profile.fraud_flags.is_empty());
        assert_eq!(profile.kyc_status, lexiloot_types::KycStatus::None);
    }

    #[test]
    fn profile_of_unknown_user_is_not_found() {
        let engine = engine();
        assert!(matches!(
            engine.profile("ghost"),
            Err(EngineError::NotFound { kind: "user", .. })
        ));
    }
}
