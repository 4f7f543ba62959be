use serde::{Deserialize, Serialize};

use crate::RewardMethod;

/// An immutable coin-ledger fact. Entries are append-only: once inserted
/// they are never mutated or deleted, and every balance in the system is a
/// sum of `delta` over a user's entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub user_id: String,
    pub delta: i64,
    /// Enumerated reason code, see [`LedgerReason::code`].
    pub reason: String,
    pub created_at_ms: u64,
}

/// Why a ledger entry exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerReason {
    WelcomeBonus,
    RoundWinBonus,
    RewardRedemption(RewardMethod),
}

impl LedgerReason {
    /// The enumerated string stored on the entry, e.g. `WELCOME_BONUS` or
    /// `REWARD_REDEMPTION_ROBUX`.
    pub fn code(&self) -> String {
        match self {
            Self::WelcomeBonus => "WELCOME_BONUS".to_string(),
            Self::RoundWinBonus => "ROUND_WIN_BONUS".to_string(),
            Self::RewardRedemption(method) => {
                format!("REWARD_REDEMPTION_{}", method.as_str().to_uppercase())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_match_ledger_vocabulary() {
        assert_eq!(LedgerReason::WelcomeBonus.code(), "WELCOME_BONUS");
        assert_eq!(LedgerReason::RoundWinBonus.code(), "ROUND_WIN_BONUS");
        assert_eq!(
            LedgerReason::RewardRedemption(RewardMethod::Robux).code(),
            "REWARD_REDEMPTION_ROBUX"
        );
        assert_eq!(
            LedgerReason::RewardRedemption(RewardMethod::Vbucks).code(),
            "REWARD_REDEMPTION_VBUCKS"
        );
    }
}
