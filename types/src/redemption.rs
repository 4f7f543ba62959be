use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Reward program a gift card belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardMethod {
    Robux,
    Vbucks,
}

#[derive(Debug, ThisError, PartialEq, Eq)]
#[error("unknown reward method: {0}")]
pub struct UnknownRewardMethod(pub String);

impl RewardMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Robux => "robux",
            Self::Vbucks => "vbucks",
        }
    }
}

impl FromStr for RewardMethod {
    type Err = UnknownRewardMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "robux" => Ok(Self::Robux),
            "vbucks" => Ok(Self::Vbucks),
            other => Err(UnknownRewardMethod(other.to_string())),
        }
    }
}

/// Redemption lifecycle. `Rejected` is declared for manual-review or
/// fraud-flag extensions but no transition produces it yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Pending,
    Sent,
    Rejected,
}

#[derive(Debug, ThisError, PartialEq, Eq)]
#[error("unknown redemption status: {0}")]
pub struct UnknownRedemptionStatus(pub String);

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for RedemptionStatus {
    type Err = UnknownRedemptionStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownRedemptionStatus(other.to_string())),
        }
    }
}

/// One redemption of coins for a gift card. Created `Pending` with the
/// debit already on the ledger; flipped to `Sent` exactly once by the
/// fulfillment worker when a code is allocated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub id: String,
    pub user_id: String,
    pub method: RewardMethod,
    pub coins_spent: i64,
    pub value_usd: u32,
    pub status: RedemptionStatus,
    pub gift_card_code: Option<String>,
    pub created_at_ms: u64,
}

/// A single allocatable gift-card code. Once `used` the entry is
/// permanently excluded from allocation; at most one redemption record may
/// ever reference its code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub id: String,
    pub method: RewardMethod,
    pub value_usd: u32,
    pub code: String,
    pub used: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_round_trips_through_str() {
        for method in [RewardMethod::Robux, RewardMethod::Vbucks] {
            assert_eq!(method.as_str().parse::<RewardMethod>(), Ok(method));
        }
        assert!("paypal".parse::<RewardMethod>().is_err());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            RedemptionStatus::Pending,
            RedemptionStatus::Sent,
            RedemptionStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<RedemptionStatus>(), Ok(status));
        }
    }
}
