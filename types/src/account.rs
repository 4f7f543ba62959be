use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error as ThisError;

/// KYC lifecycle for an account. The status is recorded but nothing in the
/// core acts on it yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    #[default]
    None,
    Pending,
    Verified,
}

#[derive(Debug, ThisError, PartialEq, Eq)]
#[error("unknown kyc status: {0}")]
pub struct UnknownKycStatus(pub String);

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
        }
    }
}

impl FromStr for KycStatus {
    type Err = UnknownKycStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "NONE" => Ok(Self::None),
            "PENDING" => Ok(Self::Pending),
            "VERIFIED" => Ok(Self::Verified),
            other => Err(UnknownKycStatus(other.to_string())),
        }
    }
}

/// A user account. Balance is deliberately absent: it is always the fold
/// over the user's ledger entries, never a stored attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: String,
    pub username: String,
    pub kyc_status: KycStatus,
    pub games_played: u64,
    pub wins: u64,
    pub fraud_flags: Vec<String>,
}

impl UserAccount {
    pub fn new(user_id: &str) -> Self {
        let prefix: String = user_id.chars().take(5).collect();
        Self {
            user_id: user_id.to_string(),
            username: format!("Player_{prefix}"),
            kyc_status: KycStatus::None,
            games_played: 0,
            wins: 0,
            fraud_flags: Vec::new(),
        }
    }
}

/// Client-facing profile: the account merged with the freshly derived
/// balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub username: String,
    pub balance: i64,
    pub kyc_status: KycStatus,
    pub games_played: u64,
    pub wins: u64,
    pub fraud_flags: Vec<String>,
}

impl UserProfile {
    pub fn from_account(account: &UserAccount, balance: i64) -> Self {
        Self {
            user_id: account.user_id.clone(),
            username: account.username.clone(),
            balance,
            kyc_status: account.kyc_status,
            games_played: account.games_played,
            wins: account.wins,
            fraud_flags: account.fraud_flags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_derives_from_user_id_prefix() {
        assert_eq!(UserAccount::new("anon_4f2k9x").username, "Player_anon_");
        assert_eq!(UserAccount::new("ab").username, "Player_ab");
    }

    #[test]
    fn kyc_status_round_trips_through_str() {
        for status in [KycStatus::None, KycStatus::Pending, KycStatus::Verified] {
            assert_eq!(status.as_str().parse::<KycStatus>(), Ok(status));
        }
        assert!("nope".parse::<KycStatus>().is_err());
    }
}
