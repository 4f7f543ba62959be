/// Coins granted once when an account is first provisioned.
pub const WELCOME_BONUS_COINS: i64 = 150;

/// Coins credited for winning a round.
pub const ROUND_WIN_BONUS_COINS: i64 = 10;

/// Fixed cost of a gift-card redemption.
pub const REDEMPTION_COST_COINS: i64 = 100;

/// Nominal USD value of a redeemed gift card.
pub const REDEMPTION_VALUE_USD: u32 = 10;

/// Word length for every round.
pub const WORD_LENGTH: usize = 5;

/// Maximum guesses before a round is lost.
pub const MAX_GUESSES: usize = 6;

/// Delay before the fulfillment worker attempts to allocate a gift-card
/// code to a pending redemption. A policy parameter, not a correctness
/// requirement.
pub const DEFAULT_FULFILLMENT_DELAY_MS: u64 = 5_000;

/// The fixed pool of secret target words.
pub const WORD_LIST: [&str; 10] = [
    "PROUD", "SHARP", "BLOCK", "CHASE", "FIELD", "GUARD", "LEVEL", "SMART", "TRUST", "VALUE",
];
