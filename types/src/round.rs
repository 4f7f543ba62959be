use serde::{Deserialize, Serialize};

use crate::{MAX_GUESSES, WORD_LENGTH};

/// Round lifecycle.
///
/// `PendingAd` rounds hold no credential and accept no guesses; the ad
/// verification gate is the only path to `InProgress`. `Won` and `Lost` are
/// terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    PendingAd,
    InProgress,
    Won,
    Lost,
}

impl RoundStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Per-letter feedback mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterMark {
    Correct,
    Present,
    Absent,
}

/// One scored letter of a guess.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterScore {
    pub letter: char,
    pub mark: LetterMark,
}

/// Server-side round state. Carries the secret `target`, so this type is
/// only ever serialized into trusted storage; clients see [`RoundView`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRound {
    pub round_id: String,
    /// Calendar identifier (UTC `YYYY-MM-DD`) grouping rounds by day.
    pub day_id: String,
    pub target: String,
    pub guesses: Vec<String>,
    pub feedback: Vec<Vec<LetterScore>>,
    pub status: RoundStatus,
    pub word_length: usize,
    pub max_guesses: usize,
    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
    /// Opaque unguessable token, present only once the round has been
    /// ad-authorized. Required for every guess submission.
    pub credential: Option<String>,
}

impl GameRound {
    pub fn new(round_id: String, day_id: String, target: String, started_at_ms: u64) -> Self {
        Self {
            round_id,
            day_id,
            target,
            guesses: Vec::new(),
            feedback: Vec::new(),
            status: RoundStatus::PendingAd,
            word_length: WORD_LENGTH,
            max_guesses: MAX_GUESSES,
            started_at_ms,
            ended_at_ms: None,
            credential: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Client-facing projection of a round. Identical to [`GameRound`] minus
/// the secret target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundView {
    pub round_id: String,
    pub day_id: String,
    pub guesses: Vec<String>,
    pub feedback: Vec<Vec<LetterScore>>,
    pub status: RoundStatus,
    pub word_length: usize,
    pub max_guesses: usize,
    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
    pub credential: Option<String>,
}

impl From<&GameRound> for RoundView {
    fn from(round: &GameRound) -> Self {
        Self {
            round_id: round.round_id.clone(),
            day_id: round.day_id.clone(),
            guesses: round.guesses.clone(),
            feedback: round.feedback.clone(),
            status: round.status,
            word_length: round.word_length,
            max_guesses: round.max_guesses,
            started_at_ms: round.started_at_ms,
            ended_at_ms: round.ended_at_ms,
            credential: round.credential.clone(),
        }
    }
}

/// A single-use claim that a rewarded ad was fully watched. The event id is
/// a global dedup key: recording the same id twice must fail, never
/// silently succeed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCompletionEvent {
    pub event_id: String,
    pub ad_unit_id: String,
    pub user_id: String,
    pub day_id: String,
    pub verified: bool,
    pub timestamp_ms: u64,
}
