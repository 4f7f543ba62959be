use rand::Rng;
use tracing::info;

use lexiloot_types::{
    AdCompletionEvent, EngineError, GameRound, LedgerReason, RoundStatus, RoundView,
    ROUND_WIN_BONUS_COINS, WORD_LIST,
};

use crate::scorer::score_guess;
use crate::state::{now_ms, utc_day_id};
use crate::{fresh_id, Engine};

impl Engine {
    /// Creates a round in `PendingAd` with a secret target drawn uniformly
    /// from the fixed word list. The target never leaves the engine; the
    /// returned view carries no credential until the ad gate authorizes it.
    pub fn create_round(&mut self, user_id: &str) -> Result<RoundView, EngineError> {
        if user_id.trim().is_empty() {
            return Err(EngineError::invalid_input("user id must not be empty"));
        }
        let target = WORD_LIST[self.rng.gen_range(0..WORD_LIST.len())].to_string();
        let now = now_ms();
        let round = GameRound::new(fresh_id("rd"), utc_day_id(now), target, now);
        info!(round_id = %round.round_id, day_id = %round.day_id, "round created");
        let view = RoundView::from(&round);
        self.sink.round(&round);
        self.state.rounds.insert(round.round_id.clone(), round);
        Ok(view)
    }

    /// Consumes an ad-completion event and makes the round playable. Event
    /// ids are deduplicated globally: a replay fails with `DuplicateEvent`
    /// no matter which round or user first claimed the id, and a failed
    /// call records nothing and flips no state. This is the sole path by
    /// which a round may become playable.
    pub fn authorize_round(
        &mut self,
        round_id: &str,
        ad_unit_id: &str,
        event_id: &str,
        user_id: &str,
    ) -> Result<RoundView, EngineError> {
        if event_id.trim().is_empty() {
            return Err(EngineError::invalid_input("event id must not be empty"));
        }
        if self.state.ad_events.contains_key(event_id) {
            return Err(EngineError::DuplicateEvent {
                event_id: event_id.to_string(),
            });
        }
        let Some(round) = self.state.rounds.get_mut(round_id) else {
            return Err(EngineError::NotFound {
                kind: "round",
                id: round_id.to_string(),
            });
        };
        if round.status != RoundStatus::PendingAd {
            return Err(EngineError::invalid_input(
                "round is not awaiting ad verification",
            ));
        }
        round.status = RoundStatus::InProgress;
        round.credential = Some(fresh_id("tok"));
        let view = RoundView::from(&*round);
        let snapshot = round.clone();

        let event = AdCompletionEvent {
            event_id: event_id.to_string(),
            ad_unit_id: ad_unit_id.to_string(),
            user_id: user_id.to_string(),
            day_id: snapshot.day_id.clone(),
            verified: true,
            timestamp_ms: now_ms(),
        };
        self.state
            .ad_events
            .insert(event_id.to_string(), event.clone());
        self.sink.ad_event(&event);
        self.sink.round(&snapshot);
        info!(round_id, event_id, "round authorized for play");
        Ok(view)
    }

    /// Scores one guess against the round's secret target. Requires the
    /// round-scoped credential minted at authorization; rounds still in
    /// `PendingAd` hold none and therefore always fail, and terminal rounds
    /// reject further guesses outright.
    pub fn submit_guess(
        &mut self,
        round_id: &str,
        guess: &str,
        credential: &str,
        user_id: &str,
    ) -> Result<RoundView, EngineError> {
        let Some(round) = self.state.rounds.get_mut(round_id) else {
            return Err(EngineError::NotFound {
                kind: "round",
                id: round_id.to_string(),
            });
        };
        if round.is_terminal() {
            return Err(EngineError::Unauthorized);
        }
        if round.credential.as_deref() != Some(credential) {
            return Err(EngineError::Unauthorized);
        }
        if !guess.chars().all(|letter| letter.is_ascii_alphabetic())
            || guess.len() != round.word_length
        {
            return Err(EngineError::invalid_input(format!(
                "guess must be exactly {} letters",
                round.word_length
            )));
        }

        let guess = guess.to_ascii_uppercase();
        let target = round.target.to_ascii_uppercase();
        round.feedback.push(score_guess(&guess, &target));
        let won = guess == target;
        round.guesses.push(guess);

        if won {
            round.status = RoundStatus::Won;
            round.ended_at_ms = Some(now_ms());
        } else if round.guesses.len() >= round.max_guesses {
            round.status = RoundStatus::Lost;
            round.ended_at_ms = Some(now_ms());
        }
        let terminal = round.is_terminal();
        let status = round.status;
        let view = RoundView::from(&*round);
        let snapshot = round.clone();

        self.sink.round(&snapshot);
        if won {
            self.append_ledger(user_id, ROUND_WIN_BONUS_COINS, LedgerReason::RoundWinBonus);
        }
        if terminal {
            self.record_round_outcome(user_id, won);
            info!(round_id, user_id, ?status, guesses = snapshot.guesses.len(), "round settled");
        }
        Ok(view)
    }
}
