//! The exo challenge: reveal every item of the pool by naming it, against a
//! stopwatch.

use std::collections::VecDeque;

use uuid::Uuid;

use crate::catalog::records::Item;
use crate::error::GameError;
use crate::game::matcher::NameMatcher;

use super::{
    Clock, GUESS_HISTORY_LEN, GuessOutcome, LeaveCheck, RevealedEntry, Session, SessionContext,
};

/// Phases of an exo challenge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExoPhase {
    /// Pool is being assembled; no guesses accepted yet.
    Setup,
    /// Guessing in progress.
    Active,
    /// Every pool item was revealed. Terminal.
    Victory,
    /// The user gave up before completing the pool. Terminal.
    Abandoned,
}

/// Session state for one exo challenge run.
///
/// The pool is fixed at start; a correct guess reveals its item exactly once
/// and victory fires the moment the revealed set covers the pool.
#[derive(Debug)]
pub struct ExoChallengeSession {
    id: Uuid,
    pool: Vec<Item>,
    matcher: NameMatcher,
    fuzzy_max_distance: usize,
    phase: ExoPhase,
    revealed: Vec<RevealedEntry>,
    score: u32,
    recent_guesses: VecDeque<String>,
    clock: Clock,
}

impl ExoChallengeSession {
    /// Assemble the pool from the active filter state. The session comes
    /// back in Setup; call [`begin`](Self::begin) to start playing.
    ///
    /// When `preselected` is given it becomes the pool as-is, bypassing
    /// filters entirely; otherwise the full catalog is fetched and the
    /// engine's predicate applied client-side. Transport failures degrade to
    /// an empty pool, which is rejected as [`GameError::EmptyPool`].
    pub async fn start(
        ctx: &SessionContext,
        engine: &crate::catalog::filter::FilterSortEngine,
        preselected: Option<Vec<Item>>,
    ) -> Result<Self, GameError> {
        let pool = match preselected {
            Some(pool) => pool,
            None => {
                let snapshot = ctx
                    .cache
                    .get_all_items_or_empty(&ctx.locale, &[], engine.ordering(), &ctx.cancel)
                    .await;
                let groups = engine.group_by_property();
                snapshot
                    .iter()
                    .filter(|item| groups.matches(item))
                    .cloned()
                    .collect()
            }
        };

        Self::from_pool(pool, &ctx.config)
    }

    /// Build a session over an already-resolved pool, in Setup.
    pub fn from_pool(
        pool: Vec<Item>,
        config: &crate::config::EngineConfig,
    ) -> Result<Self, GameError> {
        if pool.is_empty() {
            return Err(GameError::EmptyPool);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            pool,
            matcher: config.matcher,
            fuzzy_max_distance: config.fuzzy_max_distance,
            phase: ExoPhase::Setup,
            revealed: Vec::new(),
            score: 0,
            recent_guesses: VecDeque::new(),
            clock: Clock::new(config.tick_interval()),
        })
    }

    /// Start the run: the stopwatch begins and guesses are accepted.
    pub fn begin(&mut self) -> Result<(), GameError> {
        if self.phase != ExoPhase::Setup {
            return Err(self.invalid_phase("begin"));
        }
        self.clock.start_stopwatch();
        self.phase = ExoPhase::Active;
        Ok(())
    }

    /// Stable identifier of this run.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> ExoPhase {
        self.phase
    }

    /// The session's stopwatch.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Last few raw guesses, oldest first.
    pub fn recent_guesses(&self) -> impl Iterator<Item = &str> {
        self.recent_guesses.iter().map(String::as_str)
    }

    /// Whether `item_id` has been revealed in this run.
    pub fn is_revealed(&self, item_id: u64) -> bool {
        self.revealed.iter().any(|entry| entry.item_id == item_id)
    }

    /// Give up on the run. Only meaningful while active.
    pub fn abandon(&mut self) {
        if self.phase == ExoPhase::Active {
            self.phase = ExoPhase::Abandoned;
            self.clock.stop();
        }
    }

    fn invalid_phase(&self, operation: &'static str) -> GameError {
        GameError::InvalidPhase {
            operation,
            phase: format!("{:?}", self.phase),
        }
    }

    fn push_guess(&mut self, text: &str) {
        if self.recent_guesses.len() >= GUESS_HISTORY_LEN {
            self.recent_guesses.pop_front();
        }
        self.recent_guesses.push_back(text.to_owned());
    }
}

impl Session for ExoChallengeSession {
    fn visible_items(&self) -> &[Item] {
        &self.pool
    }

    fn revealed(&self) -> &[RevealedEntry] {
        &self.revealed
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn clock_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    fn submit_guess(&mut self, text: &str) -> GuessOutcome {
        if self.phase != ExoPhase::Active {
            return GuessOutcome::Unresolved;
        }
        self.push_guess(text);

        let Some(item) = self.matcher.match_exact(text, &self.pool) else {
            if let Some(near) = self
                .matcher
                .match_fuzzy(text, &self.pool, self.fuzzy_max_distance)
            {
                return GuessOutcome::Near {
                    suggestion: near.localized_name.clone(),
                };
            }
            return GuessOutcome::Unresolved;
        };

        if self.is_revealed(item.id) {
            return GuessOutcome::AlreadyRevealed { item_id: item.id };
        }

        let entry = RevealedEntry {
            item_id: item.id,
            kind: item.kind.item_type_id(),
        };
        let item_id = entry.item_id;
        self.revealed.push(entry);
        self.score += 1;

        if self.revealed.len() == self.pool.len() {
            self.phase = ExoPhase::Victory;
            self.clock.stop();
        }

        GuessOutcome::Correct { item_id }
    }

    /// Only an unfinished active run warrants a prompt; abandoning already
    /// confirmed giving up, so terminal phases navigate freely.
    fn can_leave(&self) -> LeaveCheck {
        match self.phase {
            ExoPhase::Active if self.revealed.len() < self.pool.len() => {
                LeaveCheck::NeedsConfirmation
            }
            _ => LeaveCheck::Allowed,
        }
    }
}
