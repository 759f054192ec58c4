//! The mystery item game: identify a hidden item from gradually revealed
//! hints before the round countdown expires.

use std::collections::{HashSet, VecDeque};

use rand::seq::IndexedRandom;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::filter::FilterProperty;
use crate::catalog::records::Item;
use crate::config::EngineConfig;
use crate::error::GameError;
use crate::game::matcher::NameMatcher;

use super::{
    Clock, GUESS_HISTORY_LEN, GuessOutcome, LeaveCheck, RevealedEntry, Session, SessionContext,
};

/// Tier id of the exotic rarity, the default mystery pool.
const EXOTIC_TIER_TYPE: u32 = 2;

/// Properties of the hidden item that can be offered as hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    /// Weapon or armor.
    ItemType,
    /// Flavor text.
    FlavorText,
    /// Rarity tier.
    Tier,
    /// Fine-grained category.
    Category,
    /// Weapon slot.
    WeaponSlot,
    /// Ammo type.
    WeaponAmmoType,
    /// Damage type.
    DamageType,
    /// Character class.
    ClassType,
    /// Intrinsic perk.
    IntrinsicPerk,
}

/// A countdown value at which a hint becomes visible.
///
/// Thresholds are evaluated against the falling countdown: the hint fires on
/// the first tick where `remaining <= time_ms` and stays revealed for the
/// rest of the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HintThreshold {
    /// Countdown value (milliseconds) at or below which the hint shows.
    pub time_ms: u64,
    /// Hint unlocked by this threshold.
    pub hint: HintKind,
}

/// Phases of a mystery item run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MysteryPhase {
    /// Pool is being assembled; no round yet.
    Setup,
    /// A round is running: a target is hidden and the countdown falls.
    RoundActive,
    /// The target was named in time; the answer is on display before the
    /// next round starts.
    RoundWon,
    /// Every pool item was found. Terminal.
    Victory,
    /// A countdown expired without a correct guess. Terminal.
    GameOver,
}

/// Session state for one mystery item run.
#[derive(Debug)]
pub struct MysteryItemSession {
    id: Uuid,
    pool: Vec<Item>,
    matcher: NameMatcher,
    fuzzy_max_distance: usize,
    thresholds: Vec<HintThreshold>,
    round_duration_ms: u64,
    phase: MysteryPhase,
    target_id: Option<u64>,
    targeted: HashSet<u64>,
    revealed: Vec<RevealedEntry>,
    revealed_hints: Vec<HintKind>,
    score: u32,
    recent_guesses: VecDeque<String>,
    clock: Clock,
}

impl MysteryItemSession {
    /// Assemble the pool and enter Setup.
    ///
    /// Without a preselected subset the pool defaults to the exotic tier of
    /// the catalog, fetched through the cache; transport failures degrade to
    /// an empty pool, rejected as [`GameError::EmptyPool`].
    pub async fn start(
        ctx: &SessionContext,
        preselected: Option<Vec<Item>>,
    ) -> Result<Self, GameError> {
        let pool = match preselected {
            Some(pool) => pool,
            None => {
                let params = vec![(
                    FilterProperty::TierType.query_key().to_owned(),
                    EXOTIC_TIER_TYPE.to_string(),
                )];
                ctx.cache
                    .get_all_items_or_empty(&ctx.locale, &params, Default::default(), &ctx.cancel)
                    .await
                    .as_ref()
                    .clone()
            }
        };

        Self::from_pool(pool, &ctx.config)
    }

    /// Build a session over an already-resolved pool, in Setup.
    pub fn from_pool(pool: Vec<Item>, config: &EngineConfig) -> Result<Self, GameError> {
        if pool.is_empty() {
            return Err(GameError::EmptyPool);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            pool,
            matcher: config.matcher,
            fuzzy_max_distance: config.fuzzy_max_distance,
            thresholds: config.thresholds.clone(),
            round_duration_ms: config.round_duration_ms,
            phase: MysteryPhase::Setup,
            target_id: None,
            targeted: HashSet::new(),
            revealed: Vec::new(),
            revealed_hints: Vec::new(),
            score: 0,
            recent_guesses: VecDeque::new(),
            clock: Clock::new(config.tick_interval()),
        })
    }

    /// Start the first round.
    pub fn begin(&mut self) -> Result<(), GameError> {
        if self.phase != MysteryPhase::Setup {
            return Err(self.invalid_phase("begin"));
        }
        self.next_round();
        Ok(())
    }

    /// Stable identifier of this run.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> MysteryPhase {
        self.phase
    }

    /// Id of the current round's hidden item, if a round is live.
    pub fn target_id(&self) -> Option<u64> {
        self.target_id
    }

    /// The current round's hidden item.
    pub fn target(&self) -> Option<&Item> {
        let target_id = self.target_id?;
        self.pool.iter().find(|item| item.id == target_id)
    }

    /// Hints revealed so far this round, in reveal order.
    pub fn revealed_hints(&self) -> &[HintKind] {
        &self.revealed_hints
    }

    /// The session's countdown clock.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Last few raw guesses, oldest first.
    pub fn recent_guesses(&self) -> impl Iterator<Item = &str> {
        self.recent_guesses.iter().map(String::as_str)
    }

    /// Feed one countdown value into the session: unlock due hints and
    /// detect round expiry. Hints never un-reveal within a round.
    pub fn on_tick(&mut self, remaining_ms: u64) {
        if self.phase != MysteryPhase::RoundActive {
            return;
        }

        for index in 0..self.thresholds.len() {
            let threshold = self.thresholds[index];
            if remaining_ms <= threshold.time_ms && !self.revealed_hints.contains(&threshold.hint)
            {
                debug!(hint = ?threshold.hint, remaining_ms, "hint revealed");
                self.revealed_hints.push(threshold.hint);
            }
        }

        if remaining_ms == 0 {
            self.phase = MysteryPhase::GameOver;
            self.clock.stop();
        }
    }

    /// Move from RoundWon to the next round (or Victory when the pool is
    /// exhausted). The caller drives this after the configured display
    /// delay; [`run_round_delay`](Self::run_round_delay) awaits that delay.
    pub fn advance_round(&mut self) -> Result<MysteryPhase, GameError> {
        if self.phase != MysteryPhase::RoundWon {
            return Err(self.invalid_phase("advance_round"));
        }
        self.next_round();
        Ok(self.phase)
    }

    /// Sleep out the post-win display delay, cancelled by the context's
    /// token. Returns `false` when cancelled; the caller must then drop the
    /// session instead of advancing it.
    pub async fn run_round_delay(ctx: &SessionContext) -> bool {
        tokio::select! {
            _ = ctx.cancel.cancelled() => false,
            _ = tokio::time::sleep(ctx.config.round_advance_delay()) => true,
        }
    }

    fn next_round(&mut self) {
        let remaining: Vec<&Item> = self
            .pool
            .iter()
            .filter(|item| !self.targeted.contains(&item.id))
            .collect();

        let Some(target) = remaining.choose(&mut rand::rng()) else {
            // Pool exhausted: every item found means victory, anything else
            // can only happen on an empty starting pool.
            self.phase = if self.score as usize == self.pool.len() {
                MysteryPhase::Victory
            } else {
                MysteryPhase::GameOver
            };
            self.clock.stop();
            return;
        };

        self.target_id = Some(target.id);
        self.targeted.insert(target.id);
        self.revealed_hints.clear();
        self.phase = MysteryPhase::RoundActive;
        self.clock.start_countdown(self.round_duration_ms);
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

impl Session for MysteryItemSession {
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
        self.clock.remaining_ms()
    }

    /// A guess only counts against the current round's target; naming any
    /// other pool item, however correctly, resolves to nothing.
    fn submit_guess(&mut self, text: &str) -> GuessOutcome {
        if self.phase != MysteryPhase::RoundActive {
            return GuessOutcome::Unresolved;
        }
        self.push_guess(text);

        let Some(target_id) = self.target_id else {
            return GuessOutcome::Unresolved;
        };

        match self.matcher.match_exact(text, &self.pool) {
            Some(item) if item.id == target_id => {
                let entry = RevealedEntry {
                    item_id: item.id,
                    kind: item.kind.item_type_id(),
                };
                self.revealed.push(entry);
                self.score += 1;
                self.clock.pause();
                self.phase = MysteryPhase::RoundWon;
                GuessOutcome::Correct { item_id: target_id }
            }
            Some(_) => GuessOutcome::Unresolved,
            None => {
                let Some(target) = self.pool.iter().find(|item| item.id == target_id) else {
                    return GuessOutcome::Unresolved;
                };
                match self.matcher.match_fuzzy(
                    text,
                    std::slice::from_ref(target),
                    self.fuzzy_max_distance,
                ) {
                    Some(near) => GuessOutcome::Near {
                        suggestion: near.localized_name.clone(),
                    },
                    None => GuessOutcome::Unresolved,
                }
            }
        }
    }

    /// A mystery round is always abandonable mid-guess, so the prompt has no
    /// "already complete" shortcut.
    fn can_leave(&self) -> LeaveCheck {
        match self.phase {
            MysteryPhase::RoundActive | MysteryPhase::RoundWon => LeaveCheck::NeedsConfirmation,
            _ => LeaveCheck::Allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::records::ItemKind;

    fn named(id: u64, name: &str) -> Item {
        Item {
            id,
            localized_name: name.to_owned(),
            localized_flavor_text: String::new(),
            tier_type: EXOTIC_TIER_TYPE,
            category: 9,
            icon_url: None,
            screenshot_url: None,
            localized_stats: Vec::new(),
            localized_perks: Vec::new(),
            kind: ItemKind::Weapon {
                default_damage_type: 1,
                weapon_ammo_type: 1,
                localized_weapon_slot: String::new(),
                localized_weapon_ammo_type: String::new(),
            },
        }
    }

    fn running_session(pool: Vec<Item>) -> MysteryItemSession {
        let mut session =
            MysteryItemSession::from_pool(pool, &EngineConfig::default()).unwrap();
        session.begin().unwrap();
        session
    }

    fn target_name(session: &MysteryItemSession) -> String {
        session.target().unwrap().localized_name.clone()
    }

    #[tokio::test]
    async fn empty_pool_refuses_to_start() {
        let err =
            MysteryItemSession::from_pool(Vec::new(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, GameError::EmptyPool));
    }

    #[tokio::test]
    async fn begin_draws_a_target_and_starts_the_countdown() {
        let session = running_session(vec![named(1, "Ace"), named(2, "Bane")]);
        assert_eq!(session.phase(), MysteryPhase::RoundActive);
        assert!(session.target_id().is_some());
        assert_eq!(session.clock_ms(), 40_000);
    }

    #[tokio::test]
    async fn naming_another_pool_item_does_not_count() {
        let mut session = running_session(vec![named(1, "Ace"), named(2, "Bane")]);
        let wrong = if session.target_id() == Some(1) {
            "Bane"
        } else {
            "Ace"
        };

        assert_eq!(session.submit_guess(wrong), GuessOutcome::Unresolved);
        assert_eq!(session.score(), 0);
        assert!(session.revealed().is_empty());
        assert_eq!(session.phase(), MysteryPhase::RoundActive);
    }

    #[tokio::test]
    async fn correct_guess_wins_the_round_and_pauses_the_clock() {
        let mut session = running_session(vec![named(1, "Ace"), named(2, "Bane")]);
        let name = target_name(&session);

        let outcome = session.submit_guess(&name);
        assert!(matches!(outcome, GuessOutcome::Correct { .. }));
        assert_eq!(session.score(), 1);
        assert_eq!(session.phase(), MysteryPhase::RoundWon);
        assert!(!session.clock().is_running());
    }

    #[tokio::test]
    async fn rounds_never_repeat_a_target_and_end_in_victory() {
        let mut session = running_session(vec![named(1, "Ace"), named(2, "Bane")]);
        let mut seen = Vec::new();

        for _ in 0..2 {
            seen.push(session.target_id().unwrap());
            let name = target_name(&session);
            session.submit_guess(&name);
            session.advance_round().unwrap();
        }

        assert_eq!(session.phase(), MysteryPhase::Victory);
        assert_eq!(session.score(), 2);
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn hints_unlock_monotonically_as_the_countdown_falls() {
        let mut session = running_session(vec![named(1, "Ace"), named(2, "Bane")]);

        session.on_tick(39_000);
        let early: Vec<HintKind> = session.revealed_hints().to_vec();
        assert_eq!(
            early,
            vec![HintKind::ItemType, HintKind::FlavorText, HintKind::Tier]
        );

        session.on_tick(30_000);
        assert!(session.revealed_hints().contains(&HintKind::Category));
        assert!(session.revealed_hints().contains(&HintKind::WeaponSlot));
        assert!(!session.revealed_hints().contains(&HintKind::IntrinsicPerk));

        session.on_tick(12_000);
        assert!(session.revealed_hints().contains(&HintKind::IntrinsicPerk));

        // Hints stay revealed on later ticks; no duplicates either.
        let count = session.revealed_hints().len();
        session.on_tick(11_000);
        assert_eq!(session.revealed_hints().len(), count);
    }

    #[tokio::test]
    async fn countdown_expiry_ends_the_game_without_revealing() {
        let mut session = running_session(vec![named(1, "Ace"), named(2, "Bane")]);

        session.on_tick(1000);
        assert_eq!(session.phase(), MysteryPhase::RoundActive);

        session.on_tick(0);
        assert_eq!(session.phase(), MysteryPhase::GameOver);
        assert!(session.revealed().is_empty());

        // A dead session ignores guesses.
        assert_eq!(session.submit_guess("Ace"), GuessOutcome::Unresolved);
        assert_eq!(session.score(), 0);
    }

    #[tokio::test]
    async fn hints_reset_between_rounds() {
        let mut session = running_session(vec![named(1, "Ace"), named(2, "Bane")]);
        session.on_tick(12_000);
        assert!(!session.revealed_hints().is_empty());

        let name = target_name(&session);
        session.submit_guess(&name);
        session.advance_round().unwrap();

        assert_eq!(session.phase(), MysteryPhase::RoundActive);
        assert!(session.revealed_hints().is_empty());
        assert_eq!(session.clock_ms(), 40_000);
    }

    #[tokio::test]
    async fn near_miss_on_the_target_suggests_its_name() {
        let mut session = running_session(vec![named(1, "Hawkmoon")]);
        assert_eq!(
            session.submit_guess("hawkmon"),
            GuessOutcome::Near {
                suggestion: "Hawkmoon".into()
            }
        );
        assert_eq!(session.score(), 0);
    }

    #[tokio::test]
    async fn leave_prompt_fires_whenever_a_round_is_live() {
        let mut session = running_session(vec![named(1, "Ace")]);
        assert_eq!(session.can_leave(), LeaveCheck::NeedsConfirmation);

        session.on_tick(0);
        assert_eq!(session.can_leave(), LeaveCheck::Allowed);
    }
}
