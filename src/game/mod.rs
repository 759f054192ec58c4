//! Game sessions: the two guessing minigames and their shared plumbing.

pub mod clock;
pub mod exo_challenge;
pub mod matcher;
pub mod mystery_item;

use std::sync::Arc;

use crate::cancel::Cancellation;
use crate::catalog::cache::CatalogCache;
use crate::catalog::records::Item;
use crate::config::EngineConfig;

pub use self::clock::Clock;
pub use self::exo_challenge::ExoChallengeSession;
pub use self::matcher::NameMatcher;
pub use self::mystery_item::MysteryItemSession;

/// An item solved within a session, recorded once per item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedEntry {
    /// Id of the revealed item.
    pub item_id: u64,
    /// Top-level classification (weapon vs armor) of the revealed item.
    pub kind: u32,
}

/// Result of feeding one guess into a session.
///
/// Only [`Correct`](GuessOutcome::Correct) changes session state; every other
/// outcome is a silent no-op, which makes guess submission idempotent under
/// repeated identical input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The guess named an unrevealed pool item; it is now revealed.
    Correct {
        /// Id of the newly revealed item.
        item_id: u64,
    },
    /// The guess named an item that was already revealed.
    AlreadyRevealed {
        /// Id of the previously revealed item.
        item_id: u64,
    },
    /// The guess resolved to nothing, but a candidate sits within fuzzy
    /// distance; its name is offered as feedback.
    Near {
        /// Display name of the closest candidate.
        suggestion: String,
    },
    /// The guess resolved to nothing.
    Unresolved,
}

/// Answer to "can the user navigate away right now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveCheck {
    /// Leaving loses nothing; no prompt needed.
    Allowed,
    /// An unfinished game is in progress; ask the user to confirm.
    NeedsConfirmation,
}

/// Everything a session needs from its host, bundled explicitly instead of
/// reached through process-wide singletons. The context is created on view
/// entry and disposed on teardown; cancelling it aborts the session's
/// outstanding fetches and timers.
#[derive(Clone)]
pub struct SessionContext {
    /// Shared catalog reader.
    pub cache: Arc<CatalogCache>,
    /// Engine tuning knobs.
    pub config: Arc<EngineConfig>,
    /// Locale candidate names are fetched in.
    pub locale: String,
    /// Cancellation signal for the session's lifetime.
    pub cancel: Cancellation,
}

impl SessionContext {
    /// Bundle a context for one session.
    pub fn new(cache: Arc<CatalogCache>, config: Arc<EngineConfig>, locale: impl Into<String>) -> Self {
        Self {
            cache,
            config,
            locale: locale.into(),
            cancel: Cancellation::new(),
        }
    }
}

/// Interface both minigames expose to the presentation layer.
pub trait Session {
    /// Candidate pool the session plays against.
    fn visible_items(&self) -> &[Item];

    /// Items revealed so far, in reveal order.
    fn revealed(&self) -> &[RevealedEntry];

    /// Current score.
    fn score(&self) -> u32;

    /// Live clock value in milliseconds (remaining for countdown games,
    /// elapsed for stopwatch games).
    fn clock_ms(&self) -> u64;

    /// Feed one guess into the session.
    fn submit_guess(&mut self, text: &str) -> GuessOutcome;

    /// Whether navigation away needs a confirmation prompt.
    fn can_leave(&self) -> LeaveCheck;
}

/// Number of raw guesses each session keeps for display.
pub(crate) const GUESS_HISTORY_LEN: usize = 5;
