//! Error taxonomy shared across the catalog and game layers.

use thiserror::Error;

use crate::catalog::transport::TransportError;

/// Result alias for catalog access operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failures surfaced by the catalog cache.
///
/// Transport problems and timeouts are recoverable: callers are expected to
/// degrade to an empty result set rather than crash. The [`Timeout`] variant
/// is kept separate so a UI can tell "no results" apart from "gave up
/// waiting".
///
/// [`Timeout`]: CatalogError::Timeout
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The underlying transport failed (network or server error).
    #[error("catalog transport failed")]
    Transport(#[from] TransportError),
    /// The fetch exceeded the configured time budget.
    #[error("catalog fetch timed out")]
    Timeout,
    /// The owning session was torn down before the fetch resolved.
    #[error("catalog fetch cancelled")]
    Cancelled,
}

/// Failures raised by game sessions.
///
/// A failed operation never touches prior session state; score and revealed
/// entries survive every error. Unresolved guesses are not errors, they are a
/// normal [`GuessOutcome`](crate::game::GuessOutcome).
#[derive(Debug, Error)]
pub enum GameError {
    /// The candidate pool resolved to zero items; the session refuses to
    /// start rather than declaring an instant victory.
    #[error("candidate pool is empty")]
    EmptyPool,
    /// The operation is not valid in the session's current phase.
    #[error("invalid phase for {operation}: {phase}")]
    InvalidPhase {
        /// Operation that was attempted.
        operation: &'static str,
        /// Phase the session was in, rendered for diagnostics.
        phase: String,
    },
    /// The catalog could not supply the candidate pool.
    #[error("catalog access failed")]
    Catalog(#[from] CatalogError),
}
