//! Session engine and catalog access layer for timed collectible-guessing
//! minigames.
//!
//! The crate splits into two halves. [`catalog`] talks to the item catalog
//! API: typed wire records, a transport trait with an HTTP implementation, a
//! process-wide cache that flattens paginated listings, and the filter, sort
//! and pagination helpers the browsing views build on. [`game`] hosts the two
//! minigame session state machines (the exo challenge and the mystery item
//! game) together with their shared plumbing: name matching, the tick clock,
//! and the session trait the presentation layer consumes.
//!
//! Hosts assemble a [`game::SessionContext`] from a [`catalog::CatalogCache`]
//! and an [`EngineConfig`](config::EngineConfig), then drive a session through the
//! [`game::Session`] trait. Cancelling the context's token aborts the
//! session's outstanding fetches and timers.

pub mod cancel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod game;

pub use self::cancel::Cancellation;
pub use self::config::EngineConfig;
pub use self::error::{CatalogError, CatalogResult, GameError};
