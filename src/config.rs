//! Engine configuration loading, including the hint threshold table.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::game::matcher::NameMatcher;
use crate::game::mystery_item::{HintKind, HintThreshold};

/// Default location on disk where the engine looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/engine.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RELIC_GUESSR_CONFIG_PATH";

/// Immutable runtime configuration shared across sessions and views.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Countdown length of one mystery round, in milliseconds.
    pub round_duration_ms: u64,
    /// Delay between a correct mystery guess and the next round, in
    /// milliseconds, so the answer stays on screen.
    pub round_advance_delay_ms: u64,
    /// Clock tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Time budget for one catalog request, in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Server-side page size used by the browsing views.
    pub page_size: u32,
    /// Maximum edit distance for near-miss guess feedback.
    pub fuzzy_max_distance: usize,
    /// Name normalization settings.
    pub matcher: NameMatcher,
    /// Countdown values at which each hint becomes visible, ordered by
    /// firing order (highest threshold first).
    pub thresholds: Vec<HintThreshold>,
}

impl EngineConfig {
    /// Load the configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded engine config");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Catalog request time budget.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Clock tick interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Delay between a correct mystery guess and the next round.
    pub fn round_advance_delay(&self) -> Duration {
        Duration::from_millis(self.round_advance_delay_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            round_duration_ms: 40_000,
            round_advance_delay_ms: 4_000,
            tick_interval_ms: 1_000,
            fetch_timeout_ms: 65_000,
            page_size: 42,
            fuzzy_max_distance: 2,
            matcher: NameMatcher::default(),
            thresholds: default_thresholds(),
        }
    }
}

/// JSON representation of the configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    round_duration_ms: Option<u64>,
    round_advance_delay_ms: Option<u64>,
    tick_interval_ms: Option<u64>,
    fetch_timeout_ms: Option<u64>,
    page_size: Option<u32>,
    fuzzy_max_distance: Option<usize>,
    matcher: Option<NameMatcher>,
    thresholds: Option<Vec<HintThreshold>>,
}

impl From<RawConfig> for EngineConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            round_duration_ms: raw.round_duration_ms.unwrap_or(defaults.round_duration_ms),
            round_advance_delay_ms: raw
                .round_advance_delay_ms
                .unwrap_or(defaults.round_advance_delay_ms),
            tick_interval_ms: raw.tick_interval_ms.unwrap_or(defaults.tick_interval_ms),
            fetch_timeout_ms: raw.fetch_timeout_ms.unwrap_or(defaults.fetch_timeout_ms),
            page_size: raw.page_size.unwrap_or(defaults.page_size),
            fuzzy_max_distance: raw
                .fuzzy_max_distance
                .unwrap_or(defaults.fuzzy_max_distance),
            matcher: raw.matcher.unwrap_or(defaults.matcher),
            thresholds: raw.thresholds.unwrap_or(defaults.thresholds),
        }
    }
}

/// Resolve the configuration path taking the environment override into
/// account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in hint schedule: identity hints are visible from the start, the
/// rest unlock as the countdown falls.
fn default_thresholds() -> Vec<HintThreshold> {
    vec![
        HintThreshold {
            time_ms: u64::MAX,
            hint: HintKind::ItemType,
        },
        HintThreshold {
            time_ms: u64::MAX,
            hint: HintKind::FlavorText,
        },
        HintThreshold {
            time_ms: u64::MAX,
            hint: HintKind::Tier,
        },
        HintThreshold {
            time_ms: 30_000,
            hint: HintKind::Category,
        },
        HintThreshold {
            time_ms: 30_000,
            hint: HintKind::WeaponSlot,
        },
        HintThreshold {
            time_ms: 20_000,
            hint: HintKind::WeaponAmmoType,
        },
        HintThreshold {
            time_ms: 20_000,
            hint: HintKind::DamageType,
        },
        HintThreshold {
            time_ms: 20_000,
            hint: HintKind::ClassType,
        },
        HintThreshold {
            time_ms: 12_500,
            hint: HintKind::IntrinsicPerk,
        },
    ]
}
