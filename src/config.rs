//! Runtime configuration
//!
//! Pacing knobs are read from the environment; anything missing or
//! unparseable falls back to the widget's defaults.

use std::time::Duration;

const DEFAULT_CHAR_DELAY_MS: u64 = 22;
const DEFAULT_PAUSE_MULTIPLIER: u32 = 6;
const DEFAULT_SETTLE_MS: u64 = 320;
const DEFAULT_LAYOUT_YIELD_MS: u64 = 16;
const DEFAULT_ENTRY_DELAY_MS: u64 = 260;

/// Timing of the typewriter reveal and step entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingConfig {
    /// Delay between revealed characters
    pub char_delay: Duration,
    /// Applied to `char_delay` after a sentence or clause terminator
    pub pause_multiplier: u32,
    /// Composing pause before a bubble starts revealing
    pub settle: Duration,
    /// Pause after a block-level node opens, before its children reveal
    pub layout_yield: Duration,
    /// Delay between committing a step and running its entry behavior
    pub entry_delay: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            char_delay: Duration::from_millis(DEFAULT_CHAR_DELAY_MS),
            pause_multiplier: DEFAULT_PAUSE_MULTIPLIER,
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            layout_yield: Duration::from_millis(DEFAULT_LAYOUT_YIELD_MS),
            entry_delay: Duration::from_millis(DEFAULT_ENTRY_DELAY_MS),
        }
    }
}

impl PacingConfig {
    /// No pacing at all; reveals complete in a single pass
    pub fn instant() -> Self {
        Self {
            char_delay: Duration::ZERO,
            pause_multiplier: 1,
            settle: Duration::ZERO,
            layout_yield: Duration::ZERO,
            entry_delay: Duration::ZERO,
        }
    }

    /// Pause to apply after revealing `ch`
    pub fn delay_after(&self, ch: char) -> Duration {
        if matches!(ch, '.' | '!' | '?' | ',') {
            self.char_delay * self.pause_multiplier
        } else {
            self.char_delay
        }
    }
}

/// Top-level configuration for the chat binary
#[derive(Debug, Clone, Default)]
pub struct DialogueConfig {
    pub pacing: PacingConfig,
}

impl DialogueConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let instant = lookup("BOXY_INSTANT")
            .is_some_and(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
        if instant {
            return Self {
                pacing: PacingConfig::instant(),
            };
        }

        let millis = |key: &str, default: u64| {
            Duration::from_millis(
                lookup(key)
                    .and_then(|value| value.trim().parse().ok())
                    .unwrap_or(default),
            )
        };

        Self {
            pacing: PacingConfig {
                char_delay: millis("BOXY_CHAR_DELAY_MS", DEFAULT_CHAR_DELAY_MS),
                pause_multiplier: lookup("BOXY_PAUSE_MULTIPLIER")
                    .and_then(|value| value.trim().parse().ok())
                    .unwrap_or(DEFAULT_PAUSE_MULTIPLIER),
                settle: millis("BOXY_SETTLE_MS", DEFAULT_SETTLE_MS),
                layout_yield: millis("BOXY_LAYOUT_YIELD_MS", DEFAULT_LAYOUT_YIELD_MS),
                entry_delay: millis("BOXY_ENTRY_DELAY_MS", DEFAULT_ENTRY_DELAY_MS),
            },
        }
    }
}
