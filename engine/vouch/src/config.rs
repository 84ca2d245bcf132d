//! Engine configuration.
//!
//! | Variable                              | Default |
//! |---------------------------------------|---------|
//! | `VOUCH_DEFAULT_TIMEOUT_MS`            | 5000    |
//! | `VOUCH_MAX_PRETTY_PRINT_DEPTH`        | 8       |
//! | `VOUCH_MAX_PRETTY_PRINT_ARRAY_LENGTH` | 50      |
//! | `VOUCH_MAX_PRETTY_PRINT_CHARS`        | 1000    |

use std::str::FromStr;
use std::time::Duration;

use vouch_async::DEFAULT_TIMEOUT;
use vouch_value::PrintLimits;

pub const DEFAULT_TIMEOUT_VAR: &str = "VOUCH_DEFAULT_TIMEOUT_MS";
pub const MAX_DEPTH_VAR: &str = "VOUCH_MAX_PRETTY_PRINT_DEPTH";
pub const MAX_ARRAY_LENGTH_VAR: &str = "VOUCH_MAX_PRETTY_PRINT_ARRAY_LENGTH";
pub const MAX_CHARS_VAR: &str = "VOUCH_MAX_PRETTY_PRINT_CHARS";

/// Settings for one run context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long async expectations wait when no timeout is given.
    pub default_timeout: Duration,
    pub max_pretty_print_depth: usize,
    pub max_pretty_print_array_length: usize,
    pub max_pretty_print_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let limits = PrintLimits::default();
        EngineConfig {
            default_timeout: DEFAULT_TIMEOUT,
            max_pretty_print_depth: limits.max_depth,
            max_pretty_print_array_length: limits.max_array_length,
            max_pretty_print_chars: limits.max_chars,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by the `VOUCH_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    /// Values that do not parse are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = EngineConfig::default();
        if let Some(ms) = parse_var::<u64>(&lookup, DEFAULT_TIMEOUT_VAR) {
            config.default_timeout = Duration::from_millis(ms);
        }
        if let Some(depth) = parse_var(&lookup, MAX_DEPTH_VAR) {
            config.max_pretty_print_depth = depth;
        }
        if let Some(len) = parse_var(&lookup, MAX_ARRAY_LENGTH_VAR) {
            config.max_pretty_print_array_length = len;
        }
        if let Some(chars) = parse_var(&lookup, MAX_CHARS_VAR) {
            config.max_pretty_print_chars = chars;
        }
        config
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn print_limits(&self) -> PrintLimits {
        PrintLimits {
            max_depth: self.max_pretty_print_depth,
            max_array_length: self.max_pretty_print_array_length,
            max_chars: self.max_pretty_print_chars,
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring invalid configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests;
