//! Dispatch configuration.
//!
//! Each object carries its own copy; duplicates inherit the value at
//! duplication time.

use serde::{Deserialize, Serialize};

/// Environment variable toggling strict dispatch
pub const STRICT_ENV: &str = "STRATA_STRICT";

/// Environment variable toggling per-hop chain tracing
pub const TRACE_WALK_ENV: &str = "STRATA_TRACE_WALK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Raise `NoLayers`/`MethodNotImplemented` instead of dropping the call.
    ///
    /// Lenient mode returns `Value::Undefined` when the chain is exhausted,
    /// so a terminal callback further down never fires.
    pub strict: bool,
    /// Emit a `trace!` event for every layer visited during a walk
    pub trace_walk: bool,
}

impl DispatchConfig {
    /// Strict configuration (exhausted chains are errors)
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Lenient configuration (exhausted chains are silent no-ops)
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Toggle per-hop tracing
    pub fn with_trace_walk(mut self, enabled: bool) -> Self {
        self.trace_walk = enabled;
        self
    }

    /// Overlay values from `STRATA_STRICT` / `STRATA_TRACE_WALK`.
    ///
    /// Unset or unparseable variables leave the current value in place.
    pub fn merge_with_env(&mut self) {
        if let Some(strict) = env_flag(STRICT_ENV) {
            self.strict = strict;
        }
        if let Some(trace_walk) = env_flag(TRACE_WALK_ENV) {
            self.trace_walk = trace_walk;
        }
    }

    /// Default configuration with the environment overlaid
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.merge_with_env();
        config
    }
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|raw| parse_flag(&raw))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
