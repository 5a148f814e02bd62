//! Session configuration loaded from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default quiet period before an instant-search candidate is released.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default capacity of the ordered intent channel.
pub const DEFAULT_INTENT_CAPACITY: usize = 64;

/// Upper bound accepted for the debounce window.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Tunables applied to every session opened by a handler.
///
/// ```toml
/// debounce_ms = 250
/// intent_capacity = 128
/// instant_search = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
	/// Debounce window for instant-search candidates, in milliseconds.
	pub debounce_ms: u64,
	/// Capacity of the channel between the trigger merge task and the coordinator.
	pub intent_capacity: usize,
	/// Instant-search state a fresh session starts with.
	pub instant_search: bool,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			debounce_ms: DEFAULT_DEBOUNCE_MS,
			intent_capacity: DEFAULT_INTENT_CAPACITY,
			instant_search: false,
		}
	}
}

impl SessionConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	/// Rejects values the session cannot run with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.intent_capacity == 0 {
			return Err(ConfigError::Invalid("intent_capacity must be > 0".to_string()));
		}
		if self.debounce_ms > MAX_DEBOUNCE_MS {
			return Err(ConfigError::Invalid(format!(
				"debounce_ms must be <= {MAX_DEBOUNCE_MS}, got {}",
				self.debounce_ms
			)));
		}
		Ok(())
	}

	/// Debounce window as a [`Duration`].
	pub const fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}
}
