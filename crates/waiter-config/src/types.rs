//! Configuration types for the ledger waiter.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use waiter_types::{deserialize_amount, Address, Denomination, U256, DEFAULT_CALL_GAS_LIMIT};

/// Complete waiter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WaiterConfig {
	/// Deadline and polling of the confirmation waiter
	#[serde(default)]
	pub waiter: WaitSettings,
	/// Which ledger to talk to
	pub ledger: LedgerConfig,
	/// Parameters of the scenario run
	pub scenario: ScenarioConfig,
	#[serde(default)]
	pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitSettings {
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
}

impl WaitSettings {
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}
}

impl Default for WaitSettings {
	fn default() -> Self {
		Self {
			timeout_secs: default_timeout_secs(),
			poll_interval_ms: default_poll_interval_ms(),
		}
	}
}

fn default_timeout_secs() -> u64 {
	20
}

fn default_poll_interval_ms() -> u64 {
	100
}

/// Ledger backend selection.
///
/// Each backend has its own table next to `backend`, e.g. `[ledger.simulated]`;
/// only the selected one is validated and used.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
	pub backend: String,
	#[serde(flatten)]
	pub backends: HashMap<String, toml::Value>,
}

impl LedgerConfig {
	/// Configuration table of the selected backend.
	pub fn backend_config(&self) -> Option<&toml::Value> {
		self.backends.get(&self.backend)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
	/// Account every scenario submits from
	pub account: Address,
	/// Value sent with a five-speed spawn
	#[serde(default = "default_spawn_value", deserialize_with = "deserialize_amount")]
	pub spawn_value: U256,
	#[serde(default = "default_spawn_gas_limit")]
	pub spawn_gas_limit: u64,
	/// Hex creation code of the breeding token; required for the rpc backend
	pub bytecode_path: Option<PathBuf>,
}

fn default_spawn_value() -> U256 {
	Denomination::Finney.amount(5)
}

fn default_spawn_gas_limit() -> u64 {
	DEFAULT_CALL_GAS_LIMIT
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
	#[serde(default = "default_log_level")]
	pub level: String,
	#[serde(default)]
	pub json: bool,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: default_log_level(),
			json: false,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
