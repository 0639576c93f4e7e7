//! Configuration loading from files and environment.

use crate::types::WaiterConfig;
use crate::ConfigError;
use regex::Regex;
use std::env;
use std::path::Path;
use tracing::{debug, info};
use waiter_ledger::ledger_schema;

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "WAITER_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<WaiterConfig, ConfigError> {
		let Some(file_path) = &self.file_path else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};
		info!("Loading configuration from {}", file_path);

		let content = tokio::fs::read_to_string(file_path)
			.await
			.map_err(|e| match e.kind() {
				std::io::ErrorKind::NotFound => ConfigError::FileNotFound(file_path.clone()),
				_ => ConfigError::IoError(e),
			})?;

		let mut config = self.parse(&content)?;
		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	/// Parses configuration text after substituting `${VAR}` references.
	pub fn parse(&self, content: &str) -> Result<WaiterConfig, ConfigError> {
		let substituted = substitute_env_vars(content)?;
		toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))
	}

	fn apply_env_overrides(&self, config: &mut WaiterConfig) -> Result<(), ConfigError> {
		if let Ok(timeout) = env::var(format!("{}TIMEOUT_SECS", self.env_prefix)) {
			debug!("Overriding waiter timeout from environment");
			config.waiter.timeout_secs = timeout
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid timeout: {}", e)))?;
		}

		if let Ok(interval) = env::var(format!("{}POLL_INTERVAL_MS", self.env_prefix)) {
			debug!("Overriding poll interval from environment");
			config.waiter.poll_interval_ms = interval.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid poll interval: {}", e))
			})?;
		}

		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.logging.level = log_level;
		}

		if let Ok(rpc_url) = env::var(format!("{}RPC_URL", self.env_prefix)) {
			debug!("Overriding RPC URL from environment");
			if let Some(toml::Value::Table(rpc)) = config.ledger.backends.get_mut("rpc") {
				rpc.insert("rpc_url".to_string(), toml::Value::String(rpc_url));
			}
		}

		Ok(())
	}
}

fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([^}]+)\}")
		.map_err(|e| ConfigError::ParseError(format!("Invalid substitution pattern: {}", e)))?;

	let mut result = content.to_string();
	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

/// Checks cross-field constraints and the selected backend's table.
pub fn validate_config(config: &WaiterConfig) -> Result<(), ConfigError> {
	if config.waiter.timeout_secs == 0 {
		return Err(ConfigError::ValidationError(
			"waiter.timeout_secs must be positive".to_string(),
		));
	}
	if config.waiter.poll_interval() == std::time::Duration::ZERO
		|| config.waiter.poll_interval() >= config.waiter.timeout()
	{
		return Err(ConfigError::ValidationError(
			"waiter.poll_interval_ms must be positive and shorter than the timeout".to_string(),
		));
	}

	let backend = &config.ledger.backend;
	let schema = ledger_schema(backend).ok_or_else(|| {
		ConfigError::ValidationError(format!("Unknown ledger backend '{}'", backend))
	})?;
	let table = config.ledger.backend_config().ok_or_else(|| {
		ConfigError::ValidationError(format!("Missing [ledger.{}] table", backend))
	})?;
	schema
		.validate(table)
		.map_err(|e| ConfigError::ValidationError(format!("ledger.{}: {}", backend, e)))?;

	if backend == "rpc" && config.scenario.bytecode_path.is_none() {
		return Err(ConfigError::ValidationError(
			"scenario.bytecode_path is required for the rpc backend".to_string(),
		));
	}
	if config.scenario.spawn_gas_limit == 0 {
		return Err(ConfigError::ValidationError(
			"scenario.spawn_gas_limit must be positive".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;
	use waiter_types::{Address, Denomination, U256};

	const SIMULATED: &str = r#"
[waiter]
timeout_secs = 20
poll_interval_ms = 50

[ledger]
backend = "simulated"

[ledger.simulated]
gas_price = 1
genesis = [{ address = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", balance = "10 ether" }]

[scenario]
account = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
spawn_value = "5 finney"
"#;

	fn write_config(content: &str) -> NamedTempFile {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[test]
	fn test_parse_simulated_config() {
		let config = ConfigLoader::new().parse(SIMULATED).unwrap();
		assert_eq!(config.waiter.timeout().as_secs(), 20);
		assert_eq!(config.waiter.poll_interval().as_millis(), 50);
		assert_eq!(config.ledger.backend, "simulated");
		assert!(config.ledger.backend_config().is_some());
		assert_eq!(config.scenario.account, Address::repeat_byte(0xaa));
		assert_eq!(config.scenario.spawn_value, Denomination::Finney.amount(5));
		assert_eq!(config.scenario.spawn_gas_limit, 200_000);
		assert_eq!(config.logging.level, "info");
		assert!(validate_config(&config).is_ok());
	}

	#[test]
	fn test_defaults_apply_without_waiter_table() {
		let content = SIMULATED.replace("[waiter]\ntimeout_secs = 20\npoll_interval_ms = 50\n", "");
		let config = ConfigLoader::new().parse(&content).unwrap();
		assert_eq!(config.waiter.timeout_secs, 20);
		assert_eq!(config.waiter.poll_interval_ms, 100);
	}

	#[test]
	fn test_substitution_requires_variable() {
		std::env::set_var("WAITER_TEST_SPAWN_VALUE", "13 finney");
		let content = SIMULATED.replace("\"5 finney\"", "\"${WAITER_TEST_SPAWN_VALUE}\"");
		let config = ConfigLoader::new().parse(&content).unwrap();
		assert_eq!(config.scenario.spawn_value, Denomination::Finney.amount(13));

		let missing = SIMULATED.replace("\"5 finney\"", "\"${WAITER_TEST_UNSET_VARIABLE}\"");
		assert!(matches!(
			ConfigLoader::new().parse(&missing),
			Err(ConfigError::EnvVarNotFound(name)) if name == "WAITER_TEST_UNSET_VARIABLE"
		));
	}

	#[test]
	fn test_validation_rejects_bad_backends() {
		let unknown = SIMULATED.replace("backend = \"simulated\"", "backend = \"carrier-pigeon\"");
		let config = ConfigLoader::new().parse(&unknown).unwrap();
		assert!(validate_config(&config).is_err());

		let missing_table = SIMULATED.replace("backend = \"simulated\"", "backend = \"rpc\"");
		let config = ConfigLoader::new().parse(&missing_table).unwrap();
		let err = validate_config(&config).unwrap_err().to_string();
		assert!(err.contains("[ledger.rpc]"));

		let no_genesis = SIMULATED.replace("genesis = ", "allocations = ");
		let config = ConfigLoader::new().parse(&no_genesis).unwrap();
		assert!(validate_config(&config).is_err());
	}

	#[test]
	fn test_validation_rejects_poll_interval_beyond_timeout() {
		let content = SIMULATED.replace("poll_interval_ms = 50", "poll_interval_ms = 20000");
		let config = ConfigLoader::new().parse(&content).unwrap();
		assert!(validate_config(&config).is_err());
	}

	#[test]
	fn test_rpc_backend_needs_bytecode() {
		let content = r#"
[ledger]
backend = "rpc"

[ledger.rpc]
rpc_url = "http://127.0.0.1:8545"
chain_id = 31337
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[scenario]
account = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
"#;
		let config = ConfigLoader::new().parse(content).unwrap();
		assert!(validate_config(&config)
			.unwrap_err()
			.to_string()
			.contains("bytecode_path"));

		let with_code = format!("{}bytecode_path = \"token.hex\"\n", content);
		let config = ConfigLoader::new().parse(&with_code).unwrap();
		assert!(validate_config(&config).is_ok());
	}

	#[tokio::test]
	async fn test_load_applies_env_overrides() {
		let file = write_config(SIMULATED);
		std::env::set_var("WAITER_OVERRIDE_TEST_TIMEOUT_SECS", "45");
		std::env::set_var("WAITER_OVERRIDE_TEST_LOG_LEVEL", "debug");

		let config = ConfigLoader::new()
			.with_file(file.path())
			.with_env_prefix("WAITER_OVERRIDE_TEST_")
			.load()
			.await
			.unwrap();

		assert_eq!(config.waiter.timeout_secs, 45);
		assert_eq!(config.logging.level, "debug");
		assert_eq!(config.scenario.spawn_value, U256::from(5_000_000_000_000_000u64));
	}

	#[tokio::test]
	async fn test_load_reports_missing_file() {
		let result = ConfigLoader::new()
			.with_file("/nonexistent/waiter.toml")
			.load()
			.await;
		assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

		assert!(matches!(
			ConfigLoader::new().load().await,
			Err(ConfigError::FileNotFound(_))
		));
	}
}
