//! Scenario runner.
//!
//! Each scenario drives the breeding token through the submit, advance and
//! await cycle and records its expectations in an [`InvariantReport`]. A
//! fatal wait error stops the whole run; any other error only fails the
//! scenario it happened in.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use waiter_config::{ScenarioConfig, WaiterConfig};
use waiter_core::oracle::{
	check_cost_accounting, check_counter, check_field, check_gas_range, check_not_exhausted,
	check_reverted, check_succeeded,
};
use waiter_core::{ConfirmationWaiter, InvariantOracle, InvariantReport, WaitError};
use waiter_ledger::breeding::{
	set_speed_unit_fee_call, spawn_call, spawn_topic, IBreedingToken, SpawnEvent,
};
use waiter_ledger::implementations::simulated::token;
use waiter_ledger::{create_ledger, LedgerError, LedgerInterface, LedgerService};
use waiter_types::{
	DeployedAddress, Denomination, LogFilter, Operation, Receipt, DEFAULT_DEPLOY_GAS_LIMIT,
};

/// Speed of the cockroaches spawned by the single-spawn scenarios.
pub const SPAWN_SPEED: u64 = 5;
/// Wei paid above the spawn price; the token must send it back.
pub const SPAWN_EXCESS_WEI: u64 = 17;
pub const SPAWN_MANY_COUNT: usize = 10;
pub const RAISED_FEE_FINNEY: u64 = 13;

/// Gas floor of a successful spawn and ceiling of a rejected one.
const SPAWN_MIN_GAS: u64 = 50_000;
const REVERTED_SPAWN_MAX_GAS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
	Deploy,
	SpawnOne,
	SpawnMany,
	SpawnFee,
	SpawnAndView,
}

impl Scenario {
	pub const ALL: [Scenario; 5] = [
		Scenario::Deploy,
		Scenario::SpawnOne,
		Scenario::SpawnMany,
		Scenario::SpawnFee,
		Scenario::SpawnAndView,
	];

	pub fn name(&self) -> &'static str {
		match self {
			Scenario::Deploy => "deploy",
			Scenario::SpawnOne => "spawn-one",
			Scenario::SpawnMany => "spawn-many",
			Scenario::SpawnFee => "spawn-fee",
			Scenario::SpawnAndView => "spawn-and-view",
		}
	}
}

impl fmt::Display for Scenario {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Debug, Error)]
pub enum ScenarioError {
	/// Aborts the run.
	#[error("Fatal: {0}")]
	Fatal(WaitError),
	#[error("Wait failed: {0}")]
	Wait(WaitError),
	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),
	#[error("Configuration error: {0}")]
	Config(String),
}

impl ScenarioError {
	pub fn is_fatal(&self) -> bool {
		matches!(self, ScenarioError::Fatal(_))
	}
}

impl From<WaitError> for ScenarioError {
	fn from(error: WaitError) -> Self {
		if error.is_fatal() {
			ScenarioError::Fatal(error)
		} else {
			ScenarioError::Wait(error)
		}
	}
}

/// Inputs shared by every scenario.
#[derive(Debug, Clone)]
pub struct ScenarioSettings {
	pub account: Address,
	/// Value a five-speed spawn pays before the excess is added
	pub spawn_value: U256,
	pub spawn_gas_limit: u64,
	pub creation_code: Bytes,
}

impl ScenarioSettings {
	/// Settings for the built-in simulated token.
	pub fn simulated(account: Address) -> Self {
		Self {
			account,
			spawn_value: Denomination::Finney.amount(SPAWN_SPEED),
			spawn_gas_limit: waiter_types::DEFAULT_CALL_GAS_LIMIT,
			creation_code: Bytes::from_static(token::CREATION_CODE),
		}
	}

	/// Reads the creation code from `bytecode_path` when one is configured.
	pub async fn from_config(config: &ScenarioConfig) -> Result<Self, ScenarioError> {
		let creation_code = match &config.bytecode_path {
			Some(path) => {
				let text = tokio::fs::read_to_string(path).await.map_err(|e| {
					ScenarioError::Config(format!("Failed to read {}: {}", path.display(), e))
				})?;
				let text = text.trim();
				hex::decode(text.strip_prefix("0x").unwrap_or(text))
					.map_err(|e| ScenarioError::Config(format!("Invalid bytecode: {}", e)))?
					.into()
			}
			None => Bytes::from_static(token::CREATION_CODE),
		};
		Ok(Self {
			account: config.account,
			spawn_value: config.spawn_value,
			spawn_gas_limit: config.spawn_gas_limit,
			creation_code,
		})
	}
}

/// Everything a scenario needs to talk to the ledger.
pub struct ScenarioContext {
	ledger: LedgerService,
	waiter: ConfirmationWaiter,
	oracle: InvariantOracle,
	settings: ScenarioSettings,
}

impl ScenarioContext {
	pub fn new(backend: Arc<dyn LedgerInterface>, settings: ScenarioSettings) -> Self {
		let ledger = LedgerService::new(backend);
		Self {
			waiter: ConfirmationWaiter::new(ledger.backend()),
			oracle: InvariantOracle::new(ledger.clone()),
			ledger,
			settings,
		}
	}

	pub fn with_wait_settings(mut self, timeout: Duration, poll_interval: Duration) -> Self {
		self.waiter = self
			.waiter
			.with_timeout(timeout)
			.with_poll_interval(poll_interval);
		self
	}

	pub async fn from_config(config: &WaiterConfig) -> Result<Self, ScenarioError> {
		let table = config.ledger.backend_config().ok_or_else(|| {
			ScenarioError::Config(format!("Missing [ledger.{}] table", config.ledger.backend))
		})?;
		let backend = create_ledger(&config.ledger.backend, table)?;
		let settings = ScenarioSettings::from_config(&config.scenario).await?;

		Ok(Self::new(backend, settings)
			.with_wait_settings(config.waiter.timeout(), config.waiter.poll_interval()))
	}

	pub fn waiter(&self) -> &ConfirmationWaiter {
		&self.waiter
	}

	pub fn ledger(&self) -> &LedgerService {
		&self.ledger
	}

	pub fn settings(&self) -> &ScenarioSettings {
		&self.settings
	}

	/// Submits, seals a block and waits for the receipt.
	pub async fn submit_and_confirm(&self, operation: Operation) -> Result<Receipt, ScenarioError> {
		let handle = self.ledger.submit(operation).await?;
		self.ledger.advance().await?;
		Ok(self.waiter.await_confirmation(&handle).await?)
	}

	async fn priced(&self, operation: Operation) -> Result<Operation, ScenarioError> {
		let gas_price = self.ledger.gas_price().await?;
		Ok(operation.with_gas_price(gas_price))
	}

	/// Deploys a fresh breeding token and waits until it holds code.
	pub async fn deploy_token(&self) -> Result<DeployedAddress, ScenarioError> {
		let operation = self
			.priced(
				Operation::deploy(self.settings.account, self.settings.creation_code.clone())
					.with_gas_limit(DEFAULT_DEPLOY_GAS_LIMIT),
			)
			.await?;
		let handle = self.ledger.submit(operation).await?;
		self.ledger.advance().await?;
		Ok(self.waiter.await_deployment(&handle).await?)
	}

	fn spawn_operation(&self, token: Address, name: &str, speed: u64, value: U256) -> Operation {
		Operation::call(self.settings.account, token, spawn_call(name, speed))
			.with_value(value)
			.with_gas_limit(self.settings.spawn_gas_limit)
	}

	async fn spawn(
		&self,
		token: Address,
		name: &str,
		speed: u64,
		value: U256,
	) -> Result<Receipt, ScenarioError> {
		let operation = self
			.priced(self.spawn_operation(token, name, speed, value))
			.await?;
		self.submit_and_confirm(operation).await
	}

	/// Price of a cockroach of the given speed under the current fee.
	async fn spawn_price(&self, token: Address, speed: u64) -> Result<U256, ScenarioError> {
		let fee = self
			.ledger
			.counter(token, &IBreedingToken::speedUnitFeeCall {})
			.await?;
		Ok(fee * U256::from(speed))
	}

	async fn total_supply(&self, token: Address) -> Result<U256, ScenarioError> {
		Ok(self
			.oracle
			.counter(token, &IBreedingToken::totalSupplyCall {})
			.await?)
	}

	async fn owner_tokens(&self, token: Address) -> Result<Vec<U256>, ScenarioError> {
		let call = IBreedingToken::getOwnerTokensCall {
			owner: self.settings.account,
		};
		let output = self.ledger.call(token, &call).await?;
		let (tokens,) = <(Vec<U256>,)>::abi_decode_params(&output)
			.map_err(|e| LedgerError::Decode(format!("getOwnerTokens: {}", e)))?;
		Ok(tokens)
	}

	pub async fn run(&self, scenario: Scenario) -> Result<InvariantReport, ScenarioError> {
		match scenario {
			Scenario::Deploy => self.deploy().await,
			Scenario::SpawnOne => self.spawn_one().await,
			Scenario::SpawnMany => self.spawn_many().await,
			Scenario::SpawnFee => self.spawn_fee().await,
			Scenario::SpawnAndView => self.spawn_and_view().await,
		}
	}

	async fn deploy(&self) -> Result<InvariantReport, ScenarioError> {
		let mut report = InvariantReport::new();
		let deployed = self.deploy_token().await?;

		let name = self
			.ledger
			.text(deployed.address, &IBreedingToken::nameCall {})
			.await?;
		let symbol = self
			.ledger
			.text(deployed.address, &IBreedingToken::symbolCall {})
			.await?;
		info!(address = %deployed, %name, %symbol, "Token deployed");

		report.record(
			"fresh token has no supply",
			check_counter("totalSupply", U256::ZERO, self.total_supply(deployed.address).await?),
		);
		Ok(report)
	}

	async fn spawn_one(&self) -> Result<InvariantReport, ScenarioError> {
		let mut report = InvariantReport::new();
		let token = self.deploy_token().await?.address;
		let price = self.spawn_price(token, SPAWN_SPEED).await?;
		let paid = self.settings.spawn_value + U256::from(SPAWN_EXCESS_WEI);

		let before = self.oracle.balance_of(self.settings.account).await?;
		let receipt = self.spawn(token, "Jack", SPAWN_SPEED, paid).await?;
		let after = self.oracle.balance_of(self.settings.account).await?;

		report.record("spawn succeeded", check_succeeded(&receipt));
		// Only the price stays with the token; the excess comes back.
		report.record(
			"balance decreased by price plus fee",
			check_cost_accounting(before, after, price, receipt.effective_gas_price, &receipt),
		);
		report.record(
			"gas limit not exhausted",
			check_not_exhausted(self.settings.spawn_gas_limit, &receipt),
		);
		report.record(
			"one token minted",
			check_counter("totalSupply", U256::from(1u64), self.total_supply(token).await?),
		);
		report.record(
			"token holds the price",
			check_counter("token balance", price, self.oracle.balance_of(token).await?),
		);
		Ok(report)
	}

	async fn spawn_many(&self) -> Result<InvariantReport, ScenarioError> {
		let mut report = InvariantReport::new();
		let token = self.deploy_token().await?.address;
		let price = self.spawn_price(token, 1).await?;

		let mut handles = Vec::with_capacity(SPAWN_MANY_COUNT);
		for i in 0..SPAWN_MANY_COUNT {
			let operation = self
				.priced(self.spawn_operation(token, &format!("Roach #{}", i), 1, price))
				.await?;
			handles.push(self.ledger.submit(operation).await?);
		}
		self.ledger.advance().await?;

		let receipts = join_all(handles.iter().map(|h| self.waiter.await_confirmation(h))).await;
		for (i, receipt) in receipts.into_iter().enumerate() {
			report.record(format!("spawn {} succeeded", i), check_succeeded(&receipt?));
		}

		let filter = LogFilter::new()
			.address(token)
			.event_signature(spawn_topic())
			.topic1_any([self.settings.account.into_word()]);
		report.record(
			"spawn events match spawns",
			self.oracle.expect_event_count(&filter, SPAWN_MANY_COUNT).await?,
		);
		let replayed = self.oracle.logs(&filter).await?;
		report.record(
			"event replay is idempotent",
			check_field("replayed events", SPAWN_MANY_COUNT, replayed.len()),
		);

		let mut token_ids: Vec<U256> = replayed
			.iter()
			.filter_map(SpawnEvent::from_log)
			.map(|event| event.token_id)
			.collect();
		token_ids.sort();
		let expected_ids: Vec<U256> = (0..SPAWN_MANY_COUNT as u64).map(U256::from).collect();
		report.record(
			"events carry consecutive token ids",
			check_field(
				"token ids",
				format!("{:?}", expected_ids),
				format!("{:?}", token_ids),
			),
		);

		report.record(
			"supply matches spawns",
			check_counter(
				"totalSupply",
				U256::from(SPAWN_MANY_COUNT),
				self.total_supply(token).await?,
			),
		);
		report.record(
			"owner holds every token",
			self.oracle
				.expect_counter(
					token,
					&IBreedingToken::balanceOfCall {
						owner: self.settings.account,
					},
					U256::from(SPAWN_MANY_COUNT),
				)
				.await?,
		);
		Ok(report)
	}

	async fn spawn_fee(&self) -> Result<InvariantReport, ScenarioError> {
		let mut report = InvariantReport::new();
		let token = self.deploy_token().await?.address;
		let fee = Denomination::Finney.amount(RAISED_FEE_FINNEY);

		let operation = self
			.priced(Operation::call(
				self.settings.account,
				token,
				set_speed_unit_fee_call(fee),
			))
			.await?;
		let receipt = self.submit_and_confirm(operation).await?;
		report.record("fee update succeeded", check_succeeded(&receipt));
		report.record(
			"fee updated",
			self.oracle
				.expect_counter(token, &IBreedingToken::speedUnitFeeCall {}, fee)
				.await?,
		);

		let price = self.spawn_price(token, SPAWN_SPEED).await?;
		report.record(
			"price follows raised fee",
			check_field("spawn price", fee * U256::from(SPAWN_SPEED), price),
		);

		let exact = self.spawn(token, "Mary", SPAWN_SPEED, price).await?;
		report.record("exact fee spawn succeeded", check_succeeded(&exact));
		report.record(
			"exact fee spawn did real work",
			check_gas_range(&exact, SPAWN_MIN_GAS..=self.settings.spawn_gas_limit),
		);

		let before = self.oracle.balance_of(self.settings.account).await?;
		let short = self
			.spawn(token, "Mary never", SPAWN_SPEED, price.saturating_sub(U256::from(1u64)))
			.await?;
		let after = self.oracle.balance_of(self.settings.account).await?;
		report.record("underpaid spawn reverted", check_reverted(&short));
		report.record(
			"underpaid spawn stopped early",
			check_gas_range(&short, 0..=REVERTED_SPAWN_MAX_GAS),
		);
		report.record(
			"underpaid spawn charged only gas",
			check_cost_accounting(before, after, U256::ZERO, short.effective_gas_price, &short),
		);
		report.record(
			"underpaid spawn not exhausted",
			check_not_exhausted(self.settings.spawn_gas_limit, &short),
		);
		report.record(
			"only the exact spawn minted",
			check_counter("totalSupply", U256::from(1u64), self.total_supply(token).await?),
		);
		Ok(report)
	}

	async fn spawn_and_view(&self) -> Result<InvariantReport, ScenarioError> {
		let mut report = InvariantReport::new();
		let token = self.deploy_token().await?.address;
		let price = self.spawn_price(token, SPAWN_SPEED).await?;

		let receipt = self.spawn(token, "Jack", SPAWN_SPEED, price).await?;
		report.record("spawn succeeded", check_succeeded(&receipt));
		report.record(
			"owner balance",
			self.oracle
				.expect_counter(
					token,
					&IBreedingToken::balanceOfCall {
						owner: self.settings.account,
					},
					U256::from(1u64),
				)
				.await?,
		);

		let tokens = self.owner_tokens(token).await?;
		report.record(
			"owner token list",
			check_field("getOwnerTokens", format!("{:?}", vec![U256::ZERO]), format!("{:?}", tokens)),
		);

		let output = self
			.ledger
			.call(token, &IBreedingToken::cockroachesCall { tokenId: U256::ZERO })
			.await?;
		let (name, speed, owner) = <(String, U256, Address)>::abi_decode_params(&output)
			.map_err(|e| LedgerError::Decode(format!("cockroaches: {}", e)))?;
		report.record("cockroach name", check_field("name", "Jack", name.as_str()));
		report.record(
			"cockroach speed",
			check_counter("speed", U256::from(SPAWN_SPEED), speed),
		);
		report.record(
			"cockroach owner",
			check_field("owner", self.settings.account, owner),
		);
		Ok(report)
	}
}

#[derive(Debug)]
pub struct ScenarioOutcome {
	pub scenario: Scenario,
	pub result: Result<InvariantReport, ScenarioError>,
}

impl ScenarioOutcome {
	pub fn passed(&self) -> bool {
		matches!(&self.result, Ok(report) if report.is_clean())
	}
}

#[derive(Debug, Default)]
pub struct RunSummary {
	pub outcomes: Vec<ScenarioOutcome>,
}

impl RunSummary {
	pub fn passed(&self) -> usize {
		self.outcomes.iter().filter(|o| o.passed()).count()
	}

	pub fn failed(&self) -> usize {
		self.outcomes.len() - self.passed()
	}

	pub fn is_success(&self) -> bool {
		self.failed() == 0
	}
}

/// Runs the scenarios in order.
///
/// Returns `Err` only for a fatal error, after which no further scenario is
/// started.
pub async fn run_scenarios(
	context: &ScenarioContext,
	scenarios: &[Scenario],
) -> Result<RunSummary, ScenarioError> {
	let mut summary = RunSummary::default();
	for &scenario in scenarios {
		info!(%scenario, "Running scenario");
		let result = match context.run(scenario).await {
			Err(e) if e.is_fatal() => {
				error!(%scenario, error = %e, "Fatal error, aborting run");
				return Err(e);
			}
			result => result,
		};
		match &result {
			Err(e) => warn!(%scenario, error = %e, "Scenario failed"),
			Ok(report) if report.is_clean() => {
				info!(%scenario, checks = report.len(), "Scenario passed")
			}
			Ok(report) => warn!(
				%scenario,
				violations = report.len() - report.passed(),
				"Scenario finished with violations"
			),
		}
		summary.outcomes.push(ScenarioOutcome { scenario, result });
	}
	Ok(summary)
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::io::Write;
	use waiter_ledger::implementations::simulated::SimulatedLedger;
	use waiter_types::{
		Bytes, ConfigSchema, LogEntry, OperationHandle, OperationStatus, DEFAULT_CALL_GAS_LIMIT,
	};

	fn alice() -> Address {
		Address::repeat_byte(0xaa)
	}

	fn simulated_context(balance: U256) -> ScenarioContext {
		let backend = Arc::new(SimulatedLedger::new([(alice(), balance)]));
		ScenarioContext::new(backend, ScenarioSettings::simulated(alice()))
			.with_wait_settings(Duration::from_secs(20), Duration::from_millis(10))
	}

	#[tokio::test]
	async fn test_every_scenario_passes_on_simulated_ledger() {
		let context = simulated_context(Denomination::Ether.amount(10));
		let summary = run_scenarios(&context, &Scenario::ALL).await.unwrap();

		assert_eq!(summary.outcomes.len(), Scenario::ALL.len());
		for outcome in &summary.outcomes {
			let report = outcome.result.as_ref().unwrap();
			let violations: Vec<_> = report.violations().collect();
			assert!(violations.is_empty(), "{}: {:?}", outcome.scenario, violations);
		}
		assert!(summary.is_success());
	}

	#[tokio::test]
	async fn test_deploy_then_spawn() {
		let context = simulated_context(Denomination::Ether.amount(1));

		let deployed = context.deploy_token().await.unwrap();
		assert_eq!(deployed.address, alice().create(0));

		let value = U256::from(5_000_000_000_000_000u64);
		let operation = Operation::call(alice(), deployed.address, spawn_call("Jack", 5))
			.with_value(value)
			.with_gas_limit(DEFAULT_CALL_GAS_LIMIT);
		let receipt = context.submit_and_confirm(operation).await.unwrap();

		assert!(receipt.success);
		assert!(receipt.gas_used < DEFAULT_CALL_GAS_LIMIT);
		assert_eq!(
			context.total_supply(deployed.address).await.unwrap(),
			U256::from(1u64)
		);
	}

	#[tokio::test]
	async fn test_fee_scenario_spawns_at_full_speed() {
		let context = simulated_context(Denomination::Ether.amount(1));
		let report = context.run(Scenario::SpawnFee).await.unwrap();
		assert!(report.is_clean());

		// The scenario deploys a fresh token from the first nonce.
		let token = alice().create(0);
		let output = context
			.ledger()
			.call(token, &IBreedingToken::cockroachesCall { tokenId: U256::ZERO })
			.await
			.unwrap();
		let (name, speed, _owner) = <(String, U256, Address)>::abi_decode_params(&output).unwrap();
		assert_eq!(name, "Mary");
		assert_eq!(speed, U256::from(SPAWN_SPEED));
		assert_eq!(context.total_supply(token).await.unwrap(), U256::from(1u64));
	}

	#[tokio::test]
	async fn test_rejected_submission_fails_only_the_scenario() {
		let context = simulated_context(U256::from(1_000u64));
		let summary = run_scenarios(&context, &[Scenario::Deploy, Scenario::SpawnOne])
			.await
			.unwrap();

		assert_eq!(summary.failed(), 2);
		assert!(summary.outcomes.iter().all(|o| matches!(
			o.result,
			Err(ScenarioError::Ledger(LedgerError::Rejected(_)))
		)));
	}

	/// Accepts operations but never seals a block.
	struct StalledLedger(SimulatedLedger);

	#[async_trait]
	impl LedgerInterface for StalledLedger {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			self.0.config_schema()
		}

		async fn submit(&self, operation: Operation) -> Result<OperationHandle, LedgerError> {
			self.0.submit(operation).await
		}

		async fn status(&self, handle: &OperationHandle) -> Result<OperationStatus, LedgerError> {
			self.0.status(handle).await
		}

		async fn balance(&self, account: Address) -> Result<U256, LedgerError> {
			self.0.balance(account).await
		}

		async fn code_at(&self, address: Address) -> Result<Bytes, LedgerError> {
			self.0.code_at(address).await
		}

		async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, LedgerError> {
			self.0.call(to, input).await
		}

		async fn logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, LedgerError> {
			self.0.logs(filter).await
		}

		async fn gas_price(&self) -> Result<u128, LedgerError> {
			self.0.gas_price().await
		}

		async fn advance(&self) -> Result<u64, LedgerError> {
			Ok(0)
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_timeout_aborts_the_run() {
		let backend = Arc::new(StalledLedger(SimulatedLedger::new([(
			alice(),
			Denomination::Ether.amount(1),
		)])));
		let context = ScenarioContext::new(backend, ScenarioSettings::simulated(alice()));
		let started = tokio::time::Instant::now();

		let err = run_scenarios(&context, &Scenario::ALL).await.unwrap_err();

		assert!(err.is_fatal());
		assert!(matches!(err, ScenarioError::Fatal(WaitError::Timeout { .. })));
		// Only the first scenario's deadline elapsed.
		let elapsed = started.elapsed();
		assert!(elapsed >= waiter_core::DEFAULT_TIMEOUT);
		assert!(elapsed < waiter_core::DEFAULT_TIMEOUT * 2);
	}

	#[tokio::test]
	async fn test_settings_read_hex_bytecode() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "0x6080604052").unwrap();

		let config: ScenarioConfig = toml::from_str(&format!(
			"account = \"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\"\nbytecode_path = {:?}",
			file.path().display().to_string()
		))
		.unwrap();
		let settings = ScenarioSettings::from_config(&config).await.unwrap();
		assert_eq!(settings.creation_code, Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52]));
		assert_eq!(settings.spawn_value, Denomination::Finney.amount(5));
	}

	#[tokio::test]
	async fn test_settings_reject_bad_bytecode() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "not hex").unwrap();

		let config: ScenarioConfig = toml::from_str(&format!(
			"account = \"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\"\nbytecode_path = {:?}",
			file.path().display().to_string()
		))
		.unwrap();
		assert!(matches!(
			ScenarioSettings::from_config(&config).await,
			Err(ScenarioError::Config(_))
		));
	}
}
