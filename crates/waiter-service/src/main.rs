use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use waiter_config::{ConfigLoader, WaiterConfig};
use waiter_core::oracle::InvariantViolation;
use waiter_ledger::breeding::IBreedingToken;
use waiter_service::scenarios::{run_scenarios, Scenario, ScenarioContext};
use waiter_service::tracing::{init_tracing, LogFormat, TracingConfig};

#[derive(Parser)]
#[command(name = "ledger-waiter")]
#[command(about = "Submit operations to a ledger and wait for their confirmation", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/local.toml")]
	config: PathBuf,

	/// Log level override (trace, debug, info, warn, error)
	#[arg(long)]
	log_level: Option<String>,

	/// Log output format; defaults to json when `[logging] json = true`
	#[arg(long, value_enum)]
	log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
	/// Deploy the breeding token and print its metadata
	Deploy,
	/// Run the confirmation scenarios
	Scenarios {
		/// Run only the named scenario
		#[arg(long)]
		only: Option<String>,
	},
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	// Configuration problems are reported before logging exists.
	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;

	let format = cli.log_format.unwrap_or(if config.logging.json {
		LogFormat::Json
	} else {
		LogFormat::Pretty
	});
	// The debug preset brings its own level unless one is given explicitly.
	let level = match format {
		LogFormat::Debug => cli.log_level.clone(),
		_ => Some(
			cli.log_level
				.clone()
				.unwrap_or_else(|| config.logging.level.clone()),
		),
	};
	init_tracing(TracingConfig::for_format(format, level))
		.map_err(|e| anyhow::anyhow!("{}", e))?;

	match &cli.command {
		Commands::Deploy => deploy(&config).await,
		Commands::Scenarios { only } => scenarios(&config, only.as_deref()).await,
		Commands::Validate => validate(&cli, &config),
	}
}

async fn deploy(config: &WaiterConfig) -> Result<()> {
	let context = ScenarioContext::from_config(config)
		.await
		.context("Failed to set up ledger")?;

	let deployed = context
		.deploy_token()
		.await
		.context("Token deployment failed")?;
	let ledger = context.ledger();
	let name = ledger
		.text(deployed.address, &IBreedingToken::nameCall {})
		.await?;
	let symbol = ledger
		.text(deployed.address, &IBreedingToken::symbolCall {})
		.await?;
	let supply = ledger
		.counter(deployed.address, &IBreedingToken::totalSupplyCall {})
		.await?;

	println!("Contract deployed at {}", deployed);
	println!("Deployment operation: {}", deployed.handle);
	println!("Token name: {}", name);
	println!("Token symbol: {}", symbol);
	println!("Total supply: {}", supply);
	Ok(())
}

async fn scenarios(config: &WaiterConfig, only: Option<&str>) -> Result<()> {
	let selected: Vec<Scenario> = match only {
		Some(name) => vec![Scenario::ALL
			.into_iter()
			.find(|s| s.name() == name)
			.with_context(|| format!("Unknown scenario '{}'", name))?],
		None => Scenario::ALL.to_vec(),
	};

	let context = ScenarioContext::from_config(config)
		.await
		.context("Failed to set up ledger")?;
	info!(
		backend = %config.ledger.backend,
		account = %context.settings().account,
		timeout = ?context.waiter().timeout(),
		"Running {} scenario(s)",
		selected.len()
	);

	// A fatal error surfaces here and ends the process with a failure code.
	let summary = run_scenarios(&context, &selected)
		.await
		.context("Scenario run aborted")?;

	for outcome in &summary.outcomes {
		let status = if outcome.passed() { "PASS" } else { "FAIL" };
		println!("{:<16} {}", outcome.scenario.name(), status);
		match &outcome.result {
			Ok(report) => {
				for (check, violation) in report.violations() {
					print_violation(check, violation);
				}
			}
			Err(e) => println!("    error: {}", e),
		}
	}
	println!("{} passed, {} failed", summary.passed(), summary.failed());

	if !summary.is_success() {
		anyhow::bail!("{} scenario(s) failed", summary.failed());
	}
	Ok(())
}

fn print_violation(check: &str, violation: &InvariantViolation) {
	println!("    {}: {}", check, violation);
}

fn validate(cli: &Cli, config: &WaiterConfig) -> Result<()> {
	info!("Configuration file {:?} is valid", cli.config);
	println!("Ledger backend: {}", config.ledger.backend);
	println!("Scenario account: {}", config.scenario.account);
	println!("Confirmation timeout: {:?}", config.waiter.timeout());
	println!("Poll interval: {:?}", config.waiter.poll_interval());
	Ok(())
}
