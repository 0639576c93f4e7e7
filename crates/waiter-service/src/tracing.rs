//! Tracing subscriber setup.

use tracing::info;
use tracing_subscriber::{
	fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Output presets selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
	/// Human-readable lines
	Pretty,
	/// One JSON object per event, without targets
	Json,
	/// Pretty output with thread ids, source locations and span timings
	Debug,
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
	/// Filter directive used when `RUST_LOG` is not set, e.g. `info` or
	/// `waiter_core=debug`.
	pub level: String,
	pub with_thread_ids: bool,
	pub with_file_and_line: bool,
	pub with_target: bool,
	pub with_span_events: FmtSpan,
	pub json_format: bool,
}

impl Default for TracingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			with_thread_ids: false,
			with_file_and_line: false,
			with_target: true,
			with_span_events: FmtSpan::NONE,
			json_format: false,
		}
	}
}

impl TracingConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_level(mut self, level: impl Into<String>) -> Self {
		self.level = level.into();
		self
	}

	/// Preset for `format`, keeping `level` as the filter directive.
	///
	/// The debug preset only lowers the level when none is given.
	pub fn for_format(format: LogFormat, level: Option<String>) -> Self {
		let config = match format {
			LogFormat::Pretty => Self::new(),
			LogFormat::Json => Self::production(),
			LogFormat::Debug => Self::debug(),
		};
		match level {
			Some(level) => config.with_level(level),
			None => config,
		}
	}

	pub fn debug() -> Self {
		Self {
			with_thread_ids: true,
			with_file_and_line: true,
			with_span_events: FmtSpan::ENTER | FmtSpan::CLOSE,
			..Self::default()
		}
		.with_level("debug")
	}

	pub fn production() -> Self {
		Self {
			with_target: false,
			json_format: true,
			..Self::default()
		}
	}

	/// `RUST_LOG` wins over the configured level.
	pub fn filter(&self) -> EnvFilter {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
	}
}

/// Initialize tracing with the given configuration
pub fn init_tracing(config: TracingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let subscriber = tracing_subscriber::registry().with(config.filter());

	if config.json_format {
		let json_layer = tracing_subscriber::fmt::layer()
			.json()
			.with_span_events(config.with_span_events.clone())
			.with_thread_ids(config.with_thread_ids)
			.with_file(config.with_file_and_line)
			.with_line_number(config.with_file_and_line)
			.with_target(config.with_target);

		subscriber
			.with(json_layer)
			.try_init()
			.map_err(|e| format!("Failed to initialize tracing: {}", e))?;
	} else {
		let fmt_layer = tracing_subscriber::fmt::layer()
			.with_span_events(config.with_span_events.clone())
			.with_thread_ids(config.with_thread_ids)
			.with_file(config.with_file_and_line)
			.with_line_number(config.with_file_and_line)
			.with_target(config.with_target);

		subscriber
			.with(fmt_layer)
			.try_init()
			.map_err(|e| format!("Failed to initialize tracing: {}", e))?;
	}

	info!(level = %config.level, json = config.json_format, "Tracing initialized");
	Ok(())
}
