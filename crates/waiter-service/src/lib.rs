//! Ledger waiter service: tracing setup and the scenario runner behind the
//! `ledger-waiter` binary.

pub mod scenarios;
pub mod tracing;

pub use scenarios::{run_scenarios, RunSummary, Scenario, ScenarioContext, ScenarioError};
