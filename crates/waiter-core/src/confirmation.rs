//! Conditions a watch task polls for.

use crate::WaitError;
use async_trait::async_trait;
use waiter_ledger::LedgerInterface;
use waiter_types::{DeployedAddress, OperationHandle, OperationStatus, Receipt};

/// A wait predicate paired with the value it extracts once satisfied.
///
/// `check` is polled by the watch task until it yields `Some` or a
/// non-transient error. Transient errors (failed ledger queries) are logged
/// and polled again; everything else ends the wait and reaches the caller.
#[async_trait]
pub trait Confirmation: Send + Sync + 'static {
	type Output: Send + 'static;

	async fn check(
		&self,
		ledger: &dyn LedgerInterface,
		handle: &OperationHandle,
	) -> Result<Option<Self::Output>, WaitError>;
}

/// Satisfied once the operation has a receipt, whatever its outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mined;

#[async_trait]
impl Confirmation for Mined {
	type Output = Receipt;

	async fn check(
		&self,
		ledger: &dyn LedgerInterface,
		handle: &OperationHandle,
	) -> Result<Option<Receipt>, WaitError> {
		match ledger.status(handle).await? {
			OperationStatus::Pending => Ok(None),
			OperationStatus::Finalized(receipt) => Ok(Some(receipt)),
		}
	}
}

/// Satisfied once a deployment is mined and its contract has code.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deployed;

#[async_trait]
impl Confirmation for Deployed {
	type Output = DeployedAddress;

	async fn check(
		&self,
		ledger: &dyn LedgerInterface,
		handle: &OperationHandle,
	) -> Result<Option<DeployedAddress>, WaitError> {
		let Some(receipt) = Mined.check(ledger, handle).await? else {
			return Ok(None);
		};
		if !receipt.success {
			return Err(WaitError::DeploymentReverted(*handle));
		}
		let address = receipt
			.contract_address
			.ok_or(WaitError::NotADeployment(*handle))?;

		// An empty read is final; it is not polled again.
		if ledger.code_at(address).await?.is_empty() {
			return Err(WaitError::NoCode(address));
		}
		Ok(Some(DeployedAddress {
			address,
			handle: *handle,
		}))
	}
}
