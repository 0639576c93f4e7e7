//! Native implementation of the breeding token for the simulated ledger.

use super::contract::{CallContext, Halt, SimulatedContract};
use crate::breeding::IBreedingToken::{self, IBreedingTokenCalls};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolEvent, SolInterface, SolValue};
use std::collections::HashMap;
use waiter_types::Denomination;

pub const TOKEN_NAME: &str = "CockroachToken";
pub const TOKEN_SYMBOL: &str = "ROACH";

/// Creation code the simulated ledger associates with [`BreedingToken`].
pub const CREATION_CODE: &[u8] = b"\x60\x80\x60\x40simulated:cockroach-breeding-token:v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cockroach {
	pub name: String,
	pub speed: U256,
	pub owner: Address,
}

/// Breeding token state.
///
/// Spawning costs `speed * speed_unit_fee` wei; anything paid above that is
/// sent back to the caller.
#[derive(Debug, Clone)]
pub struct BreedingToken {
	owner: Address,
	speed_unit_fee: U256,
	cockroaches: Vec<Cockroach>,
	owner_tokens: HashMap<Address, Vec<U256>>,
}

impl BreedingToken {
	/// Constructor: the deployer owns the contract; the fee starts at one finney.
	pub fn deploy(ctx: &mut CallContext) -> Result<Box<dyn SimulatedContract>, Halt> {
		ctx.sstore(true)?;
		ctx.sstore(true)?;
		Ok(Box::new(Self {
			owner: ctx.caller,
			speed_unit_fee: Denomination::Finney.amount(1),
			cockroaches: Vec::new(),
			owner_tokens: HashMap::new(),
		}))
	}

	pub fn total_supply(&self) -> U256 {
		U256::from(self.cockroaches.len())
	}

	fn spawn(&mut self, ctx: &mut CallContext, name: String, speed: U256) -> Result<Bytes, Halt> {
		ctx.sload()?;
		if speed.is_zero() {
			return Err(Halt::revert("speed must be positive"));
		}
		let price = speed
			.checked_mul(self.speed_unit_fee)
			.ok_or_else(|| Halt::revert("spawn price overflow"))?;
		if ctx.value < price {
			return Err(Halt::revert("insufficient spawn fee"));
		}

		let token_id = self.total_supply();
		let first_for_owner = !self.owner_tokens.contains_key(&ctx.caller);
		// name, speed+owner, owner's token list, supply counter
		ctx.sstore(true)?;
		ctx.sstore(true)?;
		ctx.sstore(first_for_owner)?;
		ctx.sstore(token_id.is_zero())?;
		ctx.emit(
			IBreedingToken::Spawn {
				to: ctx.caller,
				tokenId: token_id,
			}
			.encode_log_data(),
		)?;

		let excess = ctx.value - price;
		if !excess.is_zero() {
			ctx.transfer(ctx.caller, excess)?;
		}

		self.cockroaches.push(Cockroach {
			name,
			speed,
			owner: ctx.caller,
		});
		self.owner_tokens.entry(ctx.caller).or_default().push(token_id);
		Ok((token_id,).abi_encode_params().into())
	}

	fn set_speed_unit_fee(&mut self, ctx: &mut CallContext, fee: U256) -> Result<Bytes, Halt> {
		ctx.sload()?;
		if ctx.caller != self.owner {
			return Err(Halt::revert("caller is not the owner"));
		}
		ctx.sstore(false)?;
		self.speed_unit_fee = fee;
		Ok(Bytes::new())
	}
}

impl SimulatedContract for BreedingToken {
	fn execute(&mut self, ctx: &mut CallContext, input: &[u8]) -> Result<Bytes, Halt> {
		let call = IBreedingTokenCalls::abi_decode(input)
			.map_err(|e| Halt::revert(format!("invalid call: {}", e)))?;
		match call {
			IBreedingTokenCalls::spawn(call) => self.spawn(ctx, call.name, call.speed),
			_ if !ctx.value.is_zero() => Err(Halt::revert("function is not payable")),
			IBreedingTokenCalls::setSpeedUnitFee(call) => self.set_speed_unit_fee(ctx, call.fee),
			_ => {
				ctx.sload()?;
				self.view(input)
			}
		}
	}

	fn view(&self, input: &[u8]) -> Result<Bytes, Halt> {
		let call = IBreedingTokenCalls::abi_decode(input)
			.map_err(|e| Halt::revert(format!("invalid call: {}", e)))?;
		let output = match call {
			IBreedingTokenCalls::name(_) => (TOKEN_NAME.to_string(),).abi_encode_params(),
			IBreedingTokenCalls::symbol(_) => (TOKEN_SYMBOL.to_string(),).abi_encode_params(),
			IBreedingTokenCalls::totalSupply(_) => (self.total_supply(),).abi_encode_params(),
			IBreedingTokenCalls::balanceOf(call) => {
				let held = self.owner_tokens.get(&call.owner).map_or(0, Vec::len);
				(U256::from(held),).abi_encode_params()
			}
			IBreedingTokenCalls::speedUnitFee(_) => (self.speed_unit_fee,).abi_encode_params(),
			IBreedingTokenCalls::getOwnerTokens(call) => {
				let tokens = self.owner_tokens.get(&call.owner).cloned().unwrap_or_default();
				(tokens,).abi_encode_params()
			}
			IBreedingTokenCalls::cockroaches(call) => {
				let cockroach = usize::try_from(call.tokenId)
					.ok()
					.and_then(|index| self.cockroaches.get(index))
					.ok_or_else(|| Halt::revert("unknown token"))?;
				(cockroach.name.clone(), cockroach.speed, cockroach.owner).abi_encode_params()
			}
			IBreedingTokenCalls::spawn(_) | IBreedingTokenCalls::setSpeedUnitFee(_) => {
				return Err(Halt::revert("state-changing function in read-only call"));
			}
		};
		Ok(output.into())
	}

	fn boxed_clone(&self) -> Box<dyn SimulatedContract> {
		Box::new(self.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::breeding::{spawn_call, spawn_topic};
	use crate::implementations::simulated::gas::GasMeter;
	use alloy_sol_types::SolCall;

	fn ctx(caller: Address, value: U256) -> CallContext {
		CallContext::new(caller, value, Address::repeat_byte(0xcc), GasMeter::new(1_000_000))
	}

	fn deployed(owner: Address) -> Box<dyn SimulatedContract> {
		BreedingToken::deploy(&mut ctx(owner, U256::ZERO)).unwrap()
	}

	fn supply(token: &dyn SimulatedContract) -> U256 {
		let out = token
			.view(&IBreedingToken::totalSupplyCall {}.abi_encode())
			.unwrap();
		<(U256,)>::abi_decode_params(&out).unwrap().0
	}

	#[test]
	fn test_spawn_mints_and_refunds_excess() {
		let alice = Address::repeat_byte(0xaa);
		let mut token = deployed(alice);
		let paid = Denomination::Finney.amount(5) + U256::from(17u64);
		let mut call_ctx = ctx(alice, paid);

		let out = token.execute(&mut call_ctx, &spawn_call("Jack", 5)).unwrap();
		assert_eq!(<(U256,)>::abi_decode_params(&out).unwrap().0, U256::ZERO);
		assert_eq!(supply(token.as_ref()), U256::from(1u64));

		let (gas_used, logs, payouts) = call_ctx.into_effects();
		assert!(gas_used > 50_000);
		assert_eq!(logs.len(), 1);
		assert_eq!(logs[0].topics()[0], spawn_topic());
		assert_eq!(payouts, vec![(alice, U256::from(17u64))]);
	}

	#[test]
	fn test_spawn_below_fee_reverts() {
		let alice = Address::repeat_byte(0xaa);
		let mut token = deployed(alice);
		let short = Denomination::Finney.amount(5) - U256::from(1u64);

		let result = token.execute(&mut ctx(alice, short), &spawn_call("Mary never", 5));
		assert_eq!(result, Err(Halt::revert("insufficient spawn fee")));
		assert_eq!(supply(token.as_ref()), U256::ZERO);
	}

	#[test]
	fn test_only_owner_sets_fee() {
		let alice = Address::repeat_byte(0xaa);
		let bob = Address::repeat_byte(0xbb);
		let mut token = deployed(alice);
		let fee = Denomination::Finney.amount(13);
		let input = IBreedingToken::setSpeedUnitFeeCall { fee }.abi_encode();

		assert!(token.execute(&mut ctx(bob, U256::ZERO), &input).is_err());
		token.execute(&mut ctx(alice, U256::ZERO), &input).unwrap();

		let out = token
			.view(&IBreedingToken::speedUnitFeeCall {}.abi_encode())
			.unwrap();
		assert_eq!(<(U256,)>::abi_decode_params(&out).unwrap().0, fee);
	}

	#[test]
	fn test_view_rejects_mutations() {
		let token = deployed(Address::ZERO);
		assert!(token.view(&spawn_call("Jack", 5)).is_err());
		assert!(token.view(&[0xde, 0xad, 0xbe, 0xef]).is_err());
	}
}
