//! Ether denominations and amount parsing.
//!
//! Amounts in configuration files are written as `"<amount> <unit>"`, e.g.
//! `"5 finney"` or `"0.25 ether"`. The unit table is fixed; each unit is a
//! power of ten of wei.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitError {
	#[error("Unknown denomination: {0}")]
	UnknownDenomination(String),
	#[error("Invalid amount: {0}")]
	InvalidAmount(String),
	#[error("Amount does not fit in 256 bits: {0}")]
	Overflow(String),
}

/// Named ether denominations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denomination {
	Wei,
	Ada,
	Babbage,
	Shannon,
	Szabo,
	Finney,
	Ether,
}

/// Unit names (including common aliases) and the denomination they map to.
const UNITS: [(&str, Denomination); 13] = [
	("wei", Denomination::Wei),
	("ada", Denomination::Ada),
	("kwei", Denomination::Ada),
	("babbage", Denomination::Babbage),
	("mwei", Denomination::Babbage),
	("shannon", Denomination::Shannon),
	("gwei", Denomination::Shannon),
	("szabo", Denomination::Szabo),
	("microether", Denomination::Szabo),
	("finney", Denomination::Finney),
	("milliether", Denomination::Finney),
	("ether", Denomination::Ether),
	("eth", Denomination::Ether),
];

impl Denomination {
	/// Power of ten relative to wei.
	pub const fn exponent(self) -> u8 {
		match self {
			Denomination::Wei => 0,
			Denomination::Ada => 3,
			Denomination::Babbage => 6,
			Denomination::Shannon => 9,
			Denomination::Szabo => 12,
			Denomination::Finney => 15,
			Denomination::Ether => 18,
		}
	}

	pub const fn name(self) -> &'static str {
		match self {
			Denomination::Wei => "wei",
			Denomination::Ada => "ada",
			Denomination::Babbage => "babbage",
			Denomination::Shannon => "shannon",
			Denomination::Szabo => "szabo",
			Denomination::Finney => "finney",
			Denomination::Ether => "ether",
		}
	}

	/// Number of wei in one unit.
	pub fn multiplier(self) -> U256 {
		U256::from(10u64).pow(U256::from(self.exponent()))
	}

	/// `count` units expressed in wei.
	pub fn amount(self, count: u64) -> U256 {
		U256::from(count) * self.multiplier()
	}
}

impl fmt::Display for Denomination {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Denomination {
	type Err = UnitError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let lower = s.trim().to_ascii_lowercase();
		UNITS
			.iter()
			.find(|(name, _)| *name == lower)
			.map(|(_, unit)| *unit)
			.ok_or_else(|| UnitError::UnknownDenomination(s.to_string()))
	}
}

/// Parses `"<amount> [unit]"` into wei. The unit defaults to wei.
///
/// Fractional amounts are accepted as long as they resolve to a whole number
/// of wei (`"1.5 gwei"` is fine, `"0.5 wei"` is not).
pub fn parse_amount(input: &str) -> Result<U256, UnitError> {
	let mut parts = input.split_whitespace();
	let number = parts
		.next()
		.ok_or_else(|| UnitError::InvalidAmount(input.to_string()))?;
	let unit = match parts.next() {
		Some(unit) => unit.parse::<Denomination>()?,
		None => Denomination::Wei,
	};
	if parts.next().is_some() {
		return Err(UnitError::InvalidAmount(input.to_string()));
	}

	let (whole, fraction) = match number.split_once('.') {
		Some((whole, fraction)) => (whole, fraction),
		None => (number, ""),
	};
	let exponent = unit.exponent() as usize;
	let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
	if (whole.is_empty() && fraction.is_empty())
		|| !all_digits(whole)
		|| !all_digits(fraction)
		|| fraction.len() > exponent
	{
		return Err(UnitError::InvalidAmount(input.to_string()));
	}

	// Shift the fraction into the integer part: "1.5 gwei" -> "1500000000" wei.
	let digits = format!("{}{}{}", whole, fraction, "0".repeat(exponent - fraction.len()));
	let digits = digits.trim_start_matches('0');
	if digits.is_empty() {
		return Ok(U256::ZERO);
	}
	U256::from_str_radix(digits, 10).map_err(|_| UnitError::Overflow(input.to_string()))
}

/// Formats a wei amount using the largest unit that divides it exactly.
pub fn format_amount(wei: U256) -> String {
	const DESCENDING: [Denomination; 7] = [
		Denomination::Ether,
		Denomination::Finney,
		Denomination::Szabo,
		Denomination::Shannon,
		Denomination::Babbage,
		Denomination::Ada,
		Denomination::Wei,
	];
	if wei.is_zero() {
		return "0 wei".to_string();
	}
	for unit in DESCENDING {
		let multiplier = unit.multiplier();
		if (wei % multiplier).is_zero() {
			return format!("{} {}", wei / multiplier, unit);
		}
	}
	format!("{} wei", wei)
}

/// Serde helper accepting either an integer number of wei or a unit string.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Wei(u64),
		Text(String),
	}

	match Raw::deserialize(deserializer)? {
		Raw::Wei(wei) => Ok(U256::from(wei)),
		Raw::Text(text) => parse_amount(&text).map_err(serde::de::Error::custom),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_multipliers() {
		assert_eq!(Denomination::Wei.multiplier(), U256::from(1u64));
		assert_eq!(Denomination::Finney.multiplier(), U256::from(1_000_000_000_000_000u64));
		assert_eq!(
			Denomination::Ether.amount(1),
			U256::from(1_000_000_000_000_000_000u64)
		);
	}

	#[test]
	fn test_parse_units_and_aliases() {
		assert_eq!(parse_amount("5 finney").unwrap(), Denomination::Finney.amount(5));
		assert_eq!(parse_amount("5 milliether").unwrap(), Denomination::Finney.amount(5));
		assert_eq!(parse_amount("3 GWEI").unwrap(), Denomination::Shannon.amount(3));
		assert_eq!(parse_amount("17").unwrap(), U256::from(17u64));
	}

	#[test]
	fn test_parse_fractions() {
		assert_eq!(parse_amount("1.5 gwei").unwrap(), U256::from(1_500_000_000u64));
		assert_eq!(parse_amount("0.001 ether").unwrap(), Denomination::Finney.amount(1));
		assert_eq!(parse_amount("0 ether").unwrap(), U256::ZERO);
		assert!(matches!(parse_amount("0.5 wei"), Err(UnitError::InvalidAmount(_))));
	}

	#[test]
	fn test_parse_rejects_garbage() {
		assert!(matches!(
			parse_amount("5 dogecoin"),
			Err(UnitError::UnknownDenomination(_))
		));
		assert!(matches!(parse_amount(""), Err(UnitError::InvalidAmount(_))));
		assert!(matches!(parse_amount("-1 wei"), Err(UnitError::InvalidAmount(_))));
		assert!(matches!(parse_amount("1 ether extra"), Err(UnitError::InvalidAmount(_))));
	}

	#[test]
	fn test_format_amount() {
		assert_eq!(format_amount(Denomination::Finney.amount(13)), "13 finney");
		assert_eq!(format_amount(Denomination::Finney.amount(5) + U256::from(17u64)), "5000000000000017 wei");
		assert_eq!(format_amount(U256::ZERO), "0 wei");
	}

	#[test]
	fn test_deserialize_amount() {
		#[derive(Deserialize)]
		struct Holder {
			#[serde(deserialize_with = "deserialize_amount")]
			value: U256,
		}

		let text: Holder = serde_json::from_str(r#"{"value":"2 szabo"}"#).unwrap();
		assert_eq!(text.value, Denomination::Szabo.amount(2));
		let raw: Holder = serde_json::from_str(r#"{"value":42}"#).unwrap();
		assert_eq!(raw.value, U256::from(42u64));
	}
}
