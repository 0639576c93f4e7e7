//! Schema validation for ledger backend configuration tables.
//!
//! Each ledger backend describes the TOML table it expects with a [`Schema`].
//! The config loader runs that schema before the backend is constructed so a
//! bad key or a malformed address is reported up front.

use crate::units::parse_amount;
use alloy_primitives::Address;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

impl ValidationError {
	/// Prefixes the offending field with the name of the enclosing table.
	fn nested_in(self, parent: &str) -> Self {
		match self {
			ValidationError::MissingField(f) => {
				ValidationError::MissingField(format!("{}.{}", parent, f))
			}
			ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
				field: format!("{}.{}", parent, field),
				message,
			},
			ValidationError::TypeMismatch {
				field,
				expected,
				actual,
			} => ValidationError::TypeMismatch {
				field: format!("{}.{}", parent, field),
				expected,
				actual,
			},
		}
	}
}

/// Type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	/// A 20-byte hex address string.
	Address,
	/// An amount of wei, either an integer or a `"<amount> <unit>"` string.
	Amount,
	Array(Box<FieldType>),
	Table(Schema),
}

/// Type alias for field validator functions.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A field definition with name and type.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator that runs after the type check passes.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Schema definition with required and optional fields.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// Unknown keys are tolerated; backends may share a table with keys they
	/// do not use.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn type_mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(type_mismatch(field_name, "string", value));
			}
		}
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| type_mismatch(field_name, "integer", value))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}

			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		}
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(type_mismatch(field_name, "boolean", value));
			}
		}
		FieldType::Address => {
			let text = value
				.as_str()
				.ok_or_else(|| type_mismatch(field_name, "address string", value))?;
			text.parse::<Address>()
				.map_err(|e| ValidationError::InvalidValue {
					field: field_name.to_string(),
					message: format!("Invalid address: {}", e),
				})?;
		}
		FieldType::Amount => match value {
			toml::Value::Integer(wei) if *wei >= 0 => {}
			toml::Value::String(text) => {
				parse_amount(text).map_err(|e| ValidationError::InvalidValue {
					field: field_name.to_string(),
					message: e.to_string(),
				})?;
			}
			_ => return Err(type_mismatch(field_name, "amount", value)),
		},
		FieldType::Array(inner_type) => {
			let array = value
				.as_array()
				.ok_or_else(|| type_mismatch(field_name, "array", value))?;

			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		}
		FieldType::Table(schema) => {
			schema.validate(value).map_err(|e| e.nested_in(field_name))?;
		}
	}

	Ok(())
}

/// Trait defining a configuration schema that can validate TOML values.
#[async_trait]
pub trait ConfigSchema: Send + Sync {
	/// Validates a backend's TOML table.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn genesis_schema() -> Schema {
		Schema::new(
			vec![Field::new(
				"genesis",
				FieldType::Array(Box::new(FieldType::Table(Schema::new(
					vec![
						Field::new("address", FieldType::Address),
						Field::new("balance", FieldType::Amount),
					],
					vec![],
				)))),
			)],
			vec![Field::new(
				"gas_price",
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			)],
		)
	}

	#[test]
	fn test_valid_table() {
		let config: toml::Value = toml::from_str(
			r#"
gas_price = 1
genesis = [{ address = "0x00000000000000000000000000000000000000aa", balance = "1 ether" }]
"#,
		)
		.unwrap();
		assert!(genesis_schema().validate(&config).is_ok());
	}

	#[test]
	fn test_nested_errors_carry_path() {
		let config: toml::Value = toml::from_str(
			r#"genesis = [{ address = "not-an-address", balance = "1 ether" }]"#,
		)
		.unwrap();
		match genesis_schema().validate(&config) {
			Err(ValidationError::InvalidValue { field, .. }) => {
				assert_eq!(field, "genesis[0].address");
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn test_missing_and_mistyped_fields() {
		let missing: toml::Value = toml::from_str("gas_price = 1").unwrap();
		assert!(matches!(
			genesis_schema().validate(&missing),
			Err(ValidationError::MissingField(f)) if f == "genesis"
		));

		let negative: toml::Value = toml::from_str("genesis = []\ngas_price = -1").unwrap();
		assert!(matches!(
			genesis_schema().validate(&negative),
			Err(ValidationError::InvalidValue { .. })
		));

		let bad_amount: toml::Value = toml::from_str(
			r#"genesis = [{ address = "0x00000000000000000000000000000000000000aa", balance = "lots" }]"#,
		)
		.unwrap();
		assert!(genesis_schema().validate(&bad_amount).is_err());
	}
}
