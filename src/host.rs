//! Strongly typed host and record identifiers enforced across the interchange domain.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty or whitespace.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (host, record).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (host, record).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (host, record).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { HostId, "Identifier of the host (tenant) that owns every entity in one import/export invocation.", "Host" }
def_id! { RecordId, "Engine-assigned identifier a persistence collaborator stamps on an entity at first save.", "Record" }

impl RecordId {
	/// Generates a fresh random record identifier.
	pub fn generate() -> Self {
		Self(random_hex_identifier())
	}
}

/// Produces a random 128-bit identifier in the dashed hexadecimal layout persistence
/// stores conventionally use for surrogate keys.
pub(crate) fn random_hex_identifier() -> String {
	// crates.io
	use rand::Rng;

	let value: u128 = rand::rng().random();
	let hex = format!("{value:032x}");

	format!("{}-{}-{}-{}-{}", &hex[..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..])
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_padding_and_whitespace() {
		assert!(HostId::new(" host-123").is_err(), "Leading whitespace must be rejected.");
		assert!(HostId::new("host-123 ").is_err(), "Trailing whitespace must be rejected.");

		let host = HostId::new("host-123").expect("Host fixture should be considered valid.");

		assert_eq!(host.as_ref(), "host-123");
		assert!(RecordId::new("").is_err());
		assert!(RecordId::new("with space").is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let payload = "\"host-42\"";
		let host: HostId =
			serde_json::from_str(payload).expect("Host should deserialize successfully.");

		assert_eq!(host.as_ref(), "host-42");
		assert!(serde_json::from_str::<HostId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<HostId>("\" host-42\"").is_err());
	}

	#[test]
	fn length_limits_apply() {
		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		HostId::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert!(HostId::new(&too_long).is_err());
	}

	#[test]
	fn generated_record_ids_validate_and_differ() {
		let lhs = RecordId::generate();
		let rhs = RecordId::generate();

		assert_ne!(lhs, rhs);
		assert_eq!(lhs.len(), 36);
		RecordId::new(lhs.as_ref()).expect("Generated identifier should pass validation.");
	}
}
