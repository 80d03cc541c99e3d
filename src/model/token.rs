//! Access and refresh token entities and the signed-token value wrapper.

// self
use crate::{
	_prelude::*,
	host::{HostId, RecordId},
	model::FieldDecodeError,
};

/// Signed token value in compact JWS serialization, redacted in diagnostics.
///
/// Only the shape is validated (three non-empty base64url segments); signature
/// verification belongs to the issuing server, not the interchange engine.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SignedJwt(String);
impl SignedJwt {
	/// Validates and wraps a compact-serialized signed token.
	pub fn parse(value: impl Into<String>) -> Result<Self, FieldDecodeError> {
		let value = value.into();
		let mut segments = 0_usize;

		for segment in value.split('.') {
			segments += 1;

			if segment.is_empty()
				|| !segment
					.chars()
					.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '='))
			{
				return Err(FieldDecodeError::new("signed token", value));
			}
		}
		if segments != 3 {
			return Err(FieldDecodeError::new("signed token", value));
		}

		Ok(Self(value))
	}

	/// Returns the serialized token. Callers must avoid logging it.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for SignedJwt {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl TryFrom<String> for SignedJwt {
	type Error = FieldDecodeError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}
impl From<SignedJwt> for String {
	fn from(value: SignedJwt) -> Self {
		value.0
	}
}
impl Debug for SignedJwt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SignedJwt").field(&"<redacted>").finish()
	}
}
impl Display for SignedJwt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Issued access token with its resolved relationships.
///
/// The `client`, `authentication_holder`, `refresh_token`, and `approved_site` fields
/// hold engine-assigned identifiers and stay unset until the fixup pass resolves the
/// deferred references recorded during decode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Engine-assigned identifier, present once persisted.
	pub id: Option<RecordId>,
	/// Owning host, stamped by the store on save.
	pub host: Option<HostId>,
	/// Signed token value.
	pub value: Option<SignedJwt>,
	/// Expiration instant.
	#[serde(with = "time::serde::rfc3339::option")]
	pub expiration: Option<OffsetDateTime>,
	/// Scopes granted to the token.
	pub scope: BTreeSet<String>,
	/// Token type label (typically `Bearer`).
	pub token_type: Option<String>,
	/// Issuing client.
	pub client: Option<RecordId>,
	/// Captured authentication context.
	pub authentication_holder: Option<RecordId>,
	/// Paired refresh token, when one was issued.
	pub refresh_token: Option<RecordId>,
	/// Approved site this token was issued under.
	pub approved_site: Option<RecordId>,
}

/// Issued refresh token with its resolved relationships.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshToken {
	/// Engine-assigned identifier, present once persisted.
	pub id: Option<RecordId>,
	/// Owning host, stamped by the store on save.
	pub host: Option<HostId>,
	/// Signed token value.
	pub value: Option<SignedJwt>,
	/// Expiration instant.
	#[serde(with = "time::serde::rfc3339::option")]
	pub expiration: Option<OffsetDateTime>,
	/// Issuing client.
	pub client: Option<RecordId>,
	/// Captured authentication context.
	pub authentication_holder: Option<RecordId>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const SAMPLE: &str = "eyJhbGciOiJub25lIn0.eyJqdGkiOiJhYmMifQ.c2ln";

	#[test]
	fn well_formed_tokens_parse() {
		let jwt = SignedJwt::parse(SAMPLE).expect("Compact three-segment token should parse.");

		assert_eq!(jwt.expose(), SAMPLE);
	}

	#[test]
	fn malformed_tokens_are_rejected() {
		assert!(SignedJwt::parse("no-dots-here").is_err());
		assert!(SignedJwt::parse("one.two").is_err());
		assert!(SignedJwt::parse("a..c").is_err(), "Empty segments must be rejected.");
		assert!(SignedJwt::parse("a.b!c.d").is_err(), "Non-base64url characters must fail.");
	}

	#[test]
	fn formatters_redact_token_material() {
		let jwt = SignedJwt::parse(SAMPLE).expect("Sample token should parse.");

		assert_eq!(format!("{jwt:?}"), "SignedJwt(\"<redacted>\")");
		assert_eq!(format!("{jwt}"), "<redacted>");
	}
}
