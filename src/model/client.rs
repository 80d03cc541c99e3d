//! Registered client entity and its enumerated metadata values.

// self
use crate::{
	_prelude::*,
	host::{HostId, RecordId},
	model::FieldDecodeError,
};

macro_rules! def_literal_enum {
	(
		$(#[$meta:meta])*
		$name:ident, $kind:literal, {
			$($(#[$variant_meta:meta])* $variant:ident => $literal:literal,)+
		}
	) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub enum $name {
			$($(#[$variant_meta])* $variant,)+
		}
		impl $name {
			/// Looks a value up by its wire literal.
			pub fn from_name(literal: &str) -> Result<Self, FieldDecodeError> {
				match literal {
					$($literal => Ok(Self::$variant),)+
					_ => Err(FieldDecodeError::new($kind, literal)),
				}
			}

			/// Returns the wire literal for this value.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $literal,)+
				}
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(self.as_str())
			}
		}
		impl FromStr for $name {
			type Err = FieldDecodeError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::from_name(s)
			}
		}
		impl TryFrom<String> for $name {
			type Error = FieldDecodeError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::from_name(&value)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.as_str().to_owned()
			}
		}
	};
}

def_literal_enum! {
	/// Token endpoint authentication methods a client may register.
	AuthMethod, "token endpoint auth method", {
		/// HTTP Basic authentication with the client secret.
		SecretBasic => "client_secret_basic",
		/// Client secret passed in the request body.
		SecretPost => "client_secret_post",
		/// Client secret used to sign a JWT assertion.
		SecretJwt => "client_secret_jwt",
		/// Private key used to sign a JWT assertion.
		PrivateKey => "private_key_jwt",
		/// No authentication at the token endpoint.
		None => "none",
	}
}

def_literal_enum! {
	/// OIDC application types.
	AppType, "application type", {
		/// Server-based web application.
		Web => "web",
		/// Native (installed) application.
		Native => "native",
	}
}

def_literal_enum! {
	/// OIDC subject identifier types.
	SubjectType, "subject type", {
		/// The same subject value for every client.
		Public => "public",
		/// Per-sector pairwise subject values.
		Pairwise => "pairwise",
	}
}

def_literal_enum! {
	/// JWS signature algorithm identifiers accepted in client metadata.
	JwsAlgorithm, "JWS algorithm", {
		/// HMAC with SHA-256.
		Hs256 => "HS256",
		/// HMAC with SHA-384.
		Hs384 => "HS384",
		/// HMAC with SHA-512.
		Hs512 => "HS512",
		/// RSASSA-PKCS1-v1_5 with SHA-256.
		Rs256 => "RS256",
		/// RSASSA-PKCS1-v1_5 with SHA-384.
		Rs384 => "RS384",
		/// RSASSA-PKCS1-v1_5 with SHA-512.
		Rs512 => "RS512",
		/// ECDSA with P-256 and SHA-256.
		Es256 => "ES256",
		/// ECDSA with P-384 and SHA-384.
		Es384 => "ES384",
		/// ECDSA with P-521 and SHA-512.
		Es512 => "ES512",
		/// RSASSA-PSS with SHA-256.
		Ps256 => "PS256",
		/// RSASSA-PSS with SHA-384.
		Ps384 => "PS384",
		/// RSASSA-PSS with SHA-512.
		Ps512 => "PS512",
		/// Unsecured (no signature).
		None => "none",
	}
}

def_literal_enum! {
	/// JWE key management algorithm identifiers accepted in client metadata.
	JweAlgorithm, "JWE algorithm", {
		/// RSAES-PKCS1-v1_5 key encryption.
		Rsa15 => "RSA1_5",
		/// RSAES OAEP key encryption.
		RsaOaep => "RSA-OAEP",
		/// RSAES OAEP with SHA-256 key encryption.
		RsaOaep256 => "RSA-OAEP-256",
		/// AES-128 key wrap.
		A128Kw => "A128KW",
		/// AES-192 key wrap.
		A192Kw => "A192KW",
		/// AES-256 key wrap.
		A256Kw => "A256KW",
		/// Direct use of a shared symmetric key.
		Dir => "dir",
		/// ECDH-ES ephemeral-static key agreement.
		EcdhEs => "ECDH-ES",
		/// ECDH-ES with AES-128 key wrap.
		EcdhEsA128Kw => "ECDH-ES+A128KW",
		/// ECDH-ES with AES-256 key wrap.
		EcdhEsA256Kw => "ECDH-ES+A256KW",
	}
}

def_literal_enum! {
	/// JWE content encryption method identifiers accepted in client metadata.
	ContentEncryption, "content encryption method", {
		/// AES-128-CBC with HMAC-SHA-256.
		A128CbcHs256 => "A128CBC-HS256",
		/// AES-192-CBC with HMAC-SHA-384.
		A192CbcHs384 => "A192CBC-HS384",
		/// AES-256-CBC with HMAC-SHA-512.
		A256CbcHs512 => "A256CBC-HS512",
		/// AES-128-GCM.
		A128Gcm => "A128GCM",
		/// AES-192-GCM.
		A192Gcm => "A192GCM",
		/// AES-256-GCM.
		A256Gcm => "A256GCM",
	}
}

/// Registered OAuth client with its full OIDC metadata.
///
/// The `client_id` is the natural key within one host; references from other entities
/// use it directly and are never renumbered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
	/// Engine-assigned identifier, present once persisted.
	pub id: Option<RecordId>,
	/// Owning host, stamped by the store on save.
	pub host: Option<HostId>,
	/// Natural key of the client within its host.
	pub client_id: Option<String>,
	/// Client secret.
	pub client_secret: Option<String>,
	/// Human-readable client name.
	pub client_name: Option<String>,
	/// Human-readable description.
	pub description: Option<String>,
	/// Scopes the client may request.
	pub scope: BTreeSet<String>,
	/// Registered redirect URIs.
	pub redirect_uris: BTreeSet<String>,
	/// Grant types the client may use.
	pub grant_types: BTreeSet<String>,
	/// Response types the client may use.
	pub response_types: BTreeSet<String>,
	/// Resource identifiers the client may access.
	pub resource_ids: BTreeSet<String>,
	/// Authorities granted to the client itself.
	pub authorities: BTreeSet<String>,
	/// Contact addresses for the client's operators.
	pub contacts: BTreeSet<String>,
	/// Access-token validity window in seconds.
	pub access_token_validity_seconds: Option<i64>,
	/// Refresh-token validity window in seconds.
	pub refresh_token_validity_seconds: Option<i64>,
	/// Token endpoint authentication method.
	pub token_endpoint_auth_method: Option<AuthMethod>,
	/// OIDC application type.
	pub application_type: Option<AppType>,
	/// OIDC subject identifier type.
	pub subject_type: Option<SubjectType>,
	/// Client home page.
	pub client_uri: Option<Url>,
	/// Client logo.
	pub logo_uri: Option<Url>,
	/// Terms-of-service document.
	pub tos_uri: Option<Url>,
	/// Privacy policy document.
	pub policy_uri: Option<Url>,
	/// Published JWK set.
	pub jwks_uri: Option<Url>,
	/// Sector identifier for pairwise subjects.
	pub sector_identifier_uri: Option<Url>,
	/// Third-party-initiated login endpoint.
	pub initiate_login_uri: Option<Url>,
	/// Signing algorithm required on request objects.
	pub request_object_signing_alg: Option<JwsAlgorithm>,
	/// Signing algorithm for userinfo responses.
	pub user_info_signed_response_alg: Option<JwsAlgorithm>,
	/// Key management algorithm for encrypted userinfo responses.
	pub user_info_encrypted_response_alg: Option<JweAlgorithm>,
	/// Content encryption for encrypted userinfo responses.
	pub user_info_encrypted_response_enc: Option<ContentEncryption>,
	/// Signing algorithm for ID tokens.
	pub id_token_signed_response_alg: Option<JwsAlgorithm>,
	/// Key management algorithm for encrypted ID tokens.
	pub id_token_encrypted_response_alg: Option<JweAlgorithm>,
	/// Content encryption for encrypted ID tokens.
	pub id_token_encrypted_response_enc: Option<ContentEncryption>,
	/// Signing algorithm for token endpoint JWT assertions.
	pub token_endpoint_auth_signing_alg: Option<JwsAlgorithm>,
	/// Default maximum authentication age in seconds.
	pub default_max_age: Option<i64>,
	/// Whether the client requires an auth_time claim.
	pub require_auth_time: Option<bool>,
	/// Default requested ACR values.
	pub default_acr_values: BTreeSet<String>,
	/// Registered post-logout redirect URIs.
	pub post_logout_redirect_uris: BTreeSet<String>,
	/// Pre-registered request_uri values.
	pub request_uris: BTreeSet<String>,
	/// Whether protected resources may introspect this client's tokens.
	pub allow_introspection: bool,
	/// Whether refresh tokens are reused rather than rotated.
	pub reuse_refresh_token: bool,
	/// Whether the client arrived through dynamic registration.
	pub dynamically_registered: bool,
}
