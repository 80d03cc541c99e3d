//! Captured authentication context persisted alongside issued tokens.

// self
use crate::{
	_prelude::*,
	host::{HostId, RecordId},
};

/// Snapshot of the authorization request and user authentication a token was issued
/// under.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationHolder {
	/// Engine-assigned identifier, present once persisted.
	pub id: Option<RecordId>,
	/// Owning host, stamped by the store on save.
	pub host: Option<HostId>,
	/// Captured authorization request, when one was recorded.
	pub request: Option<AuthorizationRequest>,
	/// Captured user-authentication snapshot, absent for client-only grants.
	pub user_auth: Option<SavedUserAuthentication>,
}

/// The client-side half of a captured authentication: what was requested and approved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
	/// Natural key of the requesting client.
	pub client_id: Option<String>,
	/// Scopes requested for the authorization.
	pub scope: BTreeSet<String>,
	/// Resource identifiers named in the request.
	pub resource_ids: BTreeSet<String>,
	/// Authorities granted to the request.
	pub authorities: BTreeSet<String>,
	/// Whether the request was approved.
	pub approved: bool,
	/// Redirect URI the response was sent to.
	pub redirect_uri: Option<String>,
	/// Response types requested.
	pub response_types: BTreeSet<String>,
	/// Raw request parameters as submitted.
	pub request_parameters: BTreeMap<String, String>,
	/// String-valued request extensions.
	pub extensions: BTreeMap<String, String>,
}

/// The user-side half of a captured authentication.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedUserAuthentication {
	/// Principal name of the authenticated user.
	pub name: Option<String>,
	/// Type of the authentication object this snapshot was taken from.
	pub source_class: Option<String>,
	/// Whether the user was authenticated when the snapshot was taken.
	pub authenticated: bool,
	/// Authorities held by the user.
	pub authorities: BTreeSet<String>,
}
