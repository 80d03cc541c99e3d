//! Approved, whitelisted, and blacklisted site entities.

// self
use crate::{
	_prelude::*,
	host::{HostId, RecordId},
};

/// A user's standing approval for one client (a grant).
///
/// References clients by natural key; the approved access-token list is populated by
/// the fixup pass once the referenced tokens have acquired engine identifiers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovedSite {
	/// Engine-assigned identifier, present once persisted.
	pub id: Option<RecordId>,
	/// Owning host, stamped by the store on save.
	pub host: Option<HostId>,
	/// User that granted the approval.
	pub user_id: Option<String>,
	/// Natural key of the approved client.
	pub client_id: Option<String>,
	/// Instant the approval was created.
	#[serde(with = "time::serde::rfc3339::option")]
	pub creation_date: Option<OffsetDateTime>,
	/// Instant the approval was last exercised.
	#[serde(with = "time::serde::rfc3339::option")]
	pub access_date: Option<OffsetDateTime>,
	/// Instant the approval lapses, when bounded.
	#[serde(with = "time::serde::rfc3339::option")]
	pub timeout_date: Option<OffsetDateTime>,
	/// Scopes the approval covers.
	pub allowed_scopes: BTreeSet<String>,
	/// Access tokens issued under this approval.
	pub approved_access_tokens: Vec<RecordId>,
}

/// An administrator-whitelisted client that skips user approval.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WhitelistedSite {
	/// Engine-assigned identifier, present once persisted.
	pub id: Option<RecordId>,
	/// Owning host, stamped by the store on save.
	pub host: Option<HostId>,
	/// Administrator that created the entry.
	pub creator_user_id: Option<String>,
	/// Natural key of the whitelisted client.
	pub client_id: Option<String>,
	/// Scopes granted without prompting.
	pub allowed_scopes: BTreeSet<String>,
}

/// A URI barred from registration and redirect use.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlacklistedSite {
	/// Engine-assigned identifier, present once persisted.
	pub id: Option<RecordId>,
	/// Owning host, stamped by the store on save.
	pub host: Option<HostId>,
	/// The barred URI.
	pub uri: Option<Url>,
}
