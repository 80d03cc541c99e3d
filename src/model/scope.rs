//! System scope entity.

// self
use crate::{
	_prelude::*,
	host::{HostId, RecordId},
};

/// A scope the server knows about, with its presentation and policy flags.
///
/// The `value` is the natural key within one host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemScope {
	/// Engine-assigned identifier, present once persisted.
	pub id: Option<RecordId>,
	/// Owning host, stamped by the store on save.
	pub host: Option<HostId>,
	/// Scope value (natural key).
	pub value: Option<String>,
	/// Human-readable description.
	pub description: Option<String>,
	/// Icon shown on approval pages.
	pub icon: Option<String>,
	/// Whether the scope is restricted to privileged clients.
	pub restricted: bool,
	/// Whether the scope is granted to new clients by default.
	pub default_scope: bool,
}
