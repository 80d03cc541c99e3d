//! Persistence contracts the interchange engine drives, one per entity type.
//!
//! Every operation takes the owning [`HostId`](crate::host::HostId) explicitly; no
//! collaborator may recover the tenant from ambient state. All calls are synchronous
//! and may block the caller.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	host::{HostId, RecordId},
	model::{
		AccessToken, ApprovedSite, AuthenticationHolder, BlacklistedSite, Client, RefreshToken,
		SystemScope, WhitelistedSite,
	},
};

/// Result alias for persistence-collaborator calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type produced by persistence collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Uniqueness violation on a natural key.
	#[error("Natural key already exists: {key}.")]
	Conflict {
		/// The colliding key.
		key: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Storage contract for registered clients.
pub trait ClientRepository
where
	Self: Send + Sync,
{
	/// Persists a client, assigning an engine identifier on first save.
	fn save(&self, host: &HostId, client: Client) -> StoreResult<Client>;

	/// Fetches a client by engine identifier.
	fn get_by_id(&self, host: &HostId, id: &RecordId) -> StoreResult<Option<Client>>;

	/// Fetches a client by its natural key.
	fn get_by_client_id(&self, host: &HostId, client_id: &str) -> StoreResult<Option<Client>>;

	/// Returns every client owned by the host.
	fn get_all(&self, host: &HostId) -> StoreResult<Vec<Client>>;
}

/// Storage contract for approved sites (grants).
pub trait ApprovedSiteRepository
where
	Self: Send + Sync,
{
	/// Persists an approved site, assigning an engine identifier on first save.
	fn save(&self, host: &HostId, site: ApprovedSite) -> StoreResult<ApprovedSite>;

	/// Fetches an approved site by engine identifier.
	fn get_by_id(&self, host: &HostId, id: &RecordId) -> StoreResult<Option<ApprovedSite>>;

	/// Returns every approved site owned by the host.
	fn get_all(&self, host: &HostId) -> StoreResult<Vec<ApprovedSite>>;
}

/// Storage contract for whitelisted sites.
pub trait WhitelistedSiteRepository
where
	Self: Send + Sync,
{
	/// Persists a whitelisted site, assigning an engine identifier on first save.
	fn save(&self, host: &HostId, site: WhitelistedSite) -> StoreResult<WhitelistedSite>;

	/// Fetches a whitelisted site by engine identifier.
	fn get_by_id(&self, host: &HostId, id: &RecordId) -> StoreResult<Option<WhitelistedSite>>;

	/// Returns every whitelisted site owned by the host.
	fn get_all(&self, host: &HostId) -> StoreResult<Vec<WhitelistedSite>>;
}

/// Storage contract for blacklisted sites.
pub trait BlacklistedSiteRepository
where
	Self: Send + Sync,
{
	/// Persists a blacklisted site, assigning an engine identifier on first save.
	fn save(&self, host: &HostId, site: BlacklistedSite) -> StoreResult<BlacklistedSite>;

	/// Returns every blacklisted site owned by the host.
	fn get_all(&self, host: &HostId) -> StoreResult<Vec<BlacklistedSite>>;
}

/// Storage contract for captured authentication holders.
pub trait AuthenticationHolderRepository
where
	Self: Send + Sync,
{
	/// Persists a holder, assigning an engine identifier on first save.
	fn save(
		&self,
		host: &HostId,
		holder: AuthenticationHolder,
	) -> StoreResult<AuthenticationHolder>;

	/// Fetches a holder by engine identifier.
	fn get_by_id(
		&self,
		host: &HostId,
		id: &RecordId,
	) -> StoreResult<Option<AuthenticationHolder>>;

	/// Returns every holder owned by the host.
	fn get_all(&self, host: &HostId) -> StoreResult<Vec<AuthenticationHolder>>;
}

/// Storage contract for access and refresh tokens.
pub trait TokenRepository
where
	Self: Send + Sync,
{
	/// Persists an access token, assigning an engine identifier on first save.
	fn save_access_token(&self, host: &HostId, token: AccessToken) -> StoreResult<AccessToken>;

	/// Fetches an access token by engine identifier.
	fn get_access_token_by_id(
		&self,
		host: &HostId,
		id: &RecordId,
	) -> StoreResult<Option<AccessToken>>;

	/// Returns every access token owned by the host.
	fn get_all_access_tokens(&self, host: &HostId) -> StoreResult<Vec<AccessToken>>;

	/// Persists a refresh token, assigning an engine identifier on first save.
	fn save_refresh_token(&self, host: &HostId, token: RefreshToken) -> StoreResult<RefreshToken>;

	/// Fetches a refresh token by engine identifier.
	fn get_refresh_token_by_id(
		&self,
		host: &HostId,
		id: &RecordId,
	) -> StoreResult<Option<RefreshToken>>;

	/// Returns every refresh token owned by the host.
	fn get_all_refresh_tokens(&self, host: &HostId) -> StoreResult<Vec<RefreshToken>>;
}

/// Storage contract for system scopes.
pub trait SystemScopeRepository
where
	Self: Send + Sync,
{
	/// Persists a scope, assigning an engine identifier on first save.
	fn save(&self, host: &HostId, scope: SystemScope) -> StoreResult<SystemScope>;

	/// Returns every scope owned by the host.
	fn get_all(&self, host: &HostId) -> StoreResult<Vec<SystemScope>>;
}

/// The full set of persistence collaborators one import or export drives.
#[derive(Clone)]
pub struct Stores {
	/// Client storage.
	pub clients: Arc<dyn ClientRepository>,
	/// Approved-site storage.
	pub approved_sites: Arc<dyn ApprovedSiteRepository>,
	/// Whitelisted-site storage.
	pub whitelisted_sites: Arc<dyn WhitelistedSiteRepository>,
	/// Blacklisted-site storage.
	pub blacklisted_sites: Arc<dyn BlacklistedSiteRepository>,
	/// Authentication-holder storage.
	pub authentication_holders: Arc<dyn AuthenticationHolderRepository>,
	/// Access- and refresh-token storage.
	pub tokens: Arc<dyn TokenRepository>,
	/// System-scope storage.
	pub system_scopes: Arc<dyn SystemScopeRepository>,
}
impl Stores {
	/// Wires every collaborator to one shared in-memory backend.
	pub fn in_memory() -> Self {
		let store = Arc::new(MemoryStore::default());

		Self {
			clients: store.clone(),
			approved_sites: store.clone(),
			whitelisted_sites: store.clone(),
			blacklisted_sites: store.clone(),
			authentication_holders: store.clone(),
			tokens: store.clone(),
			system_scopes: store,
		}
	}
}
impl Debug for Stores {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Stores(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_engine_error_with_source() {
		// std
		use std::error::Error as StdError;

		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let engine_error: Error = store_error.clone().into();

		assert!(matches!(engine_error, Error::Storage(_)));
		assert!(engine_error.to_string().contains("database unreachable"));

		let source = StdError::source(&engine_error)
			.expect("Engine error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn conflict_errors_name_the_colliding_key() {
		let err = StoreError::Conflict { key: "client-1".into() };

		assert!(err.to_string().contains("client-1"));
	}
}
