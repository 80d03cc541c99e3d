//! Thread-safe in-memory backend implementing every repository contract, for local
//! development and tests.

// self
use crate::{
	_prelude::*,
	host::{HostId, RecordId},
	model::{
		AccessToken, ApprovedSite, AuthenticationHolder, BlacklistedSite, Client, RefreshToken,
		SystemScope, WhitelistedSite,
	},
	store::{
		ApprovedSiteRepository, AuthenticationHolderRepository, BlacklistedSiteRepository,
		ClientRepository, StoreError, StoreResult, SystemScopeRepository, TokenRepository,
		WhitelistedSiteRepository,
	},
};

#[derive(Debug, Default)]
struct MemoryState {
	clients: HashMap<RecordId, Client>,
	approved_sites: HashMap<RecordId, ApprovedSite>,
	whitelisted_sites: HashMap<RecordId, WhitelistedSite>,
	blacklisted_sites: HashMap<RecordId, BlacklistedSite>,
	authentication_holders: HashMap<RecordId, AuthenticationHolder>,
	access_tokens: HashMap<RecordId, AccessToken>,
	refresh_tokens: HashMap<RecordId, RefreshToken>,
	system_scopes: HashMap<RecordId, SystemScope>,
}

/// In-process storage backend keeping every entity table behind one lock.
#[derive(Debug, Default)]
pub struct MemoryStore(RwLock<MemoryState>);

fn owned_by(host: &Option<HostId>, requested: &HostId) -> bool {
	host.as_ref() == Some(requested)
}

/// Stamps host and identifier on an entity about to be inserted, returning the key.
fn claim_id(id: &mut Option<RecordId>, host_slot: &mut Option<HostId>, host: &HostId) -> RecordId {
	let record_id = id.clone().unwrap_or_else(RecordId::generate);

	*id = Some(record_id.clone());
	*host_slot = Some(host.clone());

	record_id
}

impl ClientRepository for MemoryStore {
	fn save(&self, host: &HostId, mut client: Client) -> StoreResult<Client> {
		let mut state = self.0.write();
		let record_id = claim_id(&mut client.id, &mut client.host, host);

		if let Some(client_id) = client.client_id.as_deref() {
			let collision = state.clients.values().any(|existing| {
				owned_by(&existing.host, host)
					&& existing.client_id.as_deref() == Some(client_id)
					&& existing.id.as_ref() != Some(&record_id)
			});

			if collision {
				return Err(StoreError::Conflict { key: client_id.to_owned() });
			}
		}

		state.clients.insert(record_id, client.clone());

		Ok(client)
	}

	fn get_by_id(&self, host: &HostId, id: &RecordId) -> StoreResult<Option<Client>> {
		Ok(self.0.read().clients.get(id).filter(|c| owned_by(&c.host, host)).cloned())
	}

	fn get_by_client_id(&self, host: &HostId, client_id: &str) -> StoreResult<Option<Client>> {
		Ok(self
			.0
			.read()
			.clients
			.values()
			.find(|c| owned_by(&c.host, host) && c.client_id.as_deref() == Some(client_id))
			.cloned())
	}

	fn get_all(&self, host: &HostId) -> StoreResult<Vec<Client>> {
		Ok(self.0.read().clients.values().filter(|c| owned_by(&c.host, host)).cloned().collect())
	}
}
impl ApprovedSiteRepository for MemoryStore {
	fn save(&self, host: &HostId, mut site: ApprovedSite) -> StoreResult<ApprovedSite> {
		let mut state = self.0.write();
		let record_id = claim_id(&mut site.id, &mut site.host, host);

		state.approved_sites.insert(record_id, site.clone());

		Ok(site)
	}

	fn get_by_id(&self, host: &HostId, id: &RecordId) -> StoreResult<Option<ApprovedSite>> {
		Ok(self.0.read().approved_sites.get(id).filter(|s| owned_by(&s.host, host)).cloned())
	}

	fn get_all(&self, host: &HostId) -> StoreResult<Vec<ApprovedSite>> {
		Ok(self
			.0
			.read()
			.approved_sites
			.values()
			.filter(|s| owned_by(&s.host, host))
			.cloned()
			.collect())
	}
}
impl WhitelistedSiteRepository for MemoryStore {
	fn save(&self, host: &HostId, mut site: WhitelistedSite) -> StoreResult<WhitelistedSite> {
		let mut state = self.0.write();
		let record_id = claim_id(&mut site.id, &mut site.host, host);

		state.whitelisted_sites.insert(record_id, site.clone());

		Ok(site)
	}

	fn get_by_id(&self, host: &HostId, id: &RecordId) -> StoreResult<Option<WhitelistedSite>> {
		Ok(self.0.read().whitelisted_sites.get(id).filter(|s| owned_by(&s.host, host)).cloned())
	}

	fn get_all(&self, host: &HostId) -> StoreResult<Vec<WhitelistedSite>> {
		Ok(self
			.0
			.read()
			.whitelisted_sites
			.values()
			.filter(|s| owned_by(&s.host, host))
			.cloned()
			.collect())
	}
}
impl BlacklistedSiteRepository for MemoryStore {
	fn save(&self, host: &HostId, mut site: BlacklistedSite) -> StoreResult<BlacklistedSite> {
		let mut state = self.0.write();
		let record_id = claim_id(&mut site.id, &mut site.host, host);

		state.blacklisted_sites.insert(record_id, site.clone());

		Ok(site)
	}

	fn get_all(&self, host: &HostId) -> StoreResult<Vec<BlacklistedSite>> {
		Ok(self
			.0
			.read()
			.blacklisted_sites
			.values()
			.filter(|s| owned_by(&s.host, host))
			.cloned()
			.collect())
	}
}
impl AuthenticationHolderRepository for MemoryStore {
	fn save(
		&self,
		host: &HostId,
		mut holder: AuthenticationHolder,
	) -> StoreResult<AuthenticationHolder> {
		let mut state = self.0.write();
		let record_id = claim_id(&mut holder.id, &mut holder.host, host);

		state.authentication_holders.insert(record_id, holder.clone());

		Ok(holder)
	}

	fn get_by_id(
		&self,
		host: &HostId,
		id: &RecordId,
	) -> StoreResult<Option<AuthenticationHolder>> {
		Ok(self
			.0
			.read()
			.authentication_holders
			.get(id)
			.filter(|h| owned_by(&h.host, host))
			.cloned())
	}

	fn get_all(&self, host: &HostId) -> StoreResult<Vec<AuthenticationHolder>> {
		Ok(self
			.0
			.read()
			.authentication_holders
			.values()
			.filter(|h| owned_by(&h.host, host))
			.cloned()
			.collect())
	}
}
impl TokenRepository for MemoryStore {
	fn save_access_token(&self, host: &HostId, mut token: AccessToken) -> StoreResult<AccessToken> {
		let mut state = self.0.write();
		let record_id = claim_id(&mut token.id, &mut token.host, host);

		state.access_tokens.insert(record_id, token.clone());

		Ok(token)
	}

	fn get_access_token_by_id(
		&self,
		host: &HostId,
		id: &RecordId,
	) -> StoreResult<Option<AccessToken>> {
		Ok(self.0.read().access_tokens.get(id).filter(|t| owned_by(&t.host, host)).cloned())
	}

	fn get_all_access_tokens(&self, host: &HostId) -> StoreResult<Vec<AccessToken>> {
		Ok(self
			.0
			.read()
			.access_tokens
			.values()
			.filter(|t| owned_by(&t.host, host))
			.cloned()
			.collect())
	}

	fn save_refresh_token(
		&self,
		host: &HostId,
		mut token: RefreshToken,
	) -> StoreResult<RefreshToken> {
		let mut state = self.0.write();
		let record_id = claim_id(&mut token.id, &mut token.host, host);

		state.refresh_tokens.insert(record_id, token.clone());

		Ok(token)
	}

	fn get_refresh_token_by_id(
		&self,
		host: &HostId,
		id: &RecordId,
	) -> StoreResult<Option<RefreshToken>> {
		Ok(self.0.read().refresh_tokens.get(id).filter(|t| owned_by(&t.host, host)).cloned())
	}

	fn get_all_refresh_tokens(&self, host: &HostId) -> StoreResult<Vec<RefreshToken>> {
		Ok(self
			.0
			.read()
			.refresh_tokens
			.values()
			.filter(|t| owned_by(&t.host, host))
			.cloned()
			.collect())
	}
}
impl SystemScopeRepository for MemoryStore {
	fn save(&self, host: &HostId, mut scope: SystemScope) -> StoreResult<SystemScope> {
		let mut state = self.0.write();
		let record_id = claim_id(&mut scope.id, &mut scope.host, host);

		if let Some(value) = scope.value.as_deref() {
			let collision = state.system_scopes.values().any(|existing| {
				owned_by(&existing.host, host)
					&& existing.value.as_deref() == Some(value)
					&& existing.id.as_ref() != Some(&record_id)
			});

			if collision {
				return Err(StoreError::Conflict { key: value.to_owned() });
			}
		}

		state.system_scopes.insert(record_id, scope.clone());

		Ok(scope)
	}

	fn get_all(&self, host: &HostId) -> StoreResult<Vec<SystemScope>> {
		Ok(self
			.0
			.read()
			.system_scopes
			.values()
			.filter(|s| owned_by(&s.host, host))
			.cloned()
			.collect())
	}
}
