//! Invocation-scoped identifier remap table.
//!
//! Created empty at import start, populated only during decode, consumed only during
//! the fixup pass, and cleared as the final step of the import. Nothing here survives
//! into a subsequent invocation.

// self
use crate::{_prelude::*, host::RecordId};

/// Entity kinds tracked by the remap table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
	/// Registered client.
	Client,
	/// Captured authentication context.
	AuthenticationHolder,
	/// Issued access token.
	AccessToken,
	/// Issued refresh token.
	RefreshToken,
	/// Approved site (grant).
	Grant,
	/// Whitelisted site.
	WhitelistedSite,
	/// Blacklisted site.
	BlacklistedSite,
	/// System scope.
	SystemScope,
}
impl EntityKind {
	/// Returns a stable label suitable for diagnostics.
	pub const fn as_str(self) -> &'static str {
		match self {
			EntityKind::Client => "client",
			EntityKind::AuthenticationHolder => "authentication holder",
			EntityKind::AccessToken => "access token",
			EntityKind::RefreshToken => "refresh token",
			EntityKind::Grant => "grant",
			EntityKind::WhitelistedSite => "whitelisted site",
			EntityKind::BlacklistedSite => "blacklisted site",
			EntityKind::SystemScope => "system scope",
		}
	}
}
impl Display for EntityKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Identifier an entity carried in the source server's schema, present only in the
/// interchange stream.
///
/// Legacy exports used numeric identifiers while this engine assigns string ones; both
/// normalize to the same textual form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegacyId(String);
impl LegacyId {
	/// Wraps a normalized identifier string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the normalized textual form.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl From<i64> for LegacyId {
	fn from(value: i64) -> Self {
		Self(value.to_string())
	}
}
impl From<&str> for LegacyId {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Display for LegacyId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Per-invocation mapping from legacy identifiers to engine-assigned ones, plus the
/// deferred cross-entity references discovered while decoding.
///
/// Exposes only insertion and full-bucket iteration. Insertion is write-once-per-key;
/// a later insertion for the same key overwrites (well-formed input never does this)
/// and is logged.
#[derive(Debug, Default)]
pub struct RemapTable {
	new_ids: HashMap<(EntityKind, LegacyId), RecordId>,
	refresh_token_to_client: HashMap<LegacyId, String>,
	refresh_token_to_holder: HashMap<LegacyId, LegacyId>,
	access_token_to_client: HashMap<LegacyId, String>,
	access_token_to_holder: HashMap<LegacyId, LegacyId>,
	access_token_to_refresh_token: HashMap<LegacyId, LegacyId>,
	grant_to_access_tokens: HashMap<LegacyId, BTreeSet<LegacyId>>,
}
impl RemapTable {
	/// Records the engine identifier assigned to a decoded entity.
	pub fn record_new_id(&mut self, kind: EntityKind, legacy: LegacyId, new_id: RecordId) {
		if let Some(previous) = self.new_ids.insert((kind, legacy.clone()), new_id) {
			tracing::warn!(%kind, %legacy, %previous, "Overwrote an existing identifier mapping.");
		}
	}

	/// Looks up the engine identifier assigned to a legacy identifier of the given kind.
	pub fn new_id(&self, kind: EntityKind, legacy: &LegacyId) -> Option<&RecordId> {
		self.new_ids.get(&(kind, legacy.clone()))
	}

	/// Defers a refresh-token-to-client reference (client referenced by natural key).
	pub fn defer_refresh_token_client(&mut self, token: LegacyId, client_id: String) {
		self.refresh_token_to_client.insert(token, client_id);
	}

	/// Defers a refresh-token-to-holder reference.
	pub fn defer_refresh_token_holder(&mut self, token: LegacyId, holder: LegacyId) {
		self.refresh_token_to_holder.insert(token, holder);
	}

	/// Defers an access-token-to-client reference (client referenced by natural key).
	pub fn defer_access_token_client(&mut self, token: LegacyId, client_id: String) {
		self.access_token_to_client.insert(token, client_id);
	}

	/// Defers an access-token-to-holder reference.
	pub fn defer_access_token_holder(&mut self, token: LegacyId, holder: LegacyId) {
		self.access_token_to_holder.insert(token, holder);
	}

	/// Defers an access-token-to-refresh-token reference.
	pub fn defer_access_token_refresh_token(&mut self, token: LegacyId, refresh: LegacyId) {
		self.access_token_to_refresh_token.insert(token, refresh);
	}

	/// Defers a grant-to-access-tokens reference set.
	pub fn defer_grant_access_tokens(&mut self, grant: LegacyId, tokens: BTreeSet<LegacyId>) {
		self.grant_to_access_tokens.insert(grant, tokens);
	}

	/// Iterates the deferred refresh-token-to-client bucket.
	pub fn refresh_token_client_refs(&self) -> impl Iterator<Item = (&LegacyId, &str)> {
		self.refresh_token_to_client.iter().map(|(token, client)| (token, client.as_str()))
	}

	/// Iterates the deferred refresh-token-to-holder bucket.
	pub fn refresh_token_holder_refs(&self) -> impl Iterator<Item = (&LegacyId, &LegacyId)> {
		self.refresh_token_to_holder.iter()
	}

	/// Iterates the deferred access-token-to-client bucket.
	pub fn access_token_client_refs(&self) -> impl Iterator<Item = (&LegacyId, &str)> {
		self.access_token_to_client.iter().map(|(token, client)| (token, client.as_str()))
	}

	/// Iterates the deferred access-token-to-holder bucket.
	pub fn access_token_holder_refs(&self) -> impl Iterator<Item = (&LegacyId, &LegacyId)> {
		self.access_token_to_holder.iter()
	}

	/// Iterates the deferred access-token-to-refresh-token bucket.
	pub fn access_token_refresh_token_refs(&self) -> impl Iterator<Item = (&LegacyId, &LegacyId)> {
		self.access_token_to_refresh_token.iter()
	}

	/// Iterates the deferred grant-to-access-tokens bucket.
	pub fn grant_access_token_refs(&self) -> impl Iterator<Item = (&LegacyId, &BTreeSet<LegacyId>)> {
		self.grant_to_access_tokens.iter()
	}

	/// Discards every mapping and deferred reference; the final step of an import.
	pub fn clear_all(&mut self) {
		self.new_ids.clear();
		self.refresh_token_to_client.clear();
		self.refresh_token_to_holder.clear();
		self.access_token_to_client.clear();
		self.access_token_to_holder.clear();
		self.access_token_to_refresh_token.clear();
		self.grant_to_access_tokens.clear();
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifier_mappings_are_keyed_by_kind() {
		let mut maps = RemapTable::default();
		let client_id = RecordId::generate();
		let token_id = RecordId::generate();

		maps.record_new_id(EntityKind::Client, LegacyId::from(7), client_id.clone());
		maps.record_new_id(EntityKind::AccessToken, LegacyId::from(7), token_id.clone());

		assert_eq!(maps.new_id(EntityKind::Client, &LegacyId::from(7)), Some(&client_id));
		assert_eq!(maps.new_id(EntityKind::AccessToken, &LegacyId::from(7)), Some(&token_id));
		assert_eq!(maps.new_id(EntityKind::Grant, &LegacyId::from(7)), None);
	}

	#[test]
	fn numeric_and_string_legacy_ids_normalize_alike() {
		assert_eq!(LegacyId::from(101), LegacyId::from("101"));
		assert_eq!(LegacyId::from(101).as_str(), "101");
	}

	#[test]
	fn clear_all_discards_every_bucket() {
		let mut maps = RemapTable::default();

		maps.record_new_id(EntityKind::Client, LegacyId::from(1), RecordId::generate());
		maps.defer_access_token_client(LegacyId::from(2), "client-1".into());
		maps.defer_grant_access_tokens(
			LegacyId::from(3),
			BTreeSet::from([LegacyId::from(2)]),
		);
		maps.clear_all();

		assert_eq!(maps.new_id(EntityKind::Client, &LegacyId::from(1)), None);
		assert_eq!(maps.access_token_client_refs().count(), 0);
		assert_eq!(maps.grant_access_token_refs().count(), 0);
	}
}
