//! Entity decoders shared across format generations.
//!
//! Every decoder follows the same discipline: begin the object, loop while the stream
//! has a next token, read the field name, skip null values unconditionally, dispatch
//! recognized names to a setter, and log-and-skip everything else. Relationship fields
//! holding legacy identifiers are never resolved inline; they are recorded into the
//! remap table and stitched together by the fixup pass once the whole stream has been
//! consumed.

// crates.io
use tracing::{debug, info};
// self
use crate::{
	_prelude::*,
	host::{HostId, random_hex_identifier},
	interchange::{
		DiagnosticKind, ImportReport,
		maps::{EntityKind, LegacyId, RemapTable},
	},
	model::{
		AccessToken, AppType, ApprovedSite, AuthMethod, AuthorizationRequest, BlacklistedSite,
		Client, ContentEncryption, FieldDecodeError, JweAlgorithm, JwsAlgorithm, RefreshToken,
		SavedUserAuthentication, SignedJwt, SubjectType, SystemScope, WhitelistedSite,
	},
	store::{StoreError, Stores},
	stream::{JsonReader, TokenKind},
};

/// Everything a decoder needs threaded through one import invocation.
pub(crate) struct DecodeContext<'a> {
	/// Persistence collaborators for the invocation.
	pub stores: &'a Stores,
	/// Host every decoded entity is created under.
	pub host: &'a HostId,
	/// Invocation-scoped remap table.
	pub maps: &'a mut RemapTable,
	/// Accumulated counts and diagnostics.
	pub report: &'a mut ImportReport,
}
impl DecodeContext<'_> {
	fn field_decode(&mut self, kind: EntityKind, err: FieldDecodeError) {
		self.report.record(DiagnosticKind::FieldDecode, format!("{kind}: {err}"));
	}
}

/// Applies a parse result to an optional field, containing failures as diagnostics.
fn set_parsed<T>(
	ctx: &mut DecodeContext,
	kind: EntityKind,
	slot: &mut Option<T>,
	parsed: Result<T, FieldDecodeError>,
) {
	match parsed {
		Ok(value) => *slot = Some(value),
		Err(err) => ctx.field_decode(kind, err),
	}
}

/// Parses a wire timestamp (RFC 3339, UTC).
pub(crate) fn parse_utc(literal: &str) -> Result<OffsetDateTime, FieldDecodeError> {
	// crates.io
	use time::format_description::well_known::Rfc3339;

	OffsetDateTime::parse(literal, &Rfc3339)
		.map_err(|_| FieldDecodeError::new("timestamp", literal))
}

/// Reads a string array into a set.
pub(crate) fn read_string_set(reader: &mut JsonReader) -> Result<BTreeSet<String>> {
	let mut set = BTreeSet::new();

	reader.begin_array()?;

	while reader.has_next() {
		set.insert(reader.next_string()?);
	}

	reader.end_array()?;

	Ok(set)
}

/// Reads a flat string-to-string object into a map, skipping non-string members.
pub(crate) fn read_string_map(reader: &mut JsonReader) -> Result<BTreeMap<String, String>> {
	let mut map = BTreeMap::new();

	reader.begin_object()?;

	while reader.has_next() {
		let name = reader.next_name()?;

		if reader.peek() == TokenKind::String {
			map.insert(name, reader.next_string()?);
		} else {
			reader.skip_value()?;
		}
	}

	reader.end_object()?;

	Ok(map)
}

/// Reads an array of identifiers (numeric or string) into a legacy-id set.
pub(crate) fn read_id_set(reader: &mut JsonReader) -> Result<BTreeSet<LegacyId>> {
	let mut set = BTreeSet::new();

	reader.begin_array()?;

	while reader.has_next() {
		set.insert(LegacyId::new(reader.next_id()?));
	}

	reader.end_array()?;

	Ok(set)
}

fn saved_id(id: Option<crate::host::RecordId>) -> Result<crate::host::RecordId> {
	id.ok_or_else(|| {
		StoreError::Backend { message: "save returned an entity without an identifier".into() }
			.into()
	})
}

/// Persists a client, regenerating its natural key once on conflict; a second failure
/// drops the entity. Returns the assigned identifier when the client survived.
fn save_client(ctx: &mut DecodeContext, mut client: Client) -> Result<Option<Client>> {
	match ctx.stores.clients.save(ctx.host, client.clone()) {
		Ok(saved) => Ok(Some(saved)),
		Err(StoreError::Conflict { key }) => {
			let regenerated = random_hex_identifier();

			ctx.report.record(
				DiagnosticKind::PersistenceConflict,
				format!("Client {key} already exists; retrying with a regenerated client id."),
			);
			client.client_id = Some(regenerated);

			match ctx.stores.clients.save(ctx.host, client) {
				Ok(saved) => Ok(Some(saved)),
				Err(StoreError::Conflict { key }) => {
					ctx.report.record(
						DiagnosticKind::PersistenceConflict,
						format!("Client {key} still conflicts after regeneration; dropping it."),
					);

					Ok(None)
				},
				Err(err) => Err(err.into()),
			}
		},
		Err(err) => Err(err.into()),
	}
}

/// Persists a system scope with the same regenerate-once conflict policy as clients.
pub(crate) fn save_system_scope(
	ctx: &mut DecodeContext,
	mut scope: SystemScope,
) -> Result<Option<SystemScope>> {
	match ctx.stores.system_scopes.save(ctx.host, scope.clone()) {
		Ok(saved) => Ok(Some(saved)),
		Err(StoreError::Conflict { key }) => {
			let regenerated = random_hex_identifier();

			ctx.report.record(
				DiagnosticKind::PersistenceConflict,
				format!("Scope {key} already exists; retrying with a regenerated value."),
			);
			scope.value = Some(regenerated);

			match ctx.stores.system_scopes.save(ctx.host, scope) {
				Ok(saved) => Ok(Some(saved)),
				Err(StoreError::Conflict { key }) => {
					ctx.report.record(
						DiagnosticKind::PersistenceConflict,
						format!("Scope {key} still conflicts after regeneration; dropping it."),
					);

					Ok(None)
				},
				Err(err) => Err(err.into()),
			}
		},
		Err(err) => Err(err.into()),
	}
}

/// Reads the `clients` section.
pub(crate) fn read_clients(reader: &mut JsonReader, ctx: &mut DecodeContext) -> Result<()> {
	reader.begin_array()?;

	while reader.has_next() {
		let mut client = Client::default();

		reader.begin_object()?;

		while reader.has_next() {
			let name = reader.next_name()?;

			if reader.peek() == TokenKind::Null {
				reader.skip_value()?;

				continue;
			}

			match name.as_str() {
				"clientId" => client.client_id = Some(reader.next_string()?),
				"secret" => client.client_secret = Some(reader.next_string()?),
				"name" => client.client_name = Some(reader.next_string()?),
				"description" => client.description = Some(reader.next_string()?),
				"scope" => client.scope = read_string_set(reader)?,
				"redirectUris" => client.redirect_uris = read_string_set(reader)?,
				"grantTypes" => client.grant_types = read_string_set(reader)?,
				"responseTypes" => client.response_types = read_string_set(reader)?,
				"resourceIds" => client.resource_ids = read_string_set(reader)?,
				"authorities" => client.authorities = read_string_set(reader)?,
				"contacts" => client.contacts = read_string_set(reader)?,
				"accessTokenValiditySeconds" =>
					client.access_token_validity_seconds = Some(reader.next_i64()?),
				"refreshTokenValiditySeconds" =>
					client.refresh_token_validity_seconds = Some(reader.next_i64()?),
				"tokenEndpointAuthMethod" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.token_endpoint_auth_method,
						AuthMethod::from_name(&literal),
					);
				},
				"applicationType" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.application_type,
						AppType::from_name(&literal),
					);
				},
				"subjectType" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.subject_type,
						SubjectType::from_name(&literal),
					);
				},
				"uri" => {
					let literal = reader.next_string()?;

					set_parsed(ctx, EntityKind::Client, &mut client.client_uri, parse_uri(&literal));
				},
				"logoUri" => {
					let literal = reader.next_string()?;

					set_parsed(ctx, EntityKind::Client, &mut client.logo_uri, parse_uri(&literal));
				},
				"tosUri" => {
					let literal = reader.next_string()?;

					set_parsed(ctx, EntityKind::Client, &mut client.tos_uri, parse_uri(&literal));
				},
				"policyUri" => {
					let literal = reader.next_string()?;

					set_parsed(ctx, EntityKind::Client, &mut client.policy_uri, parse_uri(&literal));
				},
				"jwksUri" => {
					let literal = reader.next_string()?;

					set_parsed(ctx, EntityKind::Client, &mut client.jwks_uri, parse_uri(&literal));
				},
				"sectorIdentifierUri" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.sector_identifier_uri,
						parse_uri(&literal),
					);
				},
				"initiateLoginUri" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.initiate_login_uri,
						parse_uri(&literal),
					);
				},
				"requestObjectSigningAlg" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.request_object_signing_alg,
						JwsAlgorithm::from_name(&literal),
					);
				},
				"userInfoSignedResponseAlg" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.user_info_signed_response_alg,
						JwsAlgorithm::from_name(&literal),
					);
				},
				"userInfoEncryptedResponseAlg" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.user_info_encrypted_response_alg,
						JweAlgorithm::from_name(&literal),
					);
				},
				"userInfoEncryptedResponseEnc" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.user_info_encrypted_response_enc,
						ContentEncryption::from_name(&literal),
					);
				},
				"idTokenSignedResponseAlg" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.id_token_signed_response_alg,
						JwsAlgorithm::from_name(&literal),
					);
				},
				"idTokenEncryptedResponseAlg" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.id_token_encrypted_response_alg,
						JweAlgorithm::from_name(&literal),
					);
				},
				"idTokenEncryptedResponseEnc" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.id_token_encrypted_response_enc,
						ContentEncryption::from_name(&literal),
					);
				},
				"tokenEndpointAuthSigningAlg" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::Client,
						&mut client.token_endpoint_auth_signing_alg,
						JwsAlgorithm::from_name(&literal),
					);
				},
				"defaultMaxAge" => client.default_max_age = Some(reader.next_i64()?),
				"requireAuthTime" => client.require_auth_time = Some(reader.next_bool()?),
				"defaultACRValues" => client.default_acr_values = read_string_set(reader)?,
				// Older exports wrote a single URI; newer ones write the full set.
				"postLogoutRedirectUri" => {
					client.post_logout_redirect_uris = BTreeSet::from([reader.next_string()?]);
				},
				"postLogoutRedirectUris" =>
					client.post_logout_redirect_uris = read_string_set(reader)?,
				"requestUris" => client.request_uris = read_string_set(reader)?,
				"allowIntrospection" => client.allow_introspection = reader.next_bool()?,
				"reuseRefreshToken" => client.reuse_refresh_token = reader.next_bool()?,
				"dynamicallyRegistered" => client.dynamically_registered = reader.next_bool()?,
				_ => {
					debug!(field = %name, "Skipping unrecognized client field.");
					reader.skip_value()?;
				},
			}
		}

		reader.end_object()?;

		if save_client(ctx, client)?.is_some() {
			ctx.report.counts.clients += 1;
		}
	}

	reader.end_array()?;
	info!("Done reading clients.");

	Ok(())
}

fn parse_uri(literal: &str) -> Result<Url, FieldDecodeError> {
	Url::parse(literal).map_err(|_| FieldDecodeError::new("URI", literal))
}

/// Reads the `grants` section.
pub(crate) fn read_grants(reader: &mut JsonReader, ctx: &mut DecodeContext) -> Result<()> {
	reader.begin_array()?;

	while reader.has_next() {
		let mut site = ApprovedSite::default();
		let mut current_id = None;
		let mut whitelisted_site_id = None;
		let mut token_ids = None;

		reader.begin_object()?;

		while reader.has_next() {
			let name = reader.next_name()?;

			if reader.peek() == TokenKind::Null {
				reader.skip_value()?;

				continue;
			}

			match name.as_str() {
				"id" => current_id = Some(LegacyId::new(reader.next_id()?)),
				"userId" => site.user_id = Some(reader.next_string()?),
				"clientId" => site.client_id = Some(reader.next_string()?),
				"creationDate" => {
					let literal = reader.next_string()?;

					set_parsed(ctx, EntityKind::Grant, &mut site.creation_date, parse_utc(&literal));
				},
				"accessDate" => {
					let literal = reader.next_string()?;

					set_parsed(ctx, EntityKind::Grant, &mut site.access_date, parse_utc(&literal));
				},
				"timeoutDate" => {
					let literal = reader.next_string()?;

					set_parsed(ctx, EntityKind::Grant, &mut site.timeout_date, parse_utc(&literal));
				},
				"allowedScopes" => site.allowed_scopes = read_string_set(reader)?,
				"whitelistedSiteId" => whitelisted_site_id = Some(reader.next_id()?),
				"approvedAccessTokens" => token_ids = Some(read_id_set(reader)?),
				_ => {
					debug!(field = %name, "Skipping unrecognized grant field.");
					reader.skip_value()?;
				},
			}
		}

		reader.end_object()?;

		let Some(current_id) = current_id else {
			ctx.report.record(
				DiagnosticKind::FieldDecode,
				"Grant is missing an id; dropping it.",
			);

			continue;
		};
		let saved = ctx.stores.approved_sites.save(ctx.host, site)?;
		let new_id = saved_id(saved.id)?;

		ctx.maps.record_new_id(EntityKind::Grant, current_id.clone(), new_id);

		if whitelisted_site_id.is_some() {
			// Accepted by the format but intentionally never resolved.
			debug!(grant = %current_id, "Ignoring whitelisted site marker on grant.");
		}
		if let Some(token_ids) = token_ids {
			ctx.maps.defer_grant_access_tokens(current_id.clone(), token_ids);
		}

		ctx.report.counts.grants += 1;

		debug!(grant = %current_id, "Read grant.");
	}

	reader.end_array()?;
	info!("Done reading grants.");

	Ok(())
}

/// Reads the `whitelistedSites` section.
pub(crate) fn read_whitelisted_sites(
	reader: &mut JsonReader,
	ctx: &mut DecodeContext,
) -> Result<()> {
	reader.begin_array()?;

	while reader.has_next() {
		let mut site = WhitelistedSite::default();
		let mut current_id = None;

		reader.begin_object()?;

		while reader.has_next() {
			let name = reader.next_name()?;

			if reader.peek() == TokenKind::Null {
				reader.skip_value()?;

				continue;
			}

			match name.as_str() {
				"id" => current_id = Some(LegacyId::new(reader.next_id()?)),
				"clientId" => site.client_id = Some(reader.next_string()?),
				"creatorUserId" => site.creator_user_id = Some(reader.next_string()?),
				"allowedScopes" => site.allowed_scopes = read_string_set(reader)?,
				_ => {
					debug!(field = %name, "Skipping unrecognized whitelisted site field.");
					reader.skip_value()?;
				},
			}
		}

		reader.end_object()?;

		let saved = ctx.stores.whitelisted_sites.save(ctx.host, site)?;

		if let Some(current_id) = current_id {
			ctx.maps.record_new_id(
				EntityKind::WhitelistedSite,
				current_id,
				saved_id(saved.id)?,
			);
		}

		ctx.report.counts.whitelisted_sites += 1;
	}

	reader.end_array()?;
	info!("Done reading whitelisted sites.");

	Ok(())
}

/// Reads the `blacklistedSites` section.
pub(crate) fn read_blacklisted_sites(
	reader: &mut JsonReader,
	ctx: &mut DecodeContext,
) -> Result<()> {
	reader.begin_array()?;

	while reader.has_next() {
		let mut site = BlacklistedSite::default();

		reader.begin_object()?;

		while reader.has_next() {
			let name = reader.next_name()?;

			if reader.peek() == TokenKind::Null {
				reader.skip_value()?;

				continue;
			}

			match name.as_str() {
				// Blacklist entries are standalone; nothing references them by id.
				"id" => reader.skip_value()?,
				"uri" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::BlacklistedSite,
						&mut site.uri,
						parse_uri(&literal),
					);
				},
				_ => {
					debug!(field = %name, "Skipping unrecognized blacklisted site field.");
					reader.skip_value()?;
				},
			}
		}

		reader.end_object()?;
		ctx.stores.blacklisted_sites.save(ctx.host, site)?;

		ctx.report.counts.blacklisted_sites += 1;
	}

	reader.end_array()?;
	info!("Done reading blacklisted sites.");

	Ok(())
}

/// Reads the `accessTokens` section.
pub(crate) fn read_access_tokens(reader: &mut JsonReader, ctx: &mut DecodeContext) -> Result<()> {
	reader.begin_array()?;

	while reader.has_next() {
		let mut token = AccessToken::default();
		let mut current_id = None;
		let mut client_ref = None;
		let mut holder_ref = None;
		let mut refresh_ref = None;
		let mut value_unusable = false;

		reader.begin_object()?;

		while reader.has_next() {
			let name = reader.next_name()?;

			if reader.peek() == TokenKind::Null {
				reader.skip_value()?;

				continue;
			}

			match name.as_str() {
				"id" => current_id = Some(LegacyId::new(reader.next_id()?)),
				"expiration" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::AccessToken,
						&mut token.expiration,
						parse_utc(&literal),
					);
				},
				"value" => match SignedJwt::parse(reader.next_string()?) {
					Ok(value) => token.value = Some(value),
					Err(err) => {
						value_unusable = true;
						ctx.field_decode(EntityKind::AccessToken, err);
					},
				},
				"clientId" => client_ref = Some(reader.next_string()?),
				"authenticationHolderId" =>
					holder_ref = Some(LegacyId::new(reader.next_id()?)),
				"refreshTokenId" => refresh_ref = Some(LegacyId::new(reader.next_id()?)),
				"scope" => token.scope = read_string_set(reader)?,
				"type" => token.token_type = Some(reader.next_string()?),
				_ => {
					debug!(field = %name, "Skipping unrecognized access token field.");
					reader.skip_value()?;
				},
			}
		}

		reader.end_object()?;

		if value_unusable {
			ctx.report.record(
				DiagnosticKind::FieldDecode,
				"Access token value is not a signed token; dropping the token.",
			);

			continue;
		}

		let Some(current_id) = current_id else {
			ctx.report.record(
				DiagnosticKind::FieldDecode,
				"Access token is missing an id; dropping it.",
			);

			continue;
		};
		let saved = ctx.stores.tokens.save_access_token(ctx.host, token)?;
		let new_id = saved_id(saved.id)?;

		ctx.maps.record_new_id(EntityKind::AccessToken, current_id.clone(), new_id);

		if let Some(client_ref) = client_ref {
			ctx.maps.defer_access_token_client(current_id.clone(), client_ref);
		}
		if let Some(holder_ref) = holder_ref {
			ctx.maps.defer_access_token_holder(current_id.clone(), holder_ref);
		}
		if let Some(refresh_ref) = refresh_ref {
			ctx.maps.defer_access_token_refresh_token(current_id.clone(), refresh_ref);
		}

		ctx.report.counts.access_tokens += 1;

		debug!(token = %current_id, "Read access token.");
	}

	reader.end_array()?;
	info!("Done reading access tokens.");

	Ok(())
}

/// Reads the `refreshTokens` section.
pub(crate) fn read_refresh_tokens(reader: &mut JsonReader, ctx: &mut DecodeContext) -> Result<()> {
	reader.begin_array()?;

	while reader.has_next() {
		let mut token = RefreshToken::default();
		let mut current_id = None;
		let mut client_ref = None;
		let mut holder_ref = None;
		let mut value_unusable = false;

		reader.begin_object()?;

		while reader.has_next() {
			let name = reader.next_name()?;

			if reader.peek() == TokenKind::Null {
				reader.skip_value()?;

				continue;
			}

			match name.as_str() {
				"id" => current_id = Some(LegacyId::new(reader.next_id()?)),
				"expiration" => {
					let literal = reader.next_string()?;

					set_parsed(
						ctx,
						EntityKind::RefreshToken,
						&mut token.expiration,
						parse_utc(&literal),
					);
				},
				"value" => match SignedJwt::parse(reader.next_string()?) {
					Ok(value) => token.value = Some(value),
					Err(err) => {
						value_unusable = true;
						ctx.field_decode(EntityKind::RefreshToken, err);
					},
				},
				"clientId" => client_ref = Some(reader.next_string()?),
				"authenticationHolderId" =>
					holder_ref = Some(LegacyId::new(reader.next_id()?)),
				_ => {
					debug!(field = %name, "Skipping unrecognized refresh token field.");
					reader.skip_value()?;
				},
			}
		}

		reader.end_object()?;

		if value_unusable {
			ctx.report.record(
				DiagnosticKind::FieldDecode,
				"Refresh token value is not a signed token; dropping the token.",
			);

			continue;
		}

		let Some(current_id) = current_id else {
			ctx.report.record(
				DiagnosticKind::FieldDecode,
				"Refresh token is missing an id; dropping it.",
			);

			continue;
		};
		let saved = ctx.stores.tokens.save_refresh_token(ctx.host, token)?;
		let new_id = saved_id(saved.id)?;

		ctx.maps.record_new_id(EntityKind::RefreshToken, current_id.clone(), new_id);

		if let Some(client_ref) = client_ref {
			ctx.maps.defer_refresh_token_client(current_id.clone(), client_ref);
		}
		if let Some(holder_ref) = holder_ref {
			ctx.maps.defer_refresh_token_holder(current_id.clone(), holder_ref);
		}

		ctx.report.counts.refresh_tokens += 1;

		debug!(token = %current_id, "Read refresh token.");
	}

	reader.end_array()?;
	info!("Done reading refresh tokens.");

	Ok(())
}

/// Reads an embedded authorization-request snapshot.
pub(crate) fn read_authorization_request(
	reader: &mut JsonReader,
) -> Result<AuthorizationRequest> {
	let mut request = AuthorizationRequest::default();

	reader.begin_object()?;

	while reader.has_next() {
		let name = reader.next_name()?;

		if reader.peek() == TokenKind::Null {
			reader.skip_value()?;

			continue;
		}

		match name.as_str() {
			"clientId" => request.client_id = Some(reader.next_string()?),
			"scope" => request.scope = read_string_set(reader)?,
			"resourceIds" => request.resource_ids = read_string_set(reader)?,
			"authorities" => request.authorities = read_string_set(reader)?,
			"approved" => request.approved = reader.next_bool()?,
			"denied" =>
				if !request.approved {
					request.approved = !reader.next_bool()?;
				} else {
					reader.skip_value()?;
				},
			"redirectUri" => request.redirect_uri = Some(reader.next_string()?),
			"responseTypes" => request.response_types = read_string_set(reader)?,
			"requestParameters" => request.request_parameters = read_string_map(reader)?,
			// The binary-encoded extension map; only the string form is portable.
			"extensions" => reader.skip_value()?,
			"extensionStrings" => request.extensions = read_string_map(reader)?,
			_ => {
				debug!(field = %name, "Skipping unrecognized authorization request field.");
				reader.skip_value()?;
			},
		}
	}

	reader.end_object()?;

	Ok(request)
}

/// Reads an embedded user-authentication snapshot.
pub(crate) fn read_saved_user_authentication(
	reader: &mut JsonReader,
) -> Result<SavedUserAuthentication> {
	let mut auth = SavedUserAuthentication::default();

	reader.begin_object()?;

	while reader.has_next() {
		let name = reader.next_name()?;

		if reader.peek() == TokenKind::Null {
			reader.skip_value()?;

			continue;
		}

		match name.as_str() {
			"name" => auth.name = Some(reader.next_string()?),
			"sourceClass" => auth.source_class = Some(reader.next_string()?),
			"authenticated" => auth.authenticated = reader.next_bool()?,
			"authorities" => auth.authorities = read_string_set(reader)?,
			_ => {
				debug!(field = %name, "Skipping unrecognized user authentication field.");
				reader.skip_value()?;
			},
		}
	}

	reader.end_object()?;

	Ok(auth)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn timestamps_parse_in_utc() {
		let parsed =
			parse_utc("2025-06-01T12:00:00Z").expect("RFC 3339 timestamp should parse.");

		assert_eq!(parsed.year(), 2025);
		assert!(parse_utc("June 1st, 2025").is_err());
	}

	#[test]
	fn string_sets_deduplicate() {
		let mut reader = JsonReader::parse(r#"["read","write","read"]"#)
			.expect("Array fixture should parse.");
		let set = read_string_set(&mut reader).expect("String set should read.");

		assert_eq!(set.len(), 2);
		assert!(set.contains("read"));
	}

	#[test]
	fn authorization_requests_honor_the_denied_fallback() {
		let mut reader = JsonReader::parse(r#"{"clientId":"c1","denied":false}"#)
			.expect("Request fixture should parse.");
		let request =
			read_authorization_request(&mut reader).expect("Request should decode.");

		assert!(request.approved, "An explicit denied=false must imply approval.");
		assert_eq!(request.client_id.as_deref(), Some("c1"));
	}

	#[test]
	fn authorization_requests_keep_string_extensions_only() {
		let document = r#"{
			"extensions": {"binary": "AAAA"},
			"extensionStrings": {"prompt": "consent"},
			"requestParameters": {"scope": "read", "nested": {"x": 1}}
		}"#;
		let mut reader = JsonReader::parse(document).expect("Request fixture should parse.");
		let request =
			read_authorization_request(&mut reader).expect("Request should decode.");

		assert_eq!(request.extensions.get("prompt").map(String::as_str), Some("consent"));
		assert!(!request.extensions.contains_key("binary"));
		assert_eq!(request.request_parameters.len(), 1);
	}
}
