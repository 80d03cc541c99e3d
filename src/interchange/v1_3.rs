//! Current (1.3) interchange format: full import and export.
//!
//! The 1.3 generation flattens the captured authentication context: holders carry
//! `authorizationRequest` and `savedUserAuthentication` as direct members, and system
//! scopes carry the `restricted` flag directly.

// crates.io
use tracing::{debug, info};
// self
use crate::{
	_prelude::*,
	host::{HostId, RecordId},
	interchange::{
		ACCESS_TOKENS, AUTHENTICATION_HOLDERS, BLACKLISTED_SITES, CLIENTS, DataService,
		DataServiceExtension, DiagnosticKind, FORMAT_1_3, GRANTS, ImportReport,
		REFRESH_TOKENS, SYSTEM_SCOPES, WHITELISTED_SITES, decode,
		decode::DecodeContext,
		fixup,
		maps::{EntityKind, LegacyId, RemapTable},
	},
	model::{
		ApprovedSite, AuthenticationHolder, AuthorizationRequest, Client,
		SavedUserAuthentication, SystemScope,
	},
	store::Stores,
	stream::{JsonReader, JsonWriter, TokenKind},
};

/// Data service handling the current 1.3 interchange format.
pub struct DataService13 {
	stores: Stores,
	extensions: Vec<Arc<dyn DataServiceExtension>>,
}
impl DataService13 {
	/// Creates a service over the provided collaborators with no extensions.
	pub fn new(stores: Stores) -> Self {
		Self::with_extensions(stores, Vec::new())
	}

	/// Creates a service over the provided collaborators and extension list.
	pub fn with_extensions(
		stores: Stores,
		extensions: Vec<Arc<dyn DataServiceExtension>>,
	) -> Self {
		Self { stores, extensions }
	}

	fn read_authentication_holders(
		&self,
		reader: &mut JsonReader,
		ctx: &mut DecodeContext,
	) -> Result<()> {
		reader.begin_array()?;

		while reader.has_next() {
			let mut holder = AuthenticationHolder::default();
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
					// Ownership is re-derived by the destination server.
					"ownerId" => reader.skip_value()?,
					"authorizationRequest" =>
						holder.request = Some(decode::read_authorization_request(reader)?),
					"savedUserAuthentication" =>
						holder.user_auth =
							Some(decode::read_saved_user_authentication(reader)?),
					_ => {
						debug!(field = %name, "Skipping unrecognized holder field.");
						reader.skip_value()?;
					},
				}
			}

			reader.end_object()?;

			let Some(current_id) = current_id else {
				ctx.report.record(
					DiagnosticKind::FieldDecode,
					"Authentication holder is missing an id; dropping it.",
				);

				continue;
			};
			let saved = ctx.stores.authentication_holders.save(ctx.host, holder)?;

			if let Some(new_id) = saved.id {
				ctx.maps.record_new_id(
					EntityKind::AuthenticationHolder,
					current_id.clone(),
					new_id,
				);
			}

			ctx.report.counts.authentication_holders += 1;

			debug!(holder = %current_id, "Read authentication holder.");
		}

		reader.end_array()?;
		info!("Done reading authentication holders.");

		Ok(())
	}

	fn read_system_scopes(&self, reader: &mut JsonReader, ctx: &mut DecodeContext) -> Result<()> {
		reader.begin_array()?;

		while reader.has_next() {
			let mut scope = SystemScope::default();

			reader.begin_object()?;

			while reader.has_next() {
				let name = reader.next_name()?;

				if reader.peek() == TokenKind::Null {
					reader.skip_value()?;

					continue;
				}

				match name.as_str() {
					"value" => scope.value = Some(reader.next_string()?),
					"description" => scope.description = Some(reader.next_string()?),
					"icon" => scope.icon = Some(reader.next_string()?),
					"restricted" => scope.restricted = reader.next_bool()?,
					"defaultScope" => scope.default_scope = reader.next_bool()?,
					_ => {
						debug!(field = %name, "Skipping unrecognized system scope field.");
						reader.skip_value()?;
					},
				}
			}

			reader.end_object()?;

			if decode::save_system_scope(ctx, scope)?.is_some() {
				ctx.report.counts.system_scopes += 1;
			}
		}

		reader.end_array()?;
		info!("Done reading system scopes.");

		Ok(())
	}

	fn write_clients(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()> {
		writer.name(CLIENTS)?;
		writer.begin_array()?;

		for client in self.stores.clients.get_all(host)? {
			write_client(writer, &client)?;
		}

		writer.end_array()?;

		Ok(())
	}

	fn write_grants(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()> {
		writer.name(GRANTS)?;
		writer.begin_array()?;

		for site in self.stores.approved_sites.get_all(host)? {
			write_grant(writer, &site)?;
		}

		writer.end_array()?;

		Ok(())
	}

	fn write_whitelisted_sites(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()> {
		writer.name(WHITELISTED_SITES)?;
		writer.begin_array()?;

		for site in self.stores.whitelisted_sites.get_all(host)? {
			writer.begin_object()?;
			write_record_id(writer, site.id.as_ref())?;
			writer.name("clientId")?;
			writer.value_opt_string(site.client_id.as_deref())?;
			writer.name("creatorUserId")?;
			writer.value_opt_string(site.creator_user_id.as_deref())?;
			write_string_set(writer, "allowedScopes", &site.allowed_scopes)?;
			writer.end_object()?;
		}

		writer.end_array()?;

		Ok(())
	}

	fn write_blacklisted_sites(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()> {
		writer.name(BLACKLISTED_SITES)?;
		writer.begin_array()?;

		for site in self.stores.blacklisted_sites.get_all(host)? {
			writer.begin_object()?;
			write_record_id(writer, site.id.as_ref())?;
			writer.name("uri")?;
			writer.value_opt_string(site.uri.as_ref().map(Url::as_str))?;
			writer.end_object()?;
		}

		writer.end_array()?;

		Ok(())
	}

	fn write_authentication_holders(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()> {
		writer.name(AUTHENTICATION_HOLDERS)?;
		writer.begin_array()?;

		for holder in self.stores.authentication_holders.get_all(host)? {
			writer.begin_object()?;
			write_record_id(writer, holder.id.as_ref())?;

			if let Some(request) = &holder.request {
				writer.name("authorizationRequest")?;
				write_authorization_request(writer, request)?;
			}
			if let Some(user_auth) = &holder.user_auth {
				writer.name("savedUserAuthentication")?;
				write_saved_user_authentication(writer, user_auth)?;
			}

			writer.end_object()?;
		}

		writer.end_array()?;

		Ok(())
	}

	fn write_access_tokens(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()> {
		writer.name(ACCESS_TOKENS)?;
		writer.begin_array()?;

		for token in self.stores.tokens.get_all_access_tokens(host)? {
			writer.begin_object()?;
			write_record_id(writer, token.id.as_ref())?;
			writer.name("expiration")?;
			write_opt_timestamp(writer, token.expiration)?;
			writer.name("value")?;
			writer.value_opt_string(token.value.as_ref().map(|v| v.expose()))?;
			writer.name("clientId")?;
			writer.value_opt_string(self.client_natural_key(host, token.client.as_ref())?.as_deref())?;
			writer.name("authenticationHolderId")?;
			write_opt_record_ref(writer, token.authentication_holder.as_ref())?;
			writer.name("refreshTokenId")?;
			write_opt_record_ref(writer, token.refresh_token.as_ref())?;
			write_string_set(writer, "scope", &token.scope)?;
			writer.name("type")?;
			writer.value_opt_string(token.token_type.as_deref())?;
			writer.end_object()?;
		}

		writer.end_array()?;

		Ok(())
	}

	fn write_refresh_tokens(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()> {
		writer.name(REFRESH_TOKENS)?;
		writer.begin_array()?;

		for token in self.stores.tokens.get_all_refresh_tokens(host)? {
			writer.begin_object()?;
			write_record_id(writer, token.id.as_ref())?;
			writer.name("expiration")?;
			write_opt_timestamp(writer, token.expiration)?;
			writer.name("value")?;
			writer.value_opt_string(token.value.as_ref().map(|v| v.expose()))?;
			writer.name("clientId")?;
			writer.value_opt_string(self.client_natural_key(host, token.client.as_ref())?.as_deref())?;
			writer.name("authenticationHolderId")?;
			write_opt_record_ref(writer, token.authentication_holder.as_ref())?;
			writer.end_object()?;
		}

		writer.end_array()?;

		Ok(())
	}

	fn write_system_scopes(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()> {
		writer.name(SYSTEM_SCOPES)?;
		writer.begin_array()?;

		for scope in self.stores.system_scopes.get_all(host)? {
			writer.begin_object()?;
			writer.name("value")?;
			writer.value_opt_string(scope.value.as_deref())?;
			writer.name("description")?;
			writer.value_opt_string(scope.description.as_deref())?;
			writer.name("icon")?;
			writer.value_opt_string(scope.icon.as_deref())?;
			writer.name("restricted")?;
			writer.value_bool(scope.restricted)?;
			writer.name("defaultScope")?;
			writer.value_bool(scope.default_scope)?;
			writer.end_object()?;
		}

		writer.end_array()?;

		Ok(())
	}

	/// Tokens reference clients by natural key on the wire; resolve it from the store.
	fn client_natural_key(
		&self,
		host: &HostId,
		client: Option<&RecordId>,
	) -> Result<Option<String>> {
		let Some(client) = client else { return Ok(None) };

		Ok(self.stores.clients.get_by_id(host, client)?.and_then(|c| c.client_id))
	}
}
impl DataService for DataService13 {
	fn supports_version(&self, version: &str) -> bool {
		version == FORMAT_1_3
	}

	fn import_data(&self, reader: &mut JsonReader, host: &HostId) -> Result<ImportReport> {
		info!("Reading configuration for 1.3.");

		let mut maps = RemapTable::default();
		let mut report = ImportReport::default();

		reader.begin_object()?;

		while reader.has_next() {
			let name = reader.next_name()?;
			let mut ctx = DecodeContext {
				stores: &self.stores,
				host,
				maps: &mut maps,
				report: &mut report,
			};

			match name.as_str() {
				CLIENTS => decode::read_clients(reader, &mut ctx)?,
				GRANTS => decode::read_grants(reader, &mut ctx)?,
				WHITELISTED_SITES => decode::read_whitelisted_sites(reader, &mut ctx)?,
				BLACKLISTED_SITES => decode::read_blacklisted_sites(reader, &mut ctx)?,
				AUTHENTICATION_HOLDERS => self.read_authentication_holders(reader, &mut ctx)?,
				ACCESS_TOKENS => decode::read_access_tokens(reader, &mut ctx)?,
				REFRESH_TOKENS => decode::read_refresh_tokens(reader, &mut ctx)?,
				SYSTEM_SCOPES => self.read_system_scopes(reader, &mut ctx)?,
				other => {
					let mut handled = false;

					for extension in &self.extensions {
						if extension.supports_version(FORMAT_1_3) {
							handled = extension.import_extension_data(other, reader, host)?;

							if handled {
								break;
							}
						}
					}
					if !handled {
						debug!(section = %other, "Skipping unrecognized section.");
						reader.skip_value()?;
					}
				},
			}
		}

		reader.end_object()?;
		fixup::fix_object_references(&self.stores, host, &maps, &mut report)?;

		for extension in &self.extensions {
			if extension.supports_version(FORMAT_1_3) {
				extension.fix_extension_references(&maps, host)?;

				break;
			}
		}

		maps.clear_all();

		Ok(report)
	}

	fn export_data(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()> {
		info!("Writing configuration for 1.3.");
		writer.begin_object()?;
		self.write_clients(writer, host)?;
		self.write_grants(writer, host)?;
		self.write_whitelisted_sites(writer, host)?;
		self.write_blacklisted_sites(writer, host)?;
		self.write_authentication_holders(writer, host)?;
		self.write_access_tokens(writer, host)?;
		self.write_refresh_tokens(writer, host)?;
		self.write_system_scopes(writer, host)?;

		for extension in &self.extensions {
			if extension.supports_version(FORMAT_1_3) {
				extension.export_extension_data(writer, host)?;

				break;
			}
		}

		writer.end_object()?;

		Ok(())
	}
}
impl Debug for DataService13 {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DataService13").field("extensions", &self.extensions.len()).finish()
	}
}

fn write_record_id(writer: &mut JsonWriter, id: Option<&RecordId>) -> Result<()> {
	writer.name("id")?;
	writer.value_opt_string(id.map(RecordId::as_ref))?;

	Ok(())
}

fn write_opt_record_ref(writer: &mut JsonWriter, id: Option<&RecordId>) -> Result<()> {
	writer.value_opt_string(id.map(RecordId::as_ref))?;

	Ok(())
}

fn write_opt_timestamp(writer: &mut JsonWriter, instant: Option<OffsetDateTime>) -> Result<()> {
	// crates.io
	use time::format_description::well_known::Rfc3339;

	match instant.map(|i| i.format(&Rfc3339)) {
		Some(Ok(formatted)) => writer.value_string(formatted)?,
		// A timestamp the wire format cannot carry degrades to null rather than
		// failing the whole export.
		Some(Err(_)) | None => writer.value_null()?,
	}

	Ok(())
}

fn write_string_set(
	writer: &mut JsonWriter,
	name: &str,
	values: &BTreeSet<String>,
) -> Result<()> {
	writer.name(name)?;
	writer.begin_array()?;

	for value in values {
		writer.value_string(value)?;
	}

	writer.end_array()?;

	Ok(())
}

fn write_string_map(
	writer: &mut JsonWriter,
	name: &str,
	values: &BTreeMap<String, String>,
) -> Result<()> {
	writer.name(name)?;
	writer.begin_object()?;

	for (key, value) in values {
		writer.name(key)?;
		writer.value_string(value)?;
	}

	writer.end_object()?;

	Ok(())
}

fn write_client(writer: &mut JsonWriter, client: &Client) -> Result<()> {
	writer.begin_object()?;
	writer.name("clientId")?;
	writer.value_opt_string(client.client_id.as_deref())?;
	writer.name("secret")?;
	writer.value_opt_string(client.client_secret.as_deref())?;
	writer.name("name")?;
	writer.value_opt_string(client.client_name.as_deref())?;
	writer.name("description")?;
	writer.value_opt_string(client.description.as_deref())?;
	write_string_set(writer, "scope", &client.scope)?;
	write_string_set(writer, "redirectUris", &client.redirect_uris)?;
	write_string_set(writer, "grantTypes", &client.grant_types)?;
	write_string_set(writer, "responseTypes", &client.response_types)?;
	write_string_set(writer, "resourceIds", &client.resource_ids)?;
	write_string_set(writer, "authorities", &client.authorities)?;
	write_string_set(writer, "contacts", &client.contacts)?;

	writer.name("accessTokenValiditySeconds")?;

	match client.access_token_validity_seconds {
		Some(seconds) => writer.value_i64(seconds)?,
		None => writer.value_null()?,
	}

	writer.name("refreshTokenValiditySeconds")?;

	match client.refresh_token_validity_seconds {
		Some(seconds) => writer.value_i64(seconds)?,
		None => writer.value_null()?,
	}

	writer.name("tokenEndpointAuthMethod")?;
	writer.value_opt_string(client.token_endpoint_auth_method.map(|m| m.as_str()))?;
	writer.name("applicationType")?;
	writer.value_opt_string(client.application_type.map(|t| t.as_str()))?;
	writer.name("subjectType")?;
	writer.value_opt_string(client.subject_type.map(|t| t.as_str()))?;
	writer.name("uri")?;
	writer.value_opt_string(client.client_uri.as_ref().map(Url::as_str))?;
	writer.name("logoUri")?;
	writer.value_opt_string(client.logo_uri.as_ref().map(Url::as_str))?;
	writer.name("tosUri")?;
	writer.value_opt_string(client.tos_uri.as_ref().map(Url::as_str))?;
	writer.name("policyUri")?;
	writer.value_opt_string(client.policy_uri.as_ref().map(Url::as_str))?;
	writer.name("jwksUri")?;
	writer.value_opt_string(client.jwks_uri.as_ref().map(Url::as_str))?;
	writer.name("sectorIdentifierUri")?;
	writer.value_opt_string(client.sector_identifier_uri.as_ref().map(Url::as_str))?;
	writer.name("initiateLoginUri")?;
	writer.value_opt_string(client.initiate_login_uri.as_ref().map(Url::as_str))?;
	writer.name("requestObjectSigningAlg")?;
	writer.value_opt_string(client.request_object_signing_alg.map(|a| a.as_str()))?;
	writer.name("userInfoSignedResponseAlg")?;
	writer.value_opt_string(client.user_info_signed_response_alg.map(|a| a.as_str()))?;
	writer.name("userInfoEncryptedResponseAlg")?;
	writer.value_opt_string(client.user_info_encrypted_response_alg.map(|a| a.as_str()))?;
	writer.name("userInfoEncryptedResponseEnc")?;
	writer.value_opt_string(client.user_info_encrypted_response_enc.map(|a| a.as_str()))?;
	writer.name("idTokenSignedResponseAlg")?;
	writer.value_opt_string(client.id_token_signed_response_alg.map(|a| a.as_str()))?;
	writer.name("idTokenEncryptedResponseAlg")?;
	writer.value_opt_string(client.id_token_encrypted_response_alg.map(|a| a.as_str()))?;
	writer.name("idTokenEncryptedResponseEnc")?;
	writer.value_opt_string(client.id_token_encrypted_response_enc.map(|a| a.as_str()))?;
	writer.name("tokenEndpointAuthSigningAlg")?;
	writer.value_opt_string(client.token_endpoint_auth_signing_alg.map(|a| a.as_str()))?;

	writer.name("defaultMaxAge")?;

	match client.default_max_age {
		Some(age) => writer.value_i64(age)?,
		None => writer.value_null()?,
	}

	writer.name("requireAuthTime")?;

	match client.require_auth_time {
		Some(required) => writer.value_bool(required)?,
		None => writer.value_null()?,
	}

	write_string_set(writer, "defaultACRValues", &client.default_acr_values)?;
	write_string_set(writer, "postLogoutRedirectUris", &client.post_logout_redirect_uris)?;
	write_string_set(writer, "requestUris", &client.request_uris)?;
	writer.name("allowIntrospection")?;
	writer.value_bool(client.allow_introspection)?;
	writer.name("reuseRefreshToken")?;
	writer.value_bool(client.reuse_refresh_token)?;
	writer.name("dynamicallyRegistered")?;
	writer.value_bool(client.dynamically_registered)?;
	writer.end_object()?;

	Ok(())
}

fn write_grant(writer: &mut JsonWriter, site: &ApprovedSite) -> Result<()> {
	writer.begin_object()?;
	write_record_id(writer, site.id.as_ref())?;
	writer.name("userId")?;
	writer.value_opt_string(site.user_id.as_deref())?;
	writer.name("clientId")?;
	writer.value_opt_string(site.client_id.as_deref())?;
	writer.name("creationDate")?;
	write_opt_timestamp(writer, site.creation_date)?;
	writer.name("accessDate")?;
	write_opt_timestamp(writer, site.access_date)?;
	writer.name("timeoutDate")?;
	write_opt_timestamp(writer, site.timeout_date)?;
	write_string_set(writer, "allowedScopes", &site.allowed_scopes)?;
	writer.name("approvedAccessTokens")?;
	writer.begin_array()?;

	for token in &site.approved_access_tokens {
		writer.value_string(token.as_ref())?;
	}

	writer.end_array()?;
	writer.end_object()?;

	Ok(())
}

fn write_authorization_request(
	writer: &mut JsonWriter,
	request: &AuthorizationRequest,
) -> Result<()> {
	writer.begin_object()?;
	writer.name("clientId")?;
	writer.value_opt_string(request.client_id.as_deref())?;
	write_string_set(writer, "scope", &request.scope)?;
	write_string_set(writer, "resourceIds", &request.resource_ids)?;
	write_string_set(writer, "authorities", &request.authorities)?;
	writer.name("approved")?;
	writer.value_bool(request.approved)?;
	writer.name("redirectUri")?;
	writer.value_opt_string(request.redirect_uri.as_deref())?;
	write_string_set(writer, "responseTypes", &request.response_types)?;
	write_string_map(writer, "requestParameters", &request.request_parameters)?;
	write_string_map(writer, "extensionStrings", &request.extensions)?;
	writer.end_object()?;

	Ok(())
}

fn write_saved_user_authentication(
	writer: &mut JsonWriter,
	auth: &SavedUserAuthentication,
) -> Result<()> {
	writer.begin_object()?;
	writer.name("name")?;
	writer.value_opt_string(auth.name.as_deref())?;
	writer.name("sourceClass")?;
	writer.value_opt_string(auth.source_class.as_deref())?;
	writer.name("authenticated")?;
	writer.value_bool(auth.authenticated)?;
	write_string_set(writer, "authorities", &auth.authorities)?;
	writer.end_object()?;

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{in_memory_stores, reader_for, test_host},
		interchange::FORMAT_1_1,
	};

	#[test]
	fn version_claim_is_exact() {
		let service = DataService13::new(in_memory_stores());

		assert!(service.supports_version(FORMAT_1_3));
		assert!(!service.supports_version(FORMAT_1_1));
		assert!(!service.supports_version("interchange-2.0"));
	}

	#[test]
	fn import_handles_the_minimal_forward_reference_document() {
		let service = DataService13::new(in_memory_stores());
		let host = test_host();
		let document = r#"{
			"accessTokens": [
				{"id": 101, "clientId": "c1", "value": "eyJhbGciOiJub25lIn0.eyJqdGkiOiJhIn0.c2ln", "scope": ["read"]}
			],
			"clients": [{"clientId": "c1"}]
		}"#;
		let mut reader = reader_for(document);
		let report =
			service.import_data(&mut reader, &host).expect("Import should succeed.");

		assert_eq!(report.counts.clients, 1);
		assert_eq!(report.counts.access_tokens, 1);

		let tokens = service
			.stores
			.tokens
			.get_all_access_tokens(&host)
			.expect("Token listing should succeed.");
		let client = service
			.stores
			.clients
			.get_by_client_id(&host, "c1")
			.expect("Client lookup should succeed.")
			.expect("Imported client should be present.");

		assert_eq!(tokens.len(), 1);
		assert_eq!(
			tokens[0].client, client.id,
			"The forward reference must resolve after fixup."
		);
	}
}
