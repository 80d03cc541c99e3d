//! Legacy (1.1) interchange format: import only.
//!
//! The 1.1 generation nests the captured authentication context inside an
//! `authentication` object (with a binary-encoded `userAuthentication` member this
//! engine never reads) and predates the `restricted` scope flag: scopes carry an
//! `allowDynReg` flag with the inverted meaning, and structured-scope fields that are
//! warned about and ignored. Nothing can export this generation anymore.

// crates.io
use tracing::{debug, info, warn};
// self
use crate::{
	_prelude::*,
	host::HostId,
	interchange::{
		ACCESS_TOKENS, AUTHENTICATION_HOLDERS, BLACKLISTED_SITES, CLIENTS, DataService,
		DataServiceExtension, DiagnosticKind, FORMAT_1_1, FormatDirection, GRANTS, ImportReport,
		REFRESH_TOKENS, SYSTEM_SCOPES, UnsupportedFormatError, WHITELISTED_SITES, decode,
		decode::DecodeContext,
		fixup,
		maps::{EntityKind, LegacyId, RemapTable},
	},
	model::{AuthenticationHolder, SystemScope},
	store::Stores,
	stream::{JsonReader, JsonWriter, TokenKind},
};

/// Data service handling the legacy 1.1 interchange format.
pub struct DataService11 {
	stores: Stores,
	extensions: Vec<Arc<dyn DataServiceExtension>>,
}
impl DataService11 {
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
					"ownerId" => reader.skip_value()?,
					"authentication" => self.read_nested_authentication(reader, &mut holder)?,
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

	fn read_nested_authentication(
		&self,
		reader: &mut JsonReader,
		holder: &mut AuthenticationHolder,
	) -> Result<()> {
		reader.begin_object()?;

		while reader.has_next() {
			let name = reader.next_name()?;

			if reader.peek() == TokenKind::Null {
				reader.skip_value()?;

				continue;
			}

			match name.as_str() {
				"clientAuthorization" =>
					holder.request = Some(decode::read_authorization_request(reader)?),
				// The serialized Authentication object; only the saved snapshot is
				// portable.
				"userAuthentication" => reader.skip_value()?,
				"savedUserAuthentication" =>
					holder.user_auth = Some(decode::read_saved_user_authentication(reader)?),
				_ => {
					debug!(field = %name, "Skipping unrecognized authentication field.");
					reader.skip_value()?;
				},
			}
		}

		reader.end_object()?;

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
					// 1.1 marked dynamically-registrable scopes; the modern flag is the
					// inverse.
					"allowDynReg" => scope.restricted = !reader.next_bool()?,
					"defaultScope" => scope.default_scope = reader.next_bool()?,
					"structured" | "structuredParameter" => {
						warn!("Found a structured scope, ignoring structure.");
						reader.skip_value()?;
					},
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
}
impl DataService for DataService11 {
	fn supports_version(&self, version: &str) -> bool {
		version == FORMAT_1_1
	}

	fn import_data(&self, reader: &mut JsonReader, host: &HostId) -> Result<ImportReport> {
		info!("Reading configuration for 1.1.");

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
						if extension.supports_version(FORMAT_1_1) {
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
			if extension.supports_version(FORMAT_1_1) {
				extension.fix_extension_references(&maps, host)?;

				break;
			}
		}

		maps.clear_all();

		Ok(report)
	}

	fn export_data(&self, _writer: &mut JsonWriter, _host: &HostId) -> Result<()> {
		Err(UnsupportedFormatError {
			version: FORMAT_1_1.to_owned(),
			direction: FormatDirection::Export,
		}
		.into())
	}
}
impl Debug for DataService11 {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DataService11").field("extensions", &self.extensions.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{in_memory_stores, reader_for, test_host};

	#[test]
	fn export_refuses_with_unsupported_format() {
		// self
		use crate::error::Error;

		let service = DataService11::new(in_memory_stores());
		let host = test_host();
		let mut writer = JsonWriter::new();
		let err = service
			.export_data(&mut writer, &host)
			.expect_err("Legacy generation must refuse export.");

		assert!(matches!(
			err,
			Error::UnsupportedFormat(UnsupportedFormatError {
				direction: FormatDirection::Export,
				..
			})
		));
	}

	#[test]
	fn legacy_scope_flag_inverts_into_restricted() {
		let service = DataService11::new(in_memory_stores());
		let host = test_host();
		let document = r#"{
			"systemScopes": [
				{"value": "openid", "allowDynReg": true},
				{"value": "profile", "allowDynReg": false, "structured": true}
			]
		}"#;
		let mut reader = reader_for(document);
		let report =
			service.import_data(&mut reader, &host).expect("Import should succeed.");

		assert_eq!(report.counts.system_scopes, 2);

		let scopes =
			service.stores.system_scopes.get_all(&host).expect("Scope listing should succeed.");
		let openid = scopes
			.iter()
			.find(|s| s.value.as_deref() == Some("openid"))
			.expect("openid scope should be present.");
		let profile = scopes
			.iter()
			.find(|s| s.value.as_deref() == Some("profile"))
			.expect("profile scope should be present.");

		assert!(!openid.restricted, "allowDynReg=true must become restricted=false.");
		assert!(profile.restricted, "allowDynReg=false must become restricted=true.");
	}

	#[test]
	fn nested_authentication_objects_decode() {
		let service = DataService11::new(in_memory_stores());
		let host = test_host();
		let document = r#"{
			"authenticationHolders": [{
				"id": 5,
				"authentication": {
					"clientAuthorization": {"clientId": "c1", "scope": ["openid"], "approved": true},
					"userAuthentication": "AAAA",
					"savedUserAuthentication": {"name": "alice", "authenticated": true}
				}
			}]
		}"#;
		let mut reader = reader_for(document);
		let report =
			service.import_data(&mut reader, &host).expect("Import should succeed.");

		assert_eq!(report.counts.authentication_holders, 1);

		let holders = service
			.stores
			.authentication_holders
			.get_all(&host)
			.expect("Holder listing should succeed.");
		let request =
			holders[0].request.as_ref().expect("Captured request should be present.");

		assert_eq!(request.client_id.as_deref(), Some("c1"));
		assert!(request.approved);
		assert_eq!(
			holders[0]
				.user_auth
				.as_ref()
				.expect("User snapshot should be present.")
				.name
				.as_deref(),
			Some("alice")
		);
	}
}
