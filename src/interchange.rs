//! Format services, the version dispatcher, and the import/export orchestrator.
//!
//! A document is one top-level object whose single member name declares the format
//! generation and whose value holds the entity-array sections. The orchestrator reads
//! the declared generation, hands the inner object to the first registered service
//! claiming it, and surfaces [`UnsupportedFormatError`] when none does. There is no
//! cross-version export path: a service asked to export a generation it cannot produce
//! refuses before any work happens.

pub mod maps;
pub mod v1_1;
pub mod v1_3;

pub(crate) mod decode;
pub(crate) mod fixup;

pub use v1_1::DataService11;
pub use v1_3::DataService13;

// self
use crate::{
	_prelude::*,
	host::HostId,
	interchange::maps::RemapTable,
	stream::{JsonReader, JsonWriter},
};

/// Version tag of the legacy 1.1 interchange format (import only).
pub const FORMAT_1_1: &str = "interchange-1.1";
/// Version tag of the current 1.3 interchange format.
pub const FORMAT_1_3: &str = "interchange-1.3";

/// Section name for registered clients.
pub const CLIENTS: &str = "clients";
/// Section name for approved sites.
pub const GRANTS: &str = "grants";
/// Section name for whitelisted sites.
pub const WHITELISTED_SITES: &str = "whitelistedSites";
/// Section name for blacklisted sites.
pub const BLACKLISTED_SITES: &str = "blacklistedSites";
/// Section name for captured authentication holders.
pub const AUTHENTICATION_HOLDERS: &str = "authenticationHolders";
/// Section name for access tokens.
pub const ACCESS_TOKENS: &str = "accessTokens";
/// Section name for refresh tokens.
pub const REFRESH_TOKENS: &str = "refreshTokens";
/// Section name for system scopes.
pub const SYSTEM_SCOPES: &str = "systemScopes";

/// Direction of an interchange operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatDirection {
	/// Reading a document into the store.
	Import,
	/// Producing a document from the store.
	Export,
}
impl FormatDirection {
	/// Returns a stable label suitable for error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			FormatDirection::Import => "import",
			FormatDirection::Export => "export",
		}
	}
}
impl Display for FormatDirection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Requested format generation unsupported for the requested direction; fatal and
/// surfaced before any partial work.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Format {version} is not supported for {direction}.")]
pub struct UnsupportedFormatError {
	/// The requested generation tag.
	pub version: String,
	/// The direction that was requested.
	pub direction: FormatDirection,
}

/// Kind of contained failure recorded while importing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
	/// A single field's literal could not be parsed; the field stayed unset.
	FieldDecode,
	/// A natural-key collision; recovered once or the entity was dropped.
	PersistenceConflict,
	/// A deferred reference's endpoint was missing at fixup time.
	ReferenceResolution,
}
impl DiagnosticKind {
	/// Returns a stable label suitable for audit output.
	pub const fn as_str(self) -> &'static str {
		match self {
			DiagnosticKind::FieldDecode => "field-decode",
			DiagnosticKind::PersistenceConflict => "persistence-conflict",
			DiagnosticKind::ReferenceResolution => "reference-resolution",
		}
	}
}
impl Display for DiagnosticKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One contained failure recorded during a best-effort import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
	/// What class of failure occurred.
	pub kind: DiagnosticKind,
	/// Human-readable description.
	pub message: String,
}

/// Per-section entity counts for one completed import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounts {
	/// Clients persisted.
	pub clients: usize,
	/// Grants persisted.
	pub grants: usize,
	/// Whitelisted sites persisted.
	pub whitelisted_sites: usize,
	/// Blacklisted sites persisted.
	pub blacklisted_sites: usize,
	/// Authentication holders persisted.
	pub authentication_holders: usize,
	/// Access tokens persisted.
	pub access_tokens: usize,
	/// Refresh tokens persisted.
	pub refresh_tokens: usize,
	/// System scopes persisted.
	pub system_scopes: usize,
}

/// Outcome of one import invocation: what was persisted plus every contained failure,
/// so callers can audit a best-effort run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
	/// Entities persisted per section.
	pub counts: ImportCounts,
	/// Contained failures in the order they occurred.
	pub diagnostics: Vec<Diagnostic>,
}
impl ImportReport {
	/// Records a contained failure and logs it.
	pub fn record(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
		let message = message.into();

		tracing::warn!(kind = %kind, "{message}");
		self.diagnostics.push(Diagnostic { kind, message });
	}

	/// Returns the diagnostics of one kind, in order.
	pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
		self.diagnostics.iter().filter(move |d| d.kind == kind)
	}
}

/// One format generation's import/export implementation.
pub trait DataService
where
	Self: Send + Sync,
{
	/// Returns `true` if this service handles the given generation tag.
	fn supports_version(&self, version: &str) -> bool;

	/// Consumes the sections object at the reader's position and persists its contents
	/// under the given host.
	fn import_data(&self, reader: &mut JsonReader, host: &HostId) -> Result<ImportReport>;

	/// Writes the sections object for the given host, or refuses with
	/// [`UnsupportedFormatError`] when this service cannot produce its generation.
	fn export_data(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()>;
}

/// A pluggable handler for top-level sections no built-in decoder recognizes.
///
/// Registered handlers are searched in order; the first whose `supports_version`
/// matches and whose `import_extension_data` claims the section wins. Unclaimed
/// sections are skipped wholesale.
pub trait DataServiceExtension
where
	Self: Send + Sync,
{
	/// Returns `true` if this extension handles the given generation tag.
	fn supports_version(&self, version: &str) -> bool;

	/// Offers a section to the extension. Returns `true` if the extension consumed the
	/// section's value from the reader; `false` leaves the value unconsumed.
	fn import_extension_data(
		&self,
		name: &str,
		reader: &mut JsonReader,
		host: &HostId,
	) -> Result<bool>;

	/// Resolves any deferred references the extension recorded, after the built-in
	/// fixup pass.
	fn fix_extension_references(&self, maps: &RemapTable, host: &HostId) -> Result<()> {
		let _ = (maps, host);

		Ok(())
	}

	/// Writes any extension-owned sections during export.
	fn export_extension_data(&self, writer: &mut JsonWriter, host: &HostId) -> Result<()> {
		let _ = (writer, host);

		Ok(())
	}
}

/// Orchestrator that owns the registered services and dispatches whole documents by
/// their declared generation tag.
pub struct DataInterchange {
	services: Vec<Arc<dyn DataService>>,
}
impl DataInterchange {
	/// Registers the built-in services over the provided collaborators.
	pub fn new(stores: crate::store::Stores) -> Self {
		Self::with_extensions(stores, Vec::new())
	}

	/// Registers the built-in services, each sharing the provided extension list.
	pub fn with_extensions(
		stores: crate::store::Stores,
		extensions: Vec<Arc<dyn DataServiceExtension>>,
	) -> Self {
		Self {
			services: vec![
				Arc::new(DataService13::with_extensions(stores.clone(), extensions.clone())),
				Arc::new(DataService11::with_extensions(stores, extensions)),
			],
		}
	}

	/// Builds an orchestrator from an explicit service list, first match winning.
	pub fn from_services(services: Vec<Arc<dyn DataService>>) -> Self {
		Self { services }
	}

	/// Imports a whole document, dispatching on its declared generation tag.
	pub fn import_document(&self, document: &str, host: &HostId) -> Result<ImportReport> {
		let mut reader = JsonReader::parse(document)?;

		reader.begin_object()?;

		let version = reader.next_name()?;
		let service = self.service_for(&version, FormatDirection::Import)?;
		let report = service.import_data(&mut reader, host)?;

		reader.end_object()?;

		Ok(report)
	}

	/// Exports a whole document in the requested generation, refusing up front when the
	/// generation is unsupported.
	pub fn export_document(&self, version: &str, host: &HostId) -> Result<String> {
		let service = self.service_for(version, FormatDirection::Export)?;
		let mut writer = JsonWriter::new();

		writer.begin_object()?;
		writer.name(version)?;
		service.export_data(&mut writer, host)?;
		writer.end_object()?;

		Ok(writer.into_string()?)
	}

	fn service_for(
		&self,
		version: &str,
		direction: FormatDirection,
	) -> Result<&Arc<dyn DataService>> {
		self.services.iter().find(|service| service.supports_version(version)).ok_or_else(|| {
			UnsupportedFormatError { version: version.to_owned(), direction }.into()
		})
	}
}
impl Debug for DataInterchange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DataInterchange").field("services", &self.services.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::Error, store::Stores};

	#[test]
	fn unknown_versions_are_rejected_up_front() {
		let interchange = DataInterchange::new(Stores::in_memory());
		let host = HostId::new("host-a").expect("Host fixture should be valid.");
		let err = interchange
			.import_document("{\"interchange-9.9\":{}}", &host)
			.expect_err("Unknown generation tag must be rejected.");

		assert!(matches!(
			err,
			Error::UnsupportedFormat(UnsupportedFormatError {
				direction: FormatDirection::Import,
				..
			})
		));
	}

	#[test]
	fn legacy_generation_refuses_export() {
		let interchange = DataInterchange::new(Stores::in_memory());
		let host = HostId::new("host-a").expect("Host fixture should be valid.");
		let err = interchange
			.export_document(FORMAT_1_1, &host)
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
	fn report_filters_diagnostics_by_kind() {
		let mut report = ImportReport::default();

		report.record(DiagnosticKind::FieldDecode, "bad literal");
		report.record(DiagnosticKind::ReferenceResolution, "missing endpoint");

		assert_eq!(report.diagnostics_of(DiagnosticKind::FieldDecode).count(), 1);
		assert_eq!(report.diagnostics.len(), 2);
	}
}
