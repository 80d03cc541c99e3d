//! Engine-level error types shared across the stream, store, and interchange layers.
//!
//! Only structural stream failures and unsupported-format requests are fatal to a whole
//! operation; every other failure class is contained to a single entity or relationship
//! and surfaces through [`ImportReport`](crate::interchange::ImportReport) diagnostics.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical engine error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Malformed structural nesting in the interchange stream.
	#[error("{0}")]
	Stream(
		#[from]
		#[source]
		crate::stream::StreamError,
	),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Requested format generation unsupported for the requested direction.
	#[error(transparent)]
	UnsupportedFormat(#[from] crate::interchange::UnsupportedFormatError),
}
