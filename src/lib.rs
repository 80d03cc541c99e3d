//! Rust’s turnkey OAuth 2.0 server data porter—move clients, tokens, grants, scopes,
//! and captured authorization context across server instances and schema generations in
//! one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod error;
pub mod host;
pub mod interchange;
pub mod model;
pub mod store;
pub mod stream;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)`
	//! or the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{host::HostId, store::Stores, stream::JsonReader};

	/// Host every test imports under unless a scenario needs a second tenant.
	pub fn test_host() -> HostId {
		HostId::new("host-test").expect("Test host identifier should be valid.")
	}

	/// Builds a fresh in-memory collaborator bundle for one test.
	pub fn in_memory_stores() -> Stores {
		Stores::in_memory()
	}

	/// Parses a document fixture, panicking with context on malformed test input.
	pub fn reader_for(document: &str) -> JsonReader {
		JsonReader::parse(document).expect("Test document fixture should parse.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use color_eyre as _;
