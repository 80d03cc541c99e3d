//! Persisted entity models moved by the interchange engine.
//!
//! Entities are constructed empty, populated field-by-field while one stream object is
//! decoded, persisted immediately to acquire their engine-assigned identifier, and only
//! afterward mutated by the fixup pass to attach resolved relationships.

pub mod client;
pub mod holder;
pub mod scope;
pub mod site;
pub mod token;

pub use client::*;
pub use holder::*;
pub use scope::*;
pub use site::*;
pub use token::*;

// self
use crate::_prelude::*;

/// A single field's literal could not be parsed into its typed representation.
///
/// Contained at the entity level: the field stays unset, the entity proceeds.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unrecognized {kind} literal: {literal}.")]
pub struct FieldDecodeError {
	/// Kind of value that failed to parse (auth method, algorithm, timestamp, ...).
	pub kind: &'static str,
	/// The offending literal.
	pub literal: String,
}
impl FieldDecodeError {
	/// Builds an error for the provided value kind and offending literal.
	pub fn new(kind: &'static str, literal: impl Into<String>) -> Self {
		Self { kind, literal: literal.into() }
	}
}
