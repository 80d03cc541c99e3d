//! Forward-only pull reader and push writer over the hierarchical interchange format.
//!
//! Decoders must call [`JsonReader::skip_value`] for every field name they do not
//! recognize; that discipline is what lets a newer export be partially read by an older
//! engine. Structural misuse (asking for a scalar where an object starts, closing an
//! array that never opened) raises [`StreamError`], which is fatal to the surrounding
//! import or export.

// std
use std::collections::VecDeque;
// crates.io
use serde_json::{Map, Number, Value};
// self
use crate::_prelude::*;

/// Structural kind of the next token in the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
	/// Opening brace of an object.
	BeginObject,
	/// Closing brace of an object.
	EndObject,
	/// Opening bracket of an array.
	BeginArray,
	/// Closing bracket of an array.
	EndArray,
	/// A member name inside an object.
	Name,
	/// A string scalar.
	String,
	/// A numeric scalar.
	Number,
	/// A boolean scalar.
	Boolean,
	/// An explicit null.
	Null,
	/// The document is exhausted.
	EndOfDocument,
}
impl TokenKind {
	/// Returns a stable label suitable for error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::BeginObject => "begin-object",
			TokenKind::EndObject => "end-object",
			TokenKind::BeginArray => "begin-array",
			TokenKind::EndArray => "end-array",
			TokenKind::Name => "name",
			TokenKind::String => "string",
			TokenKind::Number => "number",
			TokenKind::Boolean => "boolean",
			TokenKind::Null => "null",
			TokenKind::EndOfDocument => "end-of-document",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Malformed structural nesting or scalar coercion failure; fatal to the whole
/// import or export that hit it.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StreamError {
	/// The document text could not be parsed at all.
	#[error("Malformed document: {message}.")]
	Malformed {
		/// Parser failure including the path that produced it.
		message: String,
	},
	/// The next token does not match what the caller asked for.
	#[error("Expected {expected} but found {found}.")]
	UnexpectedToken {
		/// Token kind the caller requested.
		expected: &'static str,
		/// Token kind actually present.
		found: TokenKind,
	},
	/// A numeric scalar does not fit the requested representation.
	#[error("Number {literal} does not fit the requested representation.")]
	NumberOutOfRange {
		/// Offending literal.
		literal: String,
	},
	/// An identifier field holds neither a number nor a string.
	#[error("Identifier field holds neither a number nor a string.")]
	InvalidIdentifier,
	/// The writer was driven out of order.
	#[error("Writer misuse: {message}.")]
	WriterMisuse {
		/// What the caller did wrong.
		message: String,
	},
}

#[derive(Clone, Debug)]
enum Token {
	BeginObject,
	EndObject,
	BeginArray,
	EndArray,
	Name(String),
	Str(String),
	Num(Number),
	Bool(bool),
	Null,
}
impl Token {
	fn kind(&self) -> TokenKind {
		match self {
			Token::BeginObject => TokenKind::BeginObject,
			Token::EndObject => TokenKind::EndObject,
			Token::BeginArray => TokenKind::BeginArray,
			Token::EndArray => TokenKind::EndArray,
			Token::Name(_) => TokenKind::Name,
			Token::Str(_) => TokenKind::String,
			Token::Num(_) => TokenKind::Number,
			Token::Bool(_) => TokenKind::Boolean,
			Token::Null => TokenKind::Null,
		}
	}
}

/// Forward-only pull reader over one interchange document.
#[derive(Clone, Debug)]
pub struct JsonReader {
	tokens: VecDeque<Token>,
}
impl JsonReader {
	/// Parses a document and positions the reader at its first token.
	pub fn parse(document: &str) -> Result<Self, StreamError> {
		let deserializer = &mut serde_json::Deserializer::from_str(document);
		let value: Value = serde_path_to_error::deserialize(deserializer)
			.map_err(|e| StreamError::Malformed { message: e.to_string() })?;

		Ok(Self::from_value(value))
	}

	/// Builds a reader over an already-parsed document.
	pub fn from_value(value: Value) -> Self {
		let mut tokens = VecDeque::new();

		flatten(value, &mut tokens);

		Self { tokens }
	}

	/// Returns the kind of the next token without consuming it.
	pub fn peek(&self) -> TokenKind {
		self.tokens.front().map_or(TokenKind::EndOfDocument, Token::kind)
	}

	/// Returns `true` while the current object or array has members left to read.
	pub fn has_next(&self) -> bool {
		!matches!(
			self.peek(),
			TokenKind::EndObject | TokenKind::EndArray | TokenKind::EndOfDocument
		)
	}

	/// Consumes the opening brace of an object.
	pub fn begin_object(&mut self) -> Result<(), StreamError> {
		self.expect(TokenKind::BeginObject).map(|_| ())
	}

	/// Consumes the closing brace of an object.
	pub fn end_object(&mut self) -> Result<(), StreamError> {
		self.expect(TokenKind::EndObject).map(|_| ())
	}

	/// Consumes the opening bracket of an array.
	pub fn begin_array(&mut self) -> Result<(), StreamError> {
		self.expect(TokenKind::BeginArray).map(|_| ())
	}

	/// Consumes the closing bracket of an array.
	pub fn end_array(&mut self) -> Result<(), StreamError> {
		self.expect(TokenKind::EndArray).map(|_| ())
	}

	/// Consumes and returns the next member name.
	pub fn next_name(&mut self) -> Result<String, StreamError> {
		match self.expect(TokenKind::Name)? {
			Token::Name(name) => Ok(name),
			_ => unreachable!("expect() returned a token of the requested kind"),
		}
	}

	/// Consumes and returns the next string scalar.
	pub fn next_string(&mut self) -> Result<String, StreamError> {
		match self.expect(TokenKind::String)? {
			Token::Str(value) => Ok(value),
			_ => unreachable!("expect() returned a token of the requested kind"),
		}
	}

	/// Consumes and returns the next numeric scalar as a signed integer.
	pub fn next_i64(&mut self) -> Result<i64, StreamError> {
		match self.expect(TokenKind::Number)? {
			Token::Num(number) => number
				.as_i64()
				.ok_or_else(|| StreamError::NumberOutOfRange { literal: number.to_string() }),
			_ => unreachable!("expect() returned a token of the requested kind"),
		}
	}

	/// Consumes and returns the next boolean scalar.
	pub fn next_bool(&mut self) -> Result<bool, StreamError> {
		match self.expect(TokenKind::Boolean)? {
			Token::Bool(value) => Ok(value),
			_ => unreachable!("expect() returned a token of the requested kind"),
		}
	}

	/// Consumes an identifier scalar, accepting both numeric and string encodings.
	///
	/// Legacy exports wrote numeric identifiers while this engine assigns string ones;
	/// both normalize to the same textual form so the remap table treats them alike.
	pub fn next_id(&mut self) -> Result<String, StreamError> {
		match self.peek() {
			TokenKind::Number => Ok(self.next_i64()?.to_string()),
			TokenKind::String => self.next_string(),
			_ => Err(StreamError::InvalidIdentifier),
		}
	}

	/// Recursively discards the next value regardless of its shape.
	///
	/// When positioned at a member name, the name and its whole value are discarded.
	pub fn skip_value(&mut self) -> Result<(), StreamError> {
		if self.peek() == TokenKind::Name {
			self.tokens.pop_front();
		}

		let first = self.tokens.pop_front().ok_or(StreamError::UnexpectedToken {
			expected: "a value",
			found: TokenKind::EndOfDocument,
		})?;
		let mut depth = match first.kind() {
			TokenKind::BeginObject | TokenKind::BeginArray => 1_usize,
			TokenKind::EndObject | TokenKind::EndArray =>
				return Err(StreamError::UnexpectedToken {
					expected: "a value",
					found: first.kind(),
				}),
			_ => return Ok(()),
		};

		while depth > 0 {
			let token = self.tokens.pop_front().ok_or(StreamError::UnexpectedToken {
				expected: "a balanced value",
				found: TokenKind::EndOfDocument,
			})?;

			match token.kind() {
				TokenKind::BeginObject | TokenKind::BeginArray => depth += 1,
				TokenKind::EndObject | TokenKind::EndArray => depth -= 1,
				_ => {},
			}
		}

		Ok(())
	}

	fn expect(&mut self, kind: TokenKind) -> Result<Token, StreamError> {
		let found = self.peek();

		if found != kind {
			return Err(StreamError::UnexpectedToken { expected: kind.as_str(), found });
		}

		self.tokens.pop_front().ok_or(StreamError::UnexpectedToken {
			expected: kind.as_str(),
			found: TokenKind::EndOfDocument,
		})
	}
}

fn flatten(value: Value, out: &mut VecDeque<Token>) {
	match value {
		Value::Null => out.push_back(Token::Null),
		Value::Bool(b) => out.push_back(Token::Bool(b)),
		Value::Number(n) => out.push_back(Token::Num(n)),
		Value::String(s) => out.push_back(Token::Str(s)),
		Value::Array(items) => {
			out.push_back(Token::BeginArray);

			for item in items {
				flatten(item, out);
			}

			out.push_back(Token::EndArray);
		},
		Value::Object(members) => {
			out.push_back(Token::BeginObject);

			for (name, member) in members {
				out.push_back(Token::Name(name));
				flatten(member, out);
			}

			out.push_back(Token::EndObject);
		},
	}
}

#[derive(Debug)]
enum Frame {
	Object {
		members: Map<String, Value>,
		pending: Option<String>,
	},
	Array(Vec<Value>),
}

/// Push writer that assembles one interchange document through structural calls.
#[derive(Debug, Default)]
pub struct JsonWriter {
	stack: Vec<Frame>,
	root: Option<Value>,
}
impl JsonWriter {
	/// Creates an empty writer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Opens an object at the current position.
	pub fn begin_object(&mut self) -> Result<(), StreamError> {
		self.check_value_position("begin_object")?;
		self.stack.push(Frame::Object { members: Map::new(), pending: None });

		Ok(())
	}

	/// Closes the innermost object.
	pub fn end_object(&mut self) -> Result<(), StreamError> {
		match self.stack.pop() {
			Some(Frame::Object { members, pending: None }) =>
				self.push_value(Value::Object(members)),
			Some(Frame::Object { pending: Some(name), .. }) =>
				Err(StreamError::WriterMisuse {
					message: format!("end_object with the dangling member name `{name}`"),
				}),
			_ => Err(StreamError::WriterMisuse {
				message: "end_object outside of an object".into(),
			}),
		}
	}

	/// Opens an array at the current position.
	pub fn begin_array(&mut self) -> Result<(), StreamError> {
		self.check_value_position("begin_array")?;
		self.stack.push(Frame::Array(Vec::new()));

		Ok(())
	}

	/// Closes the innermost array.
	pub fn end_array(&mut self) -> Result<(), StreamError> {
		match self.stack.pop() {
			Some(Frame::Array(items)) => self.push_value(Value::Array(items)),
			_ => Err(StreamError::WriterMisuse {
				message: "end_array outside of an array".into(),
			}),
		}
	}

	/// Declares the name of the next member of the innermost object.
	pub fn name(&mut self, name: impl Into<String>) -> Result<(), StreamError> {
		match self.stack.last_mut() {
			Some(Frame::Object { pending: pending @ None, .. }) => {
				*pending = Some(name.into());

				Ok(())
			},
			Some(Frame::Object { pending: Some(previous), .. }) =>
				Err(StreamError::WriterMisuse {
					message: format!("name called while `{previous}` still awaits a value"),
				}),
			_ => Err(StreamError::WriterMisuse { message: "name outside of an object".into() }),
		}
	}

	/// Writes a string scalar.
	pub fn value_string(&mut self, value: impl Into<String>) -> Result<(), StreamError> {
		self.push_value(Value::String(value.into()))
	}

	/// Writes a string scalar or an explicit null.
	pub fn value_opt_string(&mut self, value: Option<&str>) -> Result<(), StreamError> {
		match value {
			Some(value) => self.value_string(value),
			None => self.value_null(),
		}
	}

	/// Writes a boolean scalar.
	pub fn value_bool(&mut self, value: bool) -> Result<(), StreamError> {
		self.push_value(Value::Bool(value))
	}

	/// Writes a signed integer scalar.
	pub fn value_i64(&mut self, value: i64) -> Result<(), StreamError> {
		self.push_value(Value::Number(Number::from(value)))
	}

	/// Writes an explicit null.
	pub fn value_null(&mut self) -> Result<(), StreamError> {
		self.push_value(Value::Null)
	}

	/// Finishes the document and returns the assembled value.
	pub fn into_document(self) -> Result<Value, StreamError> {
		if !self.stack.is_empty() {
			return Err(StreamError::WriterMisuse {
				message: format!("{} unclosed container(s) at finish", self.stack.len()),
			});
		}

		self.root.ok_or(StreamError::WriterMisuse { message: "finish before any value".into() })
	}

	/// Finishes the document and renders it as pretty-printed text.
	pub fn into_string(self) -> Result<String, StreamError> {
		let document = self.into_document()?;

		serde_json::to_string_pretty(&document)
			.map_err(|e| StreamError::Malformed { message: e.to_string() })
	}

	fn check_value_position(&self, operation: &'static str) -> Result<(), StreamError> {
		match self.stack.last() {
			None if self.root.is_some() => Err(StreamError::WriterMisuse {
				message: format!("{operation} after the document root was completed"),
			}),
			Some(Frame::Object { pending: None, .. }) => Err(StreamError::WriterMisuse {
				message: format!("{operation} inside an object without a member name"),
			}),
			_ => Ok(()),
		}
	}

	fn push_value(&mut self, value: Value) -> Result<(), StreamError> {
		match self.stack.last_mut() {
			Some(Frame::Object { members, pending }) => match pending.take() {
				Some(name) => {
					members.insert(name, value);

					Ok(())
				},
				None => Err(StreamError::WriterMisuse {
					message: "value inside an object without a member name".into(),
				}),
			},
			Some(Frame::Array(items)) => {
				items.push(value);

				Ok(())
			},
			None =>
				if self.root.is_some() {
					Err(StreamError::WriterMisuse {
						message: "second root value in one document".into(),
					})
				} else {
					self.root = Some(value);

					Ok(())
				},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn peek_does_not_consume() {
		let mut reader =
			JsonReader::parse(r#"{"a":1}"#).expect("Document fixture should parse.");

		assert_eq!(reader.peek(), TokenKind::BeginObject);
		assert_eq!(reader.peek(), TokenKind::BeginObject);
		reader.begin_object().expect("Object should open.");
		assert_eq!(reader.peek(), TokenKind::Name);
	}

	#[test]
	fn scalar_where_object_starts_is_a_stream_error() {
		let mut reader =
			JsonReader::parse(r#"{"a":{"b":2}}"#).expect("Document fixture should parse.");

		reader.begin_object().expect("Object should open.");
		reader.next_name().expect("Member name should be readable.");

		let err = reader.next_string().expect_err("Scalar read must fail at an object start.");

		assert!(matches!(
			err,
			StreamError::UnexpectedToken { expected: "string", found: TokenKind::BeginObject }
		));
	}

	#[test]
	fn skip_value_discards_nested_shapes() {
		let mut reader = JsonReader::parse(r#"{"junk":{"deep":[1,[2,{"x":null}]]},"keep":7}"#)
			.expect("Document fixture should parse.");

		reader.begin_object().expect("Object should open.");
		assert_eq!(reader.next_name().expect("First member name should read."), "junk");
		reader.skip_value().expect("Nested value should be skippable.");
		assert_eq!(reader.next_name().expect("Second member name should read."), "keep");
		assert_eq!(reader.next_i64().expect("Scalar after skip should read."), 7);
		reader.end_object().expect("Object should close.");
		assert_eq!(reader.peek(), TokenKind::EndOfDocument);
	}

	#[test]
	fn skip_value_at_a_name_discards_name_and_value() {
		let mut reader = JsonReader::parse(r#"{"junk":[1,2,3],"keep":true}"#)
			.expect("Document fixture should parse.");

		reader.begin_object().expect("Object should open.");
		reader.skip_value().expect("Name plus value should be skippable.");
		assert_eq!(reader.next_name().expect("Next member name should read."), "keep");
		assert!(reader.next_bool().expect("Boolean should read."));
	}

	#[test]
	fn identifiers_accept_numbers_and_strings() {
		let mut reader =
			JsonReader::parse(r#"[101,"a-b-c"]"#).expect("Document fixture should parse.");

		reader.begin_array().expect("Array should open.");
		assert_eq!(reader.next_id().expect("Numeric identifier should read."), "101");
		assert_eq!(reader.next_id().expect("String identifier should read."), "a-b-c");
		reader.end_array().expect("Array should close.");
	}

	#[test]
	fn malformed_documents_fail_with_context() {
		let err = JsonReader::parse("{\"a\": }").expect_err("Malformed text must not parse.");

		assert!(matches!(err, StreamError::Malformed { .. }));
	}

	#[test]
	fn writer_builds_documents_the_reader_accepts() {
		let mut writer = JsonWriter::new();

		writer.begin_object().expect("Root object should open.");
		writer.name("items").expect("Member name should be writable.");
		writer.begin_array().expect("Array should open.");
		writer.value_i64(1).expect("Integer should write.");
		writer.value_opt_string(None).expect("Null should write.");
		writer.value_string("two").expect("String should write.");
		writer.end_array().expect("Array should close.");
		writer.name("flag").expect("Second member name should be writable.");
		writer.value_bool(true).expect("Boolean should write.");
		writer.end_object().expect("Root object should close.");

		let text = writer.into_string().expect("Finished document should render.");
		let mut reader = JsonReader::parse(&text).expect("Rendered document should parse.");

		reader.begin_object().expect("Object should open.");
		assert_eq!(reader.next_name().expect("Member name should read."), "items");
	}

	#[test]
	fn writer_rejects_out_of_order_calls() {
		let mut writer = JsonWriter::new();

		writer.begin_object().expect("Root object should open.");

		let err = writer.value_bool(true).expect_err("Value without a name must fail.");

		assert!(matches!(err, StreamError::WriterMisuse { .. }));

		writer.name("dangling").expect("Member name should be writable.");

		let err = writer.end_object().expect_err("Closing on a dangling name must fail.");

		assert!(matches!(err, StreamError::WriterMisuse { .. }));
	}
}
