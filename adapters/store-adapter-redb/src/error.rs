//! Error types for the snapshot store adapter

use std::fmt;

/// Adapter-specific errors
#[derive(Debug)]
pub enum Error {
	/// Database operation error
	DbError(String),

	/// I/O error
	IoError(String),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::DbError(msg) => write!(f, "Database error: {}", msg),
			Error::IoError(msg) => write!(f, "I/O error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<Error> for quillpad::error::Error {
	fn from(err: Error) -> Self {
		quillpad::error::Error::Db(err.to_string())
	}
}

// vim: ts=4
