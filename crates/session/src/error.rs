//! Error types for search sessions.

use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds a search can resolve with.
///
/// Everything except [`ErrorKind::Cancelled`] is surfaced to the status output.
/// Cancelled outcomes belong to superseded requests and are swallowed by the
/// result router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
	/// The backend could not be reached or refused the call.
	#[error("backend unavailable")]
	BackendUnavailable,
	/// The backend did not answer in time.
	#[error("backend timed out")]
	BackendTimeout,
	/// The backend answered with something that could not be understood.
	#[error("backend protocol error")]
	BackendProtocolError,
	/// The request was superseded and the backend honored the cancellation.
	#[error("search cancelled")]
	Cancelled,
}

impl ErrorKind {
	/// Returns true for kinds that should reach the status output.
	pub const fn is_surfaced(self) -> bool {
		!matches!(self, Self::Cancelled)
	}
}

/// A backend call could not be started at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("search backend unreachable: {reason}")]
pub struct InvokeError {
	/// Collaborator-provided reason, logged but never shown verbatim.
	pub reason: String,
}

impl InvokeError {
	/// Creates an invocation error with the given reason.
	pub fn new(reason: impl Into<String>) -> Self {
		Self { reason: reason.into() }
	}
}

/// Errors raised while opening a session.
#[derive(Debug, Error)]
pub enum SessionError {
	/// `on_connection_open` was called outside a tokio runtime.
	#[error("no tokio runtime is available to host the session")]
	NoRuntime,
}

/// Errors that can occur when loading session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The file is not valid TOML or does not match the schema.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A value parsed but is out of range.
	#[error("invalid configuration: {0}")]
	Invalid(String),
}
