use std::fmt;

use crate::backend::SearchResult;
use crate::error::ErrorKind;

/// A backend result tagged with the sequence of the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
	/// Sequence of the request that produced the result.
	pub sequence: u64,
	/// What the backend answered.
	pub result: SearchResult,
}

impl SearchOutcome {
	/// Tags `result` with `sequence`.
	pub fn new(sequence: u64, result: SearchResult) -> Self {
		Self { sequence, result }
	}
}

/// Value pushed to the status output.
///
/// `Display` renders the status line shown to the user: `searching`,
/// `ready`, `no results`, or `search failed: <kind>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
	/// A backend call was started for `sequence`.
	Searching { sequence: u64, query: String },
	/// Fresh links were delivered.
	Ready,
	/// The latest search matched nothing, or the query was emptied.
	NoResults,
	/// The latest search failed; previous links stay on screen.
	Failed(ErrorKind),
}

impl fmt::Display for SearchStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Searching { .. } => f.write_str("searching"),
			Self::Ready => f.write_str("ready"),
			Self::NoResults => f.write_str("no results"),
			Self::Failed(kind) => write!(f, "search failed: {kind}"),
		}
	}
}
