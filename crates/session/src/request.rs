/// Why a request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestReason {
	/// Click or Enter. Never debounced.
	Explicit,
	/// Typing or toggling with instant search on.
	Instant,
}

impl RequestReason {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Explicit => "explicit",
			Self::Instant => "instant",
		}
	}
}

/// A request that has not been admitted by the sequencer yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
	/// Query text to search for.
	pub query: String,
	/// Trigger kind that produced the candidate.
	pub reason: RequestReason,
}

impl SearchCandidate {
	/// Candidate from a click or Enter press.
	pub fn explicit(query: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			reason: RequestReason::Explicit,
		}
	}

	/// Candidate from typing or toggling with instant search on.
	pub fn instant(query: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			reason: RequestReason::Instant,
		}
	}

	/// Whitespace-only queries count as empty.
	pub fn is_empty(&self) -> bool {
		is_blank(&self.query)
	}
}

/// An admitted request tagged with its session-unique sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
	/// Query text sent to the backend.
	pub query: String,
	/// Session-unique, strictly increasing sequence number.
	pub sequence: u64,
	/// Trigger kind the request was admitted for.
	pub reason: RequestReason,
}

impl SearchRequest {
	/// Whitespace-only queries count as empty.
	pub fn is_empty(&self) -> bool {
		is_blank(&self.query)
	}
}

pub(crate) fn is_blank(query: &str) -> bool {
	query.trim().is_empty()
}
