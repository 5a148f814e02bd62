//! Routes backend outcomes to the links and status outputs.
//!
//! An outcome is applied only if its sequence is at least the highest
//! sequence admitted so far, so a late answer for a superseded request can
//! never overwrite fresher output, whether or not its cancellation took.

use tracing::{debug, trace};

use crate::backend::SearchResult;
use crate::error::ErrorKind;
use crate::observer::Observer;
use crate::outcome::{SearchOutcome, SearchStatus};
use crate::request::SearchRequest;

/// What happened to a routed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
	/// Outputs were updated.
	Applied,
	/// The outcome belongs to a superseded request and was dropped.
	Stale,
	/// A current outcome that must not be surfaced (cancelled).
	Swallowed,
}

/// Drives the `links` and `status` outputs of one session.
pub struct ResultRouter {
	links: Box<dyn Observer<Vec<String>>>,
	status: Box<dyn Observer<SearchStatus>>,
	last_accepted: Option<u64>,
	latest_admitted: Option<u64>,
}

impl ResultRouter {
	pub fn new(links: impl Observer<Vec<String>>, status: impl Observer<SearchStatus>) -> Self {
		Self {
			links: Box::new(links),
			status: Box::new(status),
			last_accepted: None,
			latest_admitted: None,
		}
	}

	/// Highest sequence whose outcome reached the outputs.
	pub fn last_accepted(&self) -> Option<u64> {
		self.last_accepted
	}

	/// Records an admission. Non-empty requests announce `searching`.
	pub fn admitted(&mut self, request: &SearchRequest) {
		self.latest_admitted = self.latest_admitted.max(Some(request.sequence));
		if !request.is_empty() {
			self.status.on_next(SearchStatus::Searching {
				sequence: request.sequence,
				query: request.query.clone(),
			});
		}
	}

	fn is_stale(&self, sequence: u64) -> bool {
		self.last_accepted.is_some_and(|last| sequence < last) || self.latest_admitted.is_some_and(|latest| sequence < latest)
	}

	/// Applies or discards one outcome.
	pub fn route(&mut self, outcome: SearchOutcome) -> RouteDecision {
		let SearchOutcome { sequence, result } = outcome;
		if self.is_stale(sequence) {
			debug!(sequence, latest = ?self.latest_admitted, "search.stale");
			return RouteDecision::Stale;
		}
		if result == SearchResult::Failed(ErrorKind::Cancelled) {
			trace!(sequence, "search.cancelled");
			return RouteDecision::Swallowed;
		}

		self.last_accepted = Some(sequence);
		match result {
			SearchResult::Links(urls) => {
				debug!(sequence, count = urls.len(), "search.ready");
				self.links.on_next(urls);
				self.status.on_next(SearchStatus::Ready);
			}
			SearchResult::Empty => {
				debug!(sequence, "search.no_results");
				self.links.on_next(Vec::new());
				self.status.on_next(SearchStatus::NoResults);
			}
			SearchResult::Failed(kind) => {
				debug!(sequence, error = %kind, "search.failed");
				self.status.on_next(SearchStatus::Failed(kind));
			}
		}
		RouteDecision::Applied
	}
}
