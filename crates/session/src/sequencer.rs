//! Single-flight request sequencing.
//!
//! Every admitted request gets the next sequence number and supersedes the
//! one in flight. Cancellation of the superseded call is advisory; ordering
//! correctness comes from the router's sequence filter.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::{BackendRequest, SearchBackend, SearchResult};
use crate::error::ErrorKind;
use crate::outcome::SearchOutcome;
use crate::request::{SearchCandidate, SearchRequest};
use crate::task::{TaskClass, TaskSpawner};

/// Handle on the one request allowed in flight.
#[derive(Debug)]
pub struct CancellationHandle {
	sequence: u64,
	token: CancellationToken,
	task: JoinHandle<()>,
}

impl CancellationHandle {
	/// Sequence of the in-flight request.
	pub const fn sequence(&self) -> u64 {
		self.sequence
	}

	/// Asks the backend to give up. The call may still complete.
	pub fn cancel(&self) {
		self.token.cancel();
	}

	/// Cancels and stops waiting for the call.
	fn abort(self) {
		self.token.cancel();
		self.task.abort();
	}
}

/// Result of admitting one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
	/// A backend call was started; its outcome arrives on the outcome channel.
	Dispatched(SearchRequest),
	/// Resolved without a backend call (empty query or invocation failure).
	/// The outcome must be routed right away.
	Resolved(SearchRequest, SearchOutcome),
}

impl Admission {
	/// The admitted request.
	pub fn request(&self) -> &SearchRequest {
		match self {
			Self::Dispatched(request) | Self::Resolved(request, _) => request,
		}
	}
}

/// Assigns sequence numbers and keeps at most one backend call in flight.
pub struct RequestSequencer {
	backend: Arc<dyn SearchBackend>,
	spawner: TaskSpawner,
	outcomes: mpsc::UnboundedSender<SearchOutcome>,
	next_sequence: u64,
	active: Option<CancellationHandle>,
}

impl RequestSequencer {
	pub(crate) fn new(backend: Arc<dyn SearchBackend>, spawner: TaskSpawner, outcomes: mpsc::UnboundedSender<SearchOutcome>) -> Self {
		Self {
			backend,
			spawner,
			outcomes,
			next_sequence: 0,
			active: None,
		}
	}

	/// Sequence the next admitted request will receive.
	pub fn next_sequence(&self) -> u64 {
		self.next_sequence
	}

	/// Sequence of the in-flight request, if any.
	pub fn active_sequence(&self) -> Option<u64> {
		self.active.as_ref().map(CancellationHandle::sequence)
	}

	/// Admits a candidate, superseding whatever is in flight.
	pub fn admit(&mut self, candidate: SearchCandidate) -> Admission {
		let sequence = self.next_sequence;
		self.next_sequence += 1;
		let request = SearchRequest {
			query: candidate.query,
			sequence,
			reason: candidate.reason,
		};

		if let Some(previous) = self.active.take() {
			debug!(sequence = previous.sequence(), superseded_by = sequence, "search.superseded");
			previous.cancel();
		}

		if request.is_empty() {
			debug!(sequence, reason = request.reason.as_str(), "search.short_circuit");
			return Admission::Resolved(request, SearchOutcome::new(sequence, SearchResult::Empty));
		}

		let token = CancellationToken::new();
		let call = BackendRequest {
			query: request.query.clone(),
			sequence,
			cancel: token.clone(),
		};

		match self.backend.search(call) {
			Ok(future) => {
				let outcomes = self.outcomes.clone();
				let task = self.spawner.spawn(TaskClass::Backend, async move {
					let result = AssertUnwindSafe(future).catch_unwind().await.unwrap_or_else(|_| {
						warn!(sequence, "search.backend_panicked");
						SearchResult::Failed(ErrorKind::BackendProtocolError)
					});
					if outcomes.send(SearchOutcome::new(sequence, result)).is_err() {
						tracing::trace!(sequence, "search.outcome_dropped");
					}
				});
				debug!(sequence, query = %request.query, reason = request.reason.as_str(), "search.admitted");
				self.active = Some(CancellationHandle { sequence, token, task });
				Admission::Dispatched(request)
			}
			Err(err) => {
				warn!(sequence, error = %err, "search.invoke_failed");
				Admission::Resolved(request, SearchOutcome::new(sequence, SearchResult::Failed(ErrorKind::BackendUnavailable)))
			}
		}
	}

	/// Forgets the in-flight handle once its outcome was routed.
	pub fn settle(&mut self, sequence: u64) {
		if self.active_sequence() == Some(sequence) {
			self.active = None;
		}
	}

	/// Cancels and abandons the in-flight call.
	pub fn shutdown(&mut self) {
		if let Some(active) = self.active.take() {
			debug!(sequence = active.sequence(), "search.abandoned");
			active.abort();
		}
	}
}
