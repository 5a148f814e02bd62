//! Quiet-period debouncing of instant-search candidates.
//!
//! The debouncer holds at most one candidate and one deadline. The
//! coordinator sleeps until [`Debouncer::deadline`] and then calls
//! [`Debouncer::take_due`], so a session never has more than one timer.

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::request::{RequestReason, SearchCandidate};

#[derive(Debug, Clone)]
struct Pending {
	candidate: SearchCandidate,
	deadline: Instant,
}

/// Holds the most recent instant candidate until the window passes quietly.
#[derive(Debug, Clone)]
pub struct Debouncer {
	window: Duration,
	pending: Option<Pending>,
}

impl Debouncer {
	/// Creates a debouncer with the given quiet period.
	pub fn new(window: Duration) -> Self {
		Self { window, pending: None }
	}

	/// Quiet period.
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Replaces the held candidate and restarts the window.
	///
	/// An empty candidate drops whatever was pending instead.
	pub fn offer(&mut self, candidate: SearchCandidate, now: Instant) {
		debug_assert_eq!(candidate.reason, RequestReason::Instant);
		if candidate.is_empty() {
			self.cancel();
			return;
		}
		let deadline = now + self.window;
		trace!(query = %candidate.query, replaced = self.pending.is_some(), "debounce.offer");
		self.pending = Some(Pending { candidate, deadline });
	}

	/// Drops the held candidate, returning it.
	pub fn cancel(&mut self) -> Option<SearchCandidate> {
		let dropped = self.pending.take().map(|pending| pending.candidate);
		if let Some(candidate) = &dropped {
			trace!(query = %candidate.query, "debounce.cancel");
		}
		dropped
	}

	/// When the held candidate becomes due, if any.
	pub fn deadline(&self) -> Option<Instant> {
		self.pending.as_ref().map(|pending| pending.deadline)
	}

	/// Returns true while a candidate is held.
	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// Releases the held candidate once its window has elapsed.
	pub fn take_due(&mut self, now: Instant) -> Option<SearchCandidate> {
		match &self.pending {
			Some(pending) if now >= pending.deadline => self.pending.take().map(|pending| pending.candidate),
			_ => None,
		}
	}
}
