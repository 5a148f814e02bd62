//! Instant-search policy.
//!
//! [`SearchGate`] decides per intent whether a search should fire now, be
//! handed to the debouncer, or wait for an explicit trigger.

use tracing::trace;

use crate::intent::{SearchIntent, TriggerSource};
use crate::request::{SearchCandidate, is_blank};

/// Gate mode, derived from the instant-search flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateMode {
	/// Instant search on: text changes can fire searches.
	Idle,
	/// Instant search off: only click or Enter fires a search.
	#[default]
	AwaitingExplicit,
}

impl GateMode {
	const fn from_instant(enabled: bool) -> Self {
		if enabled { Self::Idle } else { Self::AwaitingExplicit }
	}
}

/// What the coordinator should do with one intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
	/// Admit immediately, bypassing the debouncer.
	Explicit(SearchCandidate),
	/// Offer to the debouncer.
	Instant(SearchCandidate),
	/// Instant search is on and the query became empty: drop any pending
	/// candidate and clear the results without contacting the backend.
	Clear,
	/// Instant search was switched off: drop any pending candidate.
	Disarm,
	/// Nothing to do; the query is cached for a later explicit trigger.
	Suppress,
}

/// Stateful filter between the trigger normalizer and the debouncer.
#[derive(Debug, Clone, Default)]
pub struct SearchGate {
	mode: GateMode,
	latest_query: String,
}

impl SearchGate {
	/// Creates a gate for a fresh session.
	pub fn new(instant_search: bool) -> Self {
		Self {
			mode: GateMode::from_instant(instant_search),
			latest_query: String::new(),
		}
	}

	/// Current mode.
	pub fn mode(&self) -> GateMode {
		self.mode
	}

	/// Latest query seen by the gate.
	pub fn latest_query(&self) -> &str {
		&self.latest_query
	}

	/// Applies the instant-search policy to one intent.
	pub fn evaluate(&mut self, intent: &SearchIntent) -> GateDecision {
		let previous = self.mode;
		self.mode = GateMode::from_instant(intent.instant_search_enabled);
		self.latest_query.clone_from(&intent.query);

		let decision = match intent.source {
			TriggerSource::Click | TriggerSource::Enter => GateDecision::Explicit(SearchCandidate::explicit(intent.query.clone())),
			TriggerSource::TextChange => match self.mode {
				GateMode::AwaitingExplicit => GateDecision::Suppress,
				GateMode::Idle if is_blank(&intent.query) => GateDecision::Clear,
				GateMode::Idle => GateDecision::Instant(SearchCandidate::instant(intent.query.clone())),
			},
			TriggerSource::ToggleChange => match self.mode {
				GateMode::AwaitingExplicit if previous == GateMode::Idle => GateDecision::Disarm,
				GateMode::AwaitingExplicit => GateDecision::Suppress,
				GateMode::Idle if is_blank(&intent.query) => GateDecision::Suppress,
				GateMode::Idle => GateDecision::Instant(SearchCandidate::instant(intent.query.clone())),
			},
		};

		trace!(source = intent.source.as_str(), mode = ?self.mode, decision = ?decision, "gate.evaluate");
		decision
	}
}
