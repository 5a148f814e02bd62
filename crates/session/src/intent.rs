//! Trigger normalization: four raw input streams merged into one ordered
//! stream of [`SearchIntent`]s.
//!
//! The merge runs as its own task and takes one event at a time, so events
//! that arrive one after another keep their arrival order. When several
//! sources are ready in the same poll the tie is broken as
//! click > enter > text change > toggle change, except that an explicit
//! trigger never overtakes query text or toggle changes that are already
//! waiting: those are folded in first so Click and Enter always see the
//! query typed before them.

use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Which input produced an intent.
///
/// Variants are declared in tie-break priority order, so the derived [`Ord`]
/// ranks `Click` highest priority (smallest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TriggerSource {
	/// The "Go" button.
	Click,
	/// Enter pressed in the query field.
	Enter,
	/// The query text changed.
	TextChange,
	/// The instant-search checkbox changed.
	ToggleChange,
}

impl TriggerSource {
	/// Returns true for sources that always trigger a search.
	pub const fn is_explicit(self) -> bool {
		matches!(self, Self::Click | Self::Enter)
	}

	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Click => "click",
			Self::Enter => "enter",
			Self::TextChange => "text_change",
			Self::ToggleChange => "toggle_change",
		}
	}
}

/// One raw event as delivered by an input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTrigger {
	/// Go button clicked.
	Click,
	/// Enter key pressed.
	Enter,
	/// Full current query text.
	Text(String),
	/// New instant-search state.
	Toggle(bool),
}

impl RawTrigger {
	const fn is_explicit(&self) -> bool {
		matches!(self, Self::Click | Self::Enter)
	}
}

/// Canonical event consumed by the search gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIntent {
	/// Latest known query text at the time of the event.
	pub query: String,
	/// Input that produced the event.
	pub source: TriggerSource,
	/// Instant-search state after the event.
	pub instant_search_enabled: bool,
	/// Arrival instant.
	pub timestamp: Instant,
}

/// Stamps raw events with the latest query and instant-search state.
#[derive(Debug, Clone, Default)]
pub struct TriggerNormalizer {
	latest_query: String,
	instant_search: bool,
}

impl TriggerNormalizer {
	/// Creates a normalizer for a fresh session.
	pub fn new(instant_search: bool) -> Self {
		Self {
			latest_query: String::new(),
			instant_search,
		}
	}

	/// Converts one raw event into an intent.
	pub fn normalize(&mut self, trigger: RawTrigger, timestamp: Instant) -> SearchIntent {
		let source = match trigger {
			RawTrigger::Click => TriggerSource::Click,
			RawTrigger::Enter => TriggerSource::Enter,
			RawTrigger::Text(text) => {
				self.latest_query = text;
				TriggerSource::TextChange
			}
			RawTrigger::Toggle(enabled) => {
				self.instant_search = enabled;
				TriggerSource::ToggleChange
			}
		};
		SearchIntent {
			query: self.latest_query.clone(),
			source,
			instant_search_enabled: self.instant_search,
			timestamp,
		}
	}
}

/// The four subscribed input sources of one connection.
pub(crate) struct TriggerSources {
	pub go_clicks: BoxStream<'static, ()>,
	pub query_inputs: BoxStream<'static, String>,
	pub instant_search_changes: BoxStream<'static, bool>,
	pub enter_presses: BoxStream<'static, ()>,
}

impl TriggerSources {
	/// Moves every text and toggle event that is ready right now into `batch`.
	fn take_ready_passive(&mut self, open: &mut OpenSources, batch: &mut Vec<RawTrigger>) {
		while open.query_inputs {
			match self.query_inputs.next().now_or_never() {
				Some(Some(text)) => batch.push(RawTrigger::Text(text)),
				Some(None) => open.query_inputs = false,
				None => break,
			}
		}
		while open.instant_search_changes {
			match self.instant_search_changes.next().now_or_never() {
				Some(Some(enabled)) => batch.push(RawTrigger::Toggle(enabled)),
				Some(None) => open.instant_search_changes = false,
				None => break,
			}
		}
	}
}

#[derive(Clone, Copy)]
struct OpenSources {
	go_clicks: bool,
	query_inputs: bool,
	instant_search_changes: bool,
	enter_presses: bool,
}

impl OpenSources {
	const fn any(self) -> bool {
		self.go_clicks || self.query_inputs || self.instant_search_changes || self.enter_presses
	}
}

/// Merges the sources into `intents` until every source has ended, the
/// coordinator hangs up, or `cancel` fires.
pub(crate) async fn run_merge(
	mut sources: TriggerSources,
	mut normalizer: TriggerNormalizer,
	intents: mpsc::Sender<SearchIntent>,
	cancel: CancellationToken,
) {
	let mut open = OpenSources {
		go_clicks: true,
		query_inputs: true,
		instant_search_changes: true,
		enter_presses: true,
	};

	let mut batch = Vec::new();

	'merge: while open.any() {
		let trigger = tokio::select! {
			biased;
			() = cancel.cancelled() => break,
			next = sources.go_clicks.next(), if open.go_clicks => match next {
				Some(()) => RawTrigger::Click,
				None => {
					open.go_clicks = false;
					continue;
				}
			},
			next = sources.enter_presses.next(), if open.enter_presses => match next {
				Some(()) => RawTrigger::Enter,
				None => {
					open.enter_presses = false;
					continue;
				}
			},
			next = sources.query_inputs.next(), if open.query_inputs => match next {
				Some(text) => RawTrigger::Text(text),
				None => {
					open.query_inputs = false;
					continue;
				}
			},
			next = sources.instant_search_changes.next(), if open.instant_search_changes => match next {
				Some(enabled) => RawTrigger::Toggle(enabled),
				None => {
					open.instant_search_changes = false;
					continue;
				}
			},
		};

		if trigger.is_explicit() {
			sources.take_ready_passive(&mut open, &mut batch);
		}
		batch.push(trigger);

		for trigger in batch.drain(..) {
			let intent = normalizer.normalize(trigger, Instant::now());
			trace!(source = intent.source.as_str(), query = %intent.query, "session.intent");
			if intents.send(intent).await.is_err() {
				break 'merge;
			}
		}
	}

	debug!("session.inputs_closed");
}
