//! Per-connection session: entry point, coordinator task and handle.
//!
//! `on_connection_open` spawns two tasks. The merge task turns the four input
//! streams into one ordered intent channel. The coordinator task is the only
//! writer of session state: it feeds intents through the gate and debouncer,
//! admits requests to the sequencer, and routes outcomes to the outputs.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::SearchBackend;
use crate::config::SessionConfig;
use crate::debounce::Debouncer;
use crate::error::SessionError;
use crate::gate::{GateDecision, SearchGate};
use crate::intent::{SearchIntent, TriggerNormalizer, TriggerSources, run_merge};
use crate::observer::Observer;
use crate::outcome::{SearchOutcome, SearchStatus};
use crate::request::SearchCandidate;
use crate::router::{ResultRouter, RouteDecision};
use crate::sequencer::{Admission, RequestSequencer};
use crate::task::{TaskClass, TaskSpawner};

/// Connection-scoped session state, republished after every coordinator step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
	/// Latest query text received.
	pub current_query: String,
	/// Current instant-search flag.
	pub instant_search_enabled: bool,
	/// Highest sequence whose outcome reached the outputs.
	pub last_accepted_sequence: Option<u64>,
	/// Sequence of the request in flight.
	pub active_sequence: Option<u64>,
}

impl SessionState {
	fn fresh(instant_search: bool) -> Self {
		Self {
			current_query: String::new(),
			instant_search_enabled: instant_search,
			last_accepted_sequence: None,
			active_sequence: None,
		}
	}
}

/// Opens search sessions against one backend.
pub struct ConnectionHandler<B> {
	backend: Arc<B>,
	config: SessionConfig,
}

impl<B: SearchBackend> ConnectionHandler<B> {
	/// Creates a handler owning `backend`.
	pub fn new(backend: B, config: SessionConfig) -> Self {
		Self::with_shared(Arc::new(backend), config)
	}

	/// Creates a handler over a shared backend.
	pub fn with_shared(backend: Arc<B>, config: SessionConfig) -> Self {
		Self { backend, config }
	}

	/// Configuration applied to every opened session.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Wires one connection's inputs to its outputs.
	///
	/// Session state starts from defaults and lives until the returned handle
	/// is closed or every input has ended and the last search resolved.
	///
	/// - `go_clicks` emits once per Go click.
	/// - `query_inputs` emits the complete query text whenever it changes.
	/// - `instant_search_changes` emits the checkbox state whenever it changes.
	/// - `enter_presses` emits once per Enter key press in the query field.
	/// - `links` receives result lists, each one replacing the previous.
	/// - `status` receives backend status updates.
	pub fn on_connection_open<G, Q, I, E>(
		&self,
		go_clicks: G,
		query_inputs: Q,
		instant_search_changes: I,
		enter_presses: E,
		links: impl Observer<Vec<String>>,
		status: impl Observer<SearchStatus>,
	) -> Result<SessionHandle, SessionError>
	where
		G: Stream<Item = ()> + Send + 'static,
		Q: Stream<Item = String> + Send + 'static,
		I: Stream<Item = bool> + Send + 'static,
		E: Stream<Item = ()> + Send + 'static,
	{
		let spawner = TaskSpawner::current()?;
		let instant_search = self.config.instant_search;
		let cancel = CancellationToken::new();

		let (intent_tx, intent_rx) = mpsc::channel(self.config.intent_capacity.max(1));
		let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
		let (state_tx, state_rx) = watch::channel(SessionState::fresh(instant_search));

		let sources = TriggerSources {
			go_clicks: go_clicks.boxed(),
			query_inputs: query_inputs.boxed(),
			instant_search_changes: instant_search_changes.boxed(),
			enter_presses: enter_presses.boxed(),
		};
		let merge = spawner.spawn(
			TaskClass::Merge,
			run_merge(sources, TriggerNormalizer::new(instant_search), intent_tx, cancel.child_token()),
		);

		let backend: Arc<dyn SearchBackend> = self.backend.clone();
		let coordinator = Coordinator {
			gate: SearchGate::new(instant_search),
			debouncer: Debouncer::new(self.config.debounce()),
			sequencer: RequestSequencer::new(backend, spawner.clone(), outcome_tx),
			router: ResultRouter::new(links, status),
			state: SessionState::fresh(instant_search),
			state_tx,
		};
		let coordinator = spawner.spawn(TaskClass::Coordinator, coordinator.run(intent_rx, outcome_rx, cancel.clone()));

		debug!(debounce_ms = self.config.debounce_ms, instant_search, "session.open");
		Ok(SessionHandle {
			cancel,
			merge,
			coordinator,
			state: state_rx,
		})
	}
}

/// Owner-side handle of one open session.
#[derive(Debug)]
pub struct SessionHandle {
	cancel: CancellationToken,
	merge: JoinHandle<()>,
	coordinator: JoinHandle<()>,
	state: watch::Receiver<SessionState>,
}

impl SessionHandle {
	/// Latest published session state.
	pub fn state(&self) -> SessionState {
		self.state.borrow().clone()
	}

	/// Receiver notified whenever session state is republished.
	pub fn watch_state(&self) -> watch::Receiver<SessionState> {
		self.state.clone()
	}

	/// Returns true once both session tasks have exited.
	pub fn is_finished(&self) -> bool {
		self.merge.is_finished() && self.coordinator.is_finished()
	}

	/// Closes the connection: cancels the in-flight request, drops any
	/// pending debounce, and waits for the session tasks to exit.
	pub async fn close(self) {
		self.cancel.cancel();
		join_task(TaskClass::Merge, self.merge).await;
		join_task(TaskClass::Coordinator, self.coordinator).await;
	}

	/// Waits for the session to end on its own after its inputs end.
	pub async fn closed(self) {
		join_task(TaskClass::Coordinator, self.coordinator).await;
		self.cancel.cancel();
		join_task(TaskClass::Merge, self.merge).await;
	}
}

async fn join_task(class: TaskClass, task: JoinHandle<()>) {
	if let Err(err) = task.await {
		warn!(error = %err, task_class = class.as_str(), "session.task_failed");
	}
}

struct Coordinator {
	gate: SearchGate,
	debouncer: Debouncer,
	sequencer: RequestSequencer,
	router: ResultRouter,
	state: SessionState,
	state_tx: watch::Sender<SessionState>,
}

impl Coordinator {
	async fn run(
		mut self,
		mut intents: mpsc::Receiver<SearchIntent>,
		mut outcomes: mpsc::UnboundedReceiver<SearchOutcome>,
		cancel: CancellationToken,
	) {
		let mut inputs_open = true;

		loop {
			if !inputs_open && !self.debouncer.is_pending() && self.sequencer.active_sequence().is_none() {
				break;
			}

			let deadline = self.debouncer.deadline();
			tokio::select! {
				biased;
				() = cancel.cancelled() => break,
				Some(outcome) = outcomes.recv() => self.on_outcome(outcome),
				() = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
					self.on_debounce_elapsed();
				}
				intent = intents.recv(), if inputs_open => match intent {
					Some(intent) => self.on_intent(intent),
					None => inputs_open = false,
				},
			}

			self.publish();
		}

		self.debouncer.cancel();
		self.sequencer.shutdown();
		self.publish();
		debug!(last_accepted = ?self.state.last_accepted_sequence, "session.closed");
	}

	fn on_intent(&mut self, intent: SearchIntent) {
		self.state.current_query.clone_from(&intent.query);
		self.state.instant_search_enabled = intent.instant_search_enabled;

		match self.gate.evaluate(&intent) {
			GateDecision::Explicit(candidate) => {
				self.debouncer.cancel();
				self.admit(candidate);
			}
			GateDecision::Instant(candidate) => self.debouncer.offer(candidate, intent.timestamp),
			GateDecision::Clear => {
				self.debouncer.cancel();
				self.admit(SearchCandidate::instant(String::new()));
			}
			GateDecision::Disarm => {
				self.debouncer.cancel();
			}
			GateDecision::Suppress => {}
		}
	}

	fn on_debounce_elapsed(&mut self) {
		if let Some(candidate) = self.debouncer.take_due(Instant::now()) {
			self.admit(candidate);
		}
	}

	fn admit(&mut self, candidate: SearchCandidate) {
		match self.sequencer.admit(candidate) {
			Admission::Dispatched(request) => self.router.admitted(&request),
			Admission::Resolved(request, outcome) => {
				self.router.admitted(&request);
				self.on_outcome(outcome);
			}
		}
	}

	fn on_outcome(&mut self, outcome: SearchOutcome) {
		let sequence = outcome.sequence;
		if self.router.route(outcome) != RouteDecision::Stale {
			self.sequencer.settle(sequence);
		}
	}

	fn publish(&mut self) {
		self.state.last_accepted_sequence = self.router.last_accepted();
		self.state.active_sequence = self.sequencer.active_sequence();
		self.state_tx.send_replace(self.state.clone());
	}
}
