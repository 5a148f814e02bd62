use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::channel::mpsc as input;
use pretty_assertions::assert_eq;
use quarry_session::{
	BackendRequest, ConnectionHandler, ErrorKind, InvokeError, SearchBackend, SearchFuture, SearchResult, SearchStatus, SessionConfig,
	SessionError, SessionHandle,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One backend call waiting for the test to answer it.
struct Call {
	query: String,
	sequence: u64,
	cancel: CancellationToken,
	respond: oneshot::Sender<SearchResult>,
}

impl Call {
	fn resolve(self, result: SearchResult) {
		let _ = self.respond.send(result);
	}
}

struct ScriptedBackend {
	calls: mpsc::UnboundedSender<Call>,
	offline: AtomicBool,
}

impl SearchBackend for ScriptedBackend {
	fn search(&self, request: BackendRequest) -> Result<SearchFuture, InvokeError> {
		if self.offline.load(Ordering::SeqCst) {
			return Err(InvokeError::new("connection refused"));
		}
		let (respond, answer) = oneshot::channel();
		let _ = self.calls.send(Call {
			query: request.query,
			sequence: request.sequence,
			cancel: request.cancel,
			respond,
		});
		Ok(async move { answer.await.unwrap_or(SearchResult::Failed(ErrorKind::BackendUnavailable)) }.boxed())
	}
}

struct Harness {
	clicks: input::UnboundedSender<()>,
	queries: input::UnboundedSender<String>,
	toggles: input::UnboundedSender<bool>,
	enters: input::UnboundedSender<()>,
	links: mpsc::UnboundedReceiver<Vec<String>>,
	status: mpsc::UnboundedReceiver<SearchStatus>,
	calls: mpsc::UnboundedReceiver<Call>,
	backend: Arc<ScriptedBackend>,
	session: SessionHandle,
}

const WAIT: Duration = Duration::from_secs(30);

/// Lets every ready task run before the next input arrives.
async fn settle() {
	tokio::time::sleep(Duration::from_millis(1)).await;
}

impl Harness {
	fn open() -> Self {
		Self::open_with(SessionConfig::default())
	}

	fn open_with(config: SessionConfig) -> Self {
		let (calls_tx, calls) = mpsc::unbounded_channel();
		let backend = Arc::new(ScriptedBackend {
			calls: calls_tx,
			offline: AtomicBool::new(false),
		});
		let handler = ConnectionHandler::with_shared(Arc::clone(&backend), config);

		let (clicks, click_rx) = input::unbounded();
		let (queries, query_rx) = input::unbounded();
		let (toggles, toggle_rx) = input::unbounded();
		let (enters, enter_rx) = input::unbounded();
		let (links_tx, links) = mpsc::unbounded_channel();
		let (status_tx, status) = mpsc::unbounded_channel();

		let session = handler
			.on_connection_open(click_rx, query_rx, toggle_rx, enter_rx, links_tx, status_tx)
			.expect("session opens inside a runtime");

		Self {
			clicks,
			queries,
			toggles,
			enters,
			links,
			status,
			calls,
			backend,
			session,
		}
	}

	/// Sends one query change and lets the session observe it.
	async fn type_query(&self, text: &str) {
		self.queries.unbounded_send(text.to_string()).unwrap();
		settle().await;
	}

	async fn click(&self) {
		self.clicks.unbounded_send(()).unwrap();
		settle().await;
	}

	async fn press_enter(&self) {
		self.enters.unbounded_send(()).unwrap();
		settle().await;
	}

	async fn toggle_instant(&self, enabled: bool) {
		self.toggles.unbounded_send(enabled).unwrap();
		settle().await;
	}

	async fn next_call(&mut self) -> Call {
		tokio::time::timeout(WAIT, self.calls.recv())
			.await
			.expect("backend call within timeout")
			.expect("backend alive")
	}

	async fn next_links(&mut self) -> Vec<String> {
		tokio::time::timeout(WAIT, self.links.recv())
			.await
			.expect("links within timeout")
			.expect("links output open")
	}

	async fn next_status(&mut self) -> String {
		tokio::time::timeout(WAIT, self.status.recv())
			.await
			.expect("status within timeout")
			.expect("status output open")
			.to_string()
	}

	/// Lets every timer and task settle, then asserts nothing else happened.
	async fn assert_quiet(&mut self) {
		tokio::time::sleep(Duration::from_secs(5)).await;
		assert!(self.calls.try_recv().is_err(), "unexpected backend call");
		assert!(self.links.try_recv().is_err(), "unexpected links update");
		assert!(self.status.try_recv().is_err(), "unexpected status update");
	}
}

fn links(urls: &[&str]) -> SearchResult {
	SearchResult::Links(urls.iter().map(|url| url.to_string()).collect())
}

fn strings(urls: &[&str]) -> Vec<String> {
	urls.iter().map(|url| url.to_string()).collect()
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn click_searches_and_delivers_links() {
	let mut h = Harness::open();
	h.type_query("rust lang").await;
	h.click().await;

	let call = h.next_call().await;
	assert_eq!(call.query, "rust lang");
	assert_eq!(call.sequence, 0);
	assert_eq!(h.next_status().await, "searching");

	call.resolve(links(&["a", "b"]));
	assert_eq!(h.next_links().await, strings(&["a", "b"]));
	assert_eq!(h.next_status().await, "ready");

	let state = h.session.state();
	assert_eq!(state.last_accepted_sequence, Some(0));
	assert_eq!(state.active_sequence, None);
	assert_eq!(state.current_query, "rust lang");
	h.assert_quiet().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn click_right_after_typing_searches_the_typed_query() {
	let mut h = Harness::open();
	h.queries.unbounded_send("rust lang".to_string()).unwrap();
	h.clicks.unbounded_send(()).unwrap();

	let call = h.next_call().await;
	assert_eq!(call.query, "rust lang");
	assert_eq!(h.next_status().await, "searching");
	assert_eq!(h.session.state().current_query, "rust lang");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn typing_without_instant_search_waits_for_explicit_trigger() {
	let mut h = Harness::open();
	h.type_query("r").await;
	h.type_query("ru").await;
	h.toggle_instant(false).await;
	h.type_query("rust").await;
	h.assert_quiet().await;

	h.press_enter().await;
	let call = h.next_call().await;
	assert_eq!(call.query, "rust");
	assert_eq!(call.sequence, 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn enabling_instant_search_with_text_searches_once() {
	let mut h = Harness::open();
	h.type_query("rust lang").await;
	h.assert_quiet().await;

	h.toggle_instant(true).await;
	let call = h.next_call().await;
	assert_eq!(call.query, "rust lang");
	assert_eq!(h.next_status().await, "searching");
	call.resolve(links(&["https://www.rust-lang.org/"]));
	assert_eq!(h.next_links().await, strings(&["https://www.rust-lang.org/"]));
	assert_eq!(h.next_status().await, "ready");
	h.assert_quiet().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn rapid_typing_is_debounced_to_the_last_query() {
	let mut h = Harness::open();
	h.toggle_instant(true).await;
	let start = Instant::now();
	h.type_query("r").await;
	h.type_query("ru").await;
	h.type_query("rus").await;

	let call = h.next_call().await;
	assert_eq!(call.query, "rus");
	assert_eq!(call.sequence, 0);
	assert!(start.elapsed() >= Duration::from_millis(300));

	assert_eq!(h.next_status().await, "searching");
	call.resolve(SearchResult::Empty);
	assert_eq!(h.next_links().await, Vec::<String>::new());
	assert_eq!(h.next_status().await, "no results");
	h.assert_quiet().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn debounce_window_is_configurable() {
	let mut h = Harness::open_with(SessionConfig {
		debounce_ms: 50,
		instant_search: true,
		..SessionConfig::default()
	});
	let start = Instant::now();
	h.type_query("tokio").await;

	let call = h.next_call().await;
	assert_eq!(call.query, "tokio");
	let waited = start.elapsed();
	assert!(waited >= Duration::from_millis(50) && waited < Duration::from_millis(300), "waited {waited:?}");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn outcome_of_superseded_request_is_discarded() {
	let mut h = Harness::open();
	h.type_query("one").await;
	h.click().await;
	let first = h.next_call().await;
	assert_eq!(h.next_status().await, "searching");

	h.type_query("two").await;
	h.press_enter().await;
	let second = h.next_call().await;
	assert_eq!(h.next_status().await, "searching");
	assert_eq!((first.sequence, second.sequence), (0, 1));
	assert!(first.cancel.is_cancelled(), "superseded call is asked to cancel");
	assert!(!second.cancel.is_cancelled());

	second.resolve(links(&["two"]));
	assert_eq!(h.next_links().await, strings(&["two"]));
	assert_eq!(h.next_status().await, "ready");

	first.resolve(links(&["one"]));
	h.assert_quiet().await;
	assert_eq!(h.session.state().last_accepted_sequence, Some(1));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn early_outcome_of_superseded_request_is_discarded() {
	let mut h = Harness::open();
	h.type_query("one").await;
	h.click().await;
	let first = h.next_call().await;
	h.click().await;
	let second = h.next_call().await;
	assert_eq!(h.next_status().await, "searching");
	assert_eq!(h.next_status().await, "searching");

	first.resolve(SearchResult::Failed(ErrorKind::Cancelled));
	h.assert_quiet().await;
	assert_eq!(h.session.state().last_accepted_sequence, None);

	second.resolve(links(&["one"]));
	assert_eq!(h.next_links().await, strings(&["one"]));
	assert_eq!(h.next_status().await, "ready");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn failure_keeps_previous_links() {
	let mut h = Harness::open();
	h.type_query("rust").await;
	h.click().await;
	h.next_call().await.resolve(links(&["x"]));
	assert_eq!(h.next_status().await, "searching");
	assert_eq!(h.next_links().await, strings(&["x"]));
	assert_eq!(h.next_status().await, "ready");

	h.click().await;
	h.next_call().await.resolve(SearchResult::Failed(ErrorKind::BackendTimeout));
	assert_eq!(h.next_status().await, "searching");
	assert_eq!(h.next_status().await, "search failed: backend timed out");
	h.assert_quiet().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn unreachable_backend_reports_unavailable() {
	let mut h = Harness::open();
	h.backend.offline.store(true, Ordering::SeqCst);
	h.type_query("rust").await;
	h.click().await;

	assert_eq!(h.next_status().await, "searching");
	assert_eq!(h.next_status().await, "search failed: backend unavailable");
	assert_eq!(h.session.state().last_accepted_sequence, Some(0));
	h.assert_quiet().await;

	h.backend.offline.store(false, Ordering::SeqCst);
	h.click().await;
	assert_eq!(h.next_call().await.sequence, 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn emptied_query_clears_without_backend_call() {
	let mut h = Harness::open();
	h.toggle_instant(true).await;
	h.type_query("rust").await;
	h.next_call().await.resolve(links(&["a"]));
	assert_eq!(h.next_status().await, "searching");
	assert_eq!(h.next_links().await, strings(&["a"]));
	assert_eq!(h.next_status().await, "ready");

	h.type_query("").await;
	assert_eq!(h.next_links().await, Vec::<String>::new());
	assert_eq!(h.next_status().await, "no results");
	h.assert_quiet().await;
	assert_eq!(h.session.state().last_accepted_sequence, Some(1));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn emptied_query_drops_pending_candidate() {
	let mut h = Harness::open();
	h.toggle_instant(true).await;
	h.type_query("ru").await;
	h.type_query("").await;

	assert_eq!(h.next_links().await, Vec::<String>::new());
	assert_eq!(h.next_status().await, "no results");
	h.assert_quiet().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn explicit_trigger_replaces_pending_candidate() {
	let mut h = Harness::open();
	h.toggle_instant(true).await;
	h.type_query("ru").await;
	h.press_enter().await;

	let call = h.next_call().await;
	assert_eq!(call.query, "ru");
	assert_eq!(call.sequence, 0);
	assert_eq!(h.next_status().await, "searching");
	h.assert_quiet().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn disabling_instant_search_drops_pending_candidate() {
	let mut h = Harness::open();
	h.toggle_instant(true).await;
	h.type_query("rust").await;
	h.toggle_instant(false).await;
	h.assert_quiet().await;
	assert!(!h.session.state().instant_search_enabled);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn explicit_empty_query_yields_no_results() {
	let mut h = Harness::open();
	h.click().await;
	assert_eq!(h.next_links().await, Vec::<String>::new());
	assert_eq!(h.next_status().await, "no results");
	h.assert_quiet().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn close_cancels_in_flight_request() {
	let mut h = Harness::open();
	h.type_query("rust").await;
	h.click().await;
	let call = h.next_call().await;

	let Harness { session, .. } = h;
	session.close().await;
	assert!(call.cancel.is_cancelled());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn session_ends_after_inputs_end_and_search_resolves() {
	let mut h = Harness::open();
	h.type_query("rust").await;
	h.click().await;
	let call = h.next_call().await;

	let Harness {
		clicks,
		queries,
		toggles,
		enters,
		links: mut links_rx,
		session,
		..
	} = h;
	drop((clicks, queries, toggles, enters));
	tokio::time::sleep(Duration::from_secs(1)).await;
	assert!(!session.is_finished(), "session waits for the in-flight search");

	call.resolve(links(&["done"]));
	assert_eq!(links_rx.recv().await, Some(strings(&["done"])));
	let state = session.watch_state();
	session.closed().await;
	assert_eq!(state.borrow().last_accepted_sequence, Some(0));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn state_starts_from_config_defaults() {
	let h = Harness::open_with(SessionConfig {
		instant_search: true,
		..SessionConfig::default()
	});
	let state = h.session.state();
	assert!(state.instant_search_enabled);
	assert_eq!(state.current_query, "");
	assert_eq!(state.last_accepted_sequence, None);
}

#[test]
fn opening_outside_a_runtime_fails() {
	let (calls, _calls_rx) = mpsc::unbounded_channel();
	let handler = ConnectionHandler::new(
		ScriptedBackend {
			calls,
			offline: AtomicBool::new(false),
		},
		SessionConfig::default(),
	);
	let (links, _links_rx) = mpsc::unbounded_channel::<Vec<String>>();
	let (status, _status_rx) = mpsc::unbounded_channel::<SearchStatus>();
	let result = handler.on_connection_open(
		futures::stream::empty::<()>(),
		futures::stream::empty::<String>(),
		futures::stream::empty::<bool>(),
		futures::stream::empty::<()>(),
		links,
		status,
	);
	assert!(matches!(result, Err(SessionError::NoRuntime)));
}
