//! Simulated search backend used by the terminal front end.

use std::time::Duration;

use futures::FutureExt;
use quarry_session::{BackendRequest, ErrorKind, InvokeError, SearchBackend, SearchFuture, SearchResult};

const LINK_BASE: &str = "https://duckduckgo.com/?q=";

/// Answers after a fixed latency with one link per query word.
///
/// Queries steer the simulation: `offline` refuses the call, `timeout` and
/// `garbled` fail, `nothing` yields no results.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
	latency: Duration,
}

impl SimulatedBackend {
	pub fn new(latency: Duration) -> Self {
		Self { latency }
	}
}

fn answer(query: &str) -> SearchResult {
	let words: Vec<&str> = query.split_whitespace().collect();
	if words.contains(&"timeout") {
		return SearchResult::Failed(ErrorKind::BackendTimeout);
	}
	if words.contains(&"garbled") {
		return SearchResult::Failed(ErrorKind::BackendProtocolError);
	}
	if words.contains(&"nothing") {
		return SearchResult::Empty;
	}
	SearchResult::Links(words.iter().map(|word| format!("{LINK_BASE}{}", word.to_lowercase())).collect())
}

impl SearchBackend for SimulatedBackend {
	fn search(&self, request: BackendRequest) -> Result<SearchFuture, InvokeError> {
		if request.query.split_whitespace().any(|word| word == "offline") {
			return Err(InvokeError::new("simulated network is offline"));
		}
		let latency = self.latency;
		Ok(async move {
			tokio::select! {
				() = request.cancel.cancelled() => {
					tracing::debug!(sequence = request.sequence, "backend.cancelled");
					SearchResult::Failed(ErrorKind::Cancelled)
				}
				() = tokio::time::sleep(latency) => answer(&request.query),
			}
		}
		.boxed())
	}
}
