//! Search backend collaborator interface.

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::{ErrorKind, InvokeError};

/// Result a backend call resolves with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
	/// Ordered result URLs.
	Links(Vec<String>),
	/// The query matched nothing.
	Empty,
	/// The call failed.
	Failed(ErrorKind),
}

/// One call handed to the backend.
#[derive(Debug, Clone)]
pub struct BackendRequest {
	/// Query text, never empty.
	pub query: String,
	/// Sequence number the outcome will be tagged with.
	pub sequence: u64,
	/// Fires when a newer request supersedes this one.
	///
	/// Honoring it is best-effort. A backend may still resolve normally after
	/// cancellation; the result router discards such late outcomes.
	pub cancel: CancellationToken,
}

/// Future returned by a started backend call.
pub type SearchFuture = BoxFuture<'static, SearchResult>;

/// External search collaborator.
///
/// `search` starts a call and returns its future without awaiting it. An
/// `Err` means the call could not be started; the sequencer turns that into
/// a `Failed(BackendUnavailable)` outcome.
pub trait SearchBackend: Send + Sync + 'static {
	/// Starts one search.
	fn search(&self, request: BackendRequest) -> Result<SearchFuture, InvokeError>;
}

impl<B: SearchBackend + ?Sized> SearchBackend for std::sync::Arc<B> {
	fn search(&self, request: BackendRequest) -> Result<SearchFuture, InvokeError> {
		(**self).search(request)
	}
}
