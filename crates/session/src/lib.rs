//! Search orchestration for one open connection.
//!
//! Four input streams (Go clicks, query text, the instant-search checkbox,
//! Enter presses) flow through a fixed pipeline:
//!
//! * [`intent`]: merges the inputs into one ordered stream of intents.
//! * [`gate`]: applies the instant-search policy.
//! * [`debounce`]: holds instant candidates until the query settles.
//! * [`sequencer`]: numbers requests and keeps one backend call in flight.
//! * [`router`]: drops stale outcomes and drives the `links` and `status` outputs.
//!
//! [`ConnectionHandler::on_connection_open`] wires all of it up and returns a
//! [`SessionHandle`].

pub mod backend;
pub mod config;
pub mod debounce;
pub mod error;
pub mod gate;
pub mod intent;
pub mod observer;
pub mod outcome;
pub mod request;
pub mod router;
pub mod sequencer;
mod session;
mod task;

pub use backend::{BackendRequest, SearchBackend, SearchFuture, SearchResult};
pub use config::SessionConfig;
pub use error::{ConfigError, ErrorKind, InvokeError, SessionError};
pub use observer::{FnObserver, Observer};
pub use outcome::{SearchOutcome, SearchStatus};
pub use request::{RequestReason, SearchCandidate, SearchRequest};
pub use session::{ConnectionHandler, SessionHandle, SessionState};
pub use task::TaskClass;
