use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::SessionError;

/// Roles of the tasks a session spawns, used to tag trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Merges the four input sources into the intent channel.
	Merge,
	/// Owns session state and drives gate, debouncer, sequencer and router.
	Coordinator,
	/// Awaits one backend call and reports its outcome.
	Backend,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Merge => "merge",
			Self::Coordinator => "coordinator",
			Self::Backend => "backend",
		}
	}
}

/// Spawns session tasks on the runtime the session was opened from.
#[derive(Debug, Clone)]
pub(crate) struct TaskSpawner {
	handle: Handle,
}

impl TaskSpawner {
	/// Captures the ambient tokio runtime.
	pub fn current() -> Result<Self, SessionError> {
		Handle::try_current().map(|handle| Self { handle }).map_err(|_| SessionError::NoRuntime)
	}

	/// Spawns an async task tagged with `class`.
	pub fn spawn<F>(&self, class: TaskClass, fut: F) -> JoinHandle<F::Output>
	where
		F: Future + Send + 'static,
		F::Output: Send + 'static,
	{
		tracing::trace!(task_class = class.as_str(), "session.spawn");
		self.handle.spawn(fut)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn outside_runtime_is_an_error() {
		assert!(matches!(TaskSpawner::current(), Err(SessionError::NoRuntime)));
	}

	#[tokio::test]
	async fn spawns_on_current_runtime() {
		let spawner = TaskSpawner::current().unwrap();
		let value = spawner.spawn(TaskClass::Backend, async { 7 }).await.unwrap();
		assert_eq!(value, 7);
	}
}
