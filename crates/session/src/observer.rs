//! Output capabilities the session pushes links and status updates into.
//!
//! Each observer has exactly one writer, the session coordinator, so no
//! synchronization is needed beyond what the channel type provides.

/// Receiver of values pushed by a session.
pub trait Observer<T>: Send + 'static {
	/// Delivers the next value. Must not block.
	fn on_next(&mut self, value: T);
}

impl<T: Send + 'static> Observer<T> for tokio::sync::mpsc::UnboundedSender<T> {
	fn on_next(&mut self, value: T) {
		if self.send(value).is_err() {
			tracing::trace!("observer.closed");
		}
	}
}

impl<T: Send + 'static> Observer<T> for futures::channel::mpsc::UnboundedSender<T> {
	fn on_next(&mut self, value: T) {
		if self.unbounded_send(value).is_err() {
			tracing::trace!("observer.closed");
		}
	}
}

/// Adapts a closure into an [`Observer`].
pub struct FnObserver<F>(pub F);

impl<T, F> Observer<T> for FnObserver<F>
where
	F: FnMut(T) + Send + 'static,
{
	fn on_next(&mut self, value: T) {
		(self.0)(value);
	}
}
