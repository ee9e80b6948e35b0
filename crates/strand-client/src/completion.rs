//! Bridge between the transport's completion callbacks and futures.
//!
//! Each native operation registers interest once and receives exactly one
//! completion. [`pair`] produces the two ends: the [`ReplyHandle`] travels
//! to the transport, the [`CompletionFuture`] stays with the caller and is
//! the single suspension point for the operation. Delivery is exactly-once
//! by construction: completing consumes the handle, and a handle dropped
//! without completing resolves the future to "dropped" so callers never
//! hang on a dead transport.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

struct Shared<T> {
    state: Mutex<State<T>>,
}

struct State<T> {
    outcome: Option<Option<T>>,
    waker: Option<Waker>,
}

impl<T> Shared<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(State {
                outcome: None,
                waker: None,
            }),
        }
    }

    fn complete(&self, value: Option<T>) {
        let waker = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                // Exactly-once: a second delivery is dropped on the floor.
                return;
            }
            state.outcome = Some(value);
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn poll(&self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let mut state = self.state.lock();
        if let Some(outcome) = state.outcome.take() {
            state.waker = None;
            Poll::Ready(outcome)
        } else {
            state.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

/// Transport-side end of a pending operation. Consumed by delivery.
pub struct ReplyHandle<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> ReplyHandle<T> {
    /// Deliver the completion. Consumes the handle; only the first delivery
    /// for an operation can ever happen.
    pub fn complete(mut self, value: T) {
        if let Some(shared) = self.shared.take() {
            shared.complete(Some(value));
        }
    }
}

impl<T> Drop for ReplyHandle<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.complete(None);
        }
    }
}

/// Caller-side end of a pending operation.
///
/// Resolves to `Some(value)` on delivery, or `None` if the transport dropped
/// the operation without completing it.
pub struct CompletionFuture<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Future for CompletionFuture<T> {
    type Output = Option<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.shared.poll(cx)
    }
}

impl<T> Unpin for CompletionFuture<T> {}

/// Create the two ends of a single-completion exchange.
pub fn pair<T>() -> (ReplyHandle<T>, CompletionFuture<T>) {
    let shared = Arc::new(Shared::new());
    (
        ReplyHandle {
            shared: Some(shared.clone()),
        },
        CompletionFuture { shared },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;
    use std::task::{RawWaker, RawWakerVTable};

    fn noop_waker() -> Waker {
        unsafe fn clone(_: *const ()) -> RawWaker {
            RawWaker::new(ptr::null(), &VTABLE)
        }
        unsafe fn wake(_: *const ()) {}
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, wake, wake, wake);
        let raw = RawWaker::new(ptr::null(), &VTABLE);
        unsafe { Waker::from_raw(raw) }
    }

    fn poll_once<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        Pin::new(future).poll(&mut cx)
    }

    #[test]
    fn resolves_after_delivery() {
        let (reply, mut future) = pair::<u64>();
        assert!(matches!(poll_once(&mut future), Poll::Pending));
        reply.complete(42);
        assert_eq!(poll_once(&mut future), Poll::Ready(Some(42)));
    }

    #[test]
    fn delivery_before_first_poll() {
        let (reply, mut future) = pair::<u64>();
        reply.complete(7);
        assert_eq!(poll_once(&mut future), Poll::Ready(Some(7)));
    }

    #[test]
    fn dropped_handle_resolves_to_none() {
        let (reply, mut future) = pair::<u64>();
        assert!(matches!(poll_once(&mut future), Poll::Pending));
        drop(reply);
        assert_eq!(poll_once(&mut future), Poll::Ready(None));
    }
}
