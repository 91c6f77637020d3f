//! Push-based streams for a single-threaded event loop.
//!
//! Observers are called synchronously on the emitting side. Nothing here is
//! `Send`: a stream lives in one context and crosses into another only
//! through the transport bridge.

mod push_channel;

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use push_channel::PushChannel;

/// Terminal error delivered to an observer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{0}")]
pub struct StreamError(pub String);

pub trait Observer<T> {
    fn next(&self, value: T);

    fn error(&self, _error: StreamError) {}

    fn complete(&self) {}
}

pub trait Observable<T> {
    /// Start delivering values to `observer` until the returned
    /// subscription is cancelled or the stream terminates.
    fn subscribe(&self, observer: Rc<dyn Observer<T>>) -> Subscription;
}

impl<T, O: Observable<T> + ?Sized> Observable<T> for Rc<O> {
    fn subscribe(&self, observer: Rc<dyn Observer<T>>) -> Subscription {
        (**self).subscribe(observer)
    }
}

/// Cancellation handle returned by [`Observable::subscribe`].
///
/// Teardown runs exactly once, on the first [`unsubscribe`](Self::unsubscribe).
/// Dropping a subscription does not cancel it.
#[derive(Default)]
pub struct Subscription {
    teardown: Vec<Box<dyn FnOnce()>>,
    closed: bool,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: vec![Box::new(teardown)],
            closed: false,
        }
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach another teardown step. Runs immediately if already closed.
    pub fn add(&mut self, teardown: impl FnOnce() + 'static) {
        if self.closed {
            teardown();
        } else {
            self.teardown.push(Box::new(teardown));
        }
    }

    pub fn unsubscribe(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for step in std::mem::take(&mut self.teardown) {
            step();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pending_teardown", &self.teardown.len())
            .field("closed", &self.closed)
            .finish()
    }
}

struct FnObserver<F, T> {
    next: F,
    _marker: PhantomData<fn(T)>,
}

impl<F: Fn(T), T> Observer<T> for FnObserver<F, T> {
    fn next(&self, value: T) {
        (self.next)(value);
    }
}

/// Observer that only cares about values.
pub fn observer_fn<T: 'static>(next: impl Fn(T) + 'static) -> Rc<dyn Observer<T>> {
    Rc::new(FnObserver {
        next,
        _marker: PhantomData,
    })
}

/// Cold stream replaying a fixed list, then completing, on every subscribe.
#[derive(Debug, Clone)]
pub struct IterStream<T> {
    items: Vec<T>,
}

pub fn from_iter<T: Clone>(items: impl IntoIterator<Item = T>) -> IterStream<T> {
    IterStream {
        items: items.into_iter().collect(),
    }
}

impl<T: Clone> Observable<T> for IterStream<T> {
    fn subscribe(&self, observer: Rc<dyn Observer<T>>) -> Subscription {
        for item in &self.items {
            observer.next(item.clone());
        }
        observer.complete();
        Subscription::empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[test]
    fn teardown_runs_once() {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let mut sub = Subscription::new(move || counter.set(counter.get() + 1));
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(runs.get(), 1);
        assert!(sub.is_closed());
    }

    #[test]
    fn add_after_close_runs_immediately() {
        let ran = Rc::new(Cell::new(false));
        let mut sub = Subscription::empty();
        sub.unsubscribe();
        let flag = ran.clone();
        sub.add(move || flag.set(true));
        assert!(ran.get());
    }

    #[test]
    fn iter_stream_replays_for_each_subscriber() {
        let stream = from_iter([1, 2, 3]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..2 {
            let sink = seen.clone();
            stream.subscribe(observer_fn(move |v| sink.borrow_mut().push(v)));
        }
        assert_eq!(*seen.borrow(), vec![1, 2, 3, 1, 2, 3]);
    }
}
