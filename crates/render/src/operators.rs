//! Stream operators the consumers stack between a snapshot channel and a
//! redraw.
//!
//! Each operator keeps its state per subscription, so two consumers of the
//! same operator chain never share a "previous value" or a timer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use bpview_core::{Observable, Observer, StreamError, Subscription};
use tokio::time::Instant;

// --- filter ---

struct Filter<T> {
    source: Rc<dyn Observable<T>>,
    predicate: Rc<dyn Fn(&T) -> bool>,
}

struct FilterObserver<T> {
    inner: Rc<dyn Observer<T>>,
    predicate: Rc<dyn Fn(&T) -> bool>,
}

impl<T: 'static> Observable<T> for Filter<T> {
    fn subscribe(&self, observer: Rc<dyn Observer<T>>) -> Subscription {
        self.source.subscribe(Rc::new(FilterObserver {
            inner: observer,
            predicate: self.predicate.clone(),
        }))
    }
}

impl<T> Observer<T> for FilterObserver<T> {
    fn next(&self, value: T) {
        if (self.predicate)(&value) {
            self.inner.next(value);
        }
    }

    fn error(&self, error: StreamError) {
        self.inner.error(error);
    }

    fn complete(&self) {
        self.inner.complete();
    }
}

/// Only values for which `predicate` holds.
pub fn filter<T: 'static>(
    source: Rc<dyn Observable<T>>,
    predicate: impl Fn(&T) -> bool + 'static,
) -> Rc<dyn Observable<T>> {
    Rc::new(Filter {
        source,
        predicate: Rc::new(predicate),
    })
}

// --- distinct_until_changed ---

struct Distinct<T> {
    source: Rc<dyn Observable<T>>,
}

struct DistinctObserver<T> {
    inner: Rc<dyn Observer<T>>,
    last: RefCell<Option<T>>,
}

impl<T: Clone + PartialEq + 'static> Observable<T> for Distinct<T> {
    fn subscribe(&self, observer: Rc<dyn Observer<T>>) -> Subscription {
        self.source.subscribe(Rc::new(DistinctObserver {
            inner: observer,
            last: RefCell::new(None),
        }))
    }
}

impl<T: Clone + PartialEq> Observer<T> for DistinctObserver<T> {
    fn next(&self, value: T) {
        {
            let mut last = self.last.borrow_mut();
            if last.as_ref() == Some(&value) {
                return;
            }
            *last = Some(value.clone());
        }
        self.inner.next(value);
    }

    fn error(&self, error: StreamError) {
        self.inner.error(error);
    }

    fn complete(&self) {
        self.inner.complete();
    }
}

/// Drop a value equal to the one delivered just before it.
pub fn distinct_until_changed<T: Clone + PartialEq + 'static>(
    source: Rc<dyn Observable<T>>,
) -> Rc<dyn Observable<T>> {
    Rc::new(Distinct { source })
}

// --- throttle_latest ---

struct Throttle<T> {
    source: Rc<dyn Observable<T>>,
    window: Duration,
}

struct ThrottleState<T> {
    inner: Rc<dyn Observer<T>>,
    window: Duration,
    pending: RefCell<Option<T>>,
    armed: Cell<bool>,
    closed: Cell<bool>,
}

struct ThrottleObserver<T> {
    state: Rc<ThrottleState<T>>,
}

impl<T: 'static> ThrottleState<T> {
    fn flush(&self) {
        self.armed.set(false);
        if self.closed.get() {
            return;
        }
        let value = self.pending.borrow_mut().take();
        if let Some(value) = value {
            self.inner.next(value);
        }
    }

    fn close(&self) {
        self.closed.set(true);
        self.pending.borrow_mut().take();
    }
}

impl<T: 'static> Observer<T> for ThrottleObserver<T> {
    fn next(&self, value: T) {
        let state = &self.state;
        if state.closed.get() {
            return;
        }
        *state.pending.borrow_mut() = Some(value);
        if state.armed.replace(true) {
            return;
        }
        let deadline = Instant::now() + state.window;
        let state = state.clone();
        tokio::task::spawn_local(async move {
            tokio::time::sleep_until(deadline).await;
            state.flush();
        });
    }

    fn error(&self, error: StreamError) {
        if !self.state.closed.get() {
            self.state.close();
            self.state.inner.error(error);
        }
    }

    fn complete(&self) {
        if self.state.closed.get() {
            return;
        }
        let value = self.state.pending.borrow_mut().take();
        self.state.closed.set(true);
        if let Some(value) = value {
            self.state.inner.next(value);
        }
        self.state.inner.complete();
    }
}

impl<T: 'static> Observable<T> for Throttle<T> {
    fn subscribe(&self, observer: Rc<dyn Observer<T>>) -> Subscription {
        let state = Rc::new(ThrottleState {
            inner: observer,
            window: self.window,
            pending: RefCell::new(None),
            armed: Cell::new(false),
            closed: Cell::new(false),
        });
        let mut subscription = self.source.subscribe(Rc::new(ThrottleObserver {
            state: state.clone(),
        }));
        subscription.add(move || state.close());
        subscription
    }
}

/// At most one value per `window`: the first value opens a window and the
/// latest value seen when it closes is delivered. Completion flushes a
/// pending value first.
///
/// Subscribers must live on a [`tokio::task::LocalSet`]; each window is a
/// local timer task.
pub fn throttle_latest<T: 'static>(
    source: Rc<dyn Observable<T>>,
    window: Duration,
) -> Rc<dyn Observable<T>> {
    Rc::new(Throttle { source, window })
}

#[cfg(test)]
mod tests {
    use bpview_core::PushChannel;
    use bpview_core::stream::{from_iter, observer_fn};
    use tokio::task::LocalSet;

    use super::*;

    fn collect<T: 'static>(stream: &Rc<dyn Observable<T>>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let sub = stream.subscribe(observer_fn(move |v| sink.borrow_mut().push(v)));
        (seen, sub)
    }

    #[test]
    fn filter_and_distinct_compose() {
        let source: Rc<dyn Observable<i32>> = Rc::new(from_iter([1, 1, 2, -3, 2, 2, 4]));
        let stream = distinct_until_changed(filter(source, |v| *v > 0));
        let (seen, _) = collect(&stream);
        assert_eq!(*seen.borrow(), vec![1, 2, 4]);
    }

    #[test]
    fn distinct_state_is_per_subscription() {
        let channel = PushChannel::<i32>::replay_latest(5);
        let stream = distinct_until_changed(Rc::new(channel.clone()) as Rc<dyn Observable<i32>>);
        let (a, _) = collect(&stream);
        let (b, _) = collect(&stream);
        channel.push(5);
        channel.push(6);
        assert_eq!(*a.borrow(), vec![5, 6]);
        assert_eq!(*b.borrow(), vec![5, 6]);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_delivers_latest_per_window() {
        LocalSet::new()
            .run_until(async {
                let channel = PushChannel::<u32>::multicast();
                let stream = throttle_latest(
                    Rc::new(channel.clone()) as Rc<dyn Observable<u32>>,
                    Duration::from_millis(10),
                );
                let (seen, _sub) = collect(&stream);

                for v in 0..5 {
                    channel.push(v);
                }
                assert!(seen.borrow().is_empty());
                tokio::time::sleep(Duration::from_millis(11)).await;
                assert_eq!(*seen.borrow(), vec![4]);

                channel.push(9);
                tokio::time::sleep(Duration::from_millis(11)).await;
                assert_eq!(*seen.borrow(), vec![4, 9]);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_flushes_on_complete_and_stops_on_cancel() {
        LocalSet::new()
            .run_until(async {
                let channel = PushChannel::<u32>::multicast();
                let source: Rc<dyn Observable<u32>> = Rc::new(channel.clone());
                let stream = throttle_latest(source, Duration::from_millis(10));

                let (cancelled, mut sub) = collect(&stream);
                let (completed, _keep) = collect(&stream);
                channel.push(1);
                sub.unsubscribe();
                channel.push(2);
                channel.complete();
                // The completed subscriber got the pending value at once.
                assert_eq!(*completed.borrow(), vec![2]);

                tokio::time::sleep(Duration::from_millis(20)).await;
                assert!(cancelled.borrow().is_empty());
                assert_eq!(*completed.borrow(), vec![2]);
            })
            .await;
    }
}
