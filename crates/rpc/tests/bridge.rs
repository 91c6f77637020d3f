//! Push streams bridged between two endpoints on one event loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bpview_core::stream::from_iter;
use bpview_core::{Observable, Observer, PushChannel, StreamError, Subscription};
use bpview_rpc::{Endpoint, ObservableBridge, TransferHandler, port_pair};
use tokio::task::LocalSet;

/// Let both dispatch loops drain their queues.
async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

fn connected() -> (Endpoint, Endpoint) {
    let (a, b) = port_pair();
    let origin = Endpoint::new(a);
    let subscriber = Endpoint::new(b);
    origin.spawn();
    subscriber.spawn();
    (origin, subscriber)
}

#[derive(Default)]
struct Recorder {
    values: RefCell<Vec<u32>>,
    completed: Cell<bool>,
    errors: RefCell<Vec<StreamError>>,
    /// Cancel our own subscription once this value arrives.
    cancel_at: Option<u32>,
    subscription: RefCell<Option<Subscription>>,
}

impl Observer<u32> for Recorder {
    fn next(&self, value: u32) {
        self.values.borrow_mut().push(value);
        if self.cancel_at == Some(value) {
            let subscription = self.subscription.borrow_mut().take();
            if let Some(mut subscription) = subscription {
                subscription.unsubscribe();
            }
        }
    }

    fn error(&self, error: StreamError) {
        self.errors.borrow_mut().push(error);
    }

    fn complete(&self) {
        self.completed.set(true);
    }
}

fn bridge(
    stream: Rc<dyn Observable<u32>>,
    from: &Endpoint,
    to: &Endpoint,
) -> Rc<dyn Observable<u32>> {
    let handler = ObservableBridge::<u32>::new();
    let wire = handler.serialize(stream, from);
    assert!(handler.can_handle(&wire));
    handler.deserialize(&wire, to).unwrap()
}

#[tokio::test]
async fn delivers_in_order_then_completes() {
    LocalSet::new()
        .run_until(async {
            let (origin, subscriber) = connected();
            let remote = bridge(Rc::new(from_iter([1u32, 2, 3])), &origin, &subscriber);

            let recorder = Rc::new(Recorder::default());
            remote.subscribe(recorder.clone());
            settle().await;

            assert_eq!(*recorder.values.borrow(), vec![1, 2, 3]);
            assert!(recorder.completed.get());
            // Completion cancels the bridged subscription on both sides; only
            // the bridged observable itself stays exposed while we hold it.
            assert_eq!(origin.exposed_count(), 1);
            assert_eq!(subscriber.exposed_count(), 0);

            drop(remote);
            settle().await;
            assert_eq!(origin.exposed_count(), 0);
        })
        .await;
}

#[tokio::test]
async fn cancelling_mid_stream_drops_later_values() {
    LocalSet::new()
        .run_until(async {
            let (origin, subscriber) = connected();
            let remote = bridge(Rc::new(from_iter([1u32, 2, 3])), &origin, &subscriber);

            let recorder = Rc::new(Recorder {
                cancel_at: Some(2),
                ..Recorder::default()
            });
            let subscription = remote.subscribe(recorder.clone());
            *recorder.subscription.borrow_mut() = Some(subscription);
            settle().await;

            assert_eq!(*recorder.values.borrow(), vec![1, 2]);
            assert!(!recorder.completed.get());
            assert_eq!(origin.exposed_count(), 1);
            assert_eq!(subscriber.exposed_count(), 0);

            drop(remote);
            settle().await;
            assert_eq!(origin.exposed_count(), 0);
        })
        .await;
}

#[tokio::test]
async fn live_channel_fans_out_independently() {
    LocalSet::new()
        .run_until(async {
            let (origin, subscriber) = connected();
            let channel = PushChannel::replay_latest(10u32);
            let remote = bridge(Rc::new(channel.clone()), &origin, &subscriber);

            let first = Rc::new(Recorder::default());
            let second = Rc::new(Recorder::default());
            let mut first_sub = remote.subscribe(first.clone());
            let _second_sub = remote.subscribe(second.clone());
            settle().await;
            assert_eq!(channel.subscriber_count(), 2);

            channel.push(11);
            settle().await;
            first_sub.unsubscribe();
            // Pushed while the cancel is still in flight.
            channel.push(12);
            settle().await;

            assert_eq!(*first.values.borrow(), vec![10, 11]);
            assert_eq!(*second.values.borrow(), vec![10, 11, 12]);
            assert_eq!(channel.subscriber_count(), 1);

            channel.complete();
            settle().await;
            assert!(second.completed.get());
            assert!(!first.completed.get());
        })
        .await;
}

#[tokio::test]
async fn cancel_before_the_subscribe_reply_delivers_nothing() {
    LocalSet::new()
        .run_until(async {
            let (origin, subscriber) = connected();
            let channel = PushChannel::replay_latest(1u32);
            let remote = bridge(Rc::new(channel.clone()), &origin, &subscriber);

            let recorder = Rc::new(Recorder::default());
            let mut subscription = remote.subscribe(recorder.clone());
            subscription.unsubscribe();
            drop(remote);
            channel.push(2);
            settle().await;
            channel.push(3);
            settle().await;

            assert!(recorder.values.borrow().is_empty());
            assert!(!recorder.completed.get());
            assert_eq!(channel.subscriber_count(), 0);
            assert_eq!(origin.exposed_count(), 0);
            assert_eq!(subscriber.exposed_count(), 0);
        })
        .await;
}

#[tokio::test]
async fn repeated_bridging_leaves_no_objects_behind() {
    LocalSet::new()
        .run_until(async {
            let (origin, subscriber) = connected();
            let channel = PushChannel::replay_latest(0u32);

            for round in 1..=50u32 {
                let remote = bridge(Rc::new(channel.clone()), &origin, &subscriber);
                let recorder = Rc::new(Recorder::default());
                let mut subscription = remote.subscribe(recorder.clone());
                settle().await;
                channel.push(round);
                settle().await;
                assert_eq!(*recorder.values.borrow(), vec![round - 1, round]);

                subscription.unsubscribe();
                drop(remote);
                settle().await;
            }

            assert_eq!(channel.subscriber_count(), 0);
            assert_eq!(origin.exposed_count(), 0);
            assert_eq!(subscriber.exposed_count(), 0);
        })
        .await;
}

#[tokio::test]
async fn cancel_after_teardown_is_a_no_op() {
    LocalSet::new()
        .run_until(async {
            let (origin, subscriber) = connected();
            let channel = PushChannel::replay_latest(1u32);
            let remote = bridge(Rc::new(channel.clone()), &origin, &subscriber);

            let recorder = Rc::new(Recorder::default());
            let mut subscription = remote.subscribe(recorder.clone());
            settle().await;
            assert_eq!(*recorder.values.borrow(), vec![1]);

            origin.close();
            settle().await;
            assert!(subscriber.is_closed());
            // The origin dropped its side of the subscription on close.
            assert_eq!(channel.subscriber_count(), 0);

            subscription.unsubscribe();
            subscription.unsubscribe();
            settle().await;
            assert!(recorder.errors.borrow().is_empty());

            // Subscribing through a dead bridge never reaches the observer.
            let late = Rc::new(Recorder::default());
            remote.subscribe(late.clone());
            settle().await;
            assert!(late.values.borrow().is_empty());
            assert!(late.errors.borrow().is_empty());
        })
        .await;
}
