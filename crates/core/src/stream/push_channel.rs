use std::cell::RefCell;
use std::rc::Rc;

use super::{Observable, Observer, Subscription};

struct ChannelState<T> {
    latest: Option<T>,
    replay: bool,
    completed: bool,
    observers: Vec<(u64, Rc<dyn Observer<T>>)>,
    next_id: u64,
}

/// Multicast stream. Every pushed value goes to every current subscriber.
///
/// In replay mode a new subscriber first receives the latest value. Cloning
/// yields another handle to the same channel.
pub struct PushChannel<T> {
    state: Rc<RefCell<ChannelState<T>>>,
}

impl<T: Clone + 'static> PushChannel<T> {
    /// Replay-latest channel seeded with `initial`.
    pub fn replay_latest(initial: T) -> Self {
        Self::with_state(Some(initial), true)
    }

    /// Plain multicast channel; late subscribers only see later values.
    pub fn multicast() -> Self {
        Self::with_state(None, false)
    }

    fn with_state(latest: Option<T>, replay: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(ChannelState {
                latest,
                replay,
                completed: false,
                observers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn latest(&self) -> Option<T> {
        self.state.borrow().latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    pub fn push(&self, value: T) {
        let observers = {
            let mut state = self.state.borrow_mut();
            if state.completed {
                return;
            }
            if state.replay {
                state.latest = Some(value.clone());
            }
            state.observers.clone()
        };
        for (id, observer) in observers {
            // An observer may cancel another while this value is in flight.
            if self.is_subscribed(id) {
                observer.next(value.clone());
            }
        }
    }

    /// Complete every subscriber and refuse further values.
    pub fn complete(&self) {
        let observers = {
            let mut state = self.state.borrow_mut();
            if state.completed {
                return;
            }
            state.completed = true;
            std::mem::take(&mut state.observers)
        };
        for (_, observer) in observers {
            observer.complete();
        }
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.state
            .borrow()
            .observers
            .iter()
            .any(|(observer_id, _)| *observer_id == id)
    }
}

impl<T: Clone + 'static> Observable<T> for PushChannel<T> {
    fn subscribe(&self, observer: Rc<dyn Observer<T>>) -> Subscription {
        let (id, replay) = {
            let mut state = self.state.borrow_mut();
            if state.completed {
                drop(state);
                observer.complete();
                return Subscription::empty();
            }
            let id = state.next_id;
            state.next_id += 1;
            state.observers.push((id, observer.clone()));
            (id, state.latest.clone())
        };
        if let Some(value) = replay {
            observer.next(value);
        }
        let weak = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state
                    .borrow_mut()
                    .observers
                    .retain(|(observer_id, _)| *observer_id != id);
            }
        })
    }
}

impl<T> Clone for PushChannel<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}
