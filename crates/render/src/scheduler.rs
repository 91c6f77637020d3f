use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// Identifies one registered frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameKey(u64);

#[derive(Default)]
struct SchedulerState {
    callbacks: HashMap<FrameKey, Rc<dyn Fn()>>,
    queued: Vec<FrameKey>,
    next_key: u64,
    frames: u64,
}

/// Defers redraws to the next frame and coalesces them per surface.
///
/// However many times a surface requests a frame between two ticks, its
/// callback runs once on the next tick.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, callback: impl Fn() + 'static) -> FrameKey {
        let mut state = self.state.borrow_mut();
        let key = FrameKey(state.next_key);
        state.next_key += 1;
        state.callbacks.insert(key, Rc::new(callback));
        key
    }

    pub fn unregister(&self, key: FrameKey) {
        let mut state = self.state.borrow_mut();
        state.callbacks.remove(&key);
        state.queued.retain(|queued| *queued != key);
    }

    /// Ask for `key`'s callback on the next tick. Returns `false` when it
    /// was already queued or is not registered.
    pub fn request(&self, key: FrameKey) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.callbacks.contains_key(&key) || state.queued.contains(&key) {
            return false;
        }
        state.queued.push(key);
        true
    }

    pub fn queued(&self) -> usize {
        self.state.borrow().queued.len()
    }

    /// Ticks that ran at least one callback.
    pub fn frames(&self) -> u64 {
        self.state.borrow().frames
    }

    /// Run every queued callback once. Requests made by those callbacks wait
    /// for the following tick.
    pub fn tick(&self) -> usize {
        let callbacks: Vec<Rc<dyn Fn()>> = {
            let mut state = self.state.borrow_mut();
            let queued = std::mem::take(&mut state.queued);
            let callbacks: Vec<_> = queued
                .iter()
                .filter_map(|key| state.callbacks.get(key).cloned())
                .collect();
            if !callbacks.is_empty() {
                state.frames += 1;
            }
            callbacks
        };
        for callback in &callbacks {
            callback();
        }
        if !callbacks.is_empty() {
            trace!(surfaces = callbacks.len(), "frame");
        }
        callbacks.len()
    }

    /// Tick every `interval` on the current `LocalSet` until aborted.
    pub fn spawn(&self, interval: Duration) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                scheduler.tick();
            }
        })
    }
}
