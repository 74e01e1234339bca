//! Events emitted by the engine

use std::sync::Arc;

use crate::splits::SplitArea;

/// A detected gameplay transition
///
/// Every event carries the tick counter it was detected on as originating
/// context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Any load began; hosts typically pause their game timer
    LoadStarted { frame: u64 },
    /// The load ended; hosts resume the timer
    LoadFinished { frame: u64 },
    /// A full loading screen came up
    LoadScreenStarted { frame: u64 },
    /// The loading screen went away
    LoadScreenFinished { frame: u64 },
    /// The opening area finished loading; hosts reset their timer.
    /// Always immediately followed by `PlayerGainedControl` in the same
    /// tick; hosts rely on the reset-before-start order.
    FirstLevelLoading { frame: u64 },
    /// Control was handed to the player; hosts start their timer
    PlayerGainedControl { frame: u64 },
    /// An armed milestone fired for the first time this run
    Split { area: SplitArea, frame: u64 },
}

impl GameEvent {
    /// Tick counter at detection time
    pub fn frame(&self) -> u64 {
        match *self {
            GameEvent::LoadStarted { frame }
            | GameEvent::LoadFinished { frame }
            | GameEvent::LoadScreenStarted { frame }
            | GameEvent::LoadScreenFinished { frame }
            | GameEvent::FirstLevelLoading { frame }
            | GameEvent::PlayerGainedControl { frame }
            | GameEvent::Split { frame, .. } => frame,
        }
    }
}

/// Execution context events are delivered on
///
/// Hosts with thread-affine state (a UI thread, typically) supply an
/// implementation that enqueues onto that thread. Jobs posted from one
/// thread must run in posting order.
pub trait Executor: Send + Sync {
    fn post(&self, job: Box<dyn FnOnce() + Send>);
}

/// Runs jobs synchronously on the posting thread
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn post(&self, job: Box<dyn FnOnce() + Send>) {
        job();
    }
}

/// Callback type for engine events
pub type EventCallback = Arc<dyn Fn(&GameEvent) + Send + Sync>;

/// Subscriber list with ordered delivery
pub struct EventHandler {
    callbacks: Vec<EventCallback>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Add a subscriber for all events
    pub fn subscribe(&mut self, callback: EventCallback) {
        self.callbacks.push(callback);
    }

    /// Check if there are any listeners
    pub fn has_listeners(&self) -> bool {
        !self.callbacks.is_empty()
    }

    /// Deliver events in detection order through the executor
    ///
    /// With no subscribers this is a no-op.
    pub fn dispatch(&self, executor: &dyn Executor, events: &[GameEvent]) {
        if self.callbacks.is_empty() {
            return;
        }

        for &event in events {
            let callbacks = self.callbacks.clone();
            executor.post(Box::new(move || {
                for callback in &callbacks {
                    callback(&event);
                }
            }));
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
