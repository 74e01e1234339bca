//! Background polling runner
//!
//! Owns the poll thread: waits for a valid game process, samples the signal
//! table on a fixed cadence, feeds the tracker, and posts derived events to
//! the host. The outer loop is the last line of defense: a fault in a tick
//! is contained, logged, and retried after a backoff. Only cancellation
//! ends the thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::events::{EventCallback, EventHandler, Executor, GameEvent, InlineExecutor};
use super::session::RunSession;
use super::tracker::StateTracker;
use crate::acquire::{LogNotifier, NotificationSink, ProcessAcquisition};
use crate::config::SplitterConfig;
use crate::error::{AutosplitterError, Result};
use crate::signals::{SampleSet, SignalTable};
use crate::splits::{SplitArea, SplitStateRegistry};

/// Poll cadence while attached
const TICK_INTERVAL: Duration = Duration::from_millis(15);
/// Rescan backoff while waiting for the process
const ATTACH_RETRY: Duration = Duration::from_millis(250);
/// Backoff after a contained fault
const FAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Snapshot of the engine's externally visible state
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AutosplitterState {
    /// Whether the poll thread is running
    pub running: bool,
    /// Whether a validated game process is attached
    pub process_attached: bool,
    /// PID of the attached process
    pub process_id: Option<u32>,
    /// Milestones fired this run, in detection order
    pub splits_fired: Vec<SplitArea>,
}

struct Shared {
    running: AtomicBool,
    reset_requested: AtomicBool,
    config: Mutex<SplitterConfig>,
    events: Mutex<EventHandler>,
    state: Mutex<AutosplitterState>,
    session: Arc<dyn RunSession>,
    executor: Arc<dyn Executor>,
    notifier: Arc<dyn NotificationSink>,
}

/// The autosplitter engine
///
/// One background thread owns the process handle, the samples, and the
/// split registry; the host interacts through atomics, the config lock,
/// and events posted to its executor.
pub struct Autosplitter {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Autosplitter {
    /// Build an engine with explicit host collaborators
    pub fn builder(session: Arc<dyn RunSession>) -> AutosplitterBuilder {
        AutosplitterBuilder::new(session)
    }

    /// Engine with default config, inline delivery, and log warnings
    pub fn new(session: Arc<dyn RunSession>) -> Self {
        Self::builder(session).build()
    }

    /// Register a subscriber for all engine events
    pub fn on_event(&self, callback: EventCallback) {
        self.shared.events.lock().subscribe(callback);
    }

    /// Current configuration
    pub fn config(&self) -> SplitterConfig {
        self.shared.config.lock().clone()
    }

    /// Swap the configuration; takes effect on the next tick
    pub fn set_config(&self, config: SplitterConfig) {
        *self.shared.config.lock() = config;
    }

    /// Snapshot of the externally visible state
    pub fn state(&self) -> AutosplitterState {
        self.shared.state.lock().clone()
    }

    /// Whether the poll thread is running
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Spawn the poll thread
    ///
    /// Calling this while already running is a programmer error and fails
    /// fast with `AlreadyRunning`.
    pub fn start_monitoring(&self) -> Result<()> {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Err(AutosplitterError::AlreadyRunning);
        }

        self.shared.reset_requested.store(false, Ordering::SeqCst);
        {
            let mut state = self.shared.state.lock();
            *state = AutosplitterState {
                running: true,
                ..AutosplitterState::default()
            };
        }

        let spawned = thread::Builder::new().name("tesv-poll".into()).spawn({
            let shared = self.shared.clone();
            move || poll_loop(shared)
        });

        match spawned {
            Ok(handle) => {
                *self.thread.lock() = Some(handle);
                log::info!("monitoring started");
                Ok(())
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::SeqCst);
                self.shared.state.lock().running = false;
                Err(AutosplitterError::Spawn(err))
            }
        }
    }

    /// Stop monitoring, blocking until the poll thread has exited
    ///
    /// The wait is bounded: cancellation is checked at the outer loop, the
    /// inner loop, and after every sleep, and all sleeps are short.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }

        let mut state = self.shared.state.lock();
        state.running = false;
        state.process_attached = false;
        state.process_id = None;
        log::info!("monitoring stopped");
    }

    /// Request a split-state reset (run start/reset from the host)
    ///
    /// The request is funneled into the poll thread and applied before the
    /// next tick's detection, so it cannot race a fire in the same tick.
    pub fn reset_split_states(&self) {
        self.shared.reset_requested.store(true, Ordering::SeqCst);
        log::info!("split state reset requested");
    }
}

/// Configures an `Autosplitter` before construction
pub struct AutosplitterBuilder {
    session: Arc<dyn RunSession>,
    config: SplitterConfig,
    executor: Arc<dyn Executor>,
    notifier: Arc<dyn NotificationSink>,
}

impl AutosplitterBuilder {
    pub fn new(session: Arc<dyn RunSession>) -> Self {
        Self {
            session,
            config: SplitterConfig::default(),
            executor: Arc::new(InlineExecutor),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Initial configuration
    pub fn config(mut self, config: SplitterConfig) -> Self {
        self.config = config;
        self
    }

    /// Execution context for event delivery (the host's UI thread, say)
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// Sink for one-time user-facing warnings
    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn build(self) -> Autosplitter {
        Autosplitter {
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                reset_requested: AtomicBool::new(false),
                config: Mutex::new(self.config),
                events: Mutex::new(EventHandler::new()),
                state: Mutex::new(AutosplitterState::default()),
                session: self.session,
                executor: self.executor,
                notifier: self.notifier,
            }),
            thread: Mutex::new(None),
        }
    }
}

fn poll_loop(shared: Arc<Shared>) {
    log::info!("memory poll thread started");

    let mut acquisition = ProcessAcquisition::new(shared.notifier.clone());
    let mut registry = SplitStateRegistry::new();

    while shared.running.load(Ordering::SeqCst) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            watch_target(&shared, &mut acquisition, &mut registry)
        }));

        if let Err(fault) = outcome {
            log::error!("poll loop fault: {}; backing off", fault_message(&*fault));
            thread::sleep(FAULT_BACKOFF);
        }
    }

    log::info!("memory poll thread exited");
}

fn fault_message(fault: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = fault.downcast_ref::<&str>() {
        s
    } else if let Some(s) = fault.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Wait for a valid process, then poll it until it exits or we are stopped
fn watch_target(
    shared: &Shared,
    acquisition: &mut ProcessAcquisition,
    registry: &mut SplitStateRegistry,
) {
    let process = loop {
        if !shared.running.load(Ordering::SeqCst) {
            return;
        }
        if let Some(process) = acquisition.find_target() {
            break process;
        }
        thread::sleep(ATTACH_RETRY);
    };

    log::info!(
        "attached to {} (pid {}, image size {})",
        process.info().name,
        process.info().pid,
        process.info().module_size
    );
    {
        let mut state = shared.state.lock();
        state.process_attached = true;
        state.process_id = Some(process.info().pid);
    }

    let signals = SignalTable::tesv();
    let mut tracker = StateTracker::new();
    let mut prev_raw = SampleSet::default();
    let ctx = process.context().clone();

    while shared.running.load(Ordering::SeqCst) {
        if !process.is_alive() {
            log::info!("target process exited, rescanning");
            break;
        }

        // Host reset requests apply before this tick's detection
        if shared.reset_requested.swap(false, Ordering::SeqCst) {
            registry.reset();
            shared.state.lock().splits_fired.clear();
            log::info!("split states reset");
        }

        let sample = signals.sample(&ctx, &prev_raw);
        let phase = shared.session.phase();
        let config = shared.config.lock().clone();
        let events = tracker.advance(&sample, phase, &config, registry);

        if !events.is_empty() {
            {
                let mut state = shared.state.lock();
                for event in &events {
                    if let GameEvent::Split { area, .. } = event {
                        state.splits_fired.push(*area);
                    }
                }
            }
            shared.events.lock().dispatch(shared.executor.as_ref(), &events);
        }

        prev_raw = sample;
        thread::sleep(TICK_INTERVAL);
    }

    // Handle is dropped (and closed) here; acquisition takes over again
    let mut state = shared.state.lock();
    state.process_attached = false;
    state.process_id = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::SharedSession;

    #[test]
    fn start_twice_is_a_precondition_violation() {
        let engine = Autosplitter::new(Arc::new(SharedSession::new()));

        engine.start_monitoring().unwrap();
        assert!(matches!(
            engine.start_monitoring(),
            Err(AutosplitterError::AlreadyRunning)
        ));

        engine.stop();
        assert!(!engine.is_running());
        assert!(!engine.state().running);
    }

    #[test]
    fn stop_without_start_is_idempotent() {
        let engine = Autosplitter::new(Arc::new(SharedSession::new()));
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn stop_blocks_until_the_thread_exits_and_allows_restart() {
        let engine = Autosplitter::new(Arc::new(SharedSession::new()));

        engine.start_monitoring().unwrap();
        engine.stop();

        // fully stopped: a fresh start is accepted again
        engine.start_monitoring().unwrap();
        engine.stop();
    }

    #[test]
    fn config_swaps_take_effect() {
        let engine = Autosplitter::new(Arc::new(SharedSession::new()));
        assert!(engine.config().auto_start);

        let mut config = SplitterConfig::default();
        config.auto_start = false;
        engine.set_config(config);
        assert!(!engine.config().auto_start);
    }

    #[test]
    fn state_snapshot_serializes() {
        let engine = Autosplitter::new(Arc::new(SharedSession::new()));
        let json = serde_json::to_string(&engine.state()).unwrap();
        let parsed: AutosplitterState = serde_json::from_str(&json).unwrap();
        assert!(!parsed.running);
        assert!(parsed.splits_fired.is_empty());
    }
}
