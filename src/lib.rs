//! TESV Autosplitter
//!
//! A standalone autosplitter engine for Skyrim speedruns. It attaches to a
//! running `TESV.exe`, polls a fixed set of memory locations on a short
//! cadence, and turns raw flag edges into discrete timer events: load
//! start/end for load removal, the opening-sequence reset/start pair, and
//! once-per-run area and quest splits.
//!
//! The embedding host (the timer) supplies the configuration, a run-session
//! accessor, and an execution context for event delivery; the engine runs
//! one background thread that re-acquires the game on process restarts and
//! never crashes its host.

pub mod acquire;
pub mod config;
pub mod core;
pub mod error;
pub mod memory;
pub mod signals;
pub mod splits;

// Re-export commonly used types
pub use acquire::{GameProcess, LogNotifier, NotificationSink, ProcessAcquisition};
pub use config::SplitterConfig;
pub use core::{
    Autosplitter, AutosplitterBuilder, AutosplitterState, EventCallback, EventHandler, Executor,
    GameEvent, InlineExecutor, RunPhase, RunSession, SharedSession, StateTracker,
};
pub use error::{AutosplitterError, ReadError, Result};
pub use memory::{DeepPointer, MemoryReader, ProcessContext, TypedValue, ValueKind};
pub use signals::{SampleSet, SignalTable, TARGET_MODULE};
pub use splits::{SplitArea, SplitRule, SplitStateRegistry, Template, TriggerEdge, WorldGate};
