//! Core engine abstractions
//!
//! - `GameEvent` / `EventHandler` - transitions delivered to the host
//! - `RunSession` - read-only view of the host's run phase
//! - `StateTracker` - pure per-tick detection state machine
//! - `Autosplitter` - the runner owning the background poll thread

mod events;
mod runner;
mod session;
mod tracker;

pub use events::{EventCallback, EventHandler, Executor, GameEvent, InlineExecutor};
pub use runner::{Autosplitter, AutosplitterBuilder, AutosplitterState};
pub use session::{RunPhase, RunSession, SharedSession};
pub use tracker::StateTracker;
