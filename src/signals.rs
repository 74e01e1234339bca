//! The fixed TESV signal table and per-tick samples
//!
//! Addresses target the supported 1.9.32.0.8 binary; anything else is
//! rejected by process validation before this table is ever read.

use crate::memory::{DeepPointer, ProcessContext, TypedValue, ValueKind};

/// Executable name of the supported game binary
pub const TARGET_MODULE: &str = "TESV.exe";

/// All signals read in one tick
///
/// Overwritten every tick and discarded on process loss. `Default` doubles
/// as the attach-time "previous" sample: all flags low, cell (0, 0).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleSet {
    /// Any load in progress (misses the Helgen intro loads)
    pub is_loading: bool,
    /// A full loading screen is up
    pub is_loading_screen: bool,
    /// Post-load fade-out; drops back low once control is handed over
    pub is_in_fade_out: bool,
    /// Player is in the Tamriel world space
    pub is_in_tamriel: bool,
    /// X world position (cell)
    pub world_x: i32,
    /// Y world position (cell)
    pub world_y: i32,
    /// Set when the last blow lands on Alduin
    pub alduin_defeated: bool,
    /// Player has full control
    pub player_has_control: bool,
}

/// The fixed table of named memory locations
///
/// Built once at engine construction, immutable thereafter.
pub struct SignalTable {
    is_loading: DeepPointer,
    is_loading_screen: DeepPointer,
    is_in_fade_out: DeepPointer,
    is_in_tamriel: DeepPointer,
    world_x: DeepPointer,
    world_y: DeepPointer,
    alduin_defeated: DeepPointer,
    player_has_control: DeepPointer,
}

impl SignalTable {
    /// The signal table for Skyrim 1.9.32.0.8
    pub fn tesv() -> Self {
        Self {
            is_loading: DeepPointer::new(TARGET_MODULE, &[0x17337CC], ValueKind::Bool),
            is_loading_screen: DeepPointer::new(TARGET_MODULE, &[0xEE3561], ValueKind::Bool),
            is_in_fade_out: DeepPointer::new(TARGET_MODULE, &[0x172EE2E], ValueKind::Bool),
            is_in_tamriel: DeepPointer::new(TARGET_MODULE, &[0x173815C], ValueKind::Bool),
            world_x: DeepPointer::new(TARGET_MODULE, &[0x172E864, 0x64], ValueKind::I32),
            world_y: DeepPointer::new(TARGET_MODULE, &[0x172E864, 0x68], ValueKind::I32),
            alduin_defeated: DeepPointer::new(TARGET_MODULE, &[0x1711608], ValueKind::Bool),
            player_has_control: DeepPointer::new(TARGET_MODULE, &[0x74814710], ValueKind::Bool),
        }
    }

    /// Read every signal once
    ///
    /// A failed individual read keeps the previous tick's value for that
    /// signal; the tick is never aborted. The reads are staggered, which the
    /// detection logic tolerates (single-tick skew at worst).
    pub fn sample(&self, ctx: &ProcessContext, prev: &SampleSet) -> SampleSet {
        SampleSet {
            is_loading: bool_or(&self.is_loading, ctx, prev.is_loading),
            is_loading_screen: bool_or(&self.is_loading_screen, ctx, prev.is_loading_screen),
            is_in_fade_out: bool_or(&self.is_in_fade_out, ctx, prev.is_in_fade_out),
            is_in_tamriel: bool_or(&self.is_in_tamriel, ctx, prev.is_in_tamriel),
            world_x: i32_or(&self.world_x, ctx, prev.world_x),
            world_y: i32_or(&self.world_y, ctx, prev.world_y),
            alduin_defeated: bool_or(&self.alduin_defeated, ctx, prev.alduin_defeated),
            player_has_control: bool_or(&self.player_has_control, ctx, prev.player_has_control),
        }
    }
}

fn bool_or(ptr: &DeepPointer, ctx: &ProcessContext, stale: bool) -> bool {
    match ptr.read(ctx) {
        Ok(TypedValue::Bool(v)) => v,
        _ => stale,
    }
}

fn i32_or(ptr: &DeepPointer, ctx: &ProcessContext, stale: i32) -> i32 {
    match ptr.read(ctx) {
        Ok(TypedValue::I32(v)) => v,
        _ => stale,
    }
}
