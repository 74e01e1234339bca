//! Cross-platform memory operations
//!
//! Platform-agnostic abstractions for reading another process's memory,
//! with implementations for Windows (`ReadProcessMemory`) and Linux
//! (`process_vm_readv`).

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

mod deep_pointer;
pub mod process;

pub use deep_pointer::{DeepPointer, TypedValue, ValueKind};
pub use process::{enumerate, is_process_running, ProcessInfo};

#[cfg(target_os = "windows")]
pub use windows::WindowsMemoryReader;

#[cfg(target_os = "linux")]
pub use linux::LinuxMemoryReader;

use std::sync::Arc;

use crate::error::ReadError;

/// Platform-agnostic memory reading trait
///
/// Every read is fresh; implementations never cache. All typed reads are
/// little-endian, matching the x86 target process.
pub trait MemoryReader: Send + Sync {
    /// Read raw bytes from the target's address space
    fn read_bytes(&self, address: usize, size: usize) -> Result<Vec<u8>, ReadError>;

    /// Read a u8 value
    fn read_u8(&self, address: usize) -> Result<u8, ReadError> {
        self.read_bytes(address, 1).map(|b| b[0])
    }

    /// Read a u16 value
    fn read_u16(&self, address: usize) -> Result<u16, ReadError> {
        self.read_bytes(address, 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a u32 value
    fn read_u32(&self, address: usize) -> Result<u32, ReadError> {
        self.read_bytes(address, 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read an i32 value
    fn read_i32(&self, address: usize) -> Result<i32, ReadError> {
        self.read_bytes(address, 4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a u64 value
    fn read_u64(&self, address: usize) -> Result<u64, ReadError> {
        self.read_bytes(address, 8)
            .map(|b| u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    /// Read an i64 value
    fn read_i64(&self, address: usize) -> Result<i64, ReadError> {
        self.read_bytes(address, 8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    /// Read a f32 value
    fn read_f32(&self, address: usize) -> Result<f32, ReadError> {
        self.read_bytes(address, 4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a boolean (non-zero = true)
    fn read_bool(&self, address: usize) -> Result<bool, ReadError> {
        self.read_u8(address).map(|v| v != 0)
    }
}

/// Context for a connected process
///
/// Bundles the reader with the main module's identity so pointer chains can
/// resolve against it. The reader is shared via `Arc`; the context itself is
/// cheap to clone.
#[derive(Clone)]
pub struct ProcessContext {
    /// Memory reader for this process
    pub reader: Arc<dyn MemoryReader>,
    /// Name of the main module (e.g. "TESV.exe")
    pub module_name: String,
    /// Base address of the main module
    pub base_address: usize,
    /// In-memory image size of the main module
    pub module_size: usize,
    /// Process ID
    pub process_id: u32,
    /// Whether this is a 64-bit process (affects pointer width)
    pub is_64_bit: bool,
}

impl ProcessContext {
    /// Create a new process context
    pub fn new(
        reader: Arc<dyn MemoryReader>,
        module_name: impl Into<String>,
        base_address: usize,
        module_size: usize,
        process_id: u32,
        is_64_bit: bool,
    ) -> Self {
        Self {
            reader,
            module_name: module_name.into(),
            base_address,
            module_size,
            process_id,
            is_64_bit,
        }
    }

    /// Read a pointer-sized value, honoring the process's pointer width
    pub fn read_ptr(&self, address: usize) -> Result<i64, ReadError> {
        if self.is_64_bit {
            self.reader.read_i64(address)
        } else {
            self.reader.read_i32(address).map(|v| v as i64)
        }
    }
}
