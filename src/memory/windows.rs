//! Windows memory reader implementation

#![cfg(target_os = "windows")]

use super::MemoryReader;
use crate::error::ReadError;

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Threading::GetExitCodeProcess;

// STILL_ACTIVE is 259 (STATUS_PENDING)
const STILL_ACTIVE: u32 = 259;

/// Windows-specific memory reader using ReadProcessMemory
///
/// Owns the process handle; it is closed when the reader is dropped.
pub struct WindowsMemoryReader {
    handle: HANDLE,
}

impl WindowsMemoryReader {
    /// Take ownership of an open process handle
    pub fn new(handle: HANDLE) -> Self {
        Self { handle }
    }

    fn process_exited(&self) -> bool {
        unsafe {
            let mut exit_code = 0u32;
            GetExitCodeProcess(self.handle, &mut exit_code).is_ok() && exit_code != STILL_ACTIVE
        }
    }
}

impl MemoryReader for WindowsMemoryReader {
    fn read_bytes(&self, address: usize, size: usize) -> Result<Vec<u8>, ReadError> {
        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0;

        let result = unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const _,
                buffer.as_mut_ptr() as *mut _,
                size,
                Some(&mut bytes_read),
            )
        };

        if result.is_ok() && bytes_read == size {
            Ok(buffer)
        } else if self.process_exited() {
            Err(ReadError::ProcessExited)
        } else {
            Err(ReadError::InvalidAddress)
        }
    }
}

impl Drop for WindowsMemoryReader {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

// The handle is only ever used for read-only queries, which the kernel
// serializes; the raw HANDLE just isn't marked Send/Sync by the bindings.
unsafe impl Send for WindowsMemoryReader {}
unsafe impl Sync for WindowsMemoryReader {}
