//! Linux memory reader implementation

#![cfg(target_os = "linux")]

use super::MemoryReader;
use crate::error::ReadError;

/// Linux-specific memory reader using process_vm_readv
pub struct LinuxMemoryReader {
    pid: i32,
}

impl LinuxMemoryReader {
    /// Create a new reader for the given process ID
    pub fn new(pid: u32) -> Self {
        Self { pid: pid as i32 }
    }

    /// The target process ID
    pub fn pid(&self) -> i32 {
        self.pid
    }
}

impl MemoryReader for LinuxMemoryReader {
    fn read_bytes(&self, address: usize, size: usize) -> Result<Vec<u8>, ReadError> {
        let mut buffer = vec![0u8; size];

        let local_iov = libc::iovec {
            iov_base: buffer.as_mut_ptr() as *mut _,
            iov_len: size,
        };

        let remote_iov = libc::iovec {
            iov_base: address as *mut _,
            iov_len: size,
        };

        let result =
            unsafe { libc::process_vm_readv(self.pid, &local_iov, 1, &remote_iov, 1, 0) };

        if result == size as isize {
            Ok(buffer)
        } else if result < 0 {
            match std::io::Error::last_os_error().raw_os_error() {
                Some(libc::ESRCH) => Err(ReadError::ProcessExited),
                _ => Err(ReadError::InvalidAddress),
            }
        } else {
            // Short read: the tail of the range is unmapped
            Err(ReadError::InvalidAddress)
        }
    }
}
