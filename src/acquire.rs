//! Target process acquisition and validation
//!
//! Scans for the game executable, validates the candidate's main-module
//! image size against the known-good builds, and quarantines failures per
//! PID so a bad binary is warned about exactly once and never retried.

use std::sync::Arc;

use crate::error::AutosplitterError;
use crate::memory::{self, ProcessContext, ProcessInfo};
use crate::signals::TARGET_MODULE;

/// Main-module image sizes of supported Skyrim 1.9.32.0.8 builds
pub const KNOWN_IMAGE_SIZES: &[usize] = &[
    27_336_704, // Steam
    26_771_456, // no-CD
];

/// Channel for one-time user-facing warnings
pub trait NotificationSink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Default sink: route warnings to the log
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }
}

/// A validated, attached game process
pub struct GameProcess {
    info: ProcessInfo,
    ctx: ProcessContext,
}

impl GameProcess {
    #[cfg(target_os = "windows")]
    fn open(info: ProcessInfo) -> Option<Self> {
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
        };

        let handle = unsafe {
            OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, false, info.pid).ok()?
        };

        let reader = Arc::new(memory::WindowsMemoryReader::new(handle));
        let ctx = ProcessContext::new(
            reader,
            TARGET_MODULE,
            info.base_address,
            info.module_size,
            info.pid,
            info.is_64_bit,
        );
        Some(Self { info, ctx })
    }

    #[cfg(target_os = "linux")]
    fn open(info: ProcessInfo) -> Option<Self> {
        let reader = Arc::new(memory::LinuxMemoryReader::new(info.pid));
        let ctx = ProcessContext::new(
            reader,
            TARGET_MODULE,
            info.base_address,
            info.module_size,
            info.pid,
            info.is_64_bit,
        );
        Some(Self { info, ctx })
    }

    /// Process metadata captured at attach time
    pub fn info(&self) -> &ProcessInfo {
        &self.info
    }

    /// Memory context for pointer resolution
    pub fn context(&self) -> &ProcessContext {
        &self.ctx
    }

    /// Whether the process is still running
    pub fn is_alive(&self) -> bool {
        memory::is_process_running(self.info.pid)
    }
}

/// Validate a candidate's main-module image size
pub fn validate(info: &ProcessInfo) -> Result<(), AutosplitterError> {
    if KNOWN_IMAGE_SIZES.contains(&info.module_size) {
        Ok(())
    } else {
        Err(AutosplitterError::UnsupportedBinary(info.module_size))
    }
}

/// Finds and validates the target process
///
/// Owns the quarantine list; there is no process-wide state. Dropped and
/// recreated only when monitoring restarts, so a quarantined PID stays
/// quarantined across process re-scans within one monitoring session.
pub struct ProcessAcquisition {
    notifier: Arc<dyn NotificationSink>,
    quarantined: Vec<u32>,
}

impl ProcessAcquisition {
    pub fn new(notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            notifier,
            quarantined: Vec::new(),
        }
    }

    /// Scan for a valid target process
    ///
    /// Returns `None` when no valid candidate exists; the caller retries
    /// after a fixed backoff. Candidates failing validation are quarantined
    /// and the user is warned once per PID.
    pub fn find_target(&mut self) -> Option<GameProcess> {
        for info in memory::enumerate(TARGET_MODULE) {
            if self.admit(&info) {
                if let Some(process) = GameProcess::open(info) {
                    return Some(process);
                }
            }
        }
        None
    }

    /// Decide whether a candidate may be attached to
    ///
    /// Quarantines (and warns once about) candidates with an unexpected
    /// image size; a quarantined PID is never reconsidered.
    fn admit(&mut self, info: &ProcessInfo) -> bool {
        if self.quarantined.contains(&info.pid) {
            return false;
        }

        match validate(info) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("quarantining pid {}: {}", info.pid, err);
                self.quarantined.push(info.pid);
                self.notifier
                    .warn("Unexpected game version. Skyrim 1.9.32.0.8 is required.");
                false
            }
        }
    }

    /// Whether a PID has been quarantined
    pub fn is_quarantined(&self, pid: u32) -> bool {
        self.quarantined.contains(&pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(AtomicUsize);

    impl NotificationSink for CountingSink {
        fn warn(&self, _message: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn candidate(pid: u32, module_size: usize) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: "TESV.exe".to_string(),
            base_address: 0x400000,
            module_size,
            is_64_bit: false,
        }
    }

    #[test]
    fn known_sizes_validate() {
        assert!(validate(&candidate(1, 27_336_704)).is_ok());
        assert!(validate(&candidate(1, 26_771_456)).is_ok());
        assert!(matches!(
            validate(&candidate(1, 12345)),
            Err(AutosplitterError::UnsupportedBinary(12345))
        ));
    }

    #[test]
    fn bad_candidate_is_quarantined_with_single_warning() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let mut acquisition = ProcessAcquisition::new(sink.clone());

        assert!(!acquisition.admit(&candidate(100, 12345)));
        assert!(acquisition.is_quarantined(100));
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);

        // never reconsidered, never re-warned
        assert!(!acquisition.admit(&candidate(100, 12345)));
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quarantine_is_per_pid() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let mut acquisition = ProcessAcquisition::new(sink);

        assert!(!acquisition.admit(&candidate(100, 12345)));
        // a fresh PID with a valid image still gets through
        assert!(acquisition.admit(&candidate(101, 27_336_704)));
        assert!(!acquisition.is_quarantined(101));
    }
}
