//! Process enumeration and module information

/// Information about a running candidate process
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    /// Process ID
    pub pid: u32,
    /// Executable name as reported by the OS
    pub name: String,
    /// Base address of the main module
    pub base_address: usize,
    /// In-memory image size of the main module
    pub module_size: usize,
    /// Whether the process is 64-bit
    pub is_64_bit: bool,
}

/// Enumerate running processes whose executable name matches
///
/// The match is case-insensitive and ignores a trailing `.exe` on either
/// side. Candidates whose main module cannot be inspected yet (still
/// initializing, or gone between snapshot and inspection) are silently
/// dropped; the caller's retry backoff will pick them up next scan.
#[cfg(target_os = "windows")]
pub fn enumerate(process_name: &str) -> Vec<ProcessInfo> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
        TH32CS_SNAPPROCESS,
    };

    let mut found = Vec::new();

    unsafe {
        let snapshot = match CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) {
            Ok(s) => s,
            Err(_) => return found,
        };

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let name = String::from_utf16_lossy(
                    &entry.szExeFile[..entry
                        .szExeFile
                        .iter()
                        .position(|&c| c == 0)
                        .unwrap_or(entry.szExeFile.len())],
                );

                if names_match(&name, process_name) {
                    if let Some((base, size)) = main_module(entry.th32ProcessID, &name) {
                        found.push(ProcessInfo {
                            pid: entry.th32ProcessID,
                            name: name.clone(),
                            base_address: base,
                            module_size: size,
                            is_64_bit: check_is_64_bit(entry.th32ProcessID),
                        });
                    }
                }

                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }

        let _ = CloseHandle(snapshot);
    }

    found
}

/// Enumerate running processes whose executable name matches (Linux)
#[cfg(target_os = "linux")]
pub fn enumerate(process_name: &str) -> Vec<ProcessInfo> {
    use std::fs;
    use std::path::Path;

    let mut found = Vec::new();

    let entries = match fs::read_dir("/proc") {
        Ok(e) => e,
        Err(_) => return found,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let pid = match path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|s| s.parse::<u32>().ok())
        {
            Some(pid) => pid,
            None => continue,
        };

        let comm = fs::read_to_string(path.join("comm"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        // cmdline carries the full executable name where comm truncates
        let exe_name = fs::read_to_string(path.join("cmdline"))
            .ok()
            .and_then(|s| s.split('\0').next().map(|s| s.to_string()))
            .and_then(|s| {
                Path::new(&s)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
            })
            .unwrap_or_else(|| comm.clone());

        if names_match(&comm, process_name) || names_match(&exe_name, process_name) {
            if let Some((base, size)) = main_module_from_maps(pid) {
                found.push(ProcessInfo {
                    pid,
                    name: exe_name,
                    base_address: base,
                    module_size: size,
                    is_64_bit: std::mem::size_of::<usize>() == 8,
                });
            }
        }
    }

    found
}

fn names_match(a: &str, b: &str) -> bool {
    let strip = |s: &str| {
        s.to_lowercase()
            .trim_end_matches(".exe")
            .to_string()
    };
    strip(a) == strip(b)
}

/// Look up the main module's base address and image size
#[cfg(target_os = "windows")]
fn main_module(pid: u32, module_name: &str) -> Option<(usize, usize)> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, MODULEENTRY32W,
        TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32,
    };

    unsafe {
        let snapshot =
            CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid).ok()?;

        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        let mut result = None;
        if Module32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let name = String::from_utf16_lossy(
                    &entry.szModule[..entry
                        .szModule
                        .iter()
                        .position(|&c| c == 0)
                        .unwrap_or(entry.szModule.len())],
                );

                if names_match(&name, module_name) {
                    result = Some((entry.modBaseAddr as usize, entry.modBaseSize as usize));
                    break;
                }

                if Module32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }

        let _ = CloseHandle(snapshot);
        result
    }
}

/// Parse /proc/[pid]/maps for the main executable mapping
#[cfg(target_os = "linux")]
fn main_module_from_maps(pid: u32) -> Option<(usize, usize)> {
    use std::fs;

    let maps = fs::read_to_string(format!("/proc/{}/maps", pid)).ok()?;

    let mut base_address = None;
    let mut end_address = 0usize;

    for line in maps.lines() {
        if !line.contains("r-x") && !line.contains("r--") {
            continue;
        }

        let range = line.split_whitespace().next()?;
        let mut parts = range.split('-');
        let start = usize::from_str_radix(parts.next()?, 16).ok()?;
        let end = usize::from_str_radix(parts.next()?, 16).ok()?;

        if base_address.is_none() {
            base_address = Some(start);
        }
        end_address = end;
    }

    let base = base_address?;
    Some((base, end_address - base))
}

/// Check if a process is 64-bit (Windows)
#[cfg(target_os = "windows")]
fn check_is_64_bit(pid: u32) -> bool {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{
        IsWow64Process, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    unsafe {
        if let Ok(handle) = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            let mut is_wow64 = windows::Win32::Foundation::BOOL(0);
            if IsWow64Process(handle, &mut is_wow64).is_ok() {
                let _ = CloseHandle(handle);
                // WOW64 means a 32-bit process on 64-bit Windows
                return !is_wow64.as_bool();
            }
            let _ = CloseHandle(handle);
        }
    }

    std::mem::size_of::<usize>() == 8
}

/// Check if a process is still running by its PID
#[cfg(target_os = "windows")]
pub fn is_process_running(pid: u32) -> bool {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    // STILL_ACTIVE is 259 (STATUS_PENDING)
    const STILL_ACTIVE: u32 = 259;

    unsafe {
        if let Ok(handle) = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            let mut exit_code = 0u32;
            let alive = GetExitCodeProcess(handle, &mut exit_code).is_ok()
                && exit_code == STILL_ACTIVE;
            let _ = CloseHandle(handle);
            return alive;
        }
    }

    false
}

/// Check if a process is still running by its PID (Linux)
#[cfg(target_os = "linux")]
pub fn is_process_running(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_matching_is_lenient() {
        assert!(names_match("TESV.exe", "tesv.exe"));
        assert!(names_match("TESV", "TESV.exe"));
        assert!(names_match("tesv.exe", "TESV"));
        assert!(!names_match("SkyrimSE.exe", "TESV.exe"));
    }
}
