//! OS signal providers for the daemon.
//!
//! Every query is best-effort: an OS error, access-denied condition, or
//! unsupported platform yields empty results, never an error that aborts the
//! pipeline. Transient failure is just "no signal this cycle".

use beacon_core::fusion::SignalSource;
use sysinfo::System;

pub struct OsSignals;

impl OsSignals {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OsSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for OsSignals {
    fn foreground_window(&self) -> (String, String) {
        #[cfg(windows)]
        {
            win32::foreground_window()
        }
        #[cfg(not(windows))]
        {
            (String::new(), String::new())
        }
    }

    fn is_process_running(&self, name: &str) -> bool {
        let mut sys = System::new();
        sys.refresh_processes();
        sys.processes()
            .values()
            .any(|process| process.name().eq_ignore_ascii_case(name))
    }

    fn window_title_for_process(&self, name: &str) -> String {
        #[cfg(windows)]
        {
            let pids = pids_for_process(name);
            if pids.is_empty() {
                return String::new();
            }
            win32::first_window_title(&pids)
        }
        #[cfg(not(windows))]
        {
            let _ = name;
            String::new()
        }
    }
}

#[cfg(windows)]
fn pids_for_process(name: &str) -> Vec<u32> {
    let mut sys = System::new();
    sys.refresh_processes();
    sys.processes()
        .iter()
        .filter(|(_, process)| process.name().eq_ignore_ascii_case(name))
        .map(|(pid, _)| pid.as_u32())
        .collect()
}

#[cfg(windows)]
mod win32 {
    use windows::core::PWSTR;
    use windows::Win32::Foundation::{CloseHandle, BOOL, FALSE, HWND, LPARAM, TRUE};
    use windows::Win32::System::Threading::{
        OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_FORMAT,
        PROCESS_QUERY_LIMITED_INFORMATION,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetForegroundWindow, GetWindowTextW, GetWindowThreadProcessId,
        IsWindowVisible,
    };

    // Titles this short are window-chrome artifacts, not content.
    const MIN_TITLE_CHARS: usize = 3;

    pub fn foreground_window() -> (String, String) {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0.is_null() {
                return (String::new(), String::new());
            }
            let title = window_text(hwnd);
            let mut pid = 0u32;
            GetWindowThreadProcessId(hwnd, Some(&mut pid));
            (title, exe_name(pid))
        }
    }

    struct TitleSearch<'a> {
        pids: &'a [u32],
        title: Option<String>,
    }

    /// First visible window title owned by any of the given pids.
    pub fn first_window_title(pids: &[u32]) -> String {
        let mut search = TitleSearch { pids, title: None };
        unsafe {
            let _ = EnumWindows(
                Some(enum_callback),
                LPARAM(&mut search as *mut TitleSearch as isize),
            );
        }
        search.title.unwrap_or_default()
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let search = &mut *(lparam.0 as *mut TitleSearch);
        let mut pid = 0u32;
        GetWindowThreadProcessId(hwnd, Some(&mut pid));
        if !search.pids.contains(&pid) || !IsWindowVisible(hwnd).as_bool() {
            return TRUE;
        }
        let title = window_text(hwnd);
        if title.chars().count() > MIN_TITLE_CHARS {
            search.title = Some(title);
            return FALSE; // stop enumeration
        }
        TRUE
    }

    unsafe fn window_text(hwnd: HWND) -> String {
        let mut buf = [0u16; 512];
        let len = GetWindowTextW(hwnd, &mut buf);
        String::from_utf16_lossy(&buf[..len as usize])
    }

    unsafe fn exe_name(pid: u32) -> String {
        if pid == 0 {
            return String::new();
        }
        let handle = match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid) {
            Ok(handle) => handle,
            Err(_) => return String::new(),
        };
        let mut buf = [0u16; 260];
        let mut len = buf.len() as u32;
        let ok = QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_FORMAT(0),
            PWSTR(buf.as_mut_ptr()),
            &mut len,
        );
        let _ = CloseHandle(handle);
        if ok.is_ok() {
            let path = String::from_utf16_lossy(&buf[..len as usize]);
            path.rsplit(['\\', '/'])
                .next()
                .unwrap_or_default()
                .to_string()
        } else {
            String::new()
        }
    }
}
