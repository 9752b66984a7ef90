//! Visible top-level window probe.
//!
//! Enumerates every top-level window known to the window manager and stops
//! at the first visible one owned by the target process. The result is a
//! point-in-time snapshot; windows created or destroyed during enumeration
//! may or may not be observed.

use crate::error::ProbeError;

/// Per-call accumulator handed to the enumeration callback. It lives on the
/// probing thread's stack and is never shared beyond the one `EnumWindows`
/// call that receives it.
#[cfg(target_os = "windows")]
struct SearchState {
    target_pid: u32,
    found: bool,
}

#[cfg(target_os = "windows")]
extern "system" fn enum_windows_callback(hwnd: usize, lparam: isize) -> i32 {
    use crate::core::win_api::{GetWindowThreadProcessId, IsWindowVisible};

    let state = unsafe { &mut *(lparam as *mut SearchState) };

    let mut window_pid: u32 = 0;
    unsafe { GetWindowThreadProcessId(hwnd, &mut window_pid) };

    if window_pid == state.target_pid && unsafe { IsWindowVisible(hwnd) } != 0 {
        state.found = true;
        return 0; // first match wins; stop enumerating
    }
    1
}

/// Does the process `pid` currently own any visible top-level window?
///
/// A completed enumeration with no match is only reported as `Ok(false)`
/// once the PID is confirmed to exist, so a dead process is not
/// indistinguishable from a hidden one. A live process the caller lacks
/// rights to open still reports `Ok(false)` — its windows were enumerable
/// either way.
#[cfg(target_os = "windows")]
pub fn has_visible_window(pid: u32) -> Result<bool, ProbeError> {
    use crate::core::win_api::{last_error, open_process_for_query, EnumWindows};

    let mut state = SearchState {
        target_pid: pid,
        found: false,
    };
    let completed =
        unsafe { EnumWindows(enum_windows_callback, &mut state as *mut SearchState as isize) };

    if state.found {
        return Ok(true);
    }
    // EnumWindows also returns FALSE when the callback stops it early, so a
    // zero return only signals failure when nothing was found.
    if completed == 0 {
        let code = last_error();
        tracing::warn!("EnumWindows failed for pid {pid} with code {code}");
        return Err(ProbeError::Enumeration { code });
    }

    match open_process_for_query(pid) {
        Ok(_process) => Ok(false),
        Err(ProbeError::AccessDenied { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(not(target_os = "windows"))]
pub fn has_visible_window(_pid: u32) -> Result<bool, ProbeError> {
    Err(ProbeError::Unsupported("window visibility probe"))
}
