//! C ABI boundary consumed by the embedding application.
//!
//! This surface keeps the legacy foreign-call contract: a nullable icon
//! struct with a paired free, `0` for an unknown integrity level, and
//! `false` for a failed visibility probe. Failures are logged through
//! `tracing` before being collapsed, so the conflation stays observable.
//! The typed Rust API in [`crate::core`] is the non-conflating surface.

use std::ffi::{c_char, CStr};
use std::ptr;

use crate::core::icon_extractor::{self, BYTES_PER_PIXEL};
use crate::core::{integrity, window_visibility};

/// Icon pixels handed across the C boundary.
///
/// `pixels` points at exactly `width * height * 4` bytes of RGBA data owned
/// by the caller. The struct and its buffer must be reclaimed exactly once
/// via [`procguard_icon_free`].
#[repr(C)]
pub struct ProcGuardIconData {
    pub width: u32,
    pub height: u32,
    pub pixels: *mut u8,
}

/// Extract the icon of the executable at `path` (NUL-terminated UTF-8).
///
/// Returns null on any failure. A non-null result transfers ownership of
/// the struct and its pixel buffer to the caller.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn procguard_extract_icon(path: *const c_char) -> *mut ProcGuardIconData {
    if path.is_null() {
        return ptr::null_mut();
    }
    let path = match CStr::from_ptr(path).to_str() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Icon path is not valid UTF-8: {e}");
            return ptr::null_mut();
        }
    };

    match icon_extractor::extract_icon(path) {
        Ok(image) => {
            let (width, height, pixels) = image.into_parts();
            let pixels = Box::into_raw(pixels.into_boxed_slice()) as *mut u8;
            Box::into_raw(Box::new(ProcGuardIconData {
                width,
                height,
                pixels,
            }))
        }
        Err(e) => {
            tracing::trace!("Icon extraction failed for {path}: {e}");
            ptr::null_mut()
        }
    }
}

/// Reclaim an icon returned by [`procguard_extract_icon`]. Null-tolerant;
/// must be called at most once per result.
///
/// # Safety
/// `data` must be null or a pointer previously returned by
/// [`procguard_extract_icon`] that has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn procguard_icon_free(data: *mut ProcGuardIconData) {
    if data.is_null() {
        return;
    }
    let data = Box::from_raw(data);
    if !data.pixels.is_null() {
        let len = data.width as usize * data.height as usize * BYTES_PER_PIXEL;
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(data.pixels, len)));
    }
}

/// Mandatory integrity level of process `pid`; `0` means unknown or
/// unavailable (no such process, access denied, or query failure).
#[no_mangle]
pub extern "C" fn procguard_process_integrity_level(pid: u32) -> u32 {
    match integrity::process_integrity_level(pid) {
        Ok(level) => level.raw,
        Err(e) => {
            tracing::trace!("Integrity probe failed for pid {pid}: {e}");
            0
        }
    }
}

/// Whether process `pid` owns a visible top-level window; `false` on any
/// failure, including a nonexistent PID.
#[no_mangle]
pub extern "C" fn procguard_has_visible_window(pid: u32) -> bool {
    match window_visibility::has_visible_window(pid) {
        Ok(visible) => visible,
        Err(e) => {
            tracing::trace!("Window visibility probe failed for pid {pid}: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_extract_icon_null_path_yields_null() {
        let result = unsafe { procguard_extract_icon(ptr::null()) };
        assert!(result.is_null());
    }

    #[test]
    fn test_extract_icon_invalid_utf8_yields_null() {
        let bogus = CString::new([0xFFu8, 0xFE].as_slice()).unwrap();
        let result = unsafe { procguard_extract_icon(bogus.as_ptr()) };
        assert!(result.is_null());
    }

    #[test]
    fn test_extract_icon_missing_file_yields_null() {
        let path = CString::new("Z:\\no\\such\\file.exe").unwrap();
        let result = unsafe { procguard_extract_icon(path.as_ptr()) };
        assert!(result.is_null());
    }

    #[test]
    fn test_icon_free_tolerates_null() {
        unsafe { procguard_icon_free(ptr::null_mut()) };
    }

    #[test]
    fn test_integrity_level_collapses_failure_to_zero() {
        assert_eq!(procguard_process_integrity_level(u32::MAX), 0);
    }

    #[test]
    fn test_visibility_collapses_failure_to_false() {
        assert!(!procguard_has_visible_window(u32::MAX));
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_extract_icon_round_trip_through_free() {
        let path = CString::new("C:\\Windows\\explorer.exe").unwrap();
        let data = unsafe { procguard_extract_icon(path.as_ptr()) };
        assert!(!data.is_null());
        unsafe {
            assert!((*data).width > 0);
            assert!(!(*data).pixels.is_null());
            procguard_icon_free(data);
        }
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_integrity_level_nonzero_for_current_process() {
        assert!(procguard_process_integrity_level(std::process::id()) > 0);
    }
}
