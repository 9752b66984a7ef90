//! Windows FFI shared by the probes.
//!
//! Hand-rolled bindings for `kernel32`, `user32`, `gdi32`, `advapi32`, and
//! `shell32`, plus RAII guards so every acquired handle is released on every
//! exit path, including early-return failure branches.

use crate::error::ProbeError;

pub const PROCESS_QUERY_LIMITED_INFORMATION: u32 = 0x1000;
pub const TOKEN_QUERY: u32 = 0x0008;
/// `TOKEN_INFORMATION_CLASS::TokenIntegrityLevel`.
pub const TOKEN_INTEGRITY_LEVEL: u32 = 25;

pub const ERROR_ACCESS_DENIED: u32 = 5;
pub const ERROR_INVALID_PARAMETER: u32 = 87;

pub const SM_CXICON: i32 = 11;
pub const SM_CYICON: i32 = 12;
pub const BI_RGB: u32 = 0;
pub const DIB_RGB_COLORS: u32 = 0;

#[repr(C)]
pub struct IconInfo {
    pub f_icon: i32,
    pub x_hotspot: u32,
    pub y_hotspot: u32,
    pub hbm_mask: usize,
    pub hbm_color: usize,
}

#[repr(C)]
pub struct BitmapInfoHeader {
    pub bi_size: u32,
    pub bi_width: i32,
    pub bi_height: i32,
    pub bi_planes: u16,
    pub bi_bit_count: u16,
    pub bi_compression: u32,
    pub bi_size_image: u32,
    pub bi_x_pels_per_meter: i32,
    pub bi_y_pels_per_meter: i32,
    pub bi_clr_used: u32,
    pub bi_clr_important: u32,
}

#[repr(C)]
pub struct BitmapInfo {
    pub bmi_header: BitmapInfoHeader,
    pub bmi_colors: [u32; 1],
}

#[repr(C)]
pub struct SidAndAttributes {
    pub sid: *mut std::ffi::c_void,
    pub attributes: u32,
}

/// Leading layout of the `TokenIntegrityLevel` query result; the SID data
/// itself trails the structure inside the same buffer.
#[repr(C)]
pub struct TokenMandatoryLabel {
    pub label: SidAndAttributes,
}

#[link(name = "kernel32")]
extern "system" {
    pub fn OpenProcess(desired_access: u32, inherit_handle: i32, pid: u32) -> usize;
    pub fn CloseHandle(handle: usize) -> i32;
    pub fn GetLastError() -> u32;
}

#[link(name = "shell32")]
extern "system" {
    pub fn ExtractIconW(instance: usize, exe_file_name: *const u16, icon_index: u32) -> usize;
}

#[link(name = "user32")]
extern "system" {
    pub fn DestroyIcon(icon: usize) -> i32;
    pub fn GetIconInfo(icon: usize, icon_info: *mut IconInfo) -> i32;
    pub fn GetSystemMetrics(index: i32) -> i32;
    pub fn GetDC(hwnd: usize) -> usize;
    pub fn ReleaseDC(hwnd: usize, hdc: usize) -> i32;
    pub fn EnumWindows(callback: extern "system" fn(usize, isize) -> i32, lparam: isize) -> i32;
    pub fn GetWindowThreadProcessId(hwnd: usize, pid: *mut u32) -> u32;
    pub fn IsWindowVisible(hwnd: usize) -> i32;
}

#[link(name = "gdi32")]
extern "system" {
    pub fn CreateCompatibleDC(hdc: usize) -> usize;
    pub fn DeleteDC(hdc: usize) -> i32;
    pub fn DeleteObject(object: usize) -> i32;
    pub fn GetDIBits(
        hdc: usize,
        hbm: usize,
        start: u32,
        lines: u32,
        bits: *mut u8,
        bmi: *mut BitmapInfo,
        usage: u32,
    ) -> i32;
}

#[link(name = "advapi32")]
extern "system" {
    pub fn OpenProcessToken(process: usize, desired_access: u32, token: *mut usize) -> i32;
    pub fn GetTokenInformation(
        token: usize,
        info_class: u32,
        info: *mut u8,
        info_len: u32,
        return_len: *mut u32,
    ) -> i32;
    pub fn GetSidSubAuthorityCount(sid: *mut std::ffi::c_void) -> *mut u8;
    pub fn GetSidSubAuthority(sid: *mut std::ffi::c_void, index: u32) -> *mut u32;
}

pub fn last_error() -> u32 {
    unsafe { GetLastError() }
}

// ---- RAII guards: release happens on drop, so no failure branch can skip it ----

/// Kernel object handle, closed on drop.
pub struct HandleGuard(pub usize);

impl HandleGuard {
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        if self.0 != 0 {
            unsafe { CloseHandle(self.0) };
        }
    }
}

/// Icon handle, destroyed on drop.
pub struct IconGuard(pub usize);

impl IconGuard {
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl Drop for IconGuard {
    fn drop(&mut self) {
        if self.0 != 0 {
            unsafe { DestroyIcon(self.0) };
        }
    }
}

/// GDI object (bitmap) handle, deleted on drop. Tolerates a null handle so
/// a mask-only icon's missing color bitmap needs no special casing.
pub struct GdiObjectGuard(pub usize);

impl GdiObjectGuard {
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl Drop for GdiObjectGuard {
    fn drop(&mut self) {
        if self.0 != 0 {
            unsafe { DeleteObject(self.0) };
        }
    }
}

/// Memory device context from `CreateCompatibleDC`, deleted on drop.
pub struct MemDcGuard(pub usize);

impl MemDcGuard {
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl Drop for MemDcGuard {
    fn drop(&mut self) {
        if self.0 != 0 {
            unsafe { DeleteDC(self.0) };
        }
    }
}

/// Screen device context from `GetDC(NULL)`, released on drop.
pub struct ScreenDcGuard(pub usize);

impl ScreenDcGuard {
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl Drop for ScreenDcGuard {
    fn drop(&mut self) {
        if self.0 != 0 {
            unsafe { ReleaseDC(0, self.0) };
        }
    }
}

/// Open a process for limited query access, classifying the failure so a
/// dead PID and a privileged process stay distinguishable.
pub fn open_process_for_query(pid: u32) -> Result<HandleGuard, ProbeError> {
    let handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid) };
    if handle == 0 {
        let code = last_error();
        return Err(match code {
            ERROR_INVALID_PARAMETER => ProbeError::NoSuchProcess(pid),
            ERROR_ACCESS_DENIED => ProbeError::AccessDenied { pid, code },
            _ => ProbeError::ResourceAcquisition {
                what: "process handle",
                code,
            },
        });
    }
    Ok(HandleGuard(handle))
}
