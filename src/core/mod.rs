//! Core probes: three independent, stateless questions about a process.
//!
//! - [`icon_extractor`] — executable path → RGBA icon at the system icon size
//! - [`integrity`] — PID → mandatory integrity level of the process token
//! - [`window_visibility`] — PID → owns a visible top-level window?
//! - [`win_api`] — shared Win32 FFI and RAII handle guards
//!
//! No probe depends on another; each acquires its OS resources locally and
//! releases them before returning.

pub mod icon_extractor;
pub mod integrity;
pub mod window_visibility;

#[cfg(target_os = "windows")]
pub(crate) mod win_api;

pub use icon_extractor::IconImage;
pub use integrity::{IntegrityLevel, IntegrityTier};
