//! Native process-introspection probes for a process-monitoring system.
//!
//! Three independent, synchronous probes build a trust profile of a running
//! process identified by PID and/or executable path: the icon its executable
//! presents, the mandatory integrity level its token runs under, and whether
//! it owns a visible top-level window. Each call scopes its OS resources to
//! itself, so concurrent probing from multiple threads is safe by
//! construction.
//!
//! The typed Rust API lives here; [`ffi`] exposes the narrow C boundary the
//! embedding application links against.

pub mod core;
pub mod error;
pub mod ffi;

pub use crate::core::icon_extractor::{extract_icon, IconImage};
pub use crate::core::integrity::{process_integrity_level, IntegrityLevel, IntegrityTier};
pub use crate::core::window_visibility::has_visible_window;
pub use crate::error::ProbeError;
