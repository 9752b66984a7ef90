//! Mandatory integrity level of a process token.
//!
//! Opens the target process for limited query access, reads the token's
//! `TokenIntegrityLevel` label, and returns the last sub-authority of the
//! label SID — the raw integrity tier — together with a best-effort
//! classification against the documented platform constants.

use serde::Serialize;

use crate::error::ProbeError;

// Documented mandatory-label RIDs. Larger means more trusted; the platform
// defines no upper bound beyond these.
pub const SECURITY_MANDATORY_UNTRUSTED_RID: u32 = 0x0000_0000;
pub const SECURITY_MANDATORY_LOW_RID: u32 = 0x0000_1000;
pub const SECURITY_MANDATORY_MEDIUM_RID: u32 = 0x0000_2000;
pub const SECURITY_MANDATORY_HIGH_RID: u32 = 0x0000_3000;
pub const SECURITY_MANDATORY_SYSTEM_RID: u32 = 0x0000_4000;
pub const SECURITY_MANDATORY_PROTECTED_PROCESS_RID: u32 = 0x0000_5000;

/// Best-effort classification of a raw integrity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum IntegrityTier {
    Untrusted,
    Low,
    Medium,
    High,
    System,
    ProtectedProcess,
}

impl IntegrityTier {
    /// Classify a raw level to the highest tier whose RID it reaches.
    /// In-between values (e.g. medium-plus) classify to their floor tier.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            r if r >= SECURITY_MANDATORY_PROTECTED_PROCESS_RID => Self::ProtectedProcess,
            r if r >= SECURITY_MANDATORY_SYSTEM_RID => Self::System,
            r if r >= SECURITY_MANDATORY_HIGH_RID => Self::High,
            r if r >= SECURITY_MANDATORY_MEDIUM_RID => Self::Medium,
            r if r >= SECURITY_MANDATORY_LOW_RID => Self::Low,
            _ => Self::Untrusted,
        }
    }
}

/// Snapshot of a process token's integrity level at call time.
///
/// Carries both the raw last-sub-authority value and its classification, so
/// callers that care about exotic in-between levels still see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegrityLevel {
    pub raw: u32,
    pub tier: IntegrityTier,
}

/// Read the mandatory integrity level of the process `pid`.
///
/// The process handle and token handle are scoped to this call; both are
/// released before returning on every path. Failure to open the process is
/// classified (`NoSuchProcess` / `AccessDenied`) rather than collapsed to a
/// sentinel value.
#[cfg(target_os = "windows")]
pub fn process_integrity_level(pid: u32) -> Result<IntegrityLevel, ProbeError> {
    use crate::core::win_api::*;

    let process = open_process_for_query(pid)?;

    let mut raw_token: usize = 0;
    if unsafe { OpenProcessToken(process.raw(), TOKEN_QUERY, &mut raw_token) } == 0 {
        let code = last_error();
        return Err(if code == ERROR_ACCESS_DENIED {
            ProbeError::AccessDenied { pid, code }
        } else {
            ProbeError::ResourceAcquisition {
                what: "process token",
                code,
            }
        });
    }
    let token = HandleGuard(raw_token);

    // Size query first; the label is variable-length because the SID's
    // sub-authority chain is.
    let mut label_len: u32 = 0;
    unsafe {
        GetTokenInformation(
            token.raw(),
            TOKEN_INTEGRITY_LEVEL,
            std::ptr::null_mut(),
            0,
            &mut label_len,
        )
    };
    if label_len == 0 {
        return Err(ProbeError::LabelDecode("label size query returned zero"));
    }

    let mut buf = vec![0u8; label_len as usize];
    if unsafe {
        GetTokenInformation(
            token.raw(),
            TOKEN_INTEGRITY_LEVEL,
            buf.as_mut_ptr(),
            label_len,
            &mut label_len,
        )
    } == 0
    {
        tracing::warn!("GetTokenInformation failed for pid {pid} with code {}", last_error());
        return Err(ProbeError::LabelDecode("label query failed"));
    }

    let raw = unsafe {
        // The byte buffer carries no alignment guarantee for the leading
        // struct, so read it out by value.
        let label = std::ptr::read_unaligned(buf.as_ptr() as *const TokenMandatoryLabel);
        if label.label.sid.is_null() {
            return Err(ProbeError::LabelDecode("label SID is null"));
        }
        let sub_auth_count = *GetSidSubAuthorityCount(label.label.sid);
        if sub_auth_count == 0 {
            return Err(ProbeError::LabelDecode("label SID has no sub-authorities"));
        }
        *GetSidSubAuthority(label.label.sid, sub_auth_count as u32 - 1)
    };

    Ok(IntegrityLevel {
        raw,
        tier: IntegrityTier::from_raw(raw),
    })
}

#[cfg(not(target_os = "windows"))]
pub fn process_integrity_level(_pid: u32) -> Result<IntegrityLevel, ProbeError> {
    Err(ProbeError::Unsupported("integrity level probe"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_rids_classify_to_their_tier() {
        assert_eq!(
            IntegrityTier::from_raw(SECURITY_MANDATORY_UNTRUSTED_RID),
            IntegrityTier::Untrusted
        );
        assert_eq!(
            IntegrityTier::from_raw(SECURITY_MANDATORY_LOW_RID),
            IntegrityTier::Low
        );
        assert_eq!(
            IntegrityTier::from_raw(SECURITY_MANDATORY_MEDIUM_RID),
            IntegrityTier::Medium
        );
        assert_eq!(
            IntegrityTier::from_raw(SECURITY_MANDATORY_HIGH_RID),
            IntegrityTier::High
        );
        assert_eq!(
            IntegrityTier::from_raw(SECURITY_MANDATORY_SYSTEM_RID),
            IntegrityTier::System
        );
        assert_eq!(
            IntegrityTier::from_raw(SECURITY_MANDATORY_PROTECTED_PROCESS_RID),
            IntegrityTier::ProtectedProcess
        );
    }

    #[test]
    fn test_in_between_levels_classify_to_floor_tier() {
        // Medium-plus (UIAccess) tokens sit between medium and high.
        assert_eq!(IntegrityTier::from_raw(0x2100), IntegrityTier::Medium);
        assert_eq!(IntegrityTier::from_raw(0x0FFF), IntegrityTier::Untrusted);
        assert_eq!(IntegrityTier::from_raw(0x3001), IntegrityTier::High);
    }

    #[test]
    fn test_levels_above_protected_process_saturate() {
        assert_eq!(
            IntegrityTier::from_raw(u32::MAX),
            IntegrityTier::ProtectedProcess
        );
    }

    #[test]
    fn test_tier_ordering_matches_raw_ordering() {
        assert!(IntegrityTier::Untrusted < IntegrityTier::Low);
        assert!(IntegrityTier::Low < IntegrityTier::Medium);
        assert!(IntegrityTier::Medium < IntegrityTier::High);
        assert!(IntegrityTier::High < IntegrityTier::System);
        assert!(IntegrityTier::System < IntegrityTier::ProtectedProcess);
        assert!(SECURITY_MANDATORY_LOW_RID < SECURITY_MANDATORY_MEDIUM_RID);
        assert!(SECURITY_MANDATORY_MEDIUM_RID < SECURITY_MANDATORY_HIGH_RID);
    }

    #[test]
    fn test_integrity_level_serializes_raw_and_tier() {
        let level = IntegrityLevel {
            raw: SECURITY_MANDATORY_MEDIUM_RID,
            tier: IntegrityTier::Medium,
        };
        let json = serde_json::to_value(level).unwrap();
        assert_eq!(json["raw"], 0x2000);
        assert_eq!(json["tier"], "Medium");
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_probe_unsupported_off_windows() {
        let err = process_integrity_level(1).unwrap_err();
        assert_eq!(err.kind(), "Unsupported");
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_current_process_reports_plausible_tier() {
        let level = process_integrity_level(std::process::id()).unwrap();
        assert!(level.raw >= SECURITY_MANDATORY_LOW_RID);
        assert!(level.tier >= IntegrityTier::Low);
        assert_eq!(level.tier, IntegrityTier::from_raw(level.raw));
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_nonexistent_pid_reports_no_such_process() {
        let err = process_integrity_level(u32::MAX).unwrap_err();
        assert_eq!(err.kind(), "NoSuchProcess");
    }
}
