//! Unified error type for all probe operations.
//!
//! `ProbeError` is the single error type returned by every probe. It
//! serializes as `{ "kind": "...", "message": "..." }` so an embedding
//! application can programmatically distinguish failure categories instead
//! of collapsing every failure into 0/false/null.

use serde::ser::SerializeStruct;

/// Typed failure reason surfaced by the probes.
///
/// Variants carry the OS error code where one exists, so "no such process",
/// "access denied", and "query failed" stay distinguishable all the way up.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The supplied path cannot be represented as a native wide string.
    #[error("path is not representable as a wide string: {0}")]
    InputEncoding(String),

    /// The file exists but carries no icon resource, or does not exist at all.
    #[error("no icon resource found in {0}")]
    IconNotFound(String),

    /// The icon handle could not be split into its mask/color bitmaps.
    #[error("icon decomposition failed (OS error {code})")]
    IconInfoUnavailable { code: u32 },

    /// The pixel buffer could not be allocated.
    #[error("failed to allocate {0}-byte pixel buffer")]
    AllocationFailure(usize),

    /// The color bitmap could not be read out as a device-independent bitmap.
    #[error("bitmap read failed (OS error {code})")]
    BitmapRead { code: u32 },

    /// No process with the given ID exists.
    #[error("no process with id {0}")]
    NoSuchProcess(u32),

    /// The OS security model refused the query.
    #[error("access denied querying process {pid} (OS error {code})")]
    AccessDenied { pid: u32, code: u32 },

    /// An intermediate OS handle (device context, token, ...) was unobtainable.
    #[error("failed to acquire {what} (OS error {code})")]
    ResourceAcquisition { what: &'static str, code: u32 },

    /// The token's mandatory-label data was present but unparseable.
    #[error("integrity label decode failed: {0}")]
    LabelDecode(&'static str),

    /// The top-level window enumeration itself failed.
    #[error("window enumeration failed (OS error {code})")]
    Enumeration { code: u32 },

    /// The probe has no implementation on this platform.
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

impl ProbeError {
    /// Returns the error kind as a string matching the variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::InputEncoding(_) => "InputEncoding",
            ProbeError::IconNotFound(_) => "IconNotFound",
            ProbeError::IconInfoUnavailable { .. } => "IconInfoUnavailable",
            ProbeError::AllocationFailure(_) => "AllocationFailure",
            ProbeError::BitmapRead { .. } => "BitmapRead",
            ProbeError::NoSuchProcess(_) => "NoSuchProcess",
            ProbeError::AccessDenied { .. } => "AccessDenied",
            ProbeError::ResourceAcquisition { .. } => "ResourceAcquisition",
            ProbeError::LabelDecode(_) => "LabelDecode",
            ProbeError::Enumeration { .. } => "Enumeration",
            ProbeError::Unsupported(_) => "Unsupported",
        }
    }
}

/// Custom Serialize: produces `{ "kind": "Variant", "message": "..." }`.
impl serde::Serialize for ProbeError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("ProbeError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

// ---- From implementations for ergonomic error conversion ----

impl From<std::str::Utf8Error> for ProbeError {
    fn from(err: std::str::Utf8Error) -> Self {
        ProbeError::InputEncoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_returns_correct_variant_name() {
        assert_eq!(ProbeError::IconNotFound("a.exe".into()).kind(), "IconNotFound");
        assert_eq!(ProbeError::NoSuchProcess(42).kind(), "NoSuchProcess");
        assert_eq!(
            ProbeError::AccessDenied { pid: 4, code: 5 }.kind(),
            "AccessDenied"
        );
        assert_eq!(
            ProbeError::ResourceAcquisition {
                what: "process token",
                code: 6
            }
            .kind(),
            "ResourceAcquisition"
        );
        assert_eq!(ProbeError::LabelDecode("short sid").kind(), "LabelDecode");
        assert_eq!(ProbeError::Unsupported("icon extraction").kind(), "Unsupported");
    }

    #[test]
    fn test_error_display_carries_os_code() {
        let err = ProbeError::BitmapRead { code: 1447 };
        assert_eq!(err.to_string(), "bitmap read failed (OS error 1447)");
    }

    #[test]
    fn test_error_serializes_as_kind_and_message() {
        let err = ProbeError::AccessDenied { pid: 1234, code: 5 };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "AccessDenied");
        assert_eq!(
            json["message"],
            "access denied querying process 1234 (OS error 5)"
        );
    }

    #[test]
    fn test_from_utf8_error_produces_input_encoding_variant() {
        let bad = [0xFFu8, 0xFE];
        let utf8_err = std::str::from_utf8(&bad).unwrap_err();
        let err: ProbeError = utf8_err.into();
        assert_eq!(err.kind(), "InputEncoding");
    }

    #[test]
    fn test_all_variants_serialize_with_two_fields() {
        let variants: Vec<ProbeError> = vec![
            ProbeError::InputEncoding("bad".into()),
            ProbeError::IconNotFound("a.exe".into()),
            ProbeError::IconInfoUnavailable { code: 6 },
            ProbeError::AllocationFailure(4096),
            ProbeError::BitmapRead { code: 87 },
            ProbeError::NoSuchProcess(9),
            ProbeError::AccessDenied { pid: 9, code: 5 },
            ProbeError::ResourceAcquisition {
                what: "screen device context",
                code: 0,
            },
            ProbeError::LabelDecode("no sub-authorities"),
            ProbeError::Enumeration { code: 1400 },
            ProbeError::Unsupported("window probe"),
        ];
        for err in variants {
            let json = serde_json::to_value(&err).unwrap();
            let obj = json.as_object().unwrap();
            assert_eq!(obj.len(), 2, "Expected exactly 2 fields for {err:?}");
            assert!(obj.contains_key("kind"));
            assert!(obj.contains_key("message"));
        }
    }
}
