//! Vendor status codes and their symbolic names.
//!
//! Every `MV_CC_*` call returns a C `int` that is either `MV_OK` or one of
//! the `0x8000_0xxx` codes below. The table mirrors the SDK's
//! `MvErrorDefine.h` so that failures can be reported by name.

use std::fmt;
use thiserror::Error;

/// Raw status code returned by an SDK call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u32);

/// Symbolic name and short description for each known code.
const ERROR_TABLE: &[(u32, &str, &str)] = &[
    (0x0000_0000, "MV_OK", "success"),
    // General
    (0x8000_0000, "MV_E_HANDLE", "error or invalid handle"),
    (0x8000_0001, "MV_E_SUPPORT", "not supported function"),
    (0x8000_0002, "MV_E_BUFOVER", "buffer overflow"),
    (0x8000_0003, "MV_E_CALLORDER", "function calling order error"),
    (0x8000_0004, "MV_E_PARAMETER", "incorrect parameter"),
    (0x8000_0006, "MV_E_RESOURCE", "applying resource failed"),
    (0x8000_0007, "MV_E_NODATA", "no data"),
    (0x8000_0008, "MV_E_PRECONDITION", "precondition error or running environment changed"),
    (0x8000_0009, "MV_E_VERSION", "version mismatches"),
    (0x8000_000A, "MV_E_NOENOUGH_BUF", "insufficient memory"),
    (0x8000_000B, "MV_E_ABNORMAL_IMAGE", "abnormal image, maybe incomplete due to packet loss"),
    (0x8000_000C, "MV_E_LOAD_LIBRARY", "load library failed"),
    (0x8000_000D, "MV_E_NOOUTBUF", "no available output buffer"),
    (0x8000_000E, "MV_E_ENCRYPT", "encryption error"),
    (0x8000_000F, "MV_E_OPENFILE", "open file error"),
    (0x8000_00FF, "MV_E_UNKNOW", "unknown error"),
    // GenICam
    (0x8000_0100, "MV_E_GC_GENERIC", "general error"),
    (0x8000_0101, "MV_E_GC_ARGUMENT", "illegal parameters"),
    (0x8000_0102, "MV_E_GC_RANGE", "the value is out of range"),
    (0x8000_0103, "MV_E_GC_PROPERTY", "property"),
    (0x8000_0104, "MV_E_GC_RUNTIME", "running environment error"),
    (0x8000_0105, "MV_E_GC_LOGICAL", "logical error"),
    (0x8000_0106, "MV_E_GC_ACCESS", "node accessing condition error"),
    (0x8000_0107, "MV_E_GC_TIMEOUT", "timeout"),
    (0x8000_0108, "MV_E_GC_DYNAMICCAST", "transformation exception"),
    (0x8000_01FF, "MV_E_GC_UNKNOW", "GenICam unknown error"),
    // GigE
    (0x8000_0200, "MV_E_NOT_IMPLEMENTED", "the command is not supported by device"),
    (0x8000_0201, "MV_E_INVALID_ADDRESS", "the target address being accessed does not exist"),
    (0x8000_0202, "MV_E_WRITE_PROTECT", "the target address is not writable"),
    (0x8000_0203, "MV_E_ACCESS_DENIED", "no permission"),
    (0x8000_0204, "MV_E_BUSY", "device is busy, or network disconnected"),
    (0x8000_0205, "MV_E_PACKET", "network data packet error"),
    (0x8000_0206, "MV_E_NETER", "network error"),
    (0x8000_0221, "MV_E_IP_CONFLICT", "device IP conflict"),
    // USB
    (0x8000_0300, "MV_E_USB_READ", "reading USB error"),
    (0x8000_0301, "MV_E_USB_WRITE", "writing USB error"),
    (0x8000_0302, "MV_E_USB_DEVICE", "device exception"),
    (0x8000_0303, "MV_E_USB_GENICAM", "GenICam error"),
    (0x8000_0304, "MV_E_USB_BANDWIDTH", "insufficient bandwidth"),
    (0x8000_0305, "MV_E_USB_DRIVER", "driver mismatch or unmounted drive"),
    (0x8000_03FF, "MV_E_USB_UNKNOW", "USB unknown error"),
    // Upgrade
    (0x8000_0400, "MV_E_UPG_FILE_MISMATCH", "firmware mismatches"),
    (0x8000_0401, "MV_E_UPG_LANGUSGE_MISMATCH", "firmware language mismatches"),
    (0x8000_0402, "MV_E_UPG_CONFLICT", "upgrading conflicted"),
    (0x8000_0403, "MV_E_UPG_INNER_ERR", "camera internal error during upgrade"),
    (0x8000_04FF, "MV_E_UPG_UNKNOW", "unknown error during upgrade"),
];

/// Name used for codes missing from the table.
pub const UNRECOGNIZED_NAME: &str = "MV_E_UNRECOGNIZED";

impl ErrorCode {
    /// Success.
    pub const OK: ErrorCode = ErrorCode(0x0000_0000);
    /// Invalid handle.
    pub const HANDLE: ErrorCode = ErrorCode(0x8000_0000);
    /// Function not supported.
    pub const SUPPORT: ErrorCode = ErrorCode(0x8000_0001);
    /// Calls made in the wrong order.
    pub const CALLORDER: ErrorCode = ErrorCode(0x8000_0003);
    /// Incorrect parameter.
    pub const PARAMETER: ErrorCode = ErrorCode(0x8000_0004);
    /// Resource allocation failed.
    pub const RESOURCE: ErrorCode = ErrorCode(0x8000_0006);
    /// No frame available.
    pub const NODATA: ErrorCode = ErrorCode(0x8000_0007);
    /// Caller buffer too small.
    pub const NOENOUGH_BUF: ErrorCode = ErrorCode(0x8000_000A);
    /// Unspecified failure.
    pub const UNKNOWN: ErrorCode = ErrorCode(0x8000_00FF);
    /// Value outside the node's range.
    pub const GC_RANGE: ErrorCode = ErrorCode(0x8000_0102);
    /// Unknown GenICam node.
    pub const GC_PROPERTY: ErrorCode = ErrorCode(0x8000_0103);
    /// GenICam node not accessible.
    pub const GC_ACCESS: ErrorCode = ErrorCode(0x8000_0106);
    /// Access denied, typically another process holds the device.
    pub const ACCESS_DENIED: ErrorCode = ErrorCode(0x8000_0203);
    /// Device busy or disconnected.
    pub const BUSY: ErrorCode = ErrorCode(0x8000_0204);

    /// Converts the signed value returned across the FFI boundary.
    #[inline]
    pub fn from_raw(ret: i32) -> Self {
        ErrorCode(ret as u32)
    }

    /// Returns true for `MV_OK`.
    #[inline]
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    /// Turns a raw return value into a `Result`.
    pub fn check(ret: i32) -> Result<(), ErrorCode> {
        let code = Self::from_raw(ret);
        if code.is_ok() {
            Ok(())
        } else {
            Err(code)
        }
    }

    fn entry(self) -> Option<&'static (u32, &'static str, &'static str)> {
        ERROR_TABLE.iter().find(|(value, _, _)| *value == self.0)
    }

    /// Symbolic vendor name, e.g. `MV_E_HANDLE`.
    pub fn name(self) -> &'static str {
        self.entry().map_or(UNRECOGNIZED_NAME, |(_, name, _)| name)
    }

    /// Short human-readable description.
    pub fn description(self) -> &'static str {
        self.entry()
            .map_or("code not listed in the vendor error table", |(_, _, desc)| desc)
    }

    /// Looks a code up by its symbolic name.
    pub fn from_name(name: &str) -> Option<Self> {
        ERROR_TABLE
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(value, _, _)| ErrorCode(*value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:x}] {}", self.0, self.name())
    }
}

/// A failed SDK call: which operation, and what it returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op} failed with error {code}")]
pub struct SdkError {
    /// Operation name, e.g. `GetFloatValue (ExposureTime)`.
    pub op: String,
    /// Status returned by the SDK.
    pub code: ErrorCode,
}

impl SdkError {
    /// Creates an error for `op`.
    pub fn new(op: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            op: op.into(),
            code,
        }
    }
}

/// Attaches an operation name to a raw SDK result.
pub trait SdkResultExt<T> {
    /// Maps the `ErrorCode` into an [`SdkError`] naming `op`.
    fn op(self, op: &str) -> Result<T, SdkError>;
}

impl<T> SdkResultExt<T> for Result<T, ErrorCode> {
    fn op(self, op: &str) -> Result<T, SdkError> {
        self.map_err(|code| SdkError::new(op, code))
    }
}
