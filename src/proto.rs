//! Wire envelope of the host module protocol
//!
//! Packages travel in both directions as an 8 byte little-endian header
//! followed by the payload:
//!
//! ```text
//! { length: u32, pid: u16, type: u8, check: u8 }
//! ```
//!
//! where `check` must be the bitwise inverse of `type` and `length` counts
//! only the payload bytes. Payloads are msgpack.

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Length of the fixed package header
pub const HEADER_LEN: usize = 8;

/// Upper bound on a single package payload
pub const MAX_PACKAGE_SIZE: u32 = 1_000_000;

/// Msgpack nil, the payload of a successful request reply
pub const NIL_PAYLOAD: &[u8] = &[0xc0];

/// Package type discriminants of the host protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PackageType {
    /// Configuration update pushed by the host
    ModuleConf = 64,
    /// Configuration acknowledged
    ModuleConfOk = 65,
    /// Configuration rejected
    ModuleConfErr = 66,
    /// A send-mail request
    ModuleReq = 80,
    /// Successful request reply
    ModuleRes = 81,
    /// Exception reply carrying an [`Exception`] payload
    ModuleErr = 82,
}

impl PackageType {
    /// Map a raw discriminant to a known package type
    #[must_use]
    pub const fn from_u8(ty: u8) -> Option<Self> {
        match ty {
            64 => Some(Self::ModuleConf),
            65 => Some(Self::ModuleConfOk),
            66 => Some(Self::ModuleConfErr),
            80 => Some(Self::ModuleReq),
            81 => Some(Self::ModuleRes),
            82 => Some(Self::ModuleErr),
            _ => None,
        }
    }
}

/// Error codes understood by the host, carried in exception replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The request payload was malformed or failed validation
    BadData,
    /// The requested operation itself failed
    Operation,
}

impl ErrorCode {
    /// The host's numeric code for this error
    #[must_use]
    pub const fn code(self) -> i8 {
        match self {
            Self::BadData => -53,
            Self::Operation => -63,
        }
    }
}

/// One framed unit of the host protocol
#[derive(Debug, Clone)]
pub struct Package {
    /// Correlation id linking a request to its reply
    pub pid: u16,
    /// Raw type discriminant; see [`PackageType::from_u8`]
    pub ty: u8,
    /// Opaque msgpack payload
    pub data: Vec<u8>,
}

/// Payload of a [`PackageType::ModuleErr`] reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exception {
    /// Human-readable failure description
    pub error_msg: String,
    /// One of the host error codes, see [`ErrorCode::code`]
    pub error_code: i8,
}

impl Exception {
    /// Create an exception payload for the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error_msg: message.into(),
            error_code: code.code(),
        }
    }

    /// Serialize to the string-keyed msgpack map the host expects
    ///
    /// # Errors
    ///
    /// Returns an error if msgpack encoding fails
    pub fn to_vec(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }
}

/// Parse a package header into `(payload length, pid, raw type)`
///
/// # Errors
///
/// Returns an error if the check bit does not match the type, or the
/// length exceeds [`MAX_PACKAGE_SIZE`]
pub fn parse_header(header: &[u8; HEADER_LEN]) -> Result<(u32, u16, u8), TransportError> {
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let pid = u16::from_le_bytes([header[4], header[5]]);
    let ty = header[6];
    let check = header[7];

    if check != !ty {
        return Err(TransportError::BadCheckBit { ty, check });
    }
    if length > MAX_PACKAGE_SIZE {
        return Err(TransportError::Oversized(length));
    }

    Ok((length, pid, ty))
}

/// Encode a package header for an outbound reply
#[must_use]
pub fn encode_header(length: u32, pid: u16, ty: PackageType) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[..4].copy_from_slice(&length.to_le_bytes());
    header[4..6].copy_from_slice(&pid.to_le_bytes());
    header[6] = ty as u8;
    header[7] = !(ty as u8);
    header
}
