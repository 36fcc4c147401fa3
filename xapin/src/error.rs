// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types and native error translation
//!
//! Sessions fail with a [`NativeError`] carrying the server's error number.
//! Every failure surfaced by a resource manager is an [`XaError`] whose
//! [`XaErrorKind`] mirrors the X/Open transaction-manager error space.

use std::fmt;
use thiserror::Error;

/// Server error numbers reported for XA statements (MySQL/MariaDB family)
pub mod native_codes {
    /// XAER_NOTA: unknown XID
    pub const XAER_NOTA: i32 = 1397;
    /// XAER_INVAL: invalid arguments
    pub const XAER_INVAL: i32 = 1398;
    /// XAER_RMFAIL: command not allowed in the current branch state
    pub const XAER_RMFAIL: i32 = 1399;
    /// XAER_OUTSIDE: work done outside of the global transaction
    pub const XAER_OUTSIDE: i32 = 1400;
    /// XAER_RMERR: fatal error in the branch
    pub const XAER_RMERR: i32 = 1401;
    /// XA_RBROLLBACK: branch was rolled back
    pub const XA_RBROLLBACK: i32 = 1402;
}

/// Failure reported by a [`Session`](crate::session::Session) while executing a command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("native error {code}: {message}")]
pub struct NativeError {
    pub code: i32,
    pub sql_state: Option<String>,
    pub message: String,
}

impl NativeError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            sql_state: None,
            message: message.into(),
        }
    }

    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }
}

/// Standardized transaction-manager error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XaErrorKind {
    /// The branch identifier is not known to the resource manager
    BranchUnknown,
    /// Bad flags or arguments, detected before any I/O
    InvalidArgument,
    /// The resource manager is unavailable or the command is not allowed now
    RmFailure,
    /// Work was attempted outside of a global transaction
    ProtocolViolation,
    /// Generic resource manager error
    RmError,
    /// The branch has been marked rollback-only
    RollbackOnly,
}

impl XaErrorKind {
    /// The X/Open numeric code for this category
    pub fn xa_code(&self) -> i32 {
        match self {
            XaErrorKind::BranchUnknown => -4,
            XaErrorKind::InvalidArgument => -5,
            XaErrorKind::RmFailure => -7,
            XaErrorKind::ProtocolViolation => -9,
            XaErrorKind::RmError => -3,
            XaErrorKind::RollbackOnly => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            XaErrorKind::BranchUnknown => "XAER_NOTA",
            XaErrorKind::InvalidArgument => "XAER_INVAL",
            XaErrorKind::RmFailure => "XAER_RMFAIL",
            XaErrorKind::ProtocolViolation => "XAER_OUTSIDE",
            XaErrorKind::RmError => "XAER_RMERR",
            XaErrorKind::RollbackOnly => "XA_RBROLLBACK",
        }
    }
}

impl fmt::Display for XaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by every XA verb
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct XaError {
    kind: XaErrorKind,
    message: String,
    #[source]
    cause: Option<NativeError>,
}

impl XaError {
    pub fn new(kind: XaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(XaErrorKind::InvalidArgument, message)
    }

    pub fn kind(&self) -> XaErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The native error this one was translated from, if any
    pub fn cause(&self) -> Option<&NativeError> {
        self.cause.as_ref()
    }

    pub fn xa_code(&self) -> i32 {
        self.kind.xa_code()
    }
}

/// Result type for XA operations
pub type XaResult<T> = Result<T, XaError>;

/// Map a native error onto the transaction-manager error space
///
/// The original error is always kept as the cause.
pub fn translate(error: NativeError) -> XaError {
    let kind = match error.code {
        native_codes::XAER_NOTA => XaErrorKind::BranchUnknown,
        native_codes::XAER_INVAL => XaErrorKind::InvalidArgument,
        native_codes::XAER_RMFAIL => XaErrorKind::RmFailure,
        native_codes::XAER_OUTSIDE => XaErrorKind::ProtocolViolation,
        native_codes::XAER_RMERR => XaErrorKind::RmError,
        native_codes::XA_RBROLLBACK => XaErrorKind::RollbackOnly,
        _ => XaErrorKind::RmError,
    };

    XaError {
        kind,
        message: error.message.clone(),
        cause: Some(error),
    }
}

impl From<NativeError> for XaError {
    fn from(error: NativeError) -> Self {
        translate(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_translation_table() {
        let table = [
            (native_codes::XAER_NOTA, XaErrorKind::BranchUnknown),
            (native_codes::XAER_INVAL, XaErrorKind::InvalidArgument),
            (native_codes::XAER_RMFAIL, XaErrorKind::RmFailure),
            (native_codes::XAER_OUTSIDE, XaErrorKind::ProtocolViolation),
            (native_codes::XAER_RMERR, XaErrorKind::RmError),
            (native_codes::XA_RBROLLBACK, XaErrorKind::RollbackOnly),
        ];

        for (code, expected) in table {
            let err = translate(NativeError::new(code, "boom"));
            assert_eq!(err.kind(), expected, "native code {}", code);
            assert_eq!(err.cause().map(|c| c.code), Some(code));
        }
    }

    #[test]
    fn test_unmapped_code_keeps_message_and_cause() {
        let native = NativeError::new(9999, "disk on fire").with_sql_state("HY000");
        let err = translate(native.clone());

        assert_eq!(err.kind(), XaErrorKind::RmError);
        assert_eq!(err.message(), "disk on fire");
        assert_eq!(err.cause(), Some(&native));
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "XAER_RMERR: disk on fire");
    }

    #[test]
    fn test_standard_codes() {
        assert_eq!(XaErrorKind::BranchUnknown.xa_code(), -4);
        assert_eq!(XaErrorKind::InvalidArgument.xa_code(), -5);
        assert_eq!(XaErrorKind::RollbackOnly.xa_code(), 100);
        assert_eq!(XaError::invalid_argument("bad flag").xa_code(), -5);
    }

    #[test]
    fn test_argument_errors_have_no_cause() {
        let err = XaError::invalid_argument("bad flag");
        assert!(err.cause().is_none());
        assert!(err.source().is_none());
    }
}
