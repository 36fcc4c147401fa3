// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Global transaction branch identifiers
//!
//! An [`Xid`] addresses one resource manager's branch of a global transaction
//! as the `(format_id, global_transaction_id, branch_qualifier)` triple.
//! Identifiers compare structurally, so they can be used as map keys and can
//! be matched against any other identifier type exposing the same three fields
//! through [`XidLike`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Read access to the three fields of a transaction branch identifier
///
/// Coordinators frequently bring their own identifier types. Anything that
/// exposes the triple can be compared against, or converted into, an [`Xid`].
pub trait XidLike {
    fn format_id(&self) -> i32;
    fn global_transaction_id(&self) -> &[u8];
    fn branch_qualifier(&self) -> &[u8];
}

/// Transaction branch identifier
///
/// Immutable once constructed. Lengths are not validated: the X/Open
/// convention caps both byte sequences at [`Xid::MAX_GTRID_SIZE`] and
/// [`Xid::MAX_BQUAL_SIZE`], but longer buffers are carried as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Xid {
    format_id: i32,
    global_transaction_id: Vec<u8>,
    branch_qualifier: Vec<u8>,
}

impl Xid {
    /// Conventional upper bound for the global transaction id
    pub const MAX_GTRID_SIZE: usize = 64;
    /// Conventional upper bound for the branch qualifier
    pub const MAX_BQUAL_SIZE: usize = 64;

    pub fn new(
        format_id: i32,
        global_transaction_id: impl Into<Vec<u8>>,
        branch_qualifier: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            format_id,
            global_transaction_id: global_transaction_id.into(),
            branch_qualifier: branch_qualifier.into(),
        }
    }

    /// Generate a fresh identifier with a random global transaction id
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4();
        Self::new(0, uuid.as_bytes().to_vec(), vec![0u8; 8])
    }

    /// Copy the fields of a foreign identifier
    pub fn from_xid_like(other: &dyn XidLike) -> Self {
        Self::new(
            other.format_id(),
            other.global_transaction_id(),
            other.branch_qualifier(),
        )
    }

    pub fn format_id(&self) -> i32 {
        self.format_id
    }

    pub fn global_transaction_id(&self) -> &[u8] {
        &self.global_transaction_id
    }

    pub fn branch_qualifier(&self) -> &[u8] {
        &self.branch_qualifier
    }

    /// Structural comparison against any identifier implementation
    pub fn matches(&self, other: &dyn XidLike) -> bool {
        self.format_id == other.format_id()
            && self.global_transaction_id == other.global_transaction_id()
            && self.branch_qualifier == other.branch_qualifier()
    }

    /// Encode the identifier the way the server-side XA parser expects it
    ///
    /// Format: `0x<gtrid>,0x<bqual>,0x<format id>`. Byte sequences are upper
    /// case hex; the format id is always eight hex digits (big-endian two's
    /// complement). An empty byte sequence is written as `''` because a bare
    /// `0x` is not a valid literal.
    pub fn to_command_text(&self) -> String {
        format!(
            "{},{},0x{:08X}",
            hex_literal(&self.global_transaction_id),
            hex_literal(&self.branch_qualifier),
            self.format_id as u32
        )
    }
}

fn hex_literal(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        "''".to_string()
    } else {
        format!("0x{}", hex::encode_upper(bytes))
    }
}

impl XidLike for Xid {
    fn format_id(&self) -> i32 {
        self.format_id
    }

    fn global_transaction_id(&self) -> &[u8] {
        &self.global_transaction_id
    }

    fn branch_qualifier(&self) -> &[u8] {
        &self.branch_qualifier
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_command_text())
    }
}
