// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! XA resource managers
//!
//! This module provides the verb surface a transaction coordinator drives:
//! start, end, prepare, commit, rollback, forget, recover and is_same_rm.
//!
//! # Variants
//!
//! - [`UnpinnedXaResource`]: every verb runs on the connection's own session
//! - [`PinnedXaResource`]: verbs are routed through the
//!   [`BranchRegistry`](crate::registry::BranchRegistry) to whichever session
//!   holds the branch

pub mod pinned;
pub mod unpinned;

pub use pinned::PinnedXaResource;
pub use unpinned::UnpinnedXaResource;

use crate::command::{issue, XaCommand};
use crate::config::EndpointConfig;
use crate::error::{XaError, XaErrorKind, XaResult};
use crate::flags::{EndFlag, ScanFlag, StartFlag, Vote};
use crate::session::{Row, Session};
use crate::xid::Xid;

/// The closed set of resource manager variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceManagerKind {
    Unpinned,
    Pinned,
}

/// What `is_same_rm` compares: variant plus target endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceManagerIdentity {
    pub kind: ResourceManagerKind,
    pub endpoint: EndpointConfig,
}

/// XA verbs on behalf of a transaction coordinator
///
/// Every verb either completes with its declared result or fails with exactly
/// one [`XaError`]. Nothing is retried internally.
pub trait XaResource: Send + Sync {
    /// Associate the calling context with a branch
    fn start(&self, xid: &Xid, flag: StartFlag) -> XaResult<()>;

    /// Dissociate the calling context from a branch
    fn end(&self, xid: &Xid, flag: EndFlag) -> XaResult<()>;

    /// First phase of two-phase commit
    fn prepare(&self, xid: &Xid) -> XaResult<Vote>;

    fn commit(&self, xid: &Xid, one_phase: bool) -> XaResult<()>;

    fn rollback(&self, xid: &Xid) -> XaResult<()>;

    /// Discard knowledge of a heuristically completed branch
    fn forget(&self, xid: &Xid) -> XaResult<()>;

    /// List prepared branches known to the server
    fn recover(&self, flag: ScanFlag) -> XaResult<Vec<Xid>>;

    fn identity(&self) -> ResourceManagerIdentity;

    /// True when `other` is the same variant targeting the same endpoint
    fn is_same_rm(&self, other: &dyn XaResource) -> bool {
        self.identity() == other.identity()
    }

    /// Branch timeouts are not supported by the backing store
    fn transaction_timeout(&self) -> u32 {
        0
    }

    /// Always declines, see [`XaResource::transaction_timeout`]
    fn set_transaction_timeout(&self, _seconds: u32) -> bool {
        false
    }

    /// `start` taking raw X/Open flags
    fn start_with_flags(&self, xid: &Xid, flags: i32) -> XaResult<()> {
        let flag = StartFlag::from_bits(flags)?;
        self.start(xid, flag)
    }

    /// `end` taking raw X/Open flags
    fn end_with_flags(&self, xid: &Xid, flags: i32) -> XaResult<()> {
        let flag = EndFlag::from_bits(flags)?;
        self.end(xid, flag)
    }

    /// `recover` taking raw X/Open flags
    fn recover_with_flags(&self, flags: i32) -> XaResult<Vec<Xid>> {
        let flag = ScanFlag::from_bits(flags)?;
        self.recover(flag)
    }
}

/// Run `XA RECOVER` on `session` when `flag` opens a scan
///
/// Without the start-scan bit nothing is issued and the result is empty; no
/// cursor is kept between calls.
pub(crate) fn recover_on(session: &dyn Session, flag: ScanFlag) -> XaResult<Vec<Xid>> {
    if !flag.starts_scan() {
        return Ok(Vec::new());
    }

    let rows = issue(session, &XaCommand::Recover)?;
    rows.iter().map(decode_recover_row).collect()
}

/// Decode one `(formatID, gtrid_length, bqual_length, data)` row
fn decode_recover_row(row: &Row) -> XaResult<Xid> {
    let malformed = |detail: &str| {
        XaError::new(
            XaErrorKind::RmError,
            format!("malformed XA RECOVER row: {}", detail),
        )
    };

    let format_id = row.get_i32(0).ok_or_else(|| malformed("formatID"))?;
    let gtrid_len = row
        .get_i32(1)
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| malformed("gtrid_length"))?;
    let bqual_len = row
        .get_i32(2)
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| malformed("bqual_length"))?;
    let data = row.get_bytes(3).ok_or_else(|| malformed("data"))?;

    let end = gtrid_len + bqual_len;
    if data.len() < end {
        return Err(malformed(&format!(
            "data holds {} bytes, lengths require {}",
            data.len(),
            end
        )));
    }

    Ok(Xid::new(
        format_id,
        data[..gtrid_len].to_vec(),
        data[gtrid_len..end].to_vec(),
    ))
}
