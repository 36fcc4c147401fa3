// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! xapin - XA branch pinning for pooled database sessions
//!
//! xapin implements the resource-manager side of the XA two-phase-commit
//! protocol on top of pooled connections.
//!
//! # Features
//!
//! - **XA verbs**: start, end, prepare, commit, rollback, forget and recover
//!   issued as `XA ...` statements against a session
//! - **Branch pinning**: a branch stays bound to the physical session that
//!   started it, even when later verbs arrive through a different pooled
//!   connection
//! - **Error translation**: server error numbers are mapped onto the X/Open
//!   error codes, keeping the native error as the cause
//!
//! # Usage
//!
//! ```rust,ignore
//! use xapin::{PinningMode, PooledConnection, StartFlag, EndFlag, XaConfig, Xid};
//!
//! let config = XaConfig { pinning: PinningMode::Pinned, ..XaConfig::default() };
//! let conn = PooledConnection::new(session, config);
//! let xa = conn.xa_resource();
//!
//! let xid = Xid::generate();
//! xa.start(&xid, StartFlag::None)?;
//! // ... work on the session ...
//! xa.end(&xid, EndFlag::Success)?;
//! xa.prepare(&xid)?;
//! xa.commit(&xid, false)?;
//! ```
//!
//! Connection establishment, the wire protocol and pool admission are not part
//! of this crate; they are reached through the [`Session`] trait.

pub mod command;
pub mod config;
pub mod error;
pub mod flags;
pub mod registry;
pub mod resource;
pub mod session;
pub mod xid;

pub use command::XaCommand;
pub use config::{EndpointConfig, PinningMode, XaConfig};
pub use error::{translate, NativeError, XaError, XaErrorKind, XaResult};
pub use flags::{EndFlag, ScanFlag, StartFlag, Vote};
pub use registry::BranchRegistry;
pub use resource::{
    PinnedXaResource, ResourceManagerIdentity, ResourceManagerKind, UnpinnedXaResource,
    XaResource,
};
pub use session::{PooledConnection, Row, Session, SessionGuard, SessionHandle, Value};
pub use xid::{Xid, XidLike};

/// xapin version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
