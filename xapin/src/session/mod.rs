// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session contract consumed by the resource managers
//!
//! A [`Session`] is one physical connection. This crate never opens, frames,
//! or authenticates connections itself; it only executes XA statements on a
//! session while holding that session's exclusive lock.
//!
//! Sessions are shared by reference ([`SessionHandle`]) between the pool, the
//! resource managers, and the branch registry. They are never cloned.

pub mod pooled;

pub use pooled::PooledConnection;

use crate::error::NativeError;
use parking_lot::ReentrantMutexGuard;
use std::sync::Arc;

/// Scoped exclusive guard over a session, released on drop
pub type SessionGuard<'a> = ReentrantMutexGuard<'a, ()>;

/// Shared reference to a physical session
pub type SessionHandle = Arc<dyn Session>;

/// One physical database connection
pub trait Session: Send + Sync {
    /// Execute a statement and return its result rows
    ///
    /// Callers hold the guard returned by [`Session::lock`] for the duration
    /// of the call.
    fn execute(&self, command: &str) -> Result<Vec<Row>, NativeError>;

    /// Take the session's re-entrant exclusive lock
    fn lock(&self) -> SessionGuard<'_>;
}

/// A single column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
}

/// A result row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Integer column, if present and representable as `i32`
    ///
    /// Text columns holding a decimal number are accepted, since some servers
    /// report `XA RECOVER` counts as strings.
    pub fn get_i32(&self, index: usize) -> Option<i32> {
        match self.values.get(index)? {
            Value::Int(v) => i32::try_from(*v).ok(),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Binary column; text columns are returned as their UTF-8 bytes
    pub fn get_bytes(&self, index: usize) -> Option<&[u8]> {
        match self.values.get(index)? {
            Value::Bytes(b) => Some(b.as_slice()),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

/// Whether two handles refer to the same physical session
pub fn same_session(a: &SessionHandle, b: &SessionHandle) -> bool {
    // Compare data pointers only; vtable pointers may differ across codegen units
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
