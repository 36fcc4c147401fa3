//! Test utilities for xapin integration tests
//!
//! `MockSession` stands in for a physical connection. It keeps a tiny model of
//! server-side XA branch state, so verbs against unknown branches fail the way
//! a real server does, and records every statement it executes.

#![allow(dead_code)]

pub mod mock_session;

pub use mock_session::{MockSession, XAER_DUPID};

use std::sync::Once;

static LOGGER: Once = Once::new();

/// Route library logging to the test harness
pub fn init_logging() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}
