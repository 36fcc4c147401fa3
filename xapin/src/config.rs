// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Resource manager configuration
//!
//! [`EndpointConfig`] identifies the server a resource manager talks to and is
//! what `is_same_rm` compares. [`PinningMode`] decides which resource manager
//! variant a pooled connection hands out.

use serde::{Deserialize, Serialize};

/// Target endpoint identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

impl EndpointConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            database: None,
            user: None,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new("localhost", 3306)
    }
}

/// Branch pinning mode for pooled connections
///
/// # Modes
///
/// - **Unpinned**: every verb runs on the connection's own session. The
///   transaction manager must drive a branch through a single connection.
///
/// - **Pinned**: a branch stays bound to the session that started it, across
///   pool checkout and return. Any connection can issue later verbs for the
///   branch and they are routed to the owning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinningMode {
    #[default]
    Unpinned,
    Pinned,
}

impl PinningMode {
    pub fn is_pinned(&self) -> bool {
        matches!(self, PinningMode::Pinned)
    }
}

/// Complete XA configuration for a pooled connection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XaConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub pinning: PinningMode,
}

impl XaConfig {
    pub fn new(endpoint: EndpointConfig, pinning: PinningMode) -> Self {
        Self { endpoint, pinning }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
