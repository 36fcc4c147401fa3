// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pooled connection wrapper
//!
//! A pool hands out one [`PooledConnection`] per checkout. The wrapper is
//! transient; the session it wraps outlives it and may be wrapped again by a
//! later checkout.

use crate::config::{PinningMode, XaConfig};
use crate::registry::BranchRegistry;
use crate::resource::{PinnedXaResource, UnpinnedXaResource, XaResource};
use crate::session::SessionHandle;
use std::sync::Arc;

/// Session handed out by a pool, together with its XA configuration
pub struct PooledConnection {
    session: SessionHandle,
    config: XaConfig,
    registry: Arc<BranchRegistry>,
}

impl PooledConnection {
    /// Wrap a session; pinned resources use the process-wide registry
    pub fn new(session: SessionHandle, config: XaConfig) -> Self {
        Self::with_registry(session, config, BranchRegistry::global())
    }

    /// Wrap a session with an explicit registry for pinned resources
    pub fn with_registry(
        session: SessionHandle,
        config: XaConfig,
        registry: Arc<BranchRegistry>,
    ) -> Self {
        Self {
            session,
            config,
            registry,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn config(&self) -> &XaConfig {
        &self.config
    }

    /// Resource manager for this checkout, selected by the pinning mode
    pub fn xa_resource(&self) -> Box<dyn XaResource> {
        match self.config.pinning {
            PinningMode::Unpinned => Box::new(UnpinnedXaResource::new(
                self.session.clone(),
                self.config.endpoint.clone(),
            )),
            PinningMode::Pinned => Box::new(PinnedXaResource::with_registry(
                self.session.clone(),
                self.config.endpoint.clone(),
                self.registry.clone(),
            )),
        }
    }
}
