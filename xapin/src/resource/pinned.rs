// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Resource manager with branch pinning
//!
//! A pool may reclaim a connection between `end`/`prepare` and the final
//! `commit`/`rollback` of a branch, and hand the same physical session out
//! again behind a new wrapper. The coordinator only knows the [`Xid`], so each
//! verb first resolves which session holds the branch:
//!
//! 1. The branch this instance itself started runs on the own session without
//!    touching the registry.
//! 2. An unknown branch is published with the own session as owner
//!    (insert-if-absent; a concurrent winner's session is used instead).
//! 3. A known branch runs on the owning session under its exclusive lock, and
//!    this instance's association is cleared afterwards.
//!
//! The association slot is shared with the pin it was published with.
//! Whichever instance removes the pin also clears the slot, so a branch
//! completed elsewhere never reaches the fast path again.
//!
//! Successful `commit` and `rollback` release the pin. A failure leaves the
//! pin in place so the verb can be retried against the same session, except
//! when the call published the pin itself and the server does not know the
//! branch: that pin is withdrawn again.

use super::{recover_on, ResourceManagerIdentity, ResourceManagerKind, XaResource};
use crate::command::{issue, XaCommand};
use crate::config::EndpointConfig;
use crate::error::{XaError, XaErrorKind, XaResult};
use crate::flags::{EndFlag, ScanFlag, StartFlag, Vote};
use crate::registry::{Association, BranchRegistry};
use crate::session::SessionHandle;
use crate::xid::Xid;
use parking_lot::Mutex;
use std::sync::Arc;

/// Whether a successful command finishes the branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Continues,
    Completes,
}

pub struct PinnedXaResource {
    session: SessionHandle,
    endpoint: EndpointConfig,
    registry: Arc<BranchRegistry>,
    /// Branch this instance published and still holds; shared with the pin so
    /// that releasing it from any instance clears the slot
    associated: Association,
}

impl PinnedXaResource {
    /// Pinned resource manager using the process-wide registry
    pub fn new(session: SessionHandle, endpoint: EndpointConfig) -> Self {
        Self::with_registry(session, endpoint, BranchRegistry::global())
    }

    pub fn with_registry(
        session: SessionHandle,
        endpoint: EndpointConfig,
        registry: Arc<BranchRegistry>,
    ) -> Self {
        Self {
            session,
            endpoint,
            registry,
            associated: Arc::new(Mutex::new(None)),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn registry(&self) -> &Arc<BranchRegistry> {
        &self.registry
    }

    /// The branch currently associated with this instance
    pub fn associated_xid(&self) -> Option<Xid> {
        self.associated.lock().clone()
    }

    fn is_associated(&self, xid: &Xid) -> bool {
        self.associated.lock().as_ref() == Some(xid)
    }

    fn clear_association(&self, xid: &Xid) {
        let mut associated = self.associated.lock();
        if associated.as_ref() == Some(xid) {
            *associated = None;
        }
    }

    fn dispatch(&self, command: XaCommand, lifecycle: Lifecycle) -> XaResult<()> {
        let xid = match command.xid() {
            Some(xid) => xid.clone(),
            None => {
                return Err(XaError::invalid_argument(format!(
                    "XA {} does not address a branch",
                    command.verb()
                )))
            }
        };

        if self.is_associated(&xid) {
            issue(self.session.as_ref(), &command)?;
            if lifecycle == Lifecycle::Completes {
                self.registry.release_if_owned(&xid, &self.session);
                self.clear_association(&xid);
            }
            return Ok(());
        }

        match self.registry.lookup(&xid) {
            None => self.dispatch_new_branch(&xid, &command, lifecycle),
            Some(owner) => {
                let result = issue(owner.as_ref(), &command);
                *self.associated.lock() = None;
                if result.is_ok() && lifecycle == Lifecycle::Completes {
                    self.registry.release_if_owned(&xid, &owner);
                }
                result.map(|_| ())
            }
        }
    }

    fn dispatch_new_branch(
        &self,
        xid: &Xid,
        command: &XaCommand,
        lifecycle: Lifecycle,
    ) -> XaResult<()> {
        let (pin, published) =
            self.registry
                .publish_pin(xid, self.session.clone(), Some(&self.associated));

        match issue(pin.session().as_ref(), command) {
            Ok(_) => {
                if lifecycle == Lifecycle::Completes {
                    self.registry.release_pin(xid, &pin);
                    self.clear_association(xid);
                }
                Ok(())
            }
            Err(err) => {
                if published && err.kind() == XaErrorKind::BranchUnknown {
                    if self.registry.release_pin(xid, &pin) {
                        log::info!("Withdrew pin for {} after failed XA {}", xid, command.verb());
                    }
                    self.clear_association(xid);
                }
                Err(err)
            }
        }
    }
}

impl XaResource for PinnedXaResource {
    fn start(&self, xid: &Xid, flag: StartFlag) -> XaResult<()> {
        // JOIN and RESUME both resume the pinned branch
        let flag = match flag {
            StartFlag::None => StartFlag::None,
            StartFlag::Join | StartFlag::Resume => StartFlag::Resume,
        };
        self.dispatch(XaCommand::Start(xid.clone(), flag), Lifecycle::Continues)
    }

    fn end(&self, xid: &Xid, flag: EndFlag) -> XaResult<()> {
        self.dispatch(XaCommand::End(xid.clone(), flag), Lifecycle::Continues)
    }

    fn prepare(&self, xid: &Xid) -> XaResult<Vote> {
        self.dispatch(XaCommand::Prepare(xid.clone()), Lifecycle::Continues)?;
        Ok(Vote::Ok)
    }

    fn commit(&self, xid: &Xid, one_phase: bool) -> XaResult<()> {
        self.dispatch(
            XaCommand::Commit {
                xid: xid.clone(),
                one_phase,
            },
            Lifecycle::Completes,
        )
    }

    fn rollback(&self, xid: &Xid) -> XaResult<()> {
        self.dispatch(XaCommand::Rollback(xid.clone()), Lifecycle::Completes)
    }

    fn forget(&self, xid: &Xid) -> XaResult<()> {
        self.registry.release(xid);
        self.clear_association(xid);
        log::debug!("forget {} released local pin", xid);
        Ok(())
    }

    fn recover(&self, flag: ScanFlag) -> XaResult<Vec<Xid>> {
        recover_on(self.session.as_ref(), flag)
    }

    fn identity(&self) -> ResourceManagerIdentity {
        ResourceManagerIdentity {
            kind: ResourceManagerKind::Pinned,
            endpoint: self.endpoint.clone(),
        }
    }
}
