// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Resource manager bound to a single session
//!
//! Every verb executes on the connection's own session. Branch state lives
//! on the server only; nothing is tracked here.

use super::{recover_on, ResourceManagerIdentity, ResourceManagerKind, XaResource};
use crate::command::{issue, XaCommand};
use crate::config::EndpointConfig;
use crate::error::XaResult;
use crate::flags::{EndFlag, ScanFlag, StartFlag, Vote};
use crate::session::SessionHandle;
use crate::xid::Xid;

pub struct UnpinnedXaResource {
    session: SessionHandle,
    endpoint: EndpointConfig,
}

impl UnpinnedXaResource {
    pub fn new(session: SessionHandle, endpoint: EndpointConfig) -> Self {
        Self { session, endpoint }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn run(&self, command: XaCommand) -> XaResult<()> {
        issue(self.session.as_ref(), &command).map(|_| ())
    }
}

impl XaResource for UnpinnedXaResource {
    fn start(&self, xid: &Xid, flag: StartFlag) -> XaResult<()> {
        self.run(XaCommand::Start(xid.clone(), flag))
    }

    fn end(&self, xid: &Xid, flag: EndFlag) -> XaResult<()> {
        self.run(XaCommand::End(xid.clone(), flag))
    }

    fn prepare(&self, xid: &Xid) -> XaResult<Vote> {
        self.run(XaCommand::Prepare(xid.clone()))?;
        Ok(Vote::Ok)
    }

    fn commit(&self, xid: &Xid, one_phase: bool) -> XaResult<()> {
        self.run(XaCommand::Commit {
            xid: xid.clone(),
            one_phase,
        })
    }

    fn rollback(&self, xid: &Xid) -> XaResult<()> {
        self.run(XaCommand::Rollback(xid.clone()))
    }

    fn forget(&self, xid: &Xid) -> XaResult<()> {
        // Heuristic completion is not supported by the server
        log::debug!("forget {} is a no-op", xid);
        Ok(())
    }

    fn recover(&self, flag: ScanFlag) -> XaResult<Vec<Xid>> {
        recover_on(self.session.as_ref(), flag)
    }

    fn identity(&self) -> ResourceManagerIdentity {
        ResourceManagerIdentity {
            kind: ResourceManagerKind::Unpinned,
            endpoint: self.endpoint.clone(),
        }
    }
}
