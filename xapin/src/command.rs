// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! XA statement construction and execution
//!
//! All statement text sent to a session is produced here from a verb, an
//! [`Xid`] encoded as hex literals, and fixed flag keywords. No caller-supplied
//! text reaches the session.

use crate::error::{translate, XaResult};
use crate::flags::{EndFlag, StartFlag};
use crate::session::{Row, Session};
use crate::xid::Xid;
use std::fmt;

/// One XA protocol statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XaCommand {
    Start(Xid, StartFlag),
    End(Xid, EndFlag),
    Prepare(Xid),
    Commit { xid: Xid, one_phase: bool },
    Rollback(Xid),
    Recover,
}

impl XaCommand {
    /// The branch this statement addresses, if any
    pub fn xid(&self) -> Option<&Xid> {
        match self {
            XaCommand::Start(xid, _)
            | XaCommand::End(xid, _)
            | XaCommand::Prepare(xid)
            | XaCommand::Commit { xid, .. }
            | XaCommand::Rollback(xid) => Some(xid),
            XaCommand::Recover => None,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            XaCommand::Start(..) => "START",
            XaCommand::End(..) => "END",
            XaCommand::Prepare(_) => "PREPARE",
            XaCommand::Commit { .. } => "COMMIT",
            XaCommand::Rollback(_) => "ROLLBACK",
            XaCommand::Recover => "RECOVER",
        }
    }

    /// Statement text as executed by the session
    pub fn to_sql(&self) -> String {
        match self {
            XaCommand::Start(xid, flag) => {
                let suffix = match flag {
                    StartFlag::None => "",
                    StartFlag::Join => " JOIN",
                    StartFlag::Resume => " RESUME",
                };
                format!("XA START {}{}", xid.to_command_text(), suffix)
            }
            XaCommand::End(xid, flag) => {
                let suffix = match flag {
                    EndFlag::Success => "",
                    EndFlag::Suspend => " SUSPEND",
                    EndFlag::Fail => " FAIL",
                };
                format!("XA END {}{}", xid.to_command_text(), suffix)
            }
            XaCommand::Prepare(xid) => format!("XA PREPARE {}", xid.to_command_text()),
            XaCommand::Commit { xid, one_phase } => format!(
                "XA COMMIT {}{}",
                xid.to_command_text(),
                if *one_phase { " ONE PHASE" } else { "" }
            ),
            XaCommand::Rollback(xid) => format!("XA ROLLBACK {}", xid.to_command_text()),
            XaCommand::Recover => "XA RECOVER".to_string(),
        }
    }
}

impl fmt::Display for XaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Execute a command on a session under its exclusive lock
///
/// The lock is held for the whole round trip and released on every exit
/// path. Native failures are translated before they propagate.
pub fn issue(session: &dyn Session, command: &XaCommand) -> XaResult<Vec<Row>> {
    let sql = command.to_sql();
    let _guard = session.lock();

    log::debug!("Issuing {}", sql);
    session.execute(&sql).map_err(|native| {
        log::warn!("{} failed with native error {}: {}", sql, native.code, native.message);
        translate(native)
    })
}
