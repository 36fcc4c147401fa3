// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! XA verb flags
//!
//! The X/Open API passes flags as integer bitmasks. Internally each verb takes
//! a closed enum; the `from_bits` constructors are the only way in from raw
//! integers and they reject anything a verb does not accept.

use crate::error::{XaError, XaResult};

/// Raw X/Open flag values
pub mod raw {
    pub const TMNOFLAGS: i32 = 0x0000_0000;
    pub const TMJOIN: i32 = 0x0020_0000;
    pub const TMENDRSCAN: i32 = 0x0080_0000;
    pub const TMSTARTRSCAN: i32 = 0x0100_0000;
    pub const TMSUSPEND: i32 = 0x0200_0000;
    pub const TMSUCCESS: i32 = 0x0400_0000;
    pub const TMRESUME: i32 = 0x0800_0000;
    pub const TMFAIL: i32 = 0x2000_0000;
    pub const TMONEPHASE: i32 = 0x4000_0000;
}

/// Flag accepted by `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StartFlag {
    #[default]
    None,
    Join,
    Resume,
}

impl StartFlag {
    pub fn from_bits(bits: i32) -> XaResult<Self> {
        match bits {
            raw::TMNOFLAGS => Ok(StartFlag::None),
            raw::TMJOIN => Ok(StartFlag::Join),
            raw::TMRESUME => Ok(StartFlag::Resume),
            other => Err(XaError::invalid_argument(format!(
                "invalid start flag 0x{:08X}",
                other
            ))),
        }
    }

    pub fn bits(&self) -> i32 {
        match self {
            StartFlag::None => raw::TMNOFLAGS,
            StartFlag::Join => raw::TMJOIN,
            StartFlag::Resume => raw::TMRESUME,
        }
    }
}

/// Flag accepted by `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EndFlag {
    #[default]
    Success,
    Suspend,
    Fail,
}

impl EndFlag {
    pub fn from_bits(bits: i32) -> XaResult<Self> {
        match bits {
            raw::TMSUCCESS => Ok(EndFlag::Success),
            raw::TMSUSPEND => Ok(EndFlag::Suspend),
            raw::TMFAIL => Ok(EndFlag::Fail),
            other => Err(XaError::invalid_argument(format!(
                "invalid end flag 0x{:08X}",
                other
            ))),
        }
    }

    pub fn bits(&self) -> i32 {
        match self {
            EndFlag::Success => raw::TMSUCCESS,
            EndFlag::Suspend => raw::TMSUSPEND,
            EndFlag::Fail => raw::TMFAIL,
        }
    }
}

/// Flag accepted by `recover`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanFlag {
    #[default]
    None,
    Start,
    End,
    Both,
}

impl ScanFlag {
    pub fn from_bits(bits: i32) -> XaResult<Self> {
        const SCAN_BITS: i32 = raw::TMSTARTRSCAN | raw::TMENDRSCAN;
        if bits & !SCAN_BITS != 0 {
            return Err(XaError::invalid_argument(format!(
                "invalid recover flags 0x{:08X}",
                bits
            )));
        }

        let start = bits & raw::TMSTARTRSCAN != 0;
        let end = bits & raw::TMENDRSCAN != 0;
        Ok(match (start, end) {
            (false, false) => ScanFlag::None,
            (true, false) => ScanFlag::Start,
            (false, true) => ScanFlag::End,
            (true, true) => ScanFlag::Both,
        })
    }

    pub fn bits(&self) -> i32 {
        match self {
            ScanFlag::None => raw::TMNOFLAGS,
            ScanFlag::Start => raw::TMSTARTRSCAN,
            ScanFlag::End => raw::TMENDRSCAN,
            ScanFlag::Both => raw::TMSTARTRSCAN | raw::TMENDRSCAN,
        }
    }

    /// Whether this call opens a recovery scan
    pub fn starts_scan(&self) -> bool {
        matches!(self, ScanFlag::Start | ScanFlag::Both)
    }
}

/// Outcome of `prepare`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vote {
    /// Read-write branch, ready to commit
    Ok,
    /// Read-only branch, already released
    ReadOnly,
}

impl Vote {
    pub fn xa_code(&self) -> i32 {
        match self {
            Vote::Ok => 0,
            Vote::ReadOnly => 3,
        }
    }
}
