// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Types for handing per-class counters to a reporter.

use alloc::string::String;
use alloc::vec::Vec;
use serde::Deserialize;
use serde::Serialize;

/// A snapshot of one traffic class's counters.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClassStat {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub bytes_up: u64,
    pub bytes_down: u64,
    pub pkts_up: u64,
    pub pkts_down: u64,
}

impl ClassStat {
    /// Has this class been credited with any traffic?
    pub fn is_idle(&self) -> bool {
        self.bytes_up == 0 && self.bytes_down == 0
    }
}

/// The result of an analysis run, in class registry order.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Report {
    pub classes: Vec<ClassStat>,
}

impl Report {
    pub fn total_bytes(&self) -> u64 {
        self.classes.iter().map(|c| c.bytes_up + c.bytes_down).sum()
    }
}
