// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use super::Direction;
use super::ip::Ipv4Addr;
use super::ip::Protocol;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// A captured packet, as recorded by the capture side.
///
/// Only the fields needed for classification are kept. `len` is the
/// number of bytes credited to whichever class the packet lands in.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Packet {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub proto: Protocol,
    pub dir: Direction,
    pub len: u64,
}

impl Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {}:{} -> {}:{} {} {}B",
            self.dir,
            self.src,
            self.src_port,
            self.dst,
            self.dst_port,
            self.proto,
            self.len,
        )
    }
}
