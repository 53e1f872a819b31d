// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Class match predicates.
//!
//! A class is a conjunction: its protocol filter and each of its four
//! groups (outside subnets, inside subnets, outside ports, inside
//! ports) must hold. Each group is a disjunction over its entries, and
//! an empty group holds for every packet.

use super::class::Group;
use super::class::Side;
use super::class::TrafficClass;
use tally_api::Direction;
use tally_api::Ipv4Addr;
use tally_api::Packet;
use tally_api::Protocol;

impl Side {
    /// The packet endpoint playing this side's role.
    ///
    /// The outside endpoint is the one on the Internet: the source of
    /// an inbound packet and the destination of an outbound one. The
    /// inside endpoint is the other one.
    pub fn endpoint(self, pkt: &Packet) -> (Ipv4Addr, u16) {
        let src = (pkt.src, pkt.src_port);
        let dst = (pkt.dst, pkt.dst_port);

        match (self, pkt.dir) {
            (Side::Outside, Direction::In) => src,
            (Side::Outside, Direction::Out) => dst,
            (Side::Inside, Direction::In) => dst,
            (Side::Inside, Direction::Out) => src,
        }
    }
}

impl Group {
    /// Does `addr` satisfy the subnet half of this group?
    pub fn subnets_match(&self, addr: Ipv4Addr) -> bool {
        self.subnets().is_empty()
            || self.subnets().iter().any(|s| s.is_member(addr))
    }

    /// Does `port` over `proto` satisfy the port half of this group?
    pub fn ports_match(&self, port: u16, proto: Protocol) -> bool {
        self.ports().is_empty()
            || self.ports().iter().any(|p| p.matches(port, proto))
    }

    fn is_match(&self, side: Side, pkt: &Packet) -> bool {
        let (addr, port) = side.endpoint(pkt);
        self.subnets_match(addr) && self.ports_match(port, pkt.proto)
    }
}

impl TrafficClass {
    /// Does the class protocol filter admit `proto`?
    pub fn protocol_match(&self, proto: Protocol) -> bool {
        self.protocol().is_none_or(|p| p == proto)
    }

    /// Does `pkt` satisfy every constraint of this class?
    pub fn is_match(&self, pkt: &Packet) -> bool {
        self.protocol_match(pkt.proto)
            && Side::ALL.iter().all(|&side| self.group(side).is_match(side, pkt))
    }
}

/// Does `pkt` belong to `class`?
#[inline]
pub fn matches(class: &TrafficClass, pkt: &Packet) -> bool {
    class.is_match(pkt)
}
