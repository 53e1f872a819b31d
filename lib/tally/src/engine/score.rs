// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Match scoring.
//!
//! A score ranks how well a class fits a packet. Zero means the class
//! does not match at all; otherwise the score is the sum of the
//! per-group contributions:
//!
//! * subnet group: the prefix length of the most specific matching
//!   subnet, or [`WILDCARD_SCORE`] when the group is empty;
//! * port group: [`PORT_MATCH_SCORE`] when a port matched, nothing
//!   when the group is empty.
//!
//! A port match outweighs any pair of subnet wildcards plus a /8, so a
//! class naming the exact service beats a class naming only a wide
//! network.

use super::class::Group;
use super::class::Side;
use super::class::TrafficClass;
use tally_api::Ipv4Addr;
use tally_api::Packet;
use tally_api::Protocol;

/// Contribution of an empty subnet group.
pub const WILDCARD_SCORE: u32 = 1;

/// Contribution of a matching port group.
pub const PORT_MATCH_SCORE: u32 = 16;

impl Group {
    /// Score the subnet half of the group, `None` if it fails.
    ///
    /// A matching /0 still counts as [`WILDCARD_SCORE`] so that a match
    /// never scores zero.
    pub fn subnet_score(&self, addr: Ipv4Addr) -> Option<u32> {
        if self.subnets().is_empty() {
            return Some(WILDCARD_SCORE);
        }

        self.subnets()
            .iter()
            .filter(|s| s.is_member(addr))
            .map(|s| u32::from(s.prefix_len()).max(WILDCARD_SCORE))
            .max()
    }

    /// Score the port half of the group, `None` if it fails.
    pub fn port_score(&self, port: u16, proto: Protocol) -> Option<u32> {
        if self.ports().is_empty() {
            return Some(0);
        }

        self.ports()
            .iter()
            .any(|p| p.matches(port, proto))
            .then_some(PORT_MATCH_SCORE)
    }

    fn score(&self, side: Side, pkt: &Packet) -> Option<u32> {
        let (addr, port) = side.endpoint(pkt);
        Some(self.subnet_score(addr)? + self.port_score(port, pkt.proto)?)
    }
}

impl TrafficClass {
    /// Score `pkt` against this class, 0 if it does not match.
    pub fn score(&self, pkt: &Packet) -> u32 {
        if !self.protocol_match(pkt.proto) {
            return 0;
        }

        Side::ALL
            .iter()
            .map(|&side| self.group(side).score(side, pkt))
            .sum::<Option<u32>>()
            .unwrap_or(0)
    }
}

/// Score `pkt` against `class`, 0 if it does not match.
#[inline]
pub fn score(class: &TrafficClass, pkt: &Packet) -> u32 {
    class.score(pkt)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::engine::predicate::matches;
    use proptest::prelude::*;
    use tally_api::ClassSpec;
    use tally_api::Direction;
    use tally_api::Ipv4Cidr;
    use tally_api::PortSpec;

    // Small address and port spaces so that random classes actually
    // match random packets now and then.
    fn addr() -> impl Strategy<Value = Ipv4Addr> {
        (0..4u8, 0..4u8).prop_map(|(a, b)| Ipv4Addr::from([10, a, b, 1]))
    }

    fn cidr() -> impl Strategy<Value = Ipv4Cidr> {
        (addr(), prop::sample::select(vec![0u8, 8, 16, 24, 32]))
            .prop_map(|(ip, len)| Ipv4Cidr::new_checked(ip, len).unwrap())
    }

    fn proto() -> impl Strategy<Value = Protocol> {
        prop::sample::select(vec![Protocol::TCP, Protocol::UDP])
    }

    fn port_spec() -> impl Strategy<Value = PortSpec> {
        (1..4u16, prop::option::of(proto()))
            .prop_map(|(n, p)| PortSpec::new(n, p))
    }

    fn class() -> impl Strategy<Value = TrafficClass> {
        (
            prop::option::of(proto()),
            prop::collection::vec(cidr(), 0..3),
            prop::collection::vec(port_spec(), 0..3),
            prop::collection::vec(cidr(), 0..3),
            prop::collection::vec(port_spec(), 0..3),
        )
            .prop_map(|(protocol, os, op, is, ip)| {
                let mut spec = ClassSpec::new(1, "random");
                spec.protocol = protocol;
                spec.outside.subnets = os;
                spec.outside.ports = op;
                spec.inside.subnets = is;
                spec.inside.ports = ip;
                TrafficClass::from_spec(&spec).unwrap()
            })
    }

    fn packet() -> impl Strategy<Value = Packet> {
        (addr(), addr(), 1..4u16, 1..4u16, proto(), any::<bool>()).prop_map(
            |(src, dst, src_port, dst_port, proto, inbound)| Packet {
                src,
                dst,
                src_port,
                dst_port,
                proto,
                dir: if inbound { Direction::In } else { Direction::Out },
                len: 1,
            },
        )
    }

    proptest! {
        #[test]
        fn score_is_positive_iff_match(c in class(), p in packet()) {
            prop_assert_eq!(score(&c, &p) > 0, matches(&c, &p));
        }
    }
}
