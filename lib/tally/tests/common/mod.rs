// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Common routines for integration tests.

// This type of pedantry is more trouble than its worth here.
#![allow(dead_code)]

// Let's make our lives easier and pub use a bunch of stuff.
pub use tally::api::ClassSpec;
pub use tally::api::Direction::*;
pub use tally::api::Ipv4Addr;
pub use tally::api::Ipv4Cidr;
pub use tally::api::Packet;
pub use tally::api::PortSpec;
pub use tally::api::Protocol;
pub use tally::engine::dispatch::DispatchStats;
pub use tally::engine::dispatch::Dispatcher;
pub use tally::engine::dispatch::MatchPolicy;
pub use tally::engine::registry::ClassRegistry;

use tally::api::Direction;

/// Build a packet from its textual parts.
pub fn pkt(
    src: &str,
    src_port: u16,
    dst: &str,
    dst_port: u16,
    len: u64,
    dir: Direction,
) -> Packet {
    Packet {
        src: src.parse().unwrap(),
        dst: dst.parse().unwrap(),
        src_port,
        dst_port,
        proto: Protocol::TCP,
        dir,
        len,
    }
}

pub fn cidr(s: &str) -> Ipv4Cidr {
    s.parse().unwrap()
}

/// The (bytes up, bytes down) of class `id`.
pub fn bytes(reg: &ClassRegistry, id: u32) -> (u64, u64) {
    let stats = reg.get(id).unwrap().stats();
    (stats.bytes_up(), stats.bytes_down())
}

/// Default, a class for the 1.0.0.0/8 LAN, and a class for anything
/// talking to port 12 on the outside.
pub fn lan_and_port_classes() -> Vec<ClassSpec> {
    let mut c1 = ClassSpec::new(1, "c1");
    c1.inside.subnets.push(cidr("1.0.0.0/8"));
    let mut c2 = ClassSpec::new(2, "c2");
    c2.outside.ports.push(PortSpec::any(12));
    vec![c1, c2]
}

pub fn lan_and_port_packets() -> Vec<Packet> {
    vec![
        pkt("1.1.1.1", 1, "2.2.2.2", 11, 10, Out),
        pkt("1.1.1.1", 2, "3.3.3.3", 12, 10, Out),
        pkt("2.2.2.2", 11, "1.1.1.1", 1, 10, In),
        pkt("8.8.8.8", 53, "2.2.2.2", 1, 10, In),
    ]
}
