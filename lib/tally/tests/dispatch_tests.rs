// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! End-to-end dispatch tests.

pub mod common;

use common::*;

// Every packet lands in exactly one class: the LAN class takes the
// packets whose inside endpoint sits in 1.0.0.0/8, except the one aimed
// at port 12, where the port class scores higher. The packet from
// 8.8.8.8 into 2.2.2.2 belongs to nobody.
#[test]
fn lan_and_port_scenario() {
    let reg = ClassRegistry::new(&lan_and_port_classes()).unwrap();
    let pkts = lan_and_port_packets();

    let claimed: Vec<bool> = pkts.iter().map(|p| reg.dispatch(p)).collect();
    assert_eq!(claimed, vec![true, true, true, false]);

    assert_eq!(bytes(&reg, 0), (0, 10));
    assert_eq!(bytes(&reg, 1), (10, 10));
    assert_eq!(bytes(&reg, 2), (10, 0));

    let report = reg.report(false);
    assert_eq!(report.total_bytes(), 40);
    let names: Vec<&str> =
        report.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["default", "c1", "c2"]);
}

#[test]
fn lan_and_port_scenario_parallel_indexed() {
    let reg = ClassRegistry::new(&lan_and_port_classes()).unwrap();
    let stats = Dispatcher::new(&reg)
        .indexed(true)
        .dispatch_all(&lan_and_port_packets(), 3)
        .unwrap();

    assert_eq!(
        stats,
        DispatchStats { packets: 4, matched: 3, unmatched: 1, bytes: 40 }
    );
    assert_eq!(bytes(&reg, 0), (0, 10));
    assert_eq!(bytes(&reg, 1), (10, 10));
    assert_eq!(bytes(&reg, 2), (10, 0));
}

// Under first-match the LAN class is declared first and takes the
// port 12 packet too.
#[test]
fn lan_and_port_scenario_first_match() {
    let reg = ClassRegistry::new(&lan_and_port_classes()).unwrap();
    Dispatcher::new(&reg)
        .policy(MatchPolicy::FirstMatch)
        .dispatch_all(&lan_and_port_packets(), 1)
        .unwrap();

    assert_eq!(bytes(&reg, 0), (0, 10));
    assert_eq!(bytes(&reg, 1), (20, 10));
    assert_eq!(bytes(&reg, 2), (0, 0));
}

#[test]
fn concurrent_dispatch_loses_nothing() {
    let lan = || {
        let mut all = ClassSpec::new(1, "all");
        all.inside.subnets.push(cidr("10.0.0.0/8"));
        ClassRegistry::new(&[all]).unwrap()
    };

    let pkts: Vec<Packet> = (0..10_000u64)
        .map(|i| {
            let len = i % 1500 + 1;
            if i % 2 == 0 {
                pkt("10.0.0.1", 1000, "1.1.1.1", 80, len, Out)
            } else {
                pkt("1.1.1.1", 80, "10.0.0.1", 1000, len, In)
            }
        })
        .collect();
    let up: u64 = pkts.iter().filter(|p| p.dir == Out).map(|p| p.len).sum();
    let down: u64 = pkts.iter().filter(|p| p.dir == In).map(|p| p.len).sum();

    for workers in [1, 2, 3, 8, 64] {
        let reg = lan();
        let stats =
            Dispatcher::new(&reg).dispatch_all(&pkts, workers).unwrap();

        assert_eq!(stats.matched, 10_000);
        assert_eq!(bytes(&reg, 1), (up, down), "workers = {workers}");
        assert_eq!(reg.get(1).unwrap().stats().pkts_up(), 5_000);
        assert_eq!(reg.get(1).unwrap().stats().pkts_down(), 5_000);
    }

    // More workers than packets.
    let reg = lan();
    let stats = Dispatcher::new(&reg).dispatch_all(&pkts[..3], 16).unwrap();
    assert_eq!(stats.packets, 3);
}

#[test]
fn specific_class_beats_broad_class() {
    let mut broad = ClassSpec::new(1, "broad");
    broad.outside.subnets.push(cidr("0.0.0.0/0"));
    let mut narrow = ClassSpec::new(2, "narrow");
    narrow.outside.subnets.push(cidr("93.184.216.0/24"));
    narrow.outside.ports.push(PortSpec::new(443, Some(Protocol::TCP)));
    let reg = ClassRegistry::new(&[broad, narrow]).unwrap();

    reg.dispatch(&pkt("10.0.0.1", 5000, "93.184.216.34", 443, 100, Out));
    reg.dispatch(&pkt("10.0.0.1", 5000, "93.184.216.34", 80, 100, Out));
    assert_eq!(bytes(&reg, 1), (100, 0));
    assert_eq!(bytes(&reg, 2), (100, 0));
}
