// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! A sorted CIDR index for narrowing the classes worth scoring.
//!
//! The index is a vector of slots sorted with [`compare()`]. Because
//! `compare()` calls any two overlapping subnets equal, a binary
//! search over it is only sound when the slots are pairwise disjoint.
//! Insertion keeps them that way: a subnet overlapping existing slots
//! swallows them into a single slot holding the widest subnet of the
//! lot and the union of their classes.
//!
//! Merging only ever widens a slot, so a lookup may return classes
//! whose own subnets miss the address. That is fine: the index selects
//! candidates, the scorer decides. What it must never do is miss a
//! class that matches, and it cannot, since every subnet of every class
//! lies inside exactly one slot holding that class.

use super::cidr::compare;
use super::class::Side;
use super::registry::ClassRegistry;
use core::cmp::Ordering;
use tally_api::Ipv4Addr;
use tally_api::Ipv4Cidr;
use tally_api::Packet;

/// A slot of the index: a subnet and the registry indices of every
/// class that declared it, or something inside it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CidrEntry {
    pub cidr: Ipv4Cidr,
    pub classes: Vec<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct CidrIndex {
    entries: Vec<CidrEntry>,
    // Classes declaring no subnet on either side.
    unanchored: Vec<usize>,
}

impl CidrIndex {
    /// Index every competing class of `registry`.
    pub fn build(registry: &ClassRegistry) -> Self {
        let mut index = Self::default();

        for (idx, class) in registry.classes().iter().enumerate().skip(1) {
            if !class.is_anchored() {
                index.unanchored.push(idx);
                continue;
            }

            for side in Side::ALL {
                for cidr in class.group(side).subnets() {
                    index.insert(*cidr, idx);
                }
            }
        }

        index
    }

    /// Add `class` under `cidr`, merging any slots it overlaps.
    pub fn insert(&mut self, cidr: Ipv4Cidr, class: usize) {
        let start = self
            .entries
            .partition_point(|e| compare(&e.cidr, &cidr) == Ordering::Less);
        let related = self.entries[start..]
            .iter()
            .take_while(|e| compare(&e.cidr, &cidr) == Ordering::Equal)
            .count();

        let mut slot = CidrEntry { cidr, classes: vec![class] };
        for old in self.entries.drain(start..start + related) {
            if old.cidr.prefix_len() < slot.cidr.prefix_len() {
                slot.cidr = old.cidr;
            }
            slot.classes.extend(old.classes);
        }
        slot.classes.sort_unstable();
        slot.classes.dedup();

        self.entries.insert(start, slot);
    }

    /// The classes of the slot holding `addr`, if any.
    pub fn lookup(&self, addr: Ipv4Addr) -> &[usize] {
        let host = Ipv4Cidr::host(addr);
        match self.entries.binary_search_by(|e| compare(&e.cidr, &host)) {
            Ok(i) => &self.entries[i].classes,
            Err(_) => &[],
        }
    }

    /// Every class that could match `pkt`, in registry order.
    pub fn candidates(&self, pkt: &Packet) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.unanchored.len() + 4);
        out.extend_from_slice(&self.unanchored);
        out.extend_from_slice(self.lookup(pkt.src));
        out.extend_from_slice(self.lookup(pkt.dst));
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn entries(&self) -> &[CidrEntry] {
        &self.entries
    }

    pub fn unanchored(&self) -> &[usize] {
        &self.unanchored
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tally_api::ClassSpec;
    use tally_api::Direction;
    use tally_api::PortSpec;
    use tally_api::Protocol;

    fn cidr(s: &str) -> Ipv4Cidr {
        s.parse().unwrap()
    }

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn disjoint_slots_stay_sorted() {
        let mut idx = CidrIndex::default();
        idx.insert(cidr("10.2.0.0/16"), 1);
        idx.insert(cidr("10.1.0.0/16"), 2);
        idx.insert(cidr("9.0.0.0/8"), 3);

        let nets: Vec<_> = idx.entries().iter().map(|e| e.cidr).collect();
        assert_eq!(
            nets,
            vec![cidr("9.0.0.0/8"), cidr("10.1.0.0/16"), cidr("10.2.0.0/16")]
        );
        assert_eq!(idx.lookup(ip("10.1.3.4")), &[2]);
        assert_eq!(idx.lookup(ip("9.9.9.9")), &[3]);
        assert!(idx.lookup(ip("10.3.0.1")).is_empty());
    }

    #[test]
    fn wider_subnet_swallows_narrower_ones() {
        let mut idx = CidrIndex::default();
        idx.insert(cidr("10.1.0.0/16"), 1);
        idx.insert(cidr("10.2.0.0/16"), 2);
        idx.insert(cidr("11.0.0.0/8"), 4);
        idx.insert(cidr("10.0.0.0/8"), 3);

        assert_eq!(idx.entries().len(), 2);
        assert_eq!(idx.entries()[0].cidr, cidr("10.0.0.0/8"));
        assert_eq!(idx.entries()[0].classes, vec![1, 2, 3]);
        assert_eq!(idx.lookup(ip("10.200.0.1")), &[1, 2, 3]);
        assert_eq!(idx.lookup(ip("11.0.0.1")), &[4]);
    }

    #[test]
    fn narrower_subnet_joins_wider_slot() {
        let mut idx = CidrIndex::default();
        idx.insert(cidr("10.0.0.0/8"), 2);
        idx.insert(cidr("10.0.0.0/24"), 1);
        idx.insert(cidr("10.0.0.0/24"), 1);

        assert_eq!(idx.entries().len(), 1);
        assert_eq!(idx.entries()[0].cidr, cidr("10.0.0.0/8"));
        assert_eq!(idx.entries()[0].classes, vec![1, 2]);
    }

    #[test]
    fn candidates_from_registry() {
        let mut web = ClassSpec::new(1, "web");
        web.outside.ports.push(PortSpec::any(443));
        let mut lan = ClassSpec::new(2, "lan");
        lan.inside.subnets.push(cidr("192.168.0.0/16"));
        let mut dns = ClassSpec::new(3, "dns");
        dns.outside.subnets.push(cidr("8.8.8.0/24"));
        let reg = ClassRegistry::new(&[web, lan, dns]).unwrap();
        let idx = CidrIndex::build(&reg);

        assert_eq!(idx.unanchored(), &[1]);

        let pkt = Packet {
            src: ip("192.168.1.1"),
            dst: ip("8.8.8.8"),
            src_port: 5353,
            dst_port: 53,
            proto: Protocol::UDP,
            dir: Direction::Out,
            len: 80,
        };
        assert_eq!(idx.candidates(&pkt), vec![1, 2, 3]);

        let pkt = Packet { dst: ip("1.1.1.1"), ..pkt };
        assert_eq!(idx.candidates(&pkt), vec![1, 2]);
    }
}
