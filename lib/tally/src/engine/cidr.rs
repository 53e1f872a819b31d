// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Subnet algebra: masks, membership, containment and ordering.
//!
//! Addresses and masks are both [`Ipv4Addr`] values, which keep their
//! octets in network order. Mixing a host-order mask with a wire-order
//! address would silently break every comparison below, so there is
//! deliberately no way to build a mask from a bare `u32` here.

use core::cmp::Ordering;
use tally_api::Ipv4Addr;
use tally_api::Ipv4Cidr;
use tally_api::Ipv4PrefixLen;

/// Build the netmask for a prefix length: the top `prefix_len` bits
/// set, the rest clear.
pub fn mask_from_prefix(prefix_len: Ipv4PrefixLen) -> Ipv4Addr {
    prefix_len.to_netmask()
}

/// Is `addr` in `network` under `mask`, i.e. `(addr & mask) == network`?
pub fn in_network(addr: Ipv4Addr, network: Ipv4Addr, mask: Ipv4Addr) -> bool {
    addr.in_network(network, mask)
}

/// How two subnets relate to each other.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Containment {
    /// Same network, same mask.
    Equal,
    /// The first subnet contains the second.
    AContainsB,
    /// The second subnet contains the first.
    BContainsA,
    /// No address is in both.
    Disjoint,
}

impl Containment {
    /// The same relation seen from the other side.
    pub fn reverse(self) -> Self {
        match self {
            Self::AContainsB => Self::BContainsA,
            Self::BContainsA => Self::AContainsB,
            other => other,
        }
    }

    pub fn is_disjoint(self) -> bool {
        self == Self::Disjoint
    }
}

/// Classify the relation between `a` and `b`.
///
/// Containment is decided by network membership: `a` contains `b` when
/// `b`'s network address lies in `a`. Two CIDRs sharing a network
/// address but not a prefix length are both "in" each other by that
/// test alone, so the wider prefix is required of the container. This
/// keeps `contains(a, b)` the exact mirror of `contains(b, a)`.
pub fn contains(a: &Ipv4Cidr, b: &Ipv4Cidr) -> Containment {
    if a == b {
        Containment::Equal
    } else if a.prefix_len() <= b.prefix_len() && a.is_member(b.ip()) {
        Containment::AContainsB
    } else if b.prefix_len() <= a.prefix_len() && b.is_member(a.ip()) {
        Containment::BContainsA
    } else {
        Containment::Disjoint
    }
}

/// Order two subnets for sorting and binary search.
///
/// Any two subnets that overlap compare `Equal`; disjoint subnets
/// order by network address. This is not a total order over arbitrary
/// sets (10.0.0.0/8 equals both 10.1.0.0/16 and 10.2.0.0/16, which
/// are not equal to each other), so a sorted slice searched with it must
/// hold pairwise disjoint subnets. See [`super::index::CidrIndex`].
pub fn compare(a: &Ipv4Cidr, b: &Ipv4Cidr) -> Ordering {
    if contains(a, b).is_disjoint() {
        a.ip().cmp(&b.ip())
    } else {
        Ordering::Equal
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cidr(s: &str) -> Ipv4Cidr {
        s.parse().unwrap()
    }

    #[test]
    fn mask_from_prefix_ends() {
        let all_zero = mask_from_prefix(Ipv4PrefixLen::NETMASK_NONE);
        let all_one = mask_from_prefix(Ipv4PrefixLen::NETMASK_ALL);
        let m24 = mask_from_prefix(Ipv4PrefixLen::new(24).unwrap());
        assert_eq!(all_zero.bytes(), [0, 0, 0, 0]);
        assert_eq!(all_one.bytes(), [255, 255, 255, 255]);
        assert_eq!(m24.bytes(), [255, 255, 255, 0]);
    }

    #[test]
    fn in_network_examples() {
        let ip = |s: &str| s.parse::<Ipv4Addr>().unwrap();
        let mask = |n| mask_from_prefix(Ipv4PrefixLen::new(n).unwrap());

        assert!(in_network(ip("192.168.1.1"), ip("192.168.1.0"), mask(24)));
        assert!(!in_network(ip("192.168.1.1"), ip("192.168.2.0"), mask(24)));
        assert!(!in_network(ip("192.168.1.33"), ip("192.168.1.0"), mask(27)));
        assert!(in_network(ip("172.18.1.1"), ip("172.16.0.0"), mask(12)));
    }

    #[test]
    fn b_contains_a() {
        let a = cidr("10.1.0.0/16");
        let b = cidr("10.0.0.0/8");
        assert_eq!(contains(&a, &b), Containment::BContainsA);
        assert_eq!(contains(&b, &a), Containment::AContainsB);
    }

    #[test]
    fn equal() {
        let a = cidr("10.0.0.0/16");
        let b = cidr("10.0.0.0/16");
        assert_eq!(contains(&a, &b), Containment::Equal);
        assert_eq!(contains(&b, &a), Containment::Equal);
    }

    #[test]
    fn disjoint() {
        let a = cidr("10.1.0.0/16");
        let b = cidr("10.2.0.0/16");
        assert_eq!(contains(&a, &b), Containment::Disjoint);
        assert_eq!(contains(&b, &a), Containment::Disjoint);
    }

    // Same network address, different prefix: only the wider one is a
    // container.
    #[test]
    fn shared_network_address() {
        let wide = cidr("10.0.0.0/8");
        let narrow = cidr("10.0.0.0/16");
        assert_eq!(contains(&wide, &narrow), Containment::AContainsB);
        assert_eq!(contains(&narrow, &wide), Containment::BContainsA);
    }

    #[test]
    fn default_route_contains_everything() {
        let any = Ipv4Cidr::ANY;
        assert_eq!(contains(&any, &cidr("8.8.8.8/32")), Containment::AContainsB);
        assert_eq!(contains(&any, &cidr("0.0.0.0/1")), Containment::AContainsB);
    }

    #[test]
    fn compare_orders_disjoint_by_network() {
        let a = cidr("10.1.0.0/16");
        let b = cidr("10.2.0.0/16");
        assert_eq!(compare(&a, &b), Ordering::Less);
        assert_eq!(compare(&b, &a), Ordering::Greater);
    }

    #[test]
    fn compare_collapses_overlap() {
        let a = cidr("10.1.0.0/16");
        let b = cidr("10.0.0.0/8");
        assert_eq!(compare(&a, &a), Ordering::Equal);
        assert_eq!(compare(&a, &b), Ordering::Equal);
        assert_eq!(compare(&b, &a), Ordering::Equal);
    }

    // Numeric order, not host-endian order: 9.255.0.0 < 10.0.0.0 even
    // though the low octet of the former is larger.
    #[test]
    fn compare_uses_network_order() {
        let a = cidr("9.255.0.0/16");
        let b = cidr("10.0.0.0/16");
        assert_eq!(compare(&a, &b), Ordering::Less);
    }
}
