// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! IPv4 addresses, subnets and protocol numbers.

use alloc::string::String;
use alloc::string::ToString;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;
use core::result;
use core::str::FromStr;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;
use serde::de::Visitor;

/// An IP protocol number, as carried in the IPv4 header.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Protocol {
    ICMP,
    IGMP,
    TCP,
    UDP,
    ICMPv6,
    Unknown(u8),
}

pub const PROTO_ICMP: u8 = 0x1;
pub const PROTO_IGMP: u8 = 0x2;
pub const PROTO_TCP: u8 = 0x6;
pub const PROTO_UDP: u8 = 0x11;
pub const PROTO_ICMPV6: u8 = 0x3A;

impl Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ICMP => write!(f, "ICMP"),
            Self::IGMP => write!(f, "IGMP"),
            Self::TCP => write!(f, "TCP"),
            Self::UDP => write!(f, "UDP"),
            Self::ICMPv6 => write!(f, "ICMPv6"),
            Self::Unknown(proto) => write!(f, "{proto}"),
        }
    }
}

impl From<u8> for Protocol {
    fn from(proto: u8) -> Self {
        match proto {
            PROTO_ICMP => Self::ICMP,
            PROTO_IGMP => Self::IGMP,
            PROTO_TCP => Self::TCP,
            PROTO_UDP => Self::UDP,
            PROTO_ICMPV6 => Self::ICMPv6,
            _ => Self::Unknown(proto),
        }
    }
}

impl From<Protocol> for u8 {
    fn from(proto: Protocol) -> u8 {
        match proto {
            Protocol::ICMP => PROTO_ICMP,
            Protocol::IGMP => PROTO_IGMP,
            Protocol::TCP => PROTO_TCP,
            Protocol::UDP => PROTO_UDP,
            Protocol::ICMPv6 => PROTO_ICMPV6,
            Protocol::Unknown(v) => v,
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    /// Parse a protocol by name ("tcp", "UDP", ...) or by number ("47").
    fn from_str(val: &str) -> result::Result<Self, Self::Err> {
        match val.to_ascii_lowercase().as_str() {
            "icmp" => Ok(Self::ICMP),
            "igmp" => Ok(Self::IGMP),
            "tcp" => Ok(Self::TCP),
            "udp" => Ok(Self::UDP),
            "icmpv6" => Ok(Self::ICMPv6),
            num => num
                .parse::<u8>()
                .map(Self::from)
                .map_err(|_| format!("bad protocol: {val}")),
        }
    }
}

impl Serialize for Protocol {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Accepts either a protocol name or its number, as a string or as an
/// integer.
struct ProtocolVisitor;

impl ProtocolVisitor {
    fn number<E, V>(v: V) -> Result<Protocol, E>
    where
        E: de::Error,
        V: TryInto<u8> + Display,
    {
        let msg = format!("bad protocol: {v}");
        v.try_into().map(Protocol::from).map_err(|_| E::custom(msg))
    }
}

impl Visitor<'_> for ProtocolVisitor {
    type Value = Protocol;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a protocol name or number")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Protocol, E> {
        Self::number(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Protocol, E> {
        Self::number(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Protocol, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ProtocolVisitor)
    }
}

/// An IPv4 address.
///
/// The octets are always kept in network order, the same order they
/// appear on the wire. Any conversion to or from a `u32` goes through
/// `{from,to}_be_bytes` so that masks and addresses can never end up
/// in different byte orders.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(C)]
pub struct Ipv4Addr {
    inner: [u8; 4],
}

impl Ipv4Addr {
    pub const ANY_ADDR: Self = Self { inner: [0; 4] };

    /// Return the bytes of the address.
    #[inline]
    pub fn bytes(&self) -> [u8; 4] {
        self.inner
    }

    pub const fn from_const(bytes: [u8; 4]) -> Self {
        Self { inner: bytes }
    }

    pub fn safe_mask(self, prefix_len: Ipv4PrefixLen) -> Self {
        self.mask_with(prefix_len.to_netmask())
    }

    /// Apply a netmask (given in the same network order as the
    /// address) octet by octet.
    #[inline]
    pub fn mask_with(self, netmask: Ipv4Addr) -> Self {
        let mut inner = self.inner;
        for (b, m) in inner.iter_mut().zip(netmask.inner) {
            *b &= m;
        }
        Self { inner }
    }

    /// Is this address a member of `network` under `netmask`?
    ///
    /// This is true iff `(self & netmask) == network`. The network is
    /// expected to have its host bits already cleared; a network with
    /// host bits set matches nothing.
    #[inline]
    pub fn in_network(self, network: Ipv4Addr, netmask: Ipv4Addr) -> bool {
        self.mask_with(netmask) == network
    }
}

impl From<Ipv4Addr> for u32 {
    fn from(ip: Ipv4Addr) -> u32 {
        u32::from_be_bytes(ip.bytes())
    }
}

impl From<u32> for Ipv4Addr {
    fn from(val: u32) -> Self {
        Self { inner: val.to_be_bytes() }
    }
}

impl From<[u8; 4]> for Ipv4Addr {
    fn from(bytes: [u8; 4]) -> Self {
        Self { inner: bytes }
    }
}

impl FromStr for Ipv4Addr {
    type Err = String;

    fn from_str(val: &str) -> result::Result<Self, Self::Err> {
        let mut inner = [0u8; 4];
        let mut parts = val.split('.');
        for octet in inner.iter_mut() {
            let part = parts.next().ok_or_else(|| format!("malformed ip: {val}"))?;
            *octet = part.parse().map_err(|e| format!("bad octet {part}: {e}"))?;
        }

        if parts.next().is_some() {
            return Err(format!("malformed ip: {val}"));
        }

        Ok(Self { inner })
    }
}

impl Display for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.inner[0], self.inner[1], self.inner[2], self.inner[3],
        )
    }
}

// There's no reason to view an Ipv4Addr as its raw array, so just
// present it in a human-friendly manner.
impl Debug for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ipv4Addr {{ inner: {self} }}")
    }
}

impl Serialize for Ipv4Addr {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ipv4Addr {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A valid IPv4 prefix length.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    Ord,
    PartialOrd,
)]
pub struct Ipv4PrefixLen(u8);

impl Ipv4PrefixLen {
    pub const NETMASK_NONE: Self = Self(0);
    pub const NETMASK_ALL: Self = Self(32);

    pub fn new(prefix_len: u8) -> Result<Self, String> {
        if prefix_len > 32 {
            return Err(format!("bad IPv4 prefix length: {prefix_len}"));
        }

        Ok(Self(prefix_len))
    }

    /// Convert the prefix length into a subnet mask: the top
    /// `prefix_len` bits set, the rest clear, in network order.
    pub const fn to_netmask(self) -> Ipv4Addr {
        let bits = match self.0 {
            0 => 0,
            n => u32::MAX << (32 - n),
        };
        Ipv4Addr::from_const(bits.to_be_bytes())
    }

    pub const fn val(&self) -> u8 {
        self.0
    }
}

/// An IPv4 CIDR.
///
/// The network address never has host bits set: `new()` clears them
/// and parsing refuses them.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Ipv4Cidr {
    ip: Ipv4Addr,
    prefix_len: Ipv4PrefixLen,
}

impl FromStr for Ipv4Cidr {
    type Err = String;

    /// Convert a string like "192.168.2.0/24" into an `Ipv4Cidr`.
    ///
    /// Unlike [`Ipv4Cidr::new()`] this refuses an address with host
    /// bits set: "192.168.2.1/24" is almost certainly a typo in a class
    /// definition and silently widening it would change what it
    /// matches.
    fn from_str(val: &str) -> result::Result<Self, Self::Err> {
        let (ip_s, prefix_s) = match val.split_once('/') {
            Some(v) => v,
            None => return Err("no '/' found".to_string()),
        };

        let ip: Ipv4Addr = match ip_s.parse() {
            Ok(v) => v,
            Err(e) => return Err(format!("bad IP: {e}")),
        };

        let raw = match prefix_s.parse::<u8>() {
            Ok(v) => v,
            Err(e) => {
                return Err(format!("bad prefix length: {e}"));
            }
        };

        let prefix_len = Ipv4PrefixLen::new(raw)?;
        let cidr = Ipv4Cidr::new(ip, prefix_len);
        if cidr.ip() != ip {
            return Err(format!("host bits set in {val}"));
        }
        Ok(cidr)
    }
}

impl Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len.val())
    }
}

impl Serialize for Ipv4Cidr {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ipv4Cidr {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Ipv4Cidr {
    /// The whole IPv4 address space, `0.0.0.0/0`.
    pub const ANY: Self =
        Self { ip: Ipv4Addr::ANY_ADDR, prefix_len: Ipv4PrefixLen(0) };

    pub fn ip(&self) -> Ipv4Addr {
        self.parts().0
    }

    /// Is this `ip` a member of the CIDR?
    pub fn is_member(&self, ip: Ipv4Addr) -> bool {
        ip.in_network(self.ip, self.mask())
    }

    pub fn new(ip: Ipv4Addr, prefix_len: Ipv4PrefixLen) -> Self {
        let ip = ip.safe_mask(prefix_len);
        Ipv4Cidr { ip, prefix_len }
    }

    pub fn new_checked(ip: Ipv4Addr, prefix_len: u8) -> Result<Self, String> {
        let pl = Ipv4PrefixLen::new(prefix_len)?;
        let ip = ip.safe_mask(pl);
        Ok(Ipv4Cidr { ip, prefix_len: pl })
    }

    /// A CIDR covering exactly one host.
    pub fn host(ip: Ipv4Addr) -> Self {
        Ipv4Cidr { ip, prefix_len: Ipv4PrefixLen::NETMASK_ALL }
    }

    pub fn parts(&self) -> (Ipv4Addr, Ipv4PrefixLen) {
        (self.ip, self.prefix_len)
    }

    pub fn prefix_len(self) -> u8 {
        self.parts().1.val()
    }

    /// Convert the CIDR prefix length into a subnet mask.
    pub fn mask(self) -> Ipv4Addr {
        self.prefix_len.to_netmask()
    }
}
