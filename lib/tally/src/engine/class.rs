// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Installed traffic classes.

use super::stat::ClassCounter;
use core::fmt;
use core::fmt::Display;
use tally_api::ClassSpec;
use tally_api::ClassStat;
use tally_api::GroupSpec;
use tally_api::Ipv4Cidr;
use tally_api::PortSpec;
use tally_api::Protocol;
use thiserror::Error;

/// Errors found while turning class definitions into installed classes.
///
/// These are precondition violations: a registry is never built from
/// definitions that produce one.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ClassError {
    #[error("class id {0} is reserved for the default class")]
    ReservedId(u32),

    #[error("duplicate class id {0}")]
    DuplicateId(u32),

    #[error("class {id} has an empty name")]
    EmptyName { id: u32 },

    #[error("class {id} ({name}): invalid port {port}")]
    InvalidPort { id: u32, name: String, port: u16 },
}

/// Which side of the LAN boundary a group of constraints describes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Side {
    /// The Internet-facing endpoint.
    Outside,
    /// The LAN-facing endpoint.
    Inside,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Outside, Side::Inside];
}

impl Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Outside => "outside",
            Self::Inside => "inside",
        };
        write!(f, "{s}")
    }
}

/// A single port constraint.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PortMatch {
    number: u16,
    proto: Option<Protocol>,
}

impl PortMatch {
    pub fn new(number: u16, proto: Option<Protocol>) -> Self {
        Self { number, proto: proto.and_then(wildcard_zero) }
    }

    pub fn number(&self) -> u16 {
        self.number
    }

    /// The protocol this port is restricted to, `None` for any.
    pub fn proto(&self) -> Option<Protocol> {
        self.proto
    }

    /// Does a packet port/protocol pair satisfy this constraint?
    #[inline]
    pub fn matches(&self, port: u16, proto: Protocol) -> bool {
        self.number == port && self.proto.is_none_or(|p| p == proto)
    }
}

impl Display for PortMatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.proto {
            Some(proto) => write!(f, "{}/{}", self.number, proto),
            None => write!(f, "{}", self.number),
        }
    }
}

/// The subnets and ports of one side of a class.
///
/// The lists are fixed once the class is installed. An empty list is a
/// wildcard.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Group {
    subnets: Box<[Ipv4Cidr]>,
    ports: Box<[PortMatch]>,
}

impl Group {
    pub fn subnets(&self) -> &[Ipv4Cidr] {
        &self.subnets
    }

    pub fn ports(&self) -> &[PortMatch] {
        &self.ports
    }

    pub fn is_empty(&self) -> bool {
        self.subnets.is_empty() && self.ports.is_empty()
    }
}

/// A traffic class: its identity, its constraints, and its counters.
#[derive(Debug)]
pub struct TrafficClass {
    id: u32,
    name: String,
    description: String,
    outside: Group,
    inside: Group,
    protocol: Option<Protocol>,
    stats: ClassCounter,
}

impl TrafficClass {
    /// Create a class with no constraints and zeroed counters.
    ///
    /// Such a class matches every packet, which is only what the
    /// default class wants. Everything else comes from
    /// [`TrafficClass::from_spec()`].
    pub fn new(
        id: u32,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            outside: Group::default(),
            inside: Group::default(),
            protocol: None,
            stats: ClassCounter::new(),
        }
    }

    /// Validate a class definition and install it.
    pub fn from_spec(spec: &ClassSpec) -> Result<Self, ClassError> {
        if spec.name.trim().is_empty() {
            return Err(ClassError::EmptyName { id: spec.id });
        }

        let mut class =
            Self::new(spec.id, spec.name.clone(), spec.description.clone());
        class.protocol = spec.protocol.and_then(wildcard_zero);
        class.outside = Self::group_from_spec(spec, &spec.outside)?;
        class.inside = Self::group_from_spec(spec, &spec.inside)?;
        Ok(class)
    }

    fn group_from_spec(
        spec: &ClassSpec,
        group: &GroupSpec,
    ) -> Result<Group, ClassError> {
        let ports = group
            .ports
            .iter()
            .map(|&PortSpec { number, protocol }| {
                if number == 0 {
                    return Err(ClassError::InvalidPort {
                        id: spec.id,
                        name: spec.name.clone(),
                        port: number,
                    });
                }
                Ok(PortMatch::new(number, protocol))
            })
            .collect::<Result<Box<[_]>, _>>()?;

        Ok(Group { subnets: group.subnets.clone().into_boxed_slice(), ports })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The protocol filter, `None` for any.
    pub fn protocol(&self) -> Option<Protocol> {
        self.protocol
    }

    pub fn group(&self, side: Side) -> &Group {
        match side {
            Side::Outside => &self.outside,
            Side::Inside => &self.inside,
        }
    }

    /// Does this class declare any subnet at all?
    pub fn is_anchored(&self) -> bool {
        !self.outside.subnets.is_empty() || !self.inside.subnets.is_empty()
    }

    pub fn stats(&self) -> &ClassCounter {
        &self.stats
    }
}

impl From<&TrafficClass> for ClassStat {
    fn from(class: &TrafficClass) -> Self {
        ClassStat {
            id: class.id,
            name: class.name.clone(),
            description: class.description.clone(),
            bytes_up: class.stats.bytes_up(),
            bytes_down: class.stats.bytes_down(),
            pkts_up: class.stats.pkts_up(),
            pkts_down: class.stats.pkts_down(),
        }
    }
}

// Protocol number 0 in a class definition means "any protocol".
fn wildcard_zero(proto: Protocol) -> Option<Protocol> {
    if u8::from(proto) == 0 { None } else { Some(proto) }
}
