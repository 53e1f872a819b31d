// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Traffic class definitions as they are read from configuration.

use super::ip::Ipv4Cidr;
use super::ip::Protocol;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Display;
use core::result;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;

/// A port a class cares about.
///
/// A `protocol` of `None` matches the port number on any transport
/// protocol.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PortSpec {
    pub number: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

impl PortSpec {
    pub fn new(number: u16, protocol: Option<Protocol>) -> Self {
        Self { number, protocol }
    }

    pub fn any(number: u16) -> Self {
        Self { number, protocol: None }
    }
}

impl FromStr for PortSpec {
    type Err = String;

    /// Parse "443" or "443/tcp".
    fn from_str(val: &str) -> result::Result<Self, Self::Err> {
        let (num_s, proto) = match val.split_once('/') {
            Some((num_s, proto_s)) => {
                (num_s, Some(proto_s.parse::<Protocol>()?))
            }
            None => (val, None),
        };

        let number = num_s
            .parse::<u16>()
            .map_err(|e| format!("bad port {num_s}: {e}"))?;

        Ok(Self { number, protocol: proto })
    }
}

impl Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.protocol {
            Some(proto) => write!(f, "{}/{}", self.number, proto),
            None => write!(f, "{}", self.number),
        }
    }
}

/// The subnets and ports declared for one side of the LAN boundary.
///
/// An empty list is a wildcard: it places no constraint on that side.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    #[serde(default)]
    pub subnets: Vec<Ipv4Cidr>,
    #[serde(default)]
    pub ports: Vec<PortSpec>,
}

/// The definition of a traffic class.
///
/// The `outside` group describes the Internet-facing endpoint of a
/// packet and the `inside` group the LAN-facing endpoint, whichever
/// header field currently holds that role.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassSpec {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default)]
    pub outside: GroupSpec,
    #[serde(default)]
    pub inside: GroupSpec,
}

impl ClassSpec {
    /// A class with the given identity and no constraints.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            protocol: None,
            outside: GroupSpec::default(),
            inside: GroupSpec::default(),
        }
    }
}
