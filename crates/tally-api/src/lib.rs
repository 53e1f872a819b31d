// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Types shared between the tally engine and its consumers.
//!
//! Everything here is plain data: addresses, subnets, traffic class
//! definitions as they come out of configuration, captured packets as
//! they come out of storage, and the per-class counters handed to a
//! reporter once a run completes.

#![no_std]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
extern crate alloc;

use alloc::string::String;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

pub mod class;
pub mod ip;
pub mod packet;
pub mod stat;

pub use class::*;
pub use ip::*;
pub use packet::*;
pub use stat::*;

/// Major version of the tally package.
pub const MAJOR_VERSION: u64 = 0;

/// The direction of a packet relative to the local network.
///
/// `In` traffic originates outside the LAN (the Internet side) and is
/// accounted as download. `Out` traffic originates inside the LAN and
/// is accounted as upload.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "inbound", alias = "IN")]
    In = 1,
    #[serde(alias = "outbound", alias = "OUT")]
    Out = 2,
}

impl core::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "in" | "inbound" => Ok(Direction::In),
            "out" | "outbound" => Ok(Direction::Out),
            _ => Err(format!("invalid direction: {s}")),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dirstr = match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        };

        write!(f, "{dirstr}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn direction_from_str() {
        assert_eq!("in".parse(), Ok(Direction::In));
        assert_eq!("INBOUND".parse(), Ok(Direction::In));
        assert_eq!("Out".parse(), Ok(Direction::Out));
        assert_eq!("outbound".parse(), Ok(Direction::Out));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_serde() {
        let d: Direction = serde_json::from_str("\"inbound\"").unwrap();
        assert_eq!(d, Direction::In);
        let d: Direction = serde_json::from_str("\"out\"").unwrap();
        assert_eq!(d, Direction::Out);
        assert_eq!(serde_json::to_string(&Direction::In).unwrap(), "\"in\"");
    }
}
