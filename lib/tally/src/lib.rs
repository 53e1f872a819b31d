// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! tally: attribute captured packets to traffic classes.
//!
//! A traffic class describes a kind of traffic (SSH, HTTPS, the
//! office VPN) in terms of subnets and ports on either side of the LAN
//! boundary plus an optional transport protocol. The engine scans the
//! installed classes for every packet, picks the best match, and
//! credits the packet's bytes to that class's upload or download
//! counter. Packets nobody claims land in the default class.

#![allow(clippy::len_without_is_empty)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

pub use tally_api as api;

pub mod engine;
pub mod print;
pub mod provider;
