// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The classification engine.
//!
//! Leaves first: [`cidr`] holds the address/mask algebra, [`class`]
//! and [`registry`] own the installed classes, [`predicate`] and
//! [`score`] decide how well a class fits a packet, [`dispatch`] folds
//! packets into class counters, and [`analysis`] strings one whole run
//! together over a [`source`].
pub mod analysis;
pub mod cidr;
pub mod class;
pub mod dispatch;
pub mod index;
pub mod predicate;
pub mod registry;
pub mod score;
pub mod source;
pub mod stat;

pub use tally_api::Direction;
pub use tally_api::Packet;
