// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Per-class traffic counters.
//!
//! These are the only state that changes once a registry is built.
//! Any number of dispatch workers may credit the same class at once,
//! so every update is a single atomic read-modify-write; no lock is
//! ever taken. Counters only grow. At 64 bits they wrap on overflow,
//! which a single analysis run cannot reach in practice.

use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering;
use tally_api::Direction;

/// Upload/download counters of a traffic class.
#[derive(Debug, Default)]
pub struct ClassCounter {
    pub bytes_up: AtomicU64,
    pub bytes_down: AtomicU64,
    pub pkts_up: AtomicU64,
    pub pkts_down: AtomicU64,
}

impl ClassCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a packet of `pkt_size` bytes travelling in `direction`.
    ///
    /// Inbound traffic is download, outbound traffic is upload.
    #[inline]
    pub fn hit(&self, direction: Direction, pkt_size: u64) {
        let (pkts, bytes) = match direction {
            Direction::In => (&self.pkts_down, &self.bytes_down),
            Direction::Out => (&self.pkts_up, &self.bytes_up),
        };
        pkts.fetch_add(1, Ordering::Relaxed);
        bytes.fetch_add(pkt_size, Ordering::Relaxed);
    }

    pub fn bytes_up(&self) -> u64 {
        self.bytes_up.load(Ordering::Relaxed)
    }

    pub fn bytes_down(&self) -> u64 {
        self.bytes_down.load(Ordering::Relaxed)
    }

    pub fn pkts_up(&self) -> u64 {
        self.pkts_up.load(Ordering::Relaxed)
    }

    pub fn pkts_down(&self) -> u64 {
        self.pkts_down.load(Ordering::Relaxed)
    }
}
