// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Packet dispatch.
//!
//! Dispatch picks one class per packet and credits the packet's bytes
//! to it. The default class never competes: it is credited only when
//! no other class matches. The registry is shared read-only between
//! any number of workers; the class counters are the sole mutable
//! state and are updated atomically.

use super::index::CidrIndex;
use super::registry::ClassRegistry;
use crate::provider::LogLevel;
use crate::provider::LogProvider;
use core::fmt;
use core::fmt::Display;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;
use std::thread;
use tally_api::Packet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("at least one dispatch worker is required")]
    NoWorkers,

    /// A worker thread panicked. Dispatch cannot fail on any packet, so
    /// this reports a bug in the engine rather than a runtime condition.
    #[error("dispatch worker {0} panicked")]
    WorkerPanic(usize),
}

/// How a class is chosen among several that match a packet.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub enum MatchPolicy {
    /// The highest scoring class; the earliest one on a tie.
    #[default]
    #[serde(rename = "best")]
    BestScore,

    /// The earliest class that matches at all.
    #[serde(rename = "first")]
    FirstMatch,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best" => Ok(Self::BestScore),
            "first" => Ok(Self::FirstMatch),
            _ => Err(format!("invalid match policy: {s}")),
        }
    }
}

impl Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::BestScore => "best",
            Self::FirstMatch => "first",
        };
        write!(f, "{s}")
    }
}

/// Totals of a dispatch run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct DispatchStats {
    pub packets: u64,
    /// Packets credited to a class other than the default.
    pub matched: u64,
    /// Packets credited to the default class.
    pub unmatched: u64,
    pub bytes: u64,
}

impl DispatchStats {
    fn record(&mut self, pkt: &Packet, matched: bool) {
        self.packets += 1;
        self.bytes = self.bytes.wrapping_add(pkt.len);
        if matched {
            self.matched += 1;
        } else {
            self.unmatched += 1;
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.packets += other.packets;
        self.matched += other.matched;
        self.unmatched += other.unmatched;
        self.bytes = self.bytes.wrapping_add(other.bytes);
    }
}

impl Display for DispatchStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} packets ({} bytes): {} classified, {} unclassified",
            self.packets, self.bytes, self.matched, self.unmatched,
        )
    }
}

/// Dispatches packets into the classes of one registry.
pub struct Dispatcher<'a> {
    registry: &'a ClassRegistry,
    policy: MatchPolicy,
    index: Option<CidrIndex>,
    log: Option<&'a dyn LogProvider>,
}

impl<'a> Dispatcher<'a> {
    /// A best-score dispatcher scanning every class.
    pub fn new(registry: &'a ClassRegistry) -> Self {
        Self { registry, policy: MatchPolicy::default(), index: None, log: None }
    }

    pub fn policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Narrow the classes scored for each packet with a [`CidrIndex`].
    pub fn indexed(mut self, indexed: bool) -> Self {
        self.index = indexed.then(|| CidrIndex::build(self.registry));
        self
    }

    /// Log a summary of every [`Dispatcher::dispatch_all()`] run.
    pub fn log(mut self, log: &'a dyn LogProvider) -> Self {
        self.log = Some(log);
        self
    }

    pub fn registry(&self) -> &ClassRegistry {
        self.registry
    }

    /// The registry index of the class `pkt` belongs to, or `None` if
    /// it falls through to the default class.
    pub fn classify(&self, pkt: &Packet) -> Option<usize> {
        match &self.index {
            Some(index) => self.select(index.candidates(pkt), pkt),
            None => self.select(1..self.registry.len(), pkt),
        }
    }

    fn select<I>(&self, candidates: I, pkt: &Packet) -> Option<usize>
    where
        I: IntoIterator<Item = usize>,
    {
        let classes = self.registry.classes();

        match self.policy {
            MatchPolicy::FirstMatch => {
                candidates.into_iter().find(|&i| classes[i].is_match(pkt))
            }

            MatchPolicy::BestScore => {
                let mut best = None;
                let mut best_score = 0;

                for i in candidates {
                    let score = classes[i].score(pkt);
                    if score > best_score {
                        best = Some(i);
                        best_score = score;
                    }
                }

                best
            }
        }
    }

    /// Credit `pkt` to its class.
    ///
    /// Return `true` if a class other than the default claimed it.
    pub fn dispatch(&self, pkt: &Packet) -> bool {
        let hit = self.classify(pkt);
        let class = match hit {
            Some(i) => &self.registry.classes()[i],
            None => self.registry.default_class(),
        };
        class.stats().hit(pkt.dir, pkt.len);
        hit.is_some()
    }

    /// Dispatch `pkts` over `workers` threads.
    ///
    /// Each worker takes one contiguous chunk of the slice. The final
    /// counters do not depend on how the packets are split.
    pub fn dispatch_all(
        &self,
        pkts: &[Packet],
        workers: usize,
    ) -> Result<DispatchStats, DispatchError> {
        if workers == 0 {
            return Err(DispatchError::NoWorkers);
        }

        let chunk_len = pkts.len().div_ceil(workers).max(1);
        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = pkts
                .chunks(chunk_len)
                .map(|chunk| {
                    s.spawn(move || {
                        let mut stats = DispatchStats::default();
                        for pkt in chunk {
                            stats.record(pkt, self.dispatch(pkt));
                        }
                        stats
                    })
                })
                .collect();

            // Join every worker before looking at any result, or the
            // scope would re-raise a panic we mean to report.
            handles.into_iter().map(|h| h.join()).collect()
        });

        let mut total = DispatchStats::default();
        for (i, res) in results.into_iter().enumerate() {
            let stats = res.map_err(|_| DispatchError::WorkerPanic(i))?;
            total.merge(&stats);
        }

        if let Some(log) = self.log {
            log.log(
                LogLevel::Note,
                &format!(
                    "dispatched {total} over {workers} worker(s), policy {}",
                    self.policy
                ),
            );

            if total.packets > 0 && total.matched == 0 {
                log.log(
                    LogLevel::Warn,
                    "no class matched any packet, all traffic went to the \
                     default class",
                );
            }
        }

        Ok(total)
    }
}

impl ClassRegistry {
    /// Credit `pkt` to its best-scoring class with a plain scan.
    pub fn dispatch(&self, pkt: &Packet) -> bool {
        Dispatcher::new(self).dispatch(pkt)
    }
}
