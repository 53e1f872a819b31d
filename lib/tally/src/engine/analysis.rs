// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! One complete analysis run: load, build, dispatch, report.
//!
//! The registry lives exactly as long as the run. It is built from
//! the class source, every packet is dispatched into it, its counters
//! are snapshotted into a [`Report`], and it is dropped on return,
//! whichever way the run ends.

use super::class::ClassError;
use super::dispatch::DispatchError;
use super::dispatch::DispatchStats;
use super::dispatch::Dispatcher;
use super::dispatch::MatchPolicy;
use super::registry::ClassRegistry;
use super::source::ClassSource;
use super::source::PacketSource;
use super::source::SourceError;
use crate::provider::LogLevel;
use crate::provider::LogProvider;
use serde::Deserialize;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::thread;
use tally_api::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("invalid class definition")]
    Class(#[from] ClassError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Knobs of an analysis run.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisOpts {
    /// Number of dispatch threads.
    pub workers: usize,
    pub policy: MatchPolicy,
    /// Select candidate classes with a CIDR index instead of scoring
    /// every class.
    pub use_index: bool,
    /// Report classes that saw no traffic.
    pub include_idle: bool,
}

impl Default for AnalysisOpts {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map_or(1, NonZeroUsize::get),
            policy: MatchPolicy::default(),
            use_index: false,
            include_idle: false,
        }
    }
}

/// The outcome of a run.
#[derive(Clone, Debug, Serialize)]
pub struct Analysis {
    pub report: Report,
    pub stats: DispatchStats,
}

/// Run one analysis from `classes` and `packets`.
pub fn analyze(
    classes: &dyn ClassSource,
    packets: &dyn PacketSource,
    opts: &AnalysisOpts,
    log: &dyn LogProvider,
) -> Result<Analysis, AnalysisError> {
    let registry = ClassRegistry::new(&classes.classes()?)?;
    log.log(
        LogLevel::Note,
        &format!(
            "installed {} traffic classes (plus default)",
            registry.len() - 1
        ),
    );

    let pkts = packets.packets()?;
    let dispatcher = Dispatcher::new(&registry)
        .policy(opts.policy)
        .indexed(opts.use_index)
        .log(log);
    let stats = dispatcher.dispatch_all(&pkts, opts.workers)?;

    Ok(Analysis { report: registry.report(opts.include_idle), stats })
}
