// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The host side of `tallyadm`: configuration, file-backed sources and
//! logging.

use serde::Deserialize;
use serde::Serialize;
use slog::Drain;
use slog::Logger;
use slog::error;
use slog::info;
use slog::o;
use slog::warn;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tally::api::ClassSpec;
use tally::api::Packet;
use tally::engine::analysis::AnalysisOpts;
use tally::engine::source::ClassSource;
use tally::engine::source::PacketSource;
use tally::engine::source::SourceError;
use tally::provider::LogLevel;
use tally::provider::LogProvider;

pub use tally::api::MAJOR_VERSION;

/// The package version of tallyadm.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A tallyadm configuration file.
///
/// ```toml
/// [analysis]
/// workers = 4
/// policy = "best"
///
/// [[class]]
/// id = 1
/// name = "ssh"
/// protocol = "tcp"
/// outside = { ports = [{ number = 22 }] }
/// inside = { subnets = ["192.168.0.0/16"] }
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisOpts,
    #[serde(default, rename = "class")]
    pub classes: Vec<ClassSpec>,
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self, SourceError> {
        toml::from_str(s).map_err(|e| SourceError::Parse {
            what: "configuration".to_string(),
            msg: e.to_string(),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| {
            SourceError::Io { what: path.display().to_string(), source }
        })?;
        Self::from_toml(&text)
    }
}

impl ClassSource for Config {
    fn classes(&self) -> Result<Vec<ClassSpec>, SourceError> {
        Ok(self.classes.clone())
    }
}

/// Packets stored in a JSON file, either as one array or as one object
/// per line.
#[derive(Clone, Debug)]
pub struct PacketFile {
    path: PathBuf,
}

impl PacketFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl PacketSource for PacketFile {
    fn packets(&self) -> Result<Vec<Packet>, SourceError> {
        let what = self.path.display().to_string();
        let text = fs::read_to_string(&self.path)
            .map_err(|source| SourceError::Io { what: what.clone(), source })?;
        parse_packets(&text).map_err(|msg| SourceError::Parse { what, msg })
    }
}

/// Parse packets from a JSON array or newline-delimited JSON objects.
pub fn parse_packets(text: &str) -> Result<Vec<Packet>, String> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text).map_err(|e| e.to_string());
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| format!("line {}: {e}", i + 1))
        })
        .collect()
}

/// Build the tallyadm logger: terminal output on stderr, filtered by
/// `RUST_LOG`, drained asynchronously.
pub fn build_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!("unit" => "tallyadm"))
}

/// Hand engine log messages to a [`slog::Logger`].
#[derive(Clone)]
pub struct SlogLog {
    log: Logger,
}

impl SlogLog {
    pub fn new(log: &Logger) -> Self {
        Self { log: log.new(o!("unit" => "engine")) }
    }
}

impl LogProvider for SlogLog {
    fn log(&self, level: LogLevel, msg: &str) {
        match level {
            LogLevel::Note => info!(self.log, "{}", msg),
            LogLevel::Warn => warn!(self.log, "{}", msg),
            LogLevel::Error => error!(self.log, "{}", msg),
        }
    }
}
