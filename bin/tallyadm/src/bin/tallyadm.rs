// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use std::io;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use clap::Parser;
use clap::ValueEnum;
use slog::Logger;
use slog::info;
use slog::o;

use tally::api::Direction;
use tally::api::Ipv4Addr;
use tally::api::Packet;
use tally::api::Protocol;
use tally::engine::analysis::analyze;
use tally::engine::dispatch::Dispatcher;
use tally::engine::dispatch::MatchPolicy;
use tally::engine::registry::ClassRegistry;
use tally::print::print_classes;
use tally::print::print_report;
use tally::print::print_scores_into;
use tallyadm::Config;
use tallyadm::MAJOR_VERSION;
use tallyadm::PacketFile;
use tallyadm::SlogLog;
use tallyadm::VERSION;
use tallyadm::build_logger;

/// Attribute captured packets to traffic classes.
#[derive(Debug, Parser)]
#[command(version = VERSION)]
enum Command {
    /// Dispatch a packet file into the configured classes and report
    /// the per-class totals.
    Classify {
        #[command(flatten)]
        config: ConfigArgs,

        /// JSON packet file: an array or one object per line.
        #[arg(short, long)]
        packets: PathBuf,

        /// Number of dispatch threads.
        #[arg(short, long)]
        workers: Option<usize>,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Report classes that saw no traffic.
        #[arg(long)]
        all: bool,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Validate the configured classes and print them.
    Check {
        #[command(flatten)]
        config: ConfigArgs,

        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Score a single packet against every configured class.
    Score {
        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        policy: PolicyArgs,

        #[arg(long)]
        src: Ipv4Addr,

        #[arg(long)]
        dst: Ipv4Addr,

        #[arg(long, default_value_t = 0)]
        src_port: u16,

        #[arg(long, default_value_t = 0)]
        dst_port: u16,

        #[arg(long, default_value_t = Protocol::TCP)]
        proto: Protocol,

        #[arg(long = "dir")]
        direction: Direction,

        #[arg(long, default_value_t = 0)]
        len: u64,
    },
}

#[derive(Args, Clone, Debug)]
struct ConfigArgs {
    /// TOML configuration holding the traffic classes.
    #[arg(short, long)]
    config: PathBuf,
}

#[derive(Args, Clone, Debug)]
struct PolicyArgs {
    /// How to choose among matching classes: "best" or "first".
    #[arg(long)]
    policy: Option<MatchPolicy>,

    /// Use a CIDR index to narrow the classes scored per packet.
    #[arg(long)]
    index: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Table,
}

fn load_config(log: &Logger, args: &ConfigArgs) -> anyhow::Result<Config> {
    let config = Config::load(&args.config).with_context(|| {
        format!("failed to load configuration {}", args.config.display())
    })?;
    info!(log, "configuration loaded";
        "path" => %args.config.display(),
        "classes" => config.classes.len());
    Ok(config)
}

fn write_json<T: serde::Serialize>(val: &T) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, val)
        .context("failed to serialize output")?;
    writeln!(out)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cmd = Command::parse();
    let log = build_logger();
    let log = log.new(o!("version" => VERSION, "api" => MAJOR_VERSION));
    info!(log, "tallyadm starting");

    match cmd {
        Command::Classify {
            config,
            packets,
            workers,
            policy,
            all,
            format,
        } => {
            let mut cfg = load_config(&log, &config)?;
            if let Some(workers) = workers {
                cfg.analysis.workers = workers;
            }
            if let Some(p) = policy.policy {
                cfg.analysis.policy = p;
            }
            cfg.analysis.use_index |= policy.index;
            cfg.analysis.include_idle |= all;

            let provider = SlogLog::new(&log);
            let source = PacketFile::new(&packets);
            let analysis = analyze(&cfg, &source, &cfg.analysis, &provider)
                .with_context(|| {
                    format!("analysis of {} failed", packets.display())
                })?;

            match format {
                Format::Json => write_json(&analysis)?,
                Format::Table => {
                    print_report(&analysis.report, Some(&analysis.stats))?
                }
            }
        }

        Command::Check { config, format } => {
            let cfg = load_config(&log, &config)?;
            let registry = ClassRegistry::new(&cfg.classes)
                .context("invalid class definition")?;
            info!(log, "classes are valid"; "installed" => registry.len());

            match format {
                Format::Json => write_json(&cfg.classes)?,
                Format::Table => print_classes(&registry)?,
            }
        }

        Command::Score {
            config,
            policy,
            src,
            dst,
            src_port,
            dst_port,
            proto,
            direction,
            len,
        } => {
            let cfg = load_config(&log, &config)?;
            let registry = ClassRegistry::new(&cfg.classes)
                .context("invalid class definition")?;
            let dispatcher = Dispatcher::new(&registry)
                .policy(policy.policy.unwrap_or(cfg.analysis.policy))
                .indexed(policy.index || cfg.analysis.use_index);
            let pkt =
                Packet { src, dst, src_port, dst_port, proto, dir: direction, len };
            print_scores_into(&mut io::stdout(), &dispatcher, &pkt)?;
        }
    }

    Ok(())
}
