// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Print reports and registries in a human-friendly manner.
//!
//! This is mostly just a place to hang printing routines so that they
//! can be used by both tallyadm and integration tests.

use crate::engine::class::Group;
use crate::engine::class::Side;
use crate::engine::dispatch::DispatchStats;
use crate::engine::dispatch::Dispatcher;
use crate::engine::registry::ClassRegistry;
use std::io::Write;
use tabwriter::TabWriter;
use tally_api::Packet;
use tally_api::Report;

/// Print a [`Report`].
pub fn print_report(
    report: &Report,
    stats: Option<&DispatchStats>,
) -> std::io::Result<()> {
    print_report_into(&mut std::io::stdout(), report, stats)
}

/// Print a [`Report`] into a given writer.
pub fn print_report_into(
    writer: &mut impl Write,
    report: &Report,
    stats: Option<&DispatchStats>,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);

    writeln!(t, "ID\tNAME\tBYTES UP\tBYTES DOWN\tPKTS UP\tPKTS DOWN")?;
    for c in &report.classes {
        writeln!(
            t,
            "{}\t{}\t{}\t{}\t{}\t{}",
            c.id, c.name, c.bytes_up, c.bytes_down, c.pkts_up, c.pkts_down,
        )?;
    }
    t.flush()?;

    if let Some(stats) = stats {
        writeln!(t)?;
        write_hr(&mut t)?;
        writeln!(t, "{stats}")?;
    }
    t.flush()
}

/// Print every class of a registry with its constraints.
pub fn print_classes(registry: &ClassRegistry) -> std::io::Result<()> {
    print_classes_into(&mut std::io::stdout(), registry)
}

/// Print every class of a registry into a given writer.
pub fn print_classes_into(
    writer: &mut impl Write,
    registry: &ClassRegistry,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);

    writeln!(t, "ID\tNAME\tPROTO\tOUTSIDE\tINSIDE\tDESCRIPTION")?;
    for c in registry.classes() {
        let proto = match c.protocol() {
            Some(p) => p.to_string(),
            None => "*".to_string(),
        };
        writeln!(
            t,
            "{}\t{}\t{}\t{}\t{}\t{}",
            c.id(),
            c.name(),
            proto,
            group_str(c.group(Side::Outside)),
            group_str(c.group(Side::Inside)),
            c.description(),
        )?;
    }
    t.flush()
}

/// Print the score of every competing class for one packet, and the
/// class the dispatcher would credit.
pub fn print_scores_into(
    writer: &mut impl Write,
    dispatcher: &Dispatcher<'_>,
    pkt: &Packet,
) -> std::io::Result<()> {
    let registry = dispatcher.registry();
    let mut t = TabWriter::new(writer);

    writeln!(t, "Packet {pkt}")?;
    write_hrb(&mut t)?;
    writeln!(t, "ID\tNAME\tMATCH\tSCORE")?;
    for c in registry.competitors() {
        let score = c.score(pkt);
        let matched = if score > 0 { "yes" } else { "no" };
        writeln!(t, "{}\t{}\t{}\t{}", c.id(), c.name(), matched, score)?;
    }
    t.flush()?;

    let winner = match dispatcher.classify(pkt) {
        Some(i) => &registry.classes()[i],
        None => registry.default_class(),
    };
    write_hr(&mut t)?;
    writeln!(t, "selected: {} ({})", winner.name(), winner.id())?;
    t.flush()
}

fn group_str(group: &Group) -> String {
    if group.is_empty() {
        return "*".to_string();
    }

    let mut parts: Vec<String> =
        group.subnets().iter().map(ToString::to_string).collect();
    parts.extend(group.ports().iter().map(|p| format!(":{p}")));
    parts.join(",")
}

/// Print a horizontal rule in bold.
pub fn write_hrb(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:=<70}", "=")
}

/// Print a horizontal rule.
pub fn write_hr(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:-<70}", "-")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::registry::DEFAULT_CLASS_NAME;
    use tally_api::ClassSpec;
    use tally_api::Direction;
    use tally_api::PortSpec;
    use tally_api::Protocol;

    fn registry() -> ClassRegistry {
        let mut web = ClassSpec::new(1, "web");
        web.protocol = Some(Protocol::TCP);
        web.outside.ports.push(PortSpec::any(443));
        web.inside.subnets.push("10.0.0.0/8".parse().unwrap());
        ClassRegistry::new(&[web]).unwrap()
    }

    #[test]
    fn classes_table() {
        let mut out = Vec::new();
        print_classes_into(&mut out, &registry()).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("0"));
        assert!(lines[2].contains(":443"));
        assert!(lines[2].contains("10.0.0.0/8"));
        assert!(lines[2].contains("TCP"));
    }

    #[test]
    fn report_table() {
        let reg = registry();
        reg.get(1).unwrap().stats().hit(Direction::Out, 1500);
        let stats = DispatchStats {
            packets: 1,
            matched: 1,
            unmatched: 0,
            bytes: 1500,
        };

        let mut out = Vec::new();
        print_report_into(&mut out, &reg.report(false), Some(&stats)).unwrap();
        let out = String::from_utf8(out).unwrap();

        // Only the rows above the rule belong to the class table.
        let rows: Vec<&str> =
            out.lines().take_while(|l| !l.starts_with('-')).collect();
        assert!(rows[0].starts_with("ID"));
        assert!(rows.iter().any(|l| l.starts_with("1 ") && l.contains("web")));
        assert!(!rows.iter().any(|l| l.contains(DEFAULT_CLASS_NAME)));
        assert!(out.contains("1500"));
        assert!(out.contains(
            "1 packets (1500 bytes): 1 classified, 0 unclassified"
        ));
    }

    #[test]
    fn score_table() {
        let reg = registry();
        let d = Dispatcher::new(&reg);
        let pkt = Packet {
            src: "10.1.1.1".parse().unwrap(),
            dst: "1.1.1.1".parse().unwrap(),
            src_port: 50000,
            dst_port: 443,
            proto: Protocol::TCP,
            dir: Direction::Out,
            len: 1,
        };

        let mut out = Vec::new();
        print_scores_into(&mut out, &d, &pkt).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("selected: web (1)"));
    }
}
