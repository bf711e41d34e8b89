use std::fs::File;
use std::io::{BufWriter, Write};
use replaylib::sweep::{RunReport, SweepReport};

/// One run as `hits,accesses;`, or `-;` when it failed
fn entry(run: &RunReport) -> String {
    match run.metrics {
        Some(metrics) => format!("{metrics};"),
        None => "-;".to_string(),
    }
}

/// The console listing: a header, then each group's title followed by its entries
fn console_lines(report: &SweepReport) -> Vec<String> {
    let mut lines = vec!["# cacheHits,# cacheAccesses;".to_string()];
    for group in &report.groups {
        lines.push(group.title.clone());
        lines.push(group.runs.iter().map(|run| format!(" {}", entry(run))).collect());
    }
    lines
}

pub fn print_console(report: &SweepReport) {
    for line in console_lines(report) {
        println!("{line}");
    }
}

/// One line per group, mirroring the console output without the titles
fn write_lines<W: Write>(out: &mut W, report: &SweepReport) -> std::io::Result<()> {
    for group in &report.groups {
        let line: String = group.runs.iter().map(entry).collect();
        writeln!(out, "{line}")?;
    }
    Ok(())
}

pub fn write_results(path: &str, report: &SweepReport) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_lines(&mut out, report)?;
    out.flush()
}
