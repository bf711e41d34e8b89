mod report;

use std::fs::File;
use std::time::Instant;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use replaylib::config::RunConfig;
use replaylib::io::map_trace;
use replaylib::sweep::Sweep;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Replays a memory access trace against modelled caches and reports hits and accesses"))]
struct Args {
    /// Trace of whitespace separated `<flag> <hex address>` pairs, `S` marks a store
    trace: String,

    /// Optional file to write one line of `hits,accesses;` entries per group to
    results: Option<String>,

    /// JSON file describing the configurations to run, defaults to the built in sweep
    #[arg(short, long)]
    sweep: Option<String>,

    /// Run a single configuration instead of a sweep, as SIZE:LINE:ASSOCIATIVITY:POLICY. Repeatable
    #[arg(short, long = "run")]
    runs: Vec<RunConfig>,

    /// Number of configurations to evaluate at once
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    init_logging(args.debug);
    let sweep = if !args.runs.is_empty() {
        Sweep::single("Requested configurations", args.runs.clone())
    } else if let Some(path) = &args.sweep {
        Sweep::load(path).map_err(|e| format!("Couldn't load the sweep at path {path}: {e}"))?
    } else {
        Sweep::default()
    };
    let trace_file = File::open(&args.trace).map_err(|e| format!("Couldn't open the trace file at path {}: {e}", args.trace))?;
    let trace = map_trace(trace_file).map_err(|e| format!("Couldn't read the trace file: {e}"))?;
    info!(path = %args.trace, bytes = trace.len(), runs = sweep.run_count(), jobs = args.jobs, "replaying trace");
    let simulation_start = Instant::now();
    let result = sweep.evaluate(&trace, args.jobs);
    let simulation_time = simulation_start.elapsed();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    } else {
        report::print_console(&result);
    }
    if let Some(path) = &args.results {
        if let Err(e) = report::write_results(path, &result) {
            warn!(%path, error = %e, "results file not written");
            return Err(format!("Couldn't write the results to {path}: {e}"));
        }
        info!(%path, "wrote results");
    }
    if args.performance {
        let total_time = start.elapsed();
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes trace mapping, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed sweep: {sweep:?}");
        let failed = result.groups.iter().flat_map(|group| &group.runs).filter(|run| run.error.is_some()).count();
        println!("Failed configurations: {failed} of {}", sweep.run_count());
    }
    Ok(())
}

/// Logs go to stderr so stdout only carries results. `--debug` overrides `RUST_LOG`
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
