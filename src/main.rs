//! CLI entrypoint for `protect-reveal`.
//!
//! Parses command-line arguments, builds the HTTP client, drives the
//! protect/reveal loop (single-record or bulk), prints a terminal
//! summary, and optionally writes CSV results when an output directory
//! is provided.
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, error};
use protect_reveal::{
    client::{ProtectApi, ProtectRevealClient},
    export::{save_batches_csv, save_iterations_csv},
    report::{
        render_batch_bodies, render_bulk_summary, render_iteration_bodies, render_progress_line,
        render_run_summary,
    },
    runner::{BulkIterationResult, IterationResult, run_bulk_iteration, run_iteration},
    sequence::{generate_sequence, increment_numeric_string},
    stats::{bulk_stats, run_stats},
};

#[derive(Parser, Debug)]
#[command(
    name = "protect-reveal",
    version,
    about = "Loop protect/reveal calls against a data protection API and measure time"
)]
struct Args {
    /// API host
    #[arg(long, default_value = "192.168.0.231")]
    host: String,

    /// API port
    #[arg(long, default_value_t = 32082)]
    port: u16,

    /// protection_policy_name sent with every request
    #[arg(long, default_value = "P03")]
    policy: String,

    /// Numeric data value to start from
    #[arg(long = "start-data", default_value = "0123456789123")]
    start_data: String,

    /// Number of protect/reveal round trips (number of items in bulk mode)
    #[arg(short = 'n', long, default_value_t = 100)]
    iterations: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Bearer token attached to every request
    #[arg(long = "auth-token")]
    auth_token: Option<String>,

    /// Username forwarded with bulk reveal requests
    #[arg(long)]
    username: Option<String>,

    /// Use bulk protect/reveal endpoints
    #[arg(long)]
    bulk: bool,

    /// Batch size for bulk operations
    #[arg(long = "batch-size", default_value_t = 25)]
    batch_size: usize,

    /// Print request and response JSON bodies
    #[arg(long = "show-bodies")]
    show_bodies: bool,

    /// Show per-iteration progress output
    #[arg(long = "show-progress")]
    show_progress: bool,

    /// Write results as CSV into this directory
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control color output (auto, always, never)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Suppress the summary block (still writes exports if -o is provided)
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn verify_args(args: &Args) -> Result<()> {
    if args.start_data.is_empty() || !args.start_data.bytes().all(|b| b.is_ascii_digit()) {
        bail!(
            "--start-data must be a numeric string, got {:?}",
            args.start_data
        );
    }
    if args.bulk && args.batch_size == 0 {
        bail!("--batch-size must be at least 1");
    }
    if args.timeout == 0 {
        bail!("--timeout must be at least 1 second");
    }
    Ok(())
}

fn run_single<C: ProtectApi>(args: &Args, client: &C) -> Vec<IterationResult> {
    let mut current = args.start_data.clone();
    let mut results = Vec::with_capacity(args.iterations);
    for i in 1..=args.iterations {
        let result = run_iteration(client, &current);
        if args.show_progress {
            println!("{}", render_progress_line(i, &result));
        }
        if args.show_bodies {
            if !args.show_progress {
                println!("#{:03} data={}", i, current);
            }
            print!("{}", render_iteration_bodies(&args.policy, &result));
        }
        results.push(result);
        match increment_numeric_string(&current) {
            Ok(next) => current = next,
            Err(e) => {
                error!("{e}; stopping iterations");
                break;
            }
        }
    }
    results
}

fn run_bulk<C: ProtectApi>(args: &Args, client: &C, inputs: &[String]) -> Vec<BulkIterationResult> {
    let results = run_bulk_iteration(client, inputs, args.batch_size, args.username.as_deref());
    if args.show_bodies {
        for (idx, batch) in results.iter().enumerate() {
            println!("{}", render_batch_bodies(idx + 1, batch));
        }
    }
    results
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);
    // Configure color policy
    match args.color {
        ColorChoice::Always => {
            colored::control::set_override(true);
        }
        ColorChoice::Never => {
            colored::control::set_override(false);
        }
        ColorChoice::Auto => {}
    }
    if let Err(e) = verify_args(&args) {
        error!("{}", e);
        std::process::exit(2);
    }
    let client = match ProtectRevealClient::new(
        &args.host,
        args.port,
        &args.policy,
        Duration::from_secs(args.timeout),
        args.auth_token.as_deref(),
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to build http client: {}", e);
            std::process::exit(3);
        }
    };

    let outdir = match &args.output {
        Some(dir) => {
            if let Err(e) = fs::create_dir_all(dir) {
                error!("failed to create output directory {}: {}", dir.display(), e);
                std::process::exit(4);
            }
            Some(dir.clone())
        }
        None => None,
    };
    let ts = chrono::Local::now().format("%Y.%m.%d_%H.%M.%S");

    if args.bulk {
        let inputs = match generate_sequence(&args.start_data, args.iterations) {
            Ok(v) => v,
            Err(e) => {
                error!("{}", e);
                std::process::exit(2);
            }
        };
        let results = run_bulk(&args, &client, &inputs);
        if !args.quiet {
            println!("{}", render_bulk_summary(&bulk_stats(&results)));
        }
        if let Some(dir) = outdir {
            let csv = dir.join(format!("protect_reveal_batches_{}.csv", ts));
            if let Err(e) = save_batches_csv(&results, &csv) {
                error!("failed to write {}: {}", csv.display(), e);
                std::process::exit(5);
            }
        }
    } else {
        let t_start = Instant::now();
        let results = run_single(&args, &client);
        let total = t_start.elapsed();
        if !args.quiet {
            println!("{}", render_run_summary(&run_stats(&results, total)));
        }
        if let Some(dir) = outdir {
            let csv = dir.join(format!("protect_reveal_iterations_{}.csv", ts));
            if let Err(e) = save_iterations_csv(&results, &csv) {
                error!("failed to write {}: {}", csv.display(), e);
                std::process::exit(5);
            }
        }
    }
}
