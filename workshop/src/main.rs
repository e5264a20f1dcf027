//! Repair workshop simulation application.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use eyre::{eyre, WrapErr};
use indicatif::ProgressBar;

use workshop::{
    compare_with_arrivals, report, run_replications, simulate_pair, ArrivalDelays, Replication,
    Summary, WorkshopConfig,
};

/// Compares the cost of two repair regimes of a single-bay workshop.
#[derive(Parser)]
#[clap(version, author)]
struct Opt {
    /// Path to a JSON file with workshop parameters; missing values take their defaults.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Number of independent replications.
    #[clap(short, long, default_value = "100")]
    replications: usize,

    /// Overrides the random seed of the configuration.
    #[clap(long)]
    seed: Option<u64>,

    /// Overrides the number of simulated days of the configuration.
    #[clap(long)]
    days: Option<u32>,

    /// Path to a JSON array of inter-arrival delays. If given, a single comparison is run
    /// against these arrivals instead of generated ones.
    #[clap(long)]
    arrivals: Option<PathBuf>,

    /// Write per-replication results to this CSV file.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Write the car records of the first replication to this CSV file.
    #[clap(long)]
    records: Option<PathBuf>,

    /// Verbosity.
    #[clap(short, long, parse(from_occurrences))]
    verbose: i32,

    /// Store the logs this file.
    #[clap(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr.
    #[clap(long)]
    no_stderr: bool,

    /// Do not print progress.
    #[clap(long)]
    silent: bool,
}

/// Loads the configuration file, if any, and applies command line overrides.
fn load_config(opt: &Opt) -> eyre::Result<WorkshopConfig> {
    let mut config = if let Some(path) = &opt.config {
        let file = File::open(path)
            .wrap_err_with(|| format!("unable to open config: {}", path.display()))?;
        WorkshopConfig::from_reader(file).wrap_err("unable to load config")?
    } else {
        WorkshopConfig::default()
    };
    if let Some(seed) = opt.seed {
        config.random_seed = seed;
    }
    if let Some(days) = opt.days {
        config.total_days = days;
    }
    config.validate()?;
    Ok(config)
}

fn print_replication(replication: &Replication) {
    println!(
        "Stop hours: {:.2} (initial), {:.2} (new)",
        replication.initial.stop_hours, replication.new.stop_hours
    );
    println!(
        "Total cost: {:.2} (initial), {:.2} (new)",
        replication.initial.total_cost, replication.new.total_cost
    );
    println!(
        "Maximum allowed daily cost: {:.2}",
        replication.comparison.max_allowed_daily_cost_increase
    );
    println!(
        "Margin over maintenance: {:.2}",
        replication.comparison.margin_over_maintenance
    );
}

fn write_output(opt: &Opt, replications: &[Replication]) -> eyre::Result<()> {
    if let Some(path) = &opt.output {
        let file = File::create(path)
            .wrap_err_with(|| format!("unable to create output: {}", path.display()))?;
        report::write_replications(io::BufWriter::new(file), replications)?;
    }
    Ok(())
}

fn run(opt: &Opt) -> eyre::Result<()> {
    let config = load_config(opt)?;
    log::info!("Configuration: {:?}", config);

    if let Some(path) = &opt.arrivals {
        let file = File::open(path)
            .wrap_err_with(|| format!("unable to open arrivals: {}", path.display()))?;
        let delays = ArrivalDelays::from_reader(file).wrap_err("unable to load arrivals")?;
        let replication = compare_with_arrivals(&config, delays)?;
        print_replication(&replication);
        return write_output(opt, &[replication]);
    }

    if let Some(path) = &opt.records {
        let pair = simulate_pair(&config, 0)?;
        let file = File::create(path)
            .wrap_err_with(|| format!("unable to create records: {}", path.display()))?;
        report::write_records(io::BufWriter::new(file), &pair.initial, &pair.new)?;
    }

    let progress = if opt.silent {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(opt.replications as u64)
    };
    let replications = run_replications(&config, opt.replications, |_| progress.inc(1))?;
    progress.finish_and_clear();

    write_output(opt, &replications)?;

    let summary = Summary::new(
        replications
            .iter()
            .map(|r| (&r.initial, &r.new, &r.comparison)),
    )
    .ok_or_else(|| eyre!("no replications were run"))?;
    log::info!("{:?}", summary);
    println!(
        "Mean stop hours: {:.2} (initial), {:.2} (new)",
        summary.mean_initial_stop_hours, summary.mean_new_stop_hours
    );
    println!(
        "Mean margin over maintenance: {:.2} (min {:.2}, max {:.2})",
        summary.mean_margin_over_maintenance, summary.margin_range.0, summary.margin_range.1
    );
    Ok(())
}

/// Set up a logger based on the given user options.
fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let log_level = match opt.verbose {
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        3 => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    };
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(log_level);
    let dispatch = if let Some(path) = &opt.log_output {
        let _ = std::fs::remove_file(path);
        dispatch.chain(
            std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .append(false)
                .open(path)?,
        )
    } else {
        dispatch
    };
    let dispatch = if opt.no_stderr {
        dispatch
    } else {
        dispatch.chain(std::io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    set_up_logger(&opt)?;
    run(&opt)
}
