//! quadpi CLI
//!
//! Prints the midpoint-rule approximation of pi. With no arguments it runs the
//! reference scenario: 100000 steps, sequential, six fractional digits.

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use quadpi_core::{Config, OutputFormat, Reduction, StepCount, WorkerCount};
use quadpi_kernel::Integrator;
use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("quadpi")
        .version("0.1.0")
        .about("Approximate pi with the midpoint rule")
        .arg(
            Arg::new("steps")
                .short('n')
                .long("steps")
                .value_name("N")
                .help("Number of subintervals")
                .default_value("100000")
                .value_parser(str::parse::<StepCount>),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .value_name("W")
                .help("Worker threads for parallel strategies [default: available parallelism]")
                .value_parser(str::parse::<WorkerCount>),
        )
        .arg(
            Arg::new("strategy")
                .short('s')
                .long("strategy")
                .value_name("NAME")
                .help("Reduction strategy: sequential, chunked, strided, tree, atomic, critical, rayon")
                .default_value("sequential")
                .value_parser(str::parse::<Reduction>),
        )
        .arg(
            Arg::new("precision")
                .short('p')
                .long("precision")
                .value_name("DIGITS")
                .help("Fractional digits in text output")
                .default_value("6")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format: text or json")
                .default_value("text")
                .value_parser(str::parse::<OutputFormat>),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log diagnostics to stderr (repeat for more)")
                .action(ArgAction::Count),
        )
}

fn main() -> ExitCode {
    let (config, verbosity) = match parse_args(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => return ExitCode::from(usage_exit_code(&e, e.print())),
    };

    if let Err(e) = init_logging(verbosity) {
        eprintln!("{e:#}");
    }

    debug!(?config, "parsed configuration");

    let stdout = io::stdout();
    match run(&config, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: u8) -> Result<(), anyhow::Error> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

/// Exit code once clap has reported a usage error, `--help` or `--version`
///
/// Clap's own code (0 or 2) when the message was printed, 1 when printing it
/// failed.
fn usage_exit_code(error: &clap::Error, printed: io::Result<()>) -> u8 {
    match printed {
        Ok(()) => u8::try_from(error.exit_code()).unwrap_or(2),
        Err(_) => 1,
    }
}

/// Parse the command line into a config and a verbosity level
fn parse_args<I, T>(args: I) -> Result<(Config, u8), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    cli()
        .try_get_matches_from(args)
        .map(|matches| (config_from_matches(&matches), matches.get_count("verbose")))
}

fn config_from_matches(matches: &ArgMatches) -> Config {
    let mut config = Config::default();
    if let Some(steps) = matches.get_one::<StepCount>("steps") {
        config = config.with_steps(*steps);
    }
    if let Some(workers) = matches.get_one::<WorkerCount>("workers") {
        config = config.with_workers(*workers);
    }
    if let Some(reduction) = matches.get_one::<Reduction>("strategy") {
        config = config.with_reduction(*reduction);
    }
    if let Some(precision) = matches.get_one::<u16>("precision") {
        config = config.with_precision(*precision);
    }
    if let Some(format) = matches.get_one::<OutputFormat>("format") {
        config = config.with_format(*format);
    }
    config
}

fn run(config: &Config, out: &mut impl Write) -> Result<(), anyhow::Error> {
    let estimate = Integrator::new(config).integrate()?;

    match config.output.format {
        OutputFormat::Text => {
            writeln!(out, "{}", estimate.render(config.output.precision))
                .context("failed to write result")?;
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, &estimate.report())
                .context("failed to write report")?;
            writeln!(out).context("failed to write report")?;
        }
    }
    Ok(())
}
