use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use unbundle_audit::{Config, PlatformArgs};
use unbundle_core::{CallerFrame, InstalledSpec, RecordedStack};

#[derive(Parser)]
#[command(name = "unbundle")]
#[command(about = "Warn about libraries that left the default distribution", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Audit a project for requires of unbundled libraries
    Audit(Config),
    /// Evaluate single load requests
    Check(CheckArgs),
    /// Print the unbundled library table
    List(PlatformArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Feature names or paths to evaluate, in order
    #[arg(required = true)]
    features: Vec<String>,

    /// Source file issuing the requests
    #[arg(long)]
    caller: Option<PathBuf>,

    /// Names of dependencies already satisfied
    #[arg(long = "spec")]
    specs: Vec<String>,

    #[command(flatten)]
    platform: PlatformArgs,
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Audit(cfg) => {
            let num_threads = rayon::current_num_threads();
            info!("Running audit (using {} threads)", num_threads);
            debug!("Config: root={:?}", cfg.root);

            let result = unbundle_audit::run_audit(cfg)?;
            let elapsed_ms = start.elapsed().as_millis();

            if result.findings.is_empty() {
                unbundle_audit::print_no_findings_message(&mut stdout)?;
            } else {
                unbundle_audit::print_findings_tree(&mut stdout, &result.findings)?;
            }
            writeln!(
                stdout,
                "\n{} Finished in {}ms on {} files (using {} threads).",
                "●".bright_blue(),
                elapsed_ms.to_string().cyan(),
                result.files_analyzed.to_string().cyan(),
                num_threads.to_string().cyan()
            )?;
            stdout.flush()?;

            if !result.findings.is_empty() {
                // Non-zero exit to fail CI
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Check(args) => {
            let engine = args.platform.engine(false)?;
            let specs: Vec<InstalledSpec> = args.specs.iter().map(InstalledSpec::new).collect();
            let requester = args.caller.map(CallerFrame::at).unwrap_or_default();
            let stack = RecordedStack::above_engine(vec![CallerFrame::unknown(), requester]);

            let mut warned = 0;
            for feature in &args.features {
                let msg = engine
                    .evaluate_load(feature, &specs, &stack)
                    .or_else(|| {
                        engine
                            .resolver()
                            .resolve_feature_path(feature)
                            .is_none()
                            .then(|| engine.missing_feature_notice(feature))
                            .flatten()
                    });
                match msg {
                    Some(msg) => {
                        warned += 1;
                        eprintln!("{} {}", "warning:".yellow().bold(), msg);
                    }
                    None => debug!("No warning for '{}'", feature),
                }
            }
            info!("{} of {} requests warned", warned, args.features.len());
            Ok(())
        }
        Commands::List(platform) => {
            let tables = platform.tables()?;
            let host = platform.host(false)?;
            let header = format!("{:<16} {:<8} {:<8} ALIAS", "NAME", "SINCE", "MATCH");
            writeln!(stdout, "{}", header.bold())?;
            for record in tables.records() {
                let since = format!("{:<8}", record.unbundled_since.to_string());
                let since = if host.runtime_version < record.unbundled_since {
                    since.yellow()
                } else {
                    since.red()
                };
                writeln!(
                    stdout,
                    "{:<16} {} {:<8} {}",
                    record.name,
                    since,
                    record.match_strategy.as_str(),
                    record.alias.as_deref().unwrap_or("-")
                )?;
            }
            stdout.flush()?;
            Ok(())
        }
    }
}
