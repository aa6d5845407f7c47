use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use shade::MergeReport;
use shade_config::{init_tracing, ConfigError, ConfigFile, LoggingConfig, Plan, DEFAULT_CONFIG_FILE};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "shade", version, about = "Merge jars into one, relocating packages on the way")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge the configured inputs into the output jar
    Merge(MergeArgs),
    /// List dependency classes minimization would drop, without merging
    Unused(CommonArgs),
    /// Parse and validate a config file
    CheckConfig(CommonArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Path to the config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct MergeArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Write the jar here instead of the configured output path
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Merge(args) => {
            let mut plan = load_plan(&args.common.config)?;
            if let Some(output) = args.output {
                plan.config.output = output;
            }
            let report = plan.run().context("merge failed")?;
            print_report(&report, args.common.json)?;
            Ok(0)
        }
        Command::Unused(args) => {
            let plan = load_plan(&args.config)?;
            if plan.minimization.is_none() {
                tracing::warn!(target = "shade.cli", "minimization is disabled in the config");
            }
            let unused = plan
                .unused_classes()
                .context("failed to compute unused classes")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&unused)?);
            } else {
                for class in &unused {
                    println!("{class}");
                }
            }
            Ok(0)
        }
        Command::CheckConfig(args) => check_config(&args.config, args.json),
    }
}

fn base_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn load_plan(path: &Path) -> Result<Plan> {
    let config = ConfigFile::load_from_path(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    init_tracing(&config.logging);
    config
        .into_plan(base_dir(path))
        .with_context(|| format!("invalid config {}", path.display()))
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    config: &'a Path,
    valid: bool,
    problems: &'a [String],
}

fn check_config(path: &Path, json: bool) -> Result<i32> {
    init_tracing(&LoggingConfig::default());
    let config = ConfigFile::load_from_path(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let problems = match config.validate(base_dir(path)) {
        Ok(()) => Vec::new(),
        Err(err @ ConfigError::Invalid(_)) => err.problems().to_vec(),
        Err(err) => return Err(err.into()),
    };

    if json {
        let out = CheckOutput {
            config: path,
            valid: problems.is_empty(),
            problems: &problems,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if problems.is_empty() {
        println!("{}: ok", path.display());
    } else {
        println!("{}: {} problem(s)", path.display(), problems.len());
        for problem in &problems {
            println!("  - {problem}");
        }
    }
    Ok(if problems.is_empty() { 0 } else { 1 })
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    output: &'a Path,
    sources: usize,
    jars: usize,
    entries_written: usize,
    classes_relocated: usize,
    transformed_entries: usize,
    filtered_entries: usize,
    unused_classes: &'a [String],
    duplicates: usize,
    elapsed_ms: u128,
}

fn print_report(report: &MergeReport, json: bool) -> Result<()> {
    if json {
        let out = ReportOutput {
            output: &report.output,
            sources: report.sources,
            jars: report.jars,
            entries_written: report.entries_written,
            classes_relocated: report.classes_relocated,
            transformed_entries: report.transformed_entries,
            filtered_entries: report.filtered_entries,
            unused_classes: &report.unused_classes,
            duplicates: report.duplicates.total(),
            elapsed_ms: report.elapsed.as_millis(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
