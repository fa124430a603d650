mod report;

use clap::{Args, Parser, Subcommand};
use repro_recognizer::{Context, Device, DirectorySource, Options, Retrying, verify_with};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "repro-recognizer")]
#[command(about = "Check captured Android snapshots against a bug's expected symptoms", long_about = None)]
#[command(version, args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    verify: VerifyArgs,

    /// Log every populated entity and predicate outcome
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Store new snapshot files under a snapshot directory
    Record(RecordArgs),
}

#[derive(Args)]
struct VerifyArgs {
    /// Assertion text, e.g. `d = Device() AND has_crash(d)`
    #[arg(long, conflicts_with = "dsl_file")]
    dsl: Option<String>,

    /// File holding the assertion text
    #[arg(long)]
    dsl_file: Option<PathBuf>,

    /// Directory with `view_hierarchy/` and `device_info/` snapshots
    #[arg(long, required = true)]
    snapshots: Option<PathBuf>,

    /// Package of the app under test
    #[arg(long)]
    app_pkg: Option<String>,

    /// Default `text_similar` threshold
    #[arg(long)]
    threshold: Option<f64>,

    /// Label used in log lines and the report
    #[arg(long, default_value = "run")]
    label: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Force colored output
    #[arg(long, overrides_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[derive(Args)]
struct RecordArgs {
    /// Snapshot directory to write into
    #[arg(long)]
    snapshots: PathBuf,

    /// uiautomator XML dump to store as the current layout
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Device-info JSON to store as the current device facts
    #[arg(long)]
    device: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let result = match cli.command {
        Some(Command::Record(args)) => run_record(args).map(|()| ExitCode::SUCCESS),
        None => run_verify(cli.verify),
    };
    result.unwrap_or_else(|err| {
        eprintln!("error: {err}");
        ExitCode::from(2)
    })
}

fn run_verify(args: VerifyArgs) -> Result<ExitCode, String> {
    let text = match (&args.dsl, &args.dsl_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?,
        (None, None) => return Err("one of --dsl or --dsl-file is required".to_string()),
    };
    let root = args.snapshots.ok_or("--snapshots is required")?;

    let mut options = Options::default();
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(format!("--threshold must be between 0 and 1, got {threshold}"));
        }
        options.similarity_threshold = threshold;
    }
    let context = Context { app_package: args.app_pkg, label: args.label };

    let source = Retrying::new(DirectorySource::new(root));
    let run = verify_with(text.trim(), &source, &context, &options).map_err(|e| e.to_string())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run).map_err(|e| e.to_string())?);
    } else {
        let color = if args.no_color { false } else { args.color || io::stdout().is_terminal() };
        print!("{}", report::render(&run, color));
    }
    Ok(if run.verdict { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn run_record(args: RecordArgs) -> Result<(), String> {
    if args.layout.is_none() && args.device.is_none() {
        return Err("nothing to record: pass --layout and/or --device".to_string());
    }
    let target = DirectorySource::new(&args.snapshots);
    let read = |path: &PathBuf| fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()));

    if let Some(path) = &args.layout {
        let stored = target.record_layout(&read(path)?).map_err(|e| e.to_string())?;
        println!("{}", stored.display());
    }
    if let Some(path) = &args.device {
        let device = Device::from_json("", &read(path)?).map_err(|e| e.to_string())?;
        let stored = target.record_device_info(&device).map_err(|e| e.to_string())?;
        println!("{}", stored.display());
    }
    Ok(())
}
