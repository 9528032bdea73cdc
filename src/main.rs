use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use menu_freshness::alert::sink::{AlertSink, StdoutSink, WriterSink};
use menu_freshness::alert::{evaluate_alerts, AlertsReport};
use menu_freshness::confidence::ConfidenceReport;
use menu_freshness::config::{Config, ConfigOverrides};
use menu_freshness::diff::{diff_snapshots, textual_diff, DiffReport};
use menu_freshness::inputs::{load_optional, load_required, write_report};
use menu_freshness::menu::AdjudicatedMenu;
use menu_freshness::output::csv::{alerts_to_csv, diff_to_csv, versions_to_csv};
use menu_freshness::output::json::{render_failure, render_json};
use menu_freshness::output::table::{
    render_alerts_table, render_confidence_table, render_diff_table, render_plan_table,
    render_snapshot_table, render_versions_table,
};
use menu_freshness::scheduler::{resolve_last_runs, SchedulerPlan};
use menu_freshness::snapshot::store::SnapshotStore;
use menu_freshness::snapshot::{Snapshot, SnapshotDraft, SnapshotEntry, VersionSelector};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "menu-freshness",
    about = "Menu snapshot diffing, confidence scoring and refresh scheduling"
)]
struct Cli {
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    output: OutputFormat,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage the snapshot history of a subject.
    Snapshot {
        #[command(subcommand)]
        action: SnapshotCommand,
    },
    /// Diff two snapshot versions of a subject.
    Diff {
        subject: String,
        /// Version id or "latest".
        #[arg(default_value = "latest")]
        new: String,
        /// Defaults to the version created just before NEW.
        old: Option<String>,
        #[arg(long, default_value = "data/diff_report.json")]
        out: PathBuf,
        /// Print a line-oriented diff of both listings instead of a table.
        #[arg(long)]
        text: bool,
    },
    /// Score the merged menu and classify drift against the previous one.
    Score {
        #[arg(default_value = "data/menu_merged.json")]
        current: PathBuf,
        #[arg(default_value = "data/confidence_report.json")]
        output_path: PathBuf,
        #[arg(long)]
        previous: Option<PathBuf>,
    },
    /// Derive alerts from a diff report (and optionally a confidence report).
    Alerts {
        #[arg(default_value = "data/diff_report.json")]
        diff: PathBuf,
        #[arg(default_value = "data/alerts_report.json")]
        output_path: PathBuf,
        #[arg(long)]
        confidence: Option<PathBuf>,
        /// Append each alert as a JSON line to this file.
        #[arg(long)]
        append_log: Option<PathBuf>,
    },
    /// Decide which acquisition tiers to run next.
    Plan {
        #[arg(default_value = "data/confidence_report.json")]
        confidence: PathBuf,
        #[arg(default_value = "data/scheduler_plan.json")]
        output_path: PathBuf,
        #[arg(long, default_value = "data/alerts_report.json")]
        alerts: PathBuf,
        #[arg(long, default_value = "data/diff_report.json")]
        diff: PathBuf,
        #[arg(long = "tier1-run", default_value = "data/tier1_run.json")]
        tier1_run: PathBuf,
        #[arg(long = "tier2-run", default_value = "data/tier2_run.json")]
        tier2_run: PathBuf,
        /// Evaluate intervals as of this RFC 3339 instant instead of now.
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Subcommand)]
enum SnapshotCommand {
    /// Import a captured menu as a new version.
    Import { subject: String, file: PathBuf },
    /// List versions in creation order.
    List { subject: String },
    /// Print one version.
    Show {
        subject: String,
        #[arg(default_value = "latest")]
        version: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", render_failure(&format!("{err:#}")));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = if verbose > 0 { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        db_path: cli.db.clone(),
    });

    match &cli.command {
        Commands::Config { init, show } => {
            handle_config_command(*init, *show, &config, &config_path)
        }
        Commands::Snapshot { action } => {
            let store = SnapshotStore::open(&config.resolved_db_path())?;
            handle_snapshot_command(&store, action, cli.output)
        }
        Commands::Diff {
            subject,
            new,
            old,
            out,
            text,
        } => {
            let store = SnapshotStore::open(&config.resolved_db_path())?;
            let (old_snapshot, new_snapshot) =
                resolve_diff_pair(&store, subject, new, old.as_deref())?;
            let report = diff_snapshots(&old_snapshot, &new_snapshot);
            write_report(out, &report)?;
            if *text {
                print!("{}", textual_diff(&old_snapshot, &new_snapshot));
                return Ok(());
            }
            print_diff(&report, cli.output)
        }
        Commands::Score {
            current,
            output_path,
            previous,
        } => {
            let current_menu: AdjudicatedMenu = load_required(current)?;
            let previous_menu = previous
                .as_deref()
                .and_then(load_optional::<AdjudicatedMenu>);
            let report = config.scorer().score(&current_menu, previous_menu.as_ref());
            write_report(output_path, &report)?;
            info!(
                "confidence {:.3}, drift {}",
                report.score, report.drift.severity
            );
            print_confidence(&report, &config, cli.output)
        }
        Commands::Alerts {
            diff,
            output_path,
            confidence,
            append_log,
        } => {
            let diff_report: DiffReport = load_required(diff)?;
            let confidence_report = confidence
                .as_deref()
                .and_then(load_optional::<ConfidenceReport>);
            let events = evaluate_alerts(&diff_report, confidence_report.as_ref(), &config.alerts);
            let report = AlertsReport::new(Utc::now(), events);
            write_report(output_path, &report)?;
            dispatch_alerts(&report, &config, cli.output, append_log.as_deref())?;
            print_alerts(&report, cli.output)
        }
        Commands::Plan {
            confidence,
            output_path,
            alerts,
            diff,
            tier1_run,
            tier2_run,
            now,
        } => {
            let confidence_report: ConfidenceReport = load_required(confidence)?;
            let critical_alerts = load_optional::<AlertsReport>(alerts)
                .map(|report| report.has_critical())
                .unwrap_or(false);
            let diff_available = load_optional::<DiffReport>(diff).is_some();
            let last_runs = resolve_last_runs(tier1_run, tier2_run);
            let plan = config.scheduler().plan(
                &confidence_report,
                critical_alerts,
                diff_available,
                last_runs,
                now.unwrap_or_else(Utc::now),
            );
            write_report(output_path, &plan)?;
            print_plan(&plan, cli.output)
        }
    }
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn handle_snapshot_command(
    store: &SnapshotStore,
    action: &SnapshotCommand,
    format: OutputFormat,
) -> Result<()> {
    match action {
        SnapshotCommand::Import { subject, file } => {
            let draft: SnapshotDraft = load_required(file)?;
            let snapshot = draft.into_snapshot(Utc::now());
            let filename = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{}.json", snapshot.version_id));
            let entry = store.insert_snapshot(subject, &snapshot, &filename)?;
            info!(
                "imported {} items for {subject} as {}",
                entry.item_count, entry.version_id
            );
            print_versions(std::slice::from_ref(&entry), format)
        }
        SnapshotCommand::List { subject } => {
            let versions = store.list_versions(subject)?;
            if versions.is_empty() {
                warn!("no snapshots recorded for {subject}");
            }
            print_versions(&versions, format)
        }
        SnapshotCommand::Show { subject, version } => {
            let selector = parse_selector(version)?;
            let snapshot = store
                .resolve(subject, &selector)?
                .ok_or_else(|| anyhow!("no snapshot {selector} for subject {subject}"))?;
            match format {
                OutputFormat::Table => println!("{}", render_snapshot_table(&snapshot)),
                OutputFormat::Json => println!("{}", render_json(&snapshot)?),
                OutputFormat::Csv => {
                    warn!("CSV output for snapshot show not implemented, using JSON");
                    println!("{}", render_json(&snapshot)?);
                }
            }
            Ok(())
        }
    }
}

fn parse_selector(raw: &str) -> Result<VersionSelector> {
    VersionSelector::from_str(raw).map_err(|e| anyhow!("{e}: {raw:?}"))
}

fn resolve_diff_pair(
    store: &SnapshotStore,
    subject: &str,
    new: &str,
    old: Option<&str>,
) -> Result<(Snapshot, Snapshot)> {
    let new_selector = parse_selector(new)?;
    let new_snapshot = store
        .resolve(subject, &new_selector)?
        .ok_or_else(|| anyhow!("no snapshot {new_selector} for subject {subject}"))?;

    let old_selector = match old {
        Some(raw) => parse_selector(raw)?,
        None => {
            let previous = store
                .previous_version(subject, &new_snapshot.version_id)?
                .with_context(|| {
                    format!(
                        "no version before {} for subject {subject}; pass OLD explicitly",
                        new_snapshot.version_id
                    )
                })?;
            VersionSelector::Version(previous.version_id)
        }
    };
    let old_snapshot = store
        .resolve(subject, &old_selector)?
        .ok_or_else(|| anyhow!("no snapshot {old_selector} for subject {subject}"))?;
    Ok((old_snapshot, new_snapshot))
}

fn dispatch_alerts(
    report: &AlertsReport,
    config: &Config,
    format: OutputFormat,
    append_log: Option<&Path>,
) -> Result<()> {
    let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();
    // Machine-readable formats keep stdout clean.
    if config.alerts.enable_stdout && matches!(format, OutputFormat::Table) {
        sinks.push(Box::new(StdoutSink));
    }
    if let Some(path) = append_log {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed opening alert log: {}", path.display()))?;
        sinks.push(Box::new(WriterSink::new(file)));
    }
    for alert in &report.alerts {
        for sink in &sinks {
            if let Err(err) = sink.send(alert) {
                warn!("failed sending alert: {err}");
            }
        }
    }
    Ok(())
}

fn print_versions(entries: &[SnapshotEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_versions_table(entries)),
        OutputFormat::Json => println!("{}", render_json(entries)?),
        OutputFormat::Csv => print!("{}", versions_to_csv(entries)?),
    }
    Ok(())
}

fn print_diff(report: &DiffReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_diff_table(report)),
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => print!("{}", diff_to_csv(report)?),
    }
    Ok(())
}

fn print_confidence(report: &ConfidenceReport, config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_confidence_table(report, &config.scheduler)),
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => {
            warn!("CSV output for score not implemented, using JSON");
            println!("{}", render_json(report)?);
        }
    }
    Ok(())
}

fn print_alerts(report: &AlertsReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_alerts_table(&report.alerts)),
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => print!("{}", alerts_to_csv(&report.alerts)?),
    }
    Ok(())
}

fn print_plan(plan: &SchedulerPlan, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_plan_table(plan)),
        OutputFormat::Json => println!("{}", render_json(plan)?),
        OutputFormat::Csv => {
            warn!("CSV output for plan not implemented, using JSON");
            println!("{}", render_json(plan)?);
        }
    }
    Ok(())
}
