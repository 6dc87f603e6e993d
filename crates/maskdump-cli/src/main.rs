mod registry;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use maskdump_core::{ConnectionDescriptor, Error as CoreError, redact_connection};
use maskdump_export::{
    CsvDirSink, DEFAULT_CHUNK_SIZE, ExportDriver, ExportError, ExportOptions, ExportReport,
    GeneratorRegistry,
};
use maskdump_introspect::{DatabaseConnection, SnapshotLoader, connect};
use maskdump_plan::{
    DumpConfig, DumpPlan, PlanError, parse_plan, validate_plan_against_snapshot,
};
use registry::{RunContext, RunOptions, init_run_logging, start_run, write_plan, write_report};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "maskdump", version, about = "Masked database dumps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the dump configuration into plan.json.
    Plan(PlanArgs),
    /// Export structure and masked rows.
    Dump(DumpArgs),
    /// List the available generator ids.
    Generators,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Dump configuration (TOML).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
    /// Optional output path for plan.json.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Dump configuration (TOML).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
    /// Directory receiving structure.json and one CSV per table.
    #[arg(long)]
    out_dir: PathBuf,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Rows per batch for tables without their own chunk size.
    #[arg(long)]
    chunk_size: Option<usize>,
    /// Replay a stored plan.json instead of resolving the configuration.
    #[arg(long, value_name = "FILE")]
    plan: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Plan(args) => run_plan(args).await,
        Command::Dump(args) => run_dump(args).await,
        Command::Generators => {
            for id in GeneratorRegistry::new().ids() {
                println!("{id}");
            }
            Ok(())
        }
    }
}

async fn run_plan(args: PlanArgs) -> Result<(), CliError> {
    let config = DumpConfig::load(&args.config)?;
    let descriptor = config.connection_descriptor()?;

    let run_ctx = run_context(
        "plan",
        &args.run_dir,
        &config,
        &args.config,
        &descriptor,
        |_| {},
    );
    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(
        event = "run_started",
        run_id = %run_ctx.run_id,
        command = "plan",
        run_dir = %run_paths.root.display(),
        connection = %run_ctx.connection.redacted
    );
    let timer = Instant::now();

    let connected = connect(&descriptor).await.map_err(CliError::from);
    let connection = finish_on_error(connected, &timer)?;
    let resolved = resolve_plan(&config, &connection).await;
    connection.close().await;
    let plan = finish_on_error(resolved, &timer)?;

    write_plan(&run_paths, &plan, args.out.as_deref())?;
    tracing::info!(event = "plan_written", path = %run_paths.plan_path.display());

    tracing::info!(
        event = "run_finished",
        status = "success",
        tables = plan.len(),
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

async fn run_dump(args: DumpArgs) -> Result<(), CliError> {
    let config = DumpConfig::load(&args.config)?;
    let descriptor = config.connection_descriptor()?;

    let run_ctx = run_context(
        "dump",
        &args.run_dir,
        &config,
        &args.config,
        &descriptor,
        |options| {
            options.plan_path = args.plan.as_ref().map(|path| path.display().to_string());
            options.out_dir = Some(args.out_dir.display().to_string());
            options.chunk_size = args.chunk_size;
        },
    );
    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(
        event = "run_started",
        run_id = %run_ctx.run_id,
        command = "dump",
        run_dir = %run_paths.root.display(),
        connection = %run_ctx.connection.redacted
    );
    let timer = Instant::now();

    let connected = connect(&descriptor).await.map_err(CliError::from);
    let connection = finish_on_error(connected, &timer)?;
    let exported = export(&config, &args, &connection).await;
    connection.close().await;
    let (plan, report) = finish_on_error(exported, &timer)?;

    write_plan(&run_paths, &plan, None)?;
    write_report(&run_paths, &report)?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    tracing::info!(
        event = "run_finished",
        status = "success",
        tables = report.tables.len(),
        rows = report.rows_total,
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

async fn resolve_plan(
    config: &DumpConfig,
    connection: &DatabaseConnection,
) -> Result<DumpPlan, CliError> {
    let mut loader = SnapshotLoader::new(connection, config.introspect_options());
    let plan = config.dump_schema().load(&mut loader).await?;
    Ok(plan)
}

async fn export(
    config: &DumpConfig,
    args: &DumpArgs,
    connection: &DatabaseConnection,
) -> Result<(DumpPlan, ExportReport), CliError> {
    let plan = match &args.plan {
        Some(path) => {
            let plan_json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
            let plan = parse_plan(&plan_json)?;
            let mut loader = SnapshotLoader::new(connection, config.introspect_options());
            let snapshot = loader.load().await?;
            validate_plan_against_snapshot(&plan, snapshot)?;
            tracing::info!(event = "plan_loaded", path = %path.display(), tables = plan.len());
            plan
        }
        None => resolve_plan(config, connection).await?,
    };

    let registry = GeneratorRegistry::new();
    let options = ExportOptions {
        chunk_size: args.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
    };
    let driver = ExportDriver::new(&registry, options)?;
    let mut sink = CsvDirSink::create(&args.out_dir)?;
    let report = driver.export(&plan, connection, &mut sink).await?;
    Ok((plan, report))
}

fn run_context(
    command: &str,
    run_dir: &Path,
    config: &DumpConfig,
    config_path: &Path,
    descriptor: &ConnectionDescriptor,
    customize: impl FnOnce(&mut RunOptions),
) -> RunContext {
    let mut options = RunOptions {
        config_path: config_path.display().to_string(),
        seed: config.seed,
        include_all_tables: config.include_all_tables,
        include_views: config.introspect.include_views,
        overrides: config.tables.iter().map(|table| table.name.clone()).collect(),
        plan_path: None,
        out_dir: None,
        chunk_size: None,
    };
    customize(&mut options);

    RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: chrono::Utc::now(),
        command: command.to_string(),
        run_dir: run_dir.to_path_buf(),
        options,
        connection: redact_connection(descriptor),
    }
}

fn finish_on_error<T>(result: Result<T, CliError>, timer: &Instant) -> Result<T, CliError> {
    if let Err(err) = &result {
        tracing::warn!(
            event = "run_finished",
            status = "failure",
            error = %err,
            duration_ms = timer.elapsed().as_millis() as u64
        );
    }
    result
}
