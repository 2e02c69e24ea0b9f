//! `sdlc`: a thin CLI over the SDL compiler and the Instance/Upgrade
//! Engines (spec §6). No vendor adapter ships in this workspace, so
//! `create`/`drop`/`diff` render their plan through a generic
//! [`console_connector::ConsoleConnector`] rather than a live database.

mod console_connector;
mod error;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use console_connector::ConsoleConnector;
use error::{CliError, CliResult};
use instance_engine::{InstanceEngine, PlanExtras};
use naming::NamingScheme;
use sdl::{GlobalId, ValidatedSchema};
use upgrade_engine::{UpgradeEngine, UpgradeExtras};

#[derive(Parser)]
#[command(name = "sdlc", about = "Compile and instantiate SDL schemas")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Treat warnings as errors (spec §4.3).
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and compile the schema set, printing any diagnostics.
    Check { paths: Vec<PathBuf> },
    /// Compile the schema set and print its create plan.
    Create { paths: Vec<PathBuf> },
    /// Compile the schema set and print its drop plan.
    Drop {
        paths: Vec<PathBuf>,
        /// Drop every realized schema with `CASCADE` instead of the
        /// detailed per-object order (spec §4.5).
        #[arg(long)]
        force: bool,
    },
    /// Compile two schema sets and print the upgrade plan between them.
    Diff {
        #[arg(long = "old", required = true)]
        old: Vec<PathBuf>,
        #[arg(long = "new", required = true)]
        new: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "sdlc failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Check { paths } => check(&paths, cli.strict),
        Command::Create { paths } => create(&paths, cli.strict),
        Command::Drop { paths, force } => drop_cmd(&paths, cli.strict, force),
        Command::Diff { old, new } => diff(&old, &new, cli.strict),
    }
}

fn compile(paths: &[PathBuf], strict: bool, connector: &ConsoleConnector) -> CliResult<ValidatedSchema<'static>> {
    let db = sdl::aggregate(paths, &[], &sdl::FsSourceLoader).map_err(|d| CliError::Diagnostics(d.to_string()))?;
    let db: &'static sdl::ParserDatabase = Box::leak(Box::new(db));
    let validated = sdl::compile(db, strict, connector).map_err(|d| CliError::Diagnostics(d.to_string()))?;
    if !validated.diagnostics.is_empty() {
        eprintln!("{}", validated.diagnostics);
    }
    Ok(validated)
}

fn check(paths: &[PathBuf], strict: bool) -> CliResult<()> {
    compile(paths, strict, &ConsoleConnector)?;
    println!("ok");
    Ok(())
}

fn create(paths: &[PathBuf], strict: bool) -> CliResult<()> {
    let connector = ConsoleConnector;
    let validated = compile(paths, strict, &connector)?;
    let scheme = NamingScheme::default();
    let engine = InstanceEngine::new(&validated, &scheme);

    let plan = engine.create_plan(&PlanExtras::default(), |field_id: GlobalId| {
        types::field_type_spec(&validated, &connector, field_id).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to the logical type name");
            String::new()
        })
    })?;

    engine.apply(&plan, &connector, false)?;
    Ok(())
}

fn drop_cmd(paths: &[PathBuf], strict: bool, force: bool) -> CliResult<()> {
    let connector = ConsoleConnector;
    let validated = compile(paths, strict, &connector)?;
    let scheme = NamingScheme::default();
    let engine = InstanceEngine::new(&validated, &scheme);

    let plan = engine.drop_plan(&PlanExtras::default(), force)?;
    engine.apply(&plan, &connector, force)?;
    Ok(())
}

fn diff(old_paths: &[PathBuf], new_paths: &[PathBuf], strict: bool) -> CliResult<()> {
    let connector = ConsoleConnector;
    let old_validated = compile(old_paths, strict, &connector)?;
    let new_validated = compile(new_paths, strict, &connector)?;
    let scheme = NamingScheme::default();
    let engine = UpgradeEngine::new(&old_validated, &new_validated, &scheme);

    let type_spec_of = |validated: &ValidatedSchema<'_>, field_id: GlobalId| {
        types::field_type_spec(validated, &connector, field_id).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to the logical type name");
            String::new()
        })
    };
    let plan = engine.plan(&UpgradeExtras::default(), |field_id| type_spec_of(&old_validated, field_id), |field_id| type_spec_of(&new_validated, field_id))?;

    engine.apply(&plan, &connector, false)?;
    Ok(())
}
