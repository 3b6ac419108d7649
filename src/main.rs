//! Discount Exclusion CLI

use std::{io, path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use discount_exclusion::{
    catalog::{CustomerGroupId, FixedClock, ShopperScope, SystemClock, WebsiteId},
    config::{Config, ConfigError, StoreId},
    engine::DecisionEngine,
    evaluate::evaluate_fixture,
    fixtures::{Fixture, FixtureError},
    messages::MoneyFormatter,
    report::ReportError,
    strategies::{CatalogRuleStrategy, SpecialPriceStrategy},
    sync::{RuleStoreError, YamlRuleStore, sync_bypass_default},
};

#[derive(Debug, Parser)]
#[command(
    name = "discount-exclusion",
    about = "Decide whether cart price rules may discount already-discounted items",
    long_about = None
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a fixture set's rules against its cart and print the decisions
    Evaluate(EvaluateArgs),

    /// Set every rule's bypass flag to the configured default
    SyncBypassDefault(SyncArgs),
}

#[derive(Debug, Args)]
struct EvaluateArgs {
    /// Fixture set name
    #[arg(long)]
    fixture: String,

    /// Fixture base directory
    #[arg(long, default_value = "./fixtures")]
    fixtures_dir: PathBuf,

    /// Module configuration file
    #[arg(long, env = "DISCOUNT_EXCLUSION_CONFIG")]
    config: Option<PathBuf>,

    /// Store the cart belongs to
    #[arg(long)]
    store: Option<u32>,

    /// Website used for catalog rule lookups
    #[arg(long, default_value_t = 1)]
    website: u32,

    /// Customer group used for catalog rule lookups
    #[arg(long, default_value_t = 0)]
    customer_group: u32,

    /// Evaluation instant for catalog rules; defaults to now
    #[arg(long)]
    at: Option<Timestamp>,
}

#[derive(Debug, Args)]
struct SyncArgs {
    /// Rules file to update
    #[arg(long)]
    rules: PathBuf,

    /// Module configuration file supplying the default
    #[arg(long, env = "DISCOUNT_EXCLUSION_CONFIG")]
    config: Option<PathBuf>,

    /// Sync to bypass=enabled regardless of the configured default
    #[arg(long)]
    default_bypass: bool,

    /// Preview changes without applying them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    RuleStore(#[from] RuleStoreError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            #[expect(
                clippy::print_stderr,
                reason = "errors are reported to the terminal after logging is set up"
            )]
            {
                eprintln!("{error}");
            }

            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Evaluate(args) => evaluate(args),
        Commands::SyncBypassDefault(args) => sync(args),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, ConfigError> {
    path.map_or_else(|| Ok(Config::default()), Config::load)
}

fn evaluate(args: EvaluateArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_ref())?;
    let store = args.store.map(StoreId);

    let mut fixture = Fixture::with_base_path(args.fixtures_dir.clone());
    fixture
        .set_bypass_default(config.is_bypass_default())
        .load_set(&args.fixture)?;

    let index = fixture.catalog_index();
    let scope = ShopperScope {
        website: WebsiteId(args.website),
        customer_group: CustomerGroupId(args.customer_group),
    };

    let engine = DecisionEngine::with_defaults(config).with_strategy(SpecialPriceStrategy);
    let engine = match args.at {
        Some(at) => engine.with_strategy(CatalogRuleStrategy::new(index, FixedClock(at), scope)),
        None => engine.with_strategy(CatalogRuleStrategy::new(index, SystemClock, scope)),
    };

    info!(fixture = %args.fixture, rules = fixture.rules().len(), "evaluating fixture");

    let report = evaluate_fixture(&fixture, &engine, store)?;

    report.write_to(io::stdout().lock(), &MoneyFormatter::new(fixture.currency()?))?;

    Ok(())
}

fn sync(args: SyncArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_ref())?;
    let default = args.default_bypass || config.is_bypass_default();

    let mut store = YamlRuleStore::open(&args.rules)?;
    let report = sync_bypass_default(&mut store, default, args.dry_run)?;

    #[expect(clippy::print_stdout, reason = "the sync report is the command's output")]
    {
        println!("{report}");
    }

    Ok(())
}
