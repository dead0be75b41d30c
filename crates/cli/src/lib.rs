use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use report::{ActionOutput, Output, ScanOutput, StatusOutput};
use startopt_observer::{ContainerPathResolver, ContainerScanner, LocalContainerProvider};
use startopt_optimiser::{LogNotifier, MenuAction, OptimiserConfig, ResolverHost, StartupOptimiser};
use startopt_prefs::FilePreferences;
use startopt_registry::MemoryRegistry;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod report;

const APP_DIR_NAME: &str = "startopt";
const CONFIG_FILE_NAME: &str = "config.toml";
const PREFERENCES_FILE_NAME: &str = "preferences.json";

#[derive(Parser)]
#[command(name = "startopt")]
#[command(about = "Skip unused printer configuration files at startup", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Preferences file holding the blacklist
    #[arg(long, global = true)]
    preferences: Option<PathBuf>,

    /// Optimiser config (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the blacklisted containers
    Status,

    /// Run a startup scan and show what would load
    Scan(ScanArgs),

    /// Disable loading configuration files the active setup does not use
    Optimise(OptimiseArgs),

    /// Load only 'generic' materials
    #[command(name = "generic-materials")]
    GenericMaterials(RegistryArgs),

    /// Restore all configuration files
    Restore,

    /// Load these containers again on the next start
    Allow(IdsArgs),

    /// Skip these containers on future starts
    Disable(IdsArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Container directories (defaults to the configured search paths)
    dirs: Vec<PathBuf>,
}

#[derive(Args)]
struct RegistryArgs {
    /// Registry snapshot (JSON) describing stacks and instance containers
    #[arg(long)]
    registry: PathBuf,
}

#[derive(Args)]
struct OptimiseArgs {
    #[command(flatten)]
    registry: RegistryArgs,

    /// Container directories (defaults to the configured search paths)
    dirs: Vec<PathBuf>,
}

#[derive(Args)]
struct IdsArgs {
    /// Container ids
    #[arg(required = true)]
    ids: Vec<String>,
}

/// Host side of the command-line tool: the resolver the scan goes through.
#[derive(Default)]
struct CliHost {
    resolver: Option<Arc<dyn ContainerPathResolver>>,
}

impl ResolverHost for CliHost {
    fn install_resolver(&mut self, resolver: Arc<dyn ContainerPathResolver>) {
        self.resolver = Some(resolver);
    }
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_deref())?;
    let preferences_path = match &cli.preferences {
        Some(path) => path.clone(),
        None => app_dir()?.join(PREFERENCES_FILE_NAME),
    };
    let preferences = FilePreferences::open(&preferences_path)
        .with_context(|| format!("open preferences {}", preferences_path.display()))?;

    let optimiser = StartupOptimiser::new(
        config,
        Box::new(preferences),
        Arc::new(LocalContainerProvider::with_stock_types()),
        Box::new(LogNotifier),
    )?;

    let output = match cli.command {
        Commands::Status => Output::Status(status(&optimiser)),
        Commands::Scan(args) => Output::Scan(run_scan(&optimiser, &args.dirs)?),
        Commands::Optimise(args) => {
            run_scan(&optimiser, &args.dirs)?;
            let registry = load_registry(&args.registry.registry)?;
            run_action(&optimiser, MenuAction::DisableUnused, &registry)?
        }
        Commands::GenericMaterials(args) => {
            let registry = load_registry(&args.registry)?;
            run_action(&optimiser, MenuAction::LoadOnlyGenericMaterials, &registry)?
        }
        Commands::Restore => {
            run_action(&optimiser, MenuAction::RestoreAll, &MemoryRegistry::new())?
        }
        Commands::Allow(args) => {
            let mut removed = 0;
            for id in &args.ids {
                if optimiser.on_container_added(id)? {
                    removed += 1;
                } else {
                    log::info!("{id} was not blacklisted");
                }
            }
            Output::Action(ActionOutput {
                action: "allow".to_string(),
                added: 0,
                removed,
                total: optimiser.blacklist().len(),
            })
        }
        Commands::Disable(args) => {
            let change = optimiser.disable_containers(args.ids)?;
            Output::Action(ActionOutput {
                action: "disable".to_string(),
                added: change.added,
                removed: 0,
                total: change.total,
            })
        }
    };

    output.print(cli.json)
}

fn app_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| anyhow!("cannot determine the user config directory; pass --preferences"))
}

fn load_config(explicit: Option<&Path>) -> Result<OptimiserConfig> {
    if let Some(path) = explicit {
        return OptimiserConfig::load(path)
            .with_context(|| format!("load config {}", path.display()));
    }
    match dirs::config_dir() {
        Some(dir) => {
            let path = dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
            OptimiserConfig::load_or_default(&path)
                .with_context(|| format!("load config {}", path.display()))
        }
        None => Ok(OptimiserConfig::default()),
    }
}

fn load_registry(path: &Path) -> Result<MemoryRegistry> {
    MemoryRegistry::from_file(path)
        .with_context(|| format!("load registry snapshot {}", path.display()))
}

fn status(optimiser: &StartupOptimiser) -> StatusOutput {
    StatusOutput {
        preference_key: optimiser.config().preference_key.clone(),
        blacklist: optimiser.blacklist().ids().into_iter().collect(),
    }
}

/// Install the observer into a fresh host and scan like a host startup
fn run_scan(optimiser: &StartupOptimiser, dirs: &[PathBuf]) -> Result<ScanOutput> {
    let roots: Vec<PathBuf> = if dirs.is_empty() {
        optimiser.config().search_paths.clone()
    } else {
        dirs.to_vec()
    };
    if roots.is_empty() {
        bail!("no container directories given and no search_paths configured");
    }

    let mut host = CliHost::default();
    optimiser.on_plugins_loaded(&mut host);
    let resolver = host
        .resolver
        .ok_or_else(|| anyhow!("path observer was not installed"))?;

    let report = ContainerScanner::new(&roots).scan(&*resolver);
    let loaded: BTreeSet<String> = report.loaded.iter().map(|c| c.id.clone()).collect();
    let suppressed = optimiser
        .observer()
        .known_ids()
        .into_iter()
        .filter(|id| !loaded.contains(id))
        .collect();

    Ok(ScanOutput {
        loaded: loaded.into_iter().collect(),
        suppressed,
        skipped: report.skipped,
    })
}

fn run_action(
    optimiser: &StartupOptimiser,
    action: MenuAction,
    registry: &MemoryRegistry,
) -> Result<Output> {
    let before = optimiser.blacklist().len();
    let total = optimiser.trigger(action, registry)?;
    Ok(Output::Action(ActionOutput {
        action: action.label().to_string(),
        added: total.saturating_sub(before),
        removed: before.saturating_sub(total),
        total,
    }))
}
