mod config;
mod output;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::{CliOverrides, ConfigMerger};
use fs_err as fs;
use loadout_catalog::ComboQuery;
use loadout_core::{BuildProposal, Engine, EngineError, ItemId, SlotPolicy};
use loadout_types::element::Element;
use loadout_types::ids::{ItemType, Manufacturer};
use output::Format;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "loadout",
    version,
    about = "Catalog-driven build validation, canonical serials and edit history."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Config file (default: nearest loadout.toml above the working directory).
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Catalog directory containing catalog.json and parts/.
    #[arg(long, global = true, env = "LOADOUT_CATALOG_DIR")]
    catalog_dir: Option<Utf8PathBuf>,

    /// JSONL file history entries are appended to.
    #[arg(long, global = true, env = "LOADOUT_HISTORY_PATH")]
    history_path: Option<Utf8PathBuf>,

    /// How slotted shield perks of one shield type constrain each other.
    #[arg(long, global = true, value_enum)]
    slot_policy: Option<SlotPolicyArg>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SlotPolicyArg {
    Exclusive,
    PerSlot,
}

impl From<SlotPolicyArg> for SlotPolicy {
    fn from(arg: SlotPolicyArg) -> Self {
        match arg {
            SlotPolicyArg::Exclusive => SlotPolicy::Exclusive,
            SlotPolicyArg::PerSlot => SlotPolicy::PerSlot,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print catalog counts and fingerprint.
    Catalog,
    /// List element combos matching a partial query.
    Combos(CombosArgs),
    /// List parts legal on a manufacturer and item type.
    Parts(PartsArgs),
    /// Validate a proposal (JSON file, `-` for stdin) and print the build.
    Compose(ComposeArgs),
    /// Reconstruct a build from its serial.
    Parse(ParseArgs),
    /// Record an edit between two serials in the history file.
    Record(RecordArgs),
}

#[derive(Debug, Args)]
struct CombosArgs {
    #[arg(long)]
    primary: Element,

    #[arg(long, conflicts_with = "single")]
    secondary: Option<Element>,

    /// Only single-element combos.
    #[arg(long, default_value_t = false)]
    single: bool,

    #[arg(long)]
    underbarrel: Option<bool>,
}

#[derive(Debug, Args)]
struct PartsArgs {
    #[arg(long)]
    manufacturer: String,

    #[arg(long)]
    item_type: String,

    /// Filter by part type (weapons) or perk type (perk families).
    #[arg(long)]
    part_type: Option<String>,
}

#[derive(Debug, Args)]
struct ComposeArgs {
    proposal: Utf8PathBuf,
}

#[derive(Debug, Args)]
struct ParseArgs {
    serial: String,
}

#[derive(Debug, Args)]
struct RecordArgs {
    #[arg(long)]
    item: String,

    /// Session id (default: a fresh v4 UUID).
    #[arg(long)]
    session: Option<String>,

    #[arg(long)]
    user: u64,

    /// Serial of the build before the edit; omit for a create.
    #[arg(long)]
    previous: Option<String>,

    /// Serial of the build after the edit; omit for a delete.
    #[arg(long)]
    next: Option<String>,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.global.format;
    match run(cli) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) if err.is_rejection() => {
            output::rejection(format, &err)?;
            Ok(ExitCode::from(err.exit_code()))
        }
        Err(err) => Err(err.into()),
    }
}

fn run(cli: Cli) -> Result<(), EngineError> {
    let engine = engine(&cli.global)?;
    let format = cli.global.format;

    match cli.cmd {
        Command::Catalog => output::summary(format, &engine.catalog().summary())?,
        Command::Combos(args) => {
            let mut query = ComboQuery::primary(args.primary);
            if let Some(secondary) = args.secondary {
                query = query.secondary(secondary);
            } else if args.single {
                query = query.single();
            }
            if let Some(underbarrel) = args.underbarrel {
                query = query.underbarrel(underbarrel);
            }
            output::combos(format, &engine.catalog().element_combos_for(&query))?;
        }
        Command::Parts(args) => {
            let parts = engine.catalog().parts_for(
                &Manufacturer::new(&args.manufacturer),
                &ItemType::new(&args.item_type),
                args.part_type.as_deref(),
            );
            output::parts(format, &parts)?;
        }
        Command::Compose(args) => {
            let proposal = read_proposal(&args.proposal)?;
            let build = engine.validate_and_compose(&proposal)?;
            output::build(format, &build)?;
        }
        Command::Parse(args) => {
            let build = engine.parse_serial(&args.serial)?;
            output::build(format, &build)?;
        }
        Command::Record(args) => {
            let previous = args
                .previous
                .as_deref()
                .map(|s| engine.parse_serial(s))
                .transpose()?;
            let next = args
                .next
                .as_deref()
                .map(|s| engine.parse_serial(s))
                .transpose()?;
            let session = args
                .session
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let entry = engine.record_edit(
                &ItemId::new(args.item),
                &session,
                args.user,
                previous.as_ref(),
                next.as_ref(),
            )?;
            output::recorded(format, entry.as_ref())?;
        }
    }
    Ok(())
}

fn engine(global: &GlobalArgs) -> Result<Engine, EngineError> {
    let cwd = std::env::current_dir().context("read working directory")?;
    let cwd = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|p| anyhow::anyhow!("working directory is not UTF-8: {}", p.display()))?;
    let located = config::locate(global.config.as_deref(), &cwd)?;
    let settings = ConfigMerger::merge(
        &located,
        &CliOverrides {
            catalog_dir: global.catalog_dir.clone(),
            history_path: global.history_path.clone(),
            slot_policy: global.slot_policy.map(SlotPolicy::from),
        },
    );
    debug!(
        catalog_dir = %settings.catalog_dir,
        history_path = %settings.history_path,
        slot_policy = ?settings.slot_policy,
        "resolved settings"
    );
    Engine::from_settings(&settings)
}

fn read_proposal(path: &Utf8Path) -> anyhow::Result<BuildProposal> {
    let contents = if path.as_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("read proposal from stdin")?
    } else {
        fs::read_to_string(path).with_context(|| format!("read proposal {}", path))?
    };
    serde_json::from_str(&contents).with_context(|| format!("parse proposal {}", path))
}
