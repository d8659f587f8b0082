//! CLI surface for graft.
//!
//! Thin handlers over the ops and sync layers. All output funnels
//! through one emit path so `--json` stays uniform across commands.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, builder::BoolishValueParser};
use serde::Serialize;
use thiserror::Error;

use crate::Result;
use crate::error::{Effect, Transience};

mod commands;
mod render;

// =============================================================================
// Entry + global options
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "graft",
    version,
    about = "Vendor files from another git repository and keep them in sync",
    infer_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Source repository to vendor from.
    #[arg(long, global = true, value_name = "PATH")]
    pub src: Option<PathBuf>,

    /// Destination repository (default: current directory).
    #[arg(long, global = true, value_name = "PATH", default_value = ".")]
    pub dst: PathBuf,

    /// Machine-readable JSON output.
    #[arg(
        long,
        global = true,
        default_value_t = false,
        num_args = 0..=1,
        value_parser = BoolishValueParser::new()
    )]
    pub json: bool,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log format override: tree, pretty, compact or json.
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start tracking a file or directory from the source repository.
    #[command(alias = "track")]
    Object {
        /// Path inside the source repository.
        src_path: String,
        /// Destination path (default: same as the source path).
        dst_path: Option<String>,
    },

    /// Move a tracked file inside the destination repository.
    #[command(alias = "mv")]
    Rename {
        /// Current tracked path.
        old: String,
        /// New path.
        new: String,
    },

    /// Show tracked paths and their sync points.
    Status,

    /// Merge upstream changes into every tracked path.
    #[command(alias = "pull")]
    Update,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CliError {
    #[error("--src <PATH> is required for this command")]
    MissingSource,
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn transience(&self) -> Transience {
        match self {
            CliError::MissingSource | CliError::Render(_) => Transience::Permanent,
            CliError::Io(_) => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            CliError::MissingSource => Effect::None,
            // Output failures surface after the operation already ran.
            CliError::Render(_) | CliError::Io(_) => Effect::Unknown,
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Ctx {
        src: cli.src,
        dst: cli.dst,
        json: cli.json,
    };

    match cli.command {
        Commands::Object { src_path, dst_path } => {
            commands::object::handle(&ctx, &src_path, dst_path.as_deref())
        }
        Commands::Rename { old, new } => commands::rename::handle(&ctx, &old, &new),
        Commands::Status => commands::status::handle(&ctx),
        Commands::Update => commands::update::handle(&ctx),
    }
}

// =============================================================================
// Context + helpers
// =============================================================================

struct Ctx {
    src: Option<PathBuf>,
    dst: PathBuf,
    json: bool,
}

impl Ctx {
    fn require_src(&self) -> Result<&Path> {
        self.src
            .as_deref()
            .ok_or_else(|| CliError::MissingSource.into())
    }
}

fn emit<T: Serialize>(value: &T, human: String, json: bool) -> Result<()> {
    let s = if json {
        serde_json::to_string_pretty(value).map_err(CliError::Render)?
    } else {
        human
    };

    use std::io::Write;
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{s}")
        && e.kind() != std::io::ErrorKind::BrokenPipe
    {
        return Err(CliError::Io(e).into());
    }
    Ok(())
}
