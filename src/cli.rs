use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

Copyright (c) 2025 InkyQuill
License: MIT
Rust Edition: 2024"
);

#[derive(Parser, Debug)]
#[command(name = "mdtrim")]
#[command(about = "Remove a duplicated section from a Markdown file, with preview and rollback")]
#[command(long_about = "mdtrim collapses a duplicated block of text in place.

The duplicated block is everything between the end of an ANCHOR and the
nearest following MARKER. Both boundaries are kept; only the text between
them is removed. If either boundary is missing, the file is left untouched.

Anchor, marker, and the default file come from ~/.mdtrim/config.toml and
can be overridden on the command line.

EXAMPLES:
  mdtrim                                   Clean the configured file (README.md)
  mdtrim docs/guide.md --dry-run           Preview without writing
  mdtrim --anchor $'---\\n' --marker '### Steps' notes.md
  mdtrim --regex --anchor '## v\\d+\\n' --marker '## Usage' CHANGES.md
  mdtrim --all README.md                   Collapse every occurrence
  mdtrim rollback                          Undo the last change")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
#[command(propagate_version = true)]
struct Cli {
    /// File to clean (defaults to [target] path from the config)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Text that ends the preserved prefix
    #[arg(long, value_name = "TEXT")]
    anchor: Option<String>,

    /// Text where preserved content resumes
    #[arg(long, value_name = "TEXT")]
    marker: Option<String>,

    /// Treat anchor and marker as regular expressions
    #[arg(long)]
    regex: bool,

    /// Collapse every anchor/marker span, not just the first
    #[arg(long)]
    all: bool,

    /// Preview changes without modifying the file
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Ask for confirmation before writing
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Number of context lines to show around removed lines
    #[arg(short = 'n', long, value_name = "NUM")]
    context: Option<usize>,

    /// Skip backup creation (requires --force)
    #[arg(long = "no-backup", requires = "force")]
    #[arg(help = "Skip creating a backup (requires --force)\n⚠️  Changes cannot be rolled back!")]
    no_backup: bool,

    /// Confirm --no-backup
    #[arg(long = "force", requires = "no_backup")]
    force: bool,

    /// Custom backup directory
    #[arg(long, value_name = "DIR")]
    backup_dir: Option<PathBuf>,

    /// Write a debug log to ~/.mdtrim/mdtrim.log
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rollback a previous operation
    #[command(long_about = "Restore a file from a backup.

If no backup ID is specified, rolls back the most recent operation.
Use 'mdtrim history' to see all available backups.

EXAMPLES:
  mdtrim rollback                              Rollback last operation
  mdtrim rollback 20250110-120000000-abcd1234  Rollback specific backup")]
    Rollback {
        /// Backup ID to rollback (optional, defaults to last operation)
        #[arg(value_name = "ID")]
        id: Option<String>,

        /// Custom backup directory
        #[arg(long, value_name = "DIR")]
        backup_dir: Option<PathBuf>,
    },

    /// Show operation history
    History {
        /// Custom backup directory
        #[arg(long, value_name = "DIR")]
        backup_dir: Option<PathBuf>,
    },

    /// Show current backup status
    Status {
        /// Custom backup directory
        #[arg(long, value_name = "DIR")]
        backup_dir: Option<PathBuf>,
    },

    /// Inspect or reset the configuration file
    Config {
        /// Print the effective configuration
        #[arg(long, conflicts_with_all = ["path", "reset"])]
        show: bool,

        /// Print the config and log file locations
        #[arg(long, conflicts_with = "reset")]
        path: bool,

        /// Overwrite the config file with the commented defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Options for a clean run, as given on the command line.
/// `None` means "use the configured value".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    pub file: Option<PathBuf>,
    pub anchor: Option<String>,
    pub marker: Option<String>,
    pub regex: bool,
    pub all: bool,
    pub dry_run: bool,
    pub interactive: bool,
    pub context: Option<usize>,
    pub no_backup: bool,
    pub backup_dir: Option<PathBuf>,
    pub debug: bool,
}

#[derive(Debug, PartialEq)]
pub enum Args {
    Run(RunOptions),
    Rollback {
        id: Option<String>,
        backup_dir: Option<PathBuf>,
    },
    History {
        backup_dir: Option<PathBuf>,
    },
    Status {
        backup_dir: Option<PathBuf>,
    },
    Config {
        show: bool,
        path: bool,
        reset: bool,
    },
}

pub fn parse_args() -> Args {
    into_args(Cli::parse())
}

/// Parse from an explicit argument list (first item is the binary name)
pub fn try_parse_from<I, T>(iter: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter).map(into_args)
}

fn into_args(cli: Cli) -> Args {
    match cli.command {
        Some(Commands::Rollback { id, backup_dir }) => Args::Rollback {
            id,
            backup_dir: backup_dir.or(cli.backup_dir),
        },
        Some(Commands::History { backup_dir }) => Args::History {
            backup_dir: backup_dir.or(cli.backup_dir),
        },
        Some(Commands::Status { backup_dir }) => Args::Status {
            backup_dir: backup_dir.or(cli.backup_dir),
        },
        Some(Commands::Config { show, path, reset }) => Args::Config { show, path, reset },
        None => Args::Run(RunOptions {
            file: cli.file,
            anchor: cli.anchor,
            marker: cli.marker,
            regex: cli.regex,
            all: cli.all,
            dry_run: cli.dry_run,
            interactive: cli.interactive,
            context: cli.context,
            no_backup: cli.no_backup,
            backup_dir: cli.backup_dir,
            debug: cli.debug,
        }),
    }
}
