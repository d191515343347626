mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use pmdref::{diagnostics, error, logging};

use crate::commands::{OutputFormat, Session};

#[derive(Parser)]
#[command(name = "pmdref", about = "Instrument and variable lookup for PMD MML")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Directory `#Include` and `#FFFile` paths resolve against.
    /// Overrides `.pmdref.toml`.
    #[arg(long, global = true)]
    env_dir: Option<PathBuf>,
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Location of the definition under the cursor
    Definition(CursorArgs),
    /// Decode an SSG rhythm bitmask (0-1024)
    Drum {
        /// Instrument number of an `R` part.
        mask: u32,
    },
    /// Label of an SSG software envelope preset (0-9)
    Envelope {
        /// Instrument number of a `G`/`H`/`I` part.
        id: u32,
    },
    /// Hover text for the reference under the cursor
    Hover(CursorArgs),
    /// Nearest instrument definition at or above a line
    Instrument {
        /// MML file to search.
        file: PathBuf,
        /// Zero-based line the search starts from.
        anchor: usize,
        /// Instrument number, decimal or `$hex`.
        id: String,
    },
    /// Show a numeral in decimal and `$hex`
    Number {
        /// Decimal or `$hex` numeral.
        text: String,
    },
    /// Best variable definition around a line
    Variable {
        /// MML file to search.
        file: PathBuf,
        /// Zero-based line the search starts from.
        anchor: usize,
        /// Variable name or numeral.
        token: String,
    },
}

/// A cursor position in a document. Lines and columns are zero-based.
#[derive(Args)]
struct CursorArgs {
    /// MML file the cursor is in.
    file: PathBuf,
    /// Zero-based line.
    line: usize,
    /// Zero-based character column.
    column: usize,
    /// Read the file's unsaved contents from stdin.
    #[arg(long)]
    stdin: bool,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    let session = |stdin: bool| {
        return Session {
            env_dir: cli.env_dir.clone(),
            format: cli.format,
            stdin,
        };
    };

    let result = match &cli.command {
        Commands::Definition(cursor) => {
            commands::definition(&session(cursor.stdin), &cursor.file, cursor.line, cursor.column)
        },
        Commands::Drum { mask } => Ok(commands::drum(cli.format, *mask)),
        Commands::Envelope { id } => Ok(commands::envelope(cli.format, *id)),
        Commands::Hover(cursor) => {
            commands::hover(&session(cursor.stdin), &cursor.file, cursor.line, cursor.column)
        },
        Commands::Instrument { file, anchor, id } => {
            commands::instrument(&session(false), file, *anchor, id)
        },
        Commands::Number { text } => commands::numeral(cli.format, text),
        Commands::Variable { file, anchor, token } => {
            commands::variable(&session(false), file, *anchor, token)
        },
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            // A missing environment directory is "no result" plus a prompt.
            if matches!(e, error::Error::ConfigurationMissing) {
                ExitCode::from(1)
            } else {
                ExitCode::from(3)
            }
        },
    };
}
