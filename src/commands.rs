//! CLI commands: hover, definition, direct resolver calls, and table lookups.

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;

use pmdref::config::Config;
use pmdref::document::{ActiveBuffer, DocumentStore};
use pmdref::error;
use pmdref::number;
use pmdref::query::Lookup;
use pmdref::tables;
use pmdref::types::{DefinitionDescriptor, DocumentIdentity, Location, Token};

/// Output style shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON document on stdout.
    Json,
    /// Human-readable lines.
    Text,
}

/// Settings common to every document query.
pub struct Session {
    /// Overrides the configured environment directory.
    pub env_dir: Option<PathBuf>,
    /// Output style.
    pub format: OutputFormat,
    /// Read the queried document's live text from stdin.
    pub stdin: bool,
}

/// Per-invocation state: configuration and the document store.
struct Workspace {
    config: Config,
    store: DocumentStore,
}

impl Session {
    /// Load config and prepare a store, wiring stdin as the active buffer
    /// for `file` when requested.
    ///
    /// # Errors
    ///
    /// Returns config loading errors, or `Error::Io` if stdin cannot be read.
    fn open(&self, file: &Path) -> Result<Workspace, error::Error> {
        let mut config = Config::load(Path::new("."))?;
        if let Some(dir) = &self.env_dir {
            config = config.with_env_dir(dir.clone());
        }

        let mut store = DocumentStore::new();
        if self.stdin {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            store.set_active(ActiveBuffer {
                identity: DocumentIdentity::new(file),
                text,
            });
        }
        return Ok(Workspace { config, store });
    }
}

/// Jump target for the reference at `line`:`column` of `file`.
///
/// # Errors
///
/// Returns configuration, I/O, or malformed-token errors.
pub fn definition(session: &Session, file: &Path, line: usize, column: usize) -> Result<ExitCode, error::Error> {
    let mut workspace = session.open(file)?;
    let mut lookup = Lookup::new(&mut workspace.store, workspace.config.env_dir());
    let found = lookup.definition(&DocumentIdentity::new(file), line, column)?;
    return Ok(emit(session.format, found.as_ref(), render_location));
}

/// Decode a rhythm bitmask.
pub fn drum(format: OutputFormat, mask: u32) -> ExitCode {
    return emit(format, tables::drum_labels(mask).as_ref(), |labels| return labels.clone());
}

/// Print `value` (or a "no result" note) and pick the exit code.
fn emit<T: Serialize>(format: OutputFormat, value: Option<&T>, render: impl Fn(&T) -> String) -> ExitCode {
    match (format, value) {
        (OutputFormat::Json, _) => {
            // serde_json::to_string_pretty won't fail on these structures.
            let json = serde_json::to_string_pretty(&value).unwrap_or_default();
            println!("{json}");
        },
        (OutputFormat::Text, Some(v)) => println!("{}", render(v)),
        (OutputFormat::Text, None) => eprintln!("no result"),
    }
    return if value.is_some() { ExitCode::SUCCESS } else { ExitCode::from(1) };
}

/// Label of a software envelope preset.
pub fn envelope(format: OutputFormat, id: u32) -> ExitCode {
    return emit(format, tables::envelope_label(id).as_ref(), |label| return (*label).to_string());
}

/// Hover text for the reference at `line`:`column` of `file`.
///
/// # Errors
///
/// Returns configuration, I/O, or malformed-token errors.
pub fn hover(session: &Session, file: &Path, line: usize, column: usize) -> Result<ExitCode, error::Error> {
    let mut workspace = session.open(file)?;
    let mut lookup = Lookup::new(&mut workspace.store, workspace.config.env_dir());
    let found = lookup.hover(&DocumentIdentity::new(file), line, column)?;
    return Ok(emit(session.format, found.as_ref(), |hover| return hover.contents.clone()));
}

/// Resolve instrument `id` from `anchor` upward.
///
/// # Errors
///
/// Returns `Error::MalformedToken` if `id` is not a numeral, or
/// configuration and I/O errors.
pub fn instrument(session: &Session, file: &Path, anchor: usize, id: &str) -> Result<ExitCode, error::Error> {
    let value = number::parse(id).ok_or_else(|| {
        return error::Error::MalformedToken { token: id.to_string() };
    })?;
    let mut workspace = session.open(file)?;
    let mut lookup = Lookup::new(&mut workspace.store, workspace.config.env_dir());
    let found = lookup.resolve_instrument_definition(&DocumentIdentity::new(file), anchor, value)?;
    return Ok(emit(session.format, found.as_ref(), render_descriptor));
}

/// Show a numeral in both notations.
///
/// # Errors
///
/// Returns `Error::MalformedToken` if `text` is not a numeral.
pub fn numeral(format: OutputFormat, text: &str) -> Result<ExitCode, error::Error> {
    let value = number::parse(text).ok_or_else(|| {
        return error::Error::MalformedToken { token: text.to_string() };
    })?;
    let forms = NumberForms {
        decimal: number::format(value, false),
        hex: number::format(value, true),
        value,
    };
    return Ok(emit(format, Some(&forms), |f| return format!("{} {}", f.decimal, f.hex)));
}

/// Both spellings of one numeral.
#[derive(Serialize)]
struct NumberForms {
    decimal: String,
    hex: String,
    value: u32,
}

/// `path:line: definition (from name)`.
fn render_descriptor(descriptor: &DefinitionDescriptor) -> String {
    let marker = if descriptor.perfect_match { "" } else { " [partial]" };
    return format!(
        "{}: {} (from {}){marker}",
        render_location(&descriptor.location),
        descriptor.definition.trim(),
        descriptor.file_name
    );
}

/// `path:line`, zero-based like the input positions.
fn render_location(location: &Location) -> String {
    return format!("{}:{}", location.identity.path().display(), location.line);
}

/// Resolve a variable token (`lead`, `12`, `$0C`) around `anchor`.
///
/// # Errors
///
/// Returns configuration and I/O errors.
pub fn variable(session: &Session, file: &Path, anchor: usize, token: &str) -> Result<ExitCode, error::Error> {
    let token = Token::from_text(token);
    let mut workspace = session.open(file)?;
    let mut lookup = Lookup::new(&mut workspace.store, workspace.config.env_dir());
    let found = lookup.resolve_variable_definition(&DocumentIdentity::new(file), anchor, &token)?;
    return Ok(emit(session.format, found.as_ref(), render_descriptor));
}
