//! Hover and go-to-definition on top of the resolvers.
//!
//! The host hands over a document and a cursor. This module finds the
//! reference under the cursor (`@12`, `@@$05`, `!lead`, `!$0C`), routes SSG
//! envelope and rhythm parts to the built-in tables, and everything else to
//! the instrument or variable resolver.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::directive::parse_directive;
use crate::document::{DocumentStore, LoadedDocument};
use crate::error::Error;
use crate::instrument;
use crate::number;
use crate::tables;
use crate::types::{DefinitionDescriptor, DocumentIdentity, Location, Token};
use crate::variable;
use crate::walker::Walker;

/// Display name for definitions found in the queried document itself.
const CURRENT_DOCUMENT: &str = "Current";

/// Each extra `@` selects the next bank of 128 instruments.
const INSTRUMENT_BANK_SIZE: u32 = 128;

/// `@` run followed by a numeral, e.g. `@12`, `@@3`, `@$1F`.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static INSTRUMENT_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(@+)(\d+|\$[0-9A-Fa-f]+)").expect("valid regex"));

/// Splits a variable reference body into numeral or name.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static VARIABLE_KEY: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(?:(\d+|\$[0-9A-Fa-f]+)|(\S+))").expect("valid regex"));

/// `!` followed by a non-blank run.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static VARIABLE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"!\S+").expect("valid regex"));

/// Rendered hover content plus the definition it came from, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hover {
    /// Markdown shown to the user.
    pub contents: String,
    /// The resolved definition; `None` for built-in table entries.
    pub definition: Option<DefinitionDescriptor>,
}

/// Answers hover and definition requests against one document store.
pub struct Lookup<'a> {
    env_dir: Option<&'a Path>,
    store: &'a mut DocumentStore,
}

/// Part types whose `@` numbers index a built-in table instead of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialNamespace {
    /// SSG parts `G`, `H`, `I`: software envelope presets.
    Envelope,
    /// Rhythm part `R`: drum bitmask.
    Rhythm,
}

impl<'a> Lookup<'a> {
    /// Location to jump to from the cursor, if anything there resolves.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unreadable` if the queried document cannot be read,
    /// `Error::MalformedToken` for an out-of-range numeral under the cursor,
    /// or `Error::ConfigurationMissing` when a directive needs the
    /// environment directory and none is configured.
    pub fn definition(
        &mut self,
        identity: &DocumentIdentity,
        line: usize,
        column: usize,
    ) -> Result<Option<Location>, Error> {
        let document = self.store.load(identity, Some(line))?;
        let Some(text) = cursor_line(&document, line) else {
            return Ok(None);
        };
        if SpecialNamespace::of_line(text).is_some() {
            return Ok(None);
        }

        if let Some(directive) = parse_directive(text) {
            let env_dir = self.env_dir.ok_or(Error::ConfigurationMissing)?;
            return Ok(Some(Location {
                identity: DocumentIdentity::new(directive.target_path(env_dir)),
                line: 0,
            }));
        }

        if let Some(id) = instrument_reference_at(text, column)? {
            let found = self.find_instrument(&document.with_anchor(last_line(&document)), id)?;
            return Ok(found.map(|d| return d.location));
        }
        if let Some(token) = variable_reference_at(text, column)? {
            let found = variable::resolve(&mut *self.store, self.env_dir, &document, &token, CURRENT_DOCUMENT)?;
            return Ok(found.map(|d| return d.location));
        }
        return Ok(None);
    }

    /// Run the instrument resolver over `document` with a fresh visited set.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigurationMissing` from the resolver.
    fn find_instrument(
        &mut self,
        document: &LoadedDocument,
        id: u32,
    ) -> Result<Option<DefinitionDescriptor>, Error> {
        let mut walker = Walker::new(&mut *self.store, self.env_dir);
        return instrument::find(&mut walker, document, id, 0);
    }

    /// Hover text for the reference under the cursor.
    ///
    /// # Errors
    ///
    /// Same as [`Lookup::definition`].
    pub fn hover(
        &mut self,
        identity: &DocumentIdentity,
        line: usize,
        column: usize,
    ) -> Result<Option<Hover>, Error> {
        let document = self.store.load(identity, Some(line))?;
        let Some(text) = cursor_line(&document, line) else {
            return Ok(None);
        };

        if let Some(id) = instrument_reference_at(text, column)? {
            return self.hover_instrument(&document, text, id);
        }
        let Some(token) = variable_reference_at(text, column)? else {
            return Ok(None);
        };
        let found = variable::resolve(&mut *self.store, self.env_dir, &document, &token, CURRENT_DOCUMENT)?;
        return Ok(found.map(|definition| {
            let key = match &token {
                Token::Named(name) => name.clone(),
                Token::Numeric(value) => value.to_string(),
            };
            return Hover {
                contents: format!(
                    "!{key} -> **{}** *from {}*",
                    definition.definition.trim(),
                    definition.file_name
                ),
                definition: Some(definition),
            };
        }));
    }

    /// Hover for an `@` reference, routed by the part the line belongs to.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigurationMissing` from the resolver.
    fn hover_instrument(
        &mut self,
        document: &LoadedDocument,
        text: &str,
        id: u32,
    ) -> Result<Option<Hover>, Error> {
        let table_hover = |label: Option<String>, source: &str| {
            return label.map(|label| {
                return Hover {
                    contents: format!("@{id} -> **{label}** *from {source}*"),
                    definition: None,
                };
            });
        };

        return match SpecialNamespace::of_line(text) {
            Some(SpecialNamespace::Envelope) => Ok(table_hover(
                tables::envelope_label(id).map(str::to_string),
                "SSG Software Envelope",
            )),
            Some(SpecialNamespace::Rhythm) => Ok(table_hover(tables::drum_labels(id), "SSG Rhythm Definition")),
            None => {
                let found = self.find_instrument(&document.with_anchor(last_line(document)), id)?;
                Ok(found.map(|definition| {
                    return Hover {
                        contents: format!(
                            "@{id} -> **{}** *from {}*",
                            definition.definition.trim(),
                            definition.file_name
                        ),
                        definition: Some(definition),
                    };
                }))
            },
        };
    }

    /// Load `identity` anchored at `anchor_line`. Unreadable documents are
    /// logged and yield `None`.
    fn load_or_skip(&mut self, identity: &DocumentIdentity, anchor_line: usize) -> Option<LoadedDocument> {
        return match self.store.load(identity, Some(anchor_line)) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!(error = %e, "cannot load document for lookup");
                None
            },
        };
    }

    /// Bind a lookup to a store and an optional environment directory.
    pub fn new(store: &'a mut DocumentStore, env_dir: Option<&'a Path>) -> Self {
        return Self { env_dir, store };
    }

    /// Nearest instrument definition at or above `anchor_line`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigurationMissing` when a directive needs the
    /// environment directory and none is configured.
    pub fn resolve_instrument_definition(
        &mut self,
        identity: &DocumentIdentity,
        anchor_line: usize,
        id: u32,
    ) -> Result<Option<DefinitionDescriptor>, Error> {
        let Some(document) = self.load_or_skip(identity, anchor_line) else {
            return Ok(None);
        };
        return self.find_instrument(&document, id);
    }

    /// Best variable definition for `token` around `anchor_line`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigurationMissing` when an include needs the
    /// environment directory and none is configured.
    pub fn resolve_variable_definition(
        &mut self,
        identity: &DocumentIdentity,
        anchor_line: usize,
        token: &Token,
    ) -> Result<Option<DefinitionDescriptor>, Error> {
        let Some(document) = self.load_or_skip(identity, anchor_line) else {
            return Ok(None);
        };
        return variable::resolve(&mut *self.store, self.env_dir, &document, token, CURRENT_DOCUMENT);
    }
}

impl SpecialNamespace {
    /// Classify a line by its part letter.
    pub fn of_line(line: &str) -> Option<Self> {
        return match line.chars().next() {
            Some('G' | 'H' | 'I') => Some(Self::Envelope),
            Some('R') => Some(Self::Rhythm),
            _ => None,
        };
    }
}

/// Byte offset of character `column`, or the line length past the end.
fn byte_offset(line: &str, column: usize) -> usize {
    return line.char_indices().nth(column).map_or(line.len(), |(offset, _)| return offset);
}

/// The cursor's line, or `None` when the cursor is past the end.
fn cursor_line(document: &LoadedDocument, line: usize) -> Option<&str> {
    if line >= document.line_count() {
        return None;
    }
    return Some(document.line_at(line));
}

/// Instrument number under the cursor. `@@n` adds one bank of 128.
/// References inside the line's first word (the part name or a definition
/// key) are not references.
///
/// # Errors
///
/// Returns `Error::MalformedToken` when the number does not fit in `u32`.
pub fn instrument_reference_at(line: &str, column: usize) -> Result<Option<u32>, Error> {
    let cursor = byte_offset(line, column);
    let Some(captures) = INSTRUMENT_REFERENCE
        .captures_iter(line)
        .find(|c| return c.get(0).is_some_and(|m| return spans(line, m, cursor)))
    else {
        return Ok(None);
    };

    let (Some(whole), Some(ats), Some(numeral)) = (captures.get(0), captures.get(1), captures.get(2)) else {
        return Ok(None);
    };
    let malformed = || {
        return Error::MalformedToken {
            token: whole.as_str().to_string(),
        };
    };
    let value = number::parse(numeral.as_str()).ok_or_else(malformed)?;
    let extra_banks = u32::try_from(ats.as_str().len().saturating_sub(1)).map_err(|_err| return malformed())?;
    return extra_banks
        .checked_mul(INSTRUMENT_BANK_SIZE)
        .and_then(|base| return base.checked_add(value))
        .map(Some)
        .ok_or_else(malformed);
}

/// Index of the document's last line.
fn last_line(document: &LoadedDocument) -> usize {
    return document.line_count().saturating_sub(1);
}

/// The match covers the cursor (end inclusive) and starts after the first word.
fn spans(line: &str, found: regex::Match<'_>, cursor: usize) -> bool {
    let in_first_word = !line
        .get(..found.start())
        .is_some_and(|before| return before.chars().any(char::is_whitespace));
    return !in_first_word && found.start() <= cursor && cursor <= found.end();
}

/// Variable reference under the cursor. `|!` is an escaped `!`, not a reference.
///
/// # Errors
///
/// Returns `Error::MalformedToken` when a numeral does not fit in `u32`.
pub fn variable_reference_at(line: &str, column: usize) -> Result<Option<Token>, Error> {
    let cursor = byte_offset(line, column);
    let Some(found) = VARIABLE_REFERENCE.find_iter(line).find(|m| {
        let escaped = line.get(..m.start()).is_some_and(|before| return before.ends_with('|'));
        return !escaped && spans(line, *m, cursor);
    }) else {
        return Ok(None);
    };

    let body = found.as_str().get(1..).unwrap_or("");
    let Some(captures) = VARIABLE_KEY.captures(body) else {
        return Ok(None);
    };
    if let Some(numeral) = captures.get(1) {
        let value = number::parse(numeral.as_str()).ok_or_else(|| {
            return Error::MalformedToken {
                token: found.as_str().to_string(),
            };
        })?;
        return Ok(Some(Token::Numeric(value)));
    }
    return Ok(captures.get(2).map(|name| return Token::Named(name.as_str().to_string())));
}
