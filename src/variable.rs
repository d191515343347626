//! Variable definition lookup: `!name text` and `!12 text` lines.
//!
//! A query first searches upward from the anchor, then downward from the line
//! below it. An exact key match ends the search at once. Without one, every
//! definition whose name is a substring of the queried name is a candidate and
//! the candidate with the longest definition text wins.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::directive::{ReferenceDirective, parse_directive};
use crate::document::{DocumentStore, LoadedDocument};
use crate::error::Error;
use crate::number;
use crate::types::{DefinitionDescriptor, Location, SearchOutcome, Token};
use crate::walker::Walker;

/// `!`, then a numeral or a name, optional whitespace, then the definition text.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^!(?:(\d+|\$[0-9A-Fa-f]+)|(\S+))\s*(.*)").expect("valid regex");
});

/// Which part of a document a pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From the anchor up to `lower_bound`, nearest first.
    Backward {
        /// Topmost line searched.
        lower_bound: usize,
    },
    /// From the line after the anchor down to the last line, nearest first.
    Forward,
}

/// How a definition key relates to the queried token.
#[derive(Debug, PartialEq, Eq)]
enum KeyMatch {
    /// Same numeral value or same name.
    Exact,
    /// Unrelated key.
    Miss,
    /// The definition's name is a substring of the queried name.
    Partial,
}

/// The key of a definition line, as written.
enum VariableKey<'a> {
    /// A bare name such as `lead`.
    Name(&'a str),
    /// A numeral such as `12` or `$0C`.
    Numeral(&'a str),
}

impl VariableKey<'_> {
    /// Compare this key against the token being resolved.
    fn compare(&self, token: &Token) -> KeyMatch {
        return match (self, token) {
            (Self::Numeral(text), Token::Numeric(value)) => {
                if number::parse(text) == Some(*value) {
                    KeyMatch::Exact
                } else {
                    KeyMatch::Miss
                }
            },
            (Self::Name(name), Token::Named(wanted)) => {
                if wanted.as_str() == *name {
                    KeyMatch::Exact
                } else if wanted.contains(*name) {
                    KeyMatch::Partial
                } else {
                    KeyMatch::Miss
                }
            },
            (Self::Name(_), Token::Numeric(_)) | (Self::Numeral(_), Token::Named(_)) => KeyMatch::Miss,
        };
    }
}

/// Split a definition line into its key and trailing text.
fn definition_parts(line: &str) -> Option<(VariableKey<'_>, &str)> {
    let captures = DEFINITION.captures(line)?;
    let text = captures.get(3).map_or("", |m| return m.as_str());
    if let Some(numeral) = captures.get(1) {
        return Some((VariableKey::Numeral(numeral.as_str()), text));
    }
    let name = captures.get(2)?;
    return Some((VariableKey::Name(name.as_str()), text));
}

/// Collect candidate definitions for `token` in `document` and the documents
/// it includes, nearest first. Stops at the first exact match.
///
/// # Errors
///
/// Returns `Error::ConfigurationMissing` if an include is reached with no
/// environment directory configured.
pub fn find_all_candidates(
    walker: &mut Walker<'_>,
    document: &LoadedDocument,
    token: &Token,
    display_name: &str,
    direction: Direction,
) -> Result<SearchOutcome, Error> {
    let mut outcome = SearchOutcome::default();
    if !walker.enter(document) {
        return Ok(outcome);
    }

    for line in scan_order(document, direction) {
        let text = document.line_at(line);
        if let Some((key, definition)) = definition_parts(text) {
            let key_match = key.compare(token);
            if key_match == KeyMatch::Miss {
                continue;
            }
            let descriptor = DefinitionDescriptor {
                definition: definition.to_string(),
                file_name: display_name.to_string(),
                location: Location {
                    identity: document.identity().clone(),
                    line,
                },
                perfect_match: key_match == KeyMatch::Exact,
            };
            if descriptor.perfect_match {
                tracing::debug!(line, path = %document.identity().path().display(), "variable matched exactly");
                return Ok(SearchOutcome::perfect(descriptor));
            }
            outcome.candidates.push(descriptor);
            continue;
        }

        let Some(directive @ ReferenceDirective::Include { .. }) = parse_directive(text) else {
            continue;
        };
        let Some(included) = walker.open(&directive)? else {
            continue;
        };
        let nested = find_all_candidates(
            walker,
            &included,
            token,
            directive.display_name(),
            Direction::Backward { lower_bound: 0 },
        )?;
        if nested.short_circuited {
            return Ok(nested);
        }
        outcome.candidates.extend(nested.candidates);
    }

    return Ok(outcome);
}

/// Pick the first candidate with the longest definition text.
fn longest_definition(candidates: Vec<DefinitionDescriptor>) -> Option<DefinitionDescriptor> {
    let mut best: Option<DefinitionDescriptor> = None;
    for candidate in candidates {
        let longer = best.as_ref().is_none_or(|current| {
            return candidate.definition.chars().count() > current.definition.chars().count();
        });
        if longer {
            best = Some(candidate);
        }
    }
    return best;
}

/// Resolve `token` from `document`'s anchor: exact match above, then exact
/// match below, then the longest partial match from either side.
///
/// # Errors
///
/// Returns `Error::ConfigurationMissing` if an include is reached with no
/// environment directory configured.
pub fn resolve(
    store: &mut DocumentStore,
    env_dir: Option<&Path>,
    document: &LoadedDocument,
    token: &Token,
    display_name: &str,
) -> Result<Option<DefinitionDescriptor>, Error> {
    let previous = {
        let mut walker = Walker::new(&mut *store, env_dir);
        find_all_candidates(&mut walker, document, token, display_name, Direction::Backward { lower_bound: 0 })?
    };
    if previous.short_circuited {
        return Ok(previous.candidates.into_iter().next_back());
    }

    let subsequent = {
        let mut walker = Walker::new(&mut *store, env_dir);
        find_all_candidates(&mut walker, document, token, display_name, Direction::Forward)?
    };
    if subsequent.short_circuited {
        return Ok(subsequent.candidates.into_iter().next_back());
    }

    let mut union = previous.candidates;
    union.extend(subsequent.candidates);
    tracing::debug!(candidates = union.len(), "no exact variable match, using longest definition");
    return Ok(longest_definition(union));
}

/// Line indices a pass visits, nearest to the anchor first.
fn scan_order(document: &LoadedDocument, direction: Direction) -> Vec<usize> {
    return match direction {
        Direction::Backward { lower_bound } => (lower_bound..=document.anchor()).rev().collect(),
        Direction::Forward => (document.anchor().saturating_add(1)..document.line_count()).collect(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentIdentity;

    fn write(dir: &Path, name: &str, lines: &[&str]) -> DocumentIdentity {
        let path = dir.join(name);
        std::fs::write(&path, lines.join("\n")).unwrap();
        DocumentIdentity::new(path)
    }

    fn named(name: &str) -> Token {
        Token::Named(name.to_string())
    }

    fn resolve_at(dir: &Path, id: &DocumentIdentity, anchor: usize, token: &Token) -> Option<DefinitionDescriptor> {
        let mut store = DocumentStore::new();
        let doc = store.load(id, Some(anchor)).unwrap();
        resolve(&mut store, Some(dir), &doc, token, "Current").unwrap()
    }

    #[test]
    fn definition_line_parts() {
        let (key, text) = definition_parts("!lead  o4 l8 cde").unwrap();
        assert!(matches!(key, VariableKey::Name("lead")));
        assert_eq!(text, "o4 l8 cde");

        let (key, text) = definition_parts("!$0C\tv12").unwrap();
        assert!(matches!(key, VariableKey::Numeral("$0C")));
        assert_eq!(text, "v12");

        let (key, text) = definition_parts("!solo").unwrap();
        assert!(matches!(key, VariableKey::Name("solo")));
        assert_eq!(text, "");

        assert!(definition_parts(" !lead x").is_none());
        assert!(definition_parts("A !lead").is_none());
    }

    #[test]
    fn numeric_tokens_match_by_value() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "a.mml", &["!$0C hex twelve", "!x other", "A !12"]);
        let found = resolve_at(dir.path(), &id, 2, &Token::Numeric(12)).unwrap();
        assert_eq!(found.location.line, 0);
        assert_eq!(found.definition, "hex twelve");
        assert!(found.perfect_match);
        assert_eq!(found.file_name, "Current");
    }

    #[test]
    fn longest_definition_breaks_ties() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "a.mml", &["!vo abcdefghijkl", "!vol abcd", "A !volume"]);
        let found = resolve_at(dir.path(), &id, 2, &named("volume")).unwrap();
        assert_eq!(found.definition, "abcdefghijkl");
        assert_eq!(found.location.line, 0);
        assert!(!found.perfect_match);
    }

    #[test]
    fn equal_lengths_keep_first_seen() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "a.mml", &["!v abc", "!vo xyz", "A !volume", "!vol def"]);
        let found = resolve_at(dir.path(), &id, 2, &named("volume")).unwrap();
        // Backward pass sees `!vo` (line 1) first.
        assert_eq!(found.location.line, 1);
    }

    #[test]
    fn perfect_match_short_circuits_before_lines_above() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "a.mml", &[
            "#Include missing.mml",
            "!lead much longer definition text",
            "!lead short",
            "A !lead",
        ]);
        let mut store = DocumentStore::new();
        let doc = store.load(&id, Some(3)).unwrap();
        // No env dir: reaching the include on line 0 would be an error.
        let found = resolve(&mut store, None, &doc, &named("lead"), "Current").unwrap().unwrap();
        assert_eq!(found.location.line, 2);
        assert!(found.perfect_match);
    }

    #[test]
    fn forward_pass_finds_definition_below() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "a.mml", &["!le partial", "A !lead", "", "!lead below"]);
        let found = resolve_at(dir.path(), &id, 1, &named("lead")).unwrap();
        assert_eq!(found.location.line, 3);
        assert!(found.perfect_match);
    }

    #[test]
    fn forward_scan_order_is_nearest_first() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "a.mml", &["A !lead", "!l one", "!le two"]);
        let mut store = DocumentStore::new();
        let doc = store.load(&id, Some(0)).unwrap();
        let mut walker = Walker::new(&mut store, Some(dir.path()));
        let outcome = find_all_candidates(&mut walker, &doc, &named("lead"), "Current", Direction::Forward).unwrap();
        let lines: Vec<usize> = outcome.candidates.iter().map(|c| c.location.line).collect();
        assert_eq!(lines, vec![1, 2]);
        assert!(!outcome.short_circuited);
    }

    #[test]
    fn include_perfect_match_propagates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "defs.mml", &["!bass o2 l4", "!ba partial"]);
        let id = write(dir.path(), "a.mml", &["!bass outer", "#Include defs.mml", "!b x", "A !bass"]);
        let found = resolve_at(dir.path(), &id, 3, &named("bass")).unwrap();
        assert_eq!(found.definition, "o2 l4");
        assert_eq!(found.file_name, "defs.mml");
        assert_eq!(found.location.identity, DocumentIdentity::new(dir.path().join("defs.mml")));
    }

    #[test]
    fn include_partials_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "defs.mml", &["!vo a much longer body"]);
        let id = write(dir.path(), "a.mml", &["#Include defs.mml", "!vol short", "A !volume"]);
        let found = resolve_at(dir.path(), &id, 2, &named("volume")).unwrap();
        assert_eq!(found.file_name, "defs.mml");
        assert_eq!(found.definition, "a much longer body");
    }

    #[test]
    fn unreadable_include_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "a.mml", &["!lead above", "#Include gone.mml", "A !lead"]);
        let found = resolve_at(dir.path(), &id, 2, &named("lead")).unwrap();
        assert_eq!(found.location.line, 0);
        assert_eq!(found.definition, "above");
        assert!(found.perfect_match);
    }

    #[test]
    fn include_cycle_terminates_with_none() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.mml", &["#Include a.mml", "B c"]);
        let id = write(dir.path(), "a.mml", &["#Include b.mml", "A !missing"]);

        let mut store = DocumentStore::new();
        let doc = store.load(&id, Some(1)).unwrap();
        let mut walker = Walker::new(&mut store, Some(dir.path()));
        let outcome = find_all_candidates(
            &mut walker,
            &doc,
            &named("missing"),
            "Current",
            Direction::Backward { lower_bound: 0 },
        )
        .unwrap();
        assert!(outcome.candidates.is_empty());
        assert_eq!(walker.visited().len(), 2);

        assert!(resolve_at(dir.path(), &id, 1, &named("missing")).is_none());
    }

    #[test]
    fn no_candidates_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "a.mml", &["!abc x", "A !zzz"]);
        assert!(resolve_at(dir.path(), &id, 1, &named("zzz")).is_none());
    }
}
