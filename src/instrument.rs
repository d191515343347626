//! Nearest-preceding instrument definition lookup.
//!
//! An instrument definition is a line of the form `@<id> <text>`, where the
//! numeral may be zero-padded. The search walks upward from the anchor and the
//! first definition seen wins. On the way it follows `#FFFile` banks (scanned
//! top to bottom) and `#Include`d documents (scanned bottom to top).

use std::sync::LazyLock;

use regex::Regex;

use crate::directive::{ReferenceDirective, parse_directive};
use crate::document::LoadedDocument;
use crate::error::Error;
use crate::types::{DefinitionDescriptor, Location};
use crate::walker::Walker;

/// `@`, optional spaces, the decimal id, whitespace, then the definition text.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^@\s*(\d+)\s+(.+)").expect("valid regex"));

/// Return the definition text if `line` defines instrument `id`.
fn definition_text(line: &str, id: u32) -> Option<&str> {
    let captures = DEFINITION.captures(line)?;
    let digits = captures.get(1)?.as_str().trim_start_matches('0');
    let wanted = id.to_string();
    let matches = if id == 0 { digits.is_empty() } else { digits == wanted };
    if !matches {
        return None;
    }
    return captures.get(2).map(|text| return text.as_str());
}

/// Search `document` from its anchor up to `lower_bound` for instrument `id`.
///
/// # Errors
///
/// Returns `Error::ConfigurationMissing` if a directive is reached with no
/// environment directory configured.
pub fn find(
    walker: &mut Walker<'_>,
    document: &LoadedDocument,
    id: u32,
    lower_bound: usize,
) -> Result<Option<DefinitionDescriptor>, Error> {
    if !walker.enter(document) {
        return Ok(None);
    }

    for line in (lower_bound..=document.anchor()).rev() {
        let text = document.line_at(line);
        if let Some(definition) = definition_text(text, id) {
            tracing::debug!(id, line, path = %document.identity().path().display(), "instrument found");
            return Ok(Some(DefinitionDescriptor {
                definition: definition.to_string(),
                file_name: document.display_stem(),
                location: Location {
                    identity: document.identity().clone(),
                    line,
                },
                perfect_match: true,
            }));
        }

        let Some(directive) = parse_directive(text) else {
            continue;
        };
        let Some(target) = walker.open(&directive)? else {
            continue;
        };
        let found = match &directive {
            ReferenceDirective::ExternalDefinitions { .. } => {
                scan_bank(&target, id, directive.display_name())
            },
            ReferenceDirective::Include { .. } => find(walker, &target, id, 0)?,
        };
        if found.is_some() {
            return Ok(found);
        }
    }

    return Ok(None);
}

/// Scan an instrument bank top to bottom for the first definition of `id`.
fn scan_bank(bank: &LoadedDocument, id: u32, display_name: &str) -> Option<DefinitionDescriptor> {
    return (0..bank.line_count()).find_map(|line| {
        let definition = definition_text(bank.line_at(line), id)?;
        return Some(DefinitionDescriptor {
            definition: definition.to_string(),
            file_name: display_name.to_string(),
            location: Location {
                identity: bank.identity().clone(),
                line,
            },
            perfect_match: true,
        });
    });
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::document::DocumentStore;
    use crate::types::DocumentIdentity;

    fn write(dir: &Path, name: &str, lines: &[&str]) -> DocumentIdentity {
        let path = dir.join(name);
        std::fs::write(&path, lines.join("\n")).unwrap();
        DocumentIdentity::new(path)
    }

    fn numbered(count: usize, overrides: &[(usize, &str)]) -> Vec<String> {
        let mut lines: Vec<String> = (0..count).map(|i| format!("A l8 c{i}")).collect();
        for (index, text) in overrides {
            lines[*index] = (*text).to_string();
        }
        lines
    }

    fn lookup(dir: &Path, id: &DocumentIdentity, anchor: usize, wanted: u32) -> Option<DefinitionDescriptor> {
        let mut store = DocumentStore::new();
        let doc = store.load(id, Some(anchor)).unwrap();
        let mut walker = Walker::new(&mut store, Some(dir));
        find(&mut walker, &doc, wanted, 0).unwrap()
    }

    #[test]
    fn definition_line_forms() {
        assert_eq!(definition_text("@12 4 7 piano", 12), Some("4 7 piano"));
        assert_eq!(definition_text("@ 012\tbass", 12), Some("bass"));
        assert_eq!(definition_text("@0 sine", 0), Some("sine"));
        assert_eq!(definition_text("@000 sine", 0), Some("sine"));
        assert_eq!(definition_text("@120 x", 12), None);
        assert_eq!(definition_text("@12", 12), None);
        assert_eq!(definition_text(" @12 x", 12), None);
    }

    #[test]
    fn nearest_preceding_definition_wins() {
        let dir = tempfile::tempdir().unwrap();
        let lines = numbered(14, &[(5, "@3 far"), (10, "@3 near")]);
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let id = write(dir.path(), "song.mml", &refs);

        let found = lookup(dir.path(), &id, 12, 3).unwrap();
        assert_eq!(found.location.line, 10);
        assert_eq!(found.definition, "near");
        assert_eq!(found.file_name, "song");
        assert!(found.perfect_match);
    }

    #[test]
    fn definitions_below_anchor_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "song.mml", &["A c", "B d", "@3 below"]);
        assert!(lookup(dir.path(), &id, 1, 3).is_none());
    }

    #[test]
    fn resolves_through_ff_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bank.MML", &["; bank", "", "", "", "", "", "", "@7 from bank", "@7 later"]);
        let id = write(dir.path(), "a.mml", &["#Title x", "", "", "#FFFile bank.FF", "A @7 c"]);

        let found = lookup(dir.path(), &id, 4, 7).unwrap();
        assert_eq!(found.location.identity, DocumentIdentity::new(dir.path().join("bank.MML")));
        assert_eq!(found.location.line, 7);
        assert_eq!(found.file_name, "bank");
        assert_eq!(found.definition, "from bank");
    }

    #[test]
    fn ff_file_miss_keeps_scanning() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bank.MML", &["@1 other"]);
        let id = write(dir.path(), "a.mml", &["@7 local", "#FFFile bank.FFL", "A @7"]);

        let found = lookup(dir.path(), &id, 2, 7).unwrap();
        assert_eq!(found.location.line, 0);
        assert_eq!(found.definition, "local");
    }

    #[test]
    fn follows_include_from_its_last_line() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "inc.mml", &["@4 first", "@4 last"]);
        let id = write(dir.path(), "a.mml", &["@4 outer", "#Include inc.mml", "A @4"]);

        let found = lookup(dir.path(), &id, 2, 4).unwrap();
        assert_eq!(found.definition, "last");
        assert_eq!(found.location.line, 1);
        assert_eq!(found.file_name, "inc");
    }

    #[test]
    fn include_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.mml", &["#Include a.mml", "B c"]);
        let id = write(dir.path(), "a.mml", &["#Include b.mml", "A c"]);

        let mut store = DocumentStore::new();
        let doc = store.load(&id, None).unwrap();
        let mut walker = Walker::new(&mut store, Some(dir.path()));
        assert!(find(&mut walker, &doc, 1, 0).unwrap().is_none());
        assert_eq!(walker.visited().len(), 2);
    }

    #[test]
    fn cycle_through_respelled_path_does_not_reenter() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.mml", &["#Include ./a.mml"]);
        let id = write(dir.path(), "a.mml", &["#Include b.mml", "A @1 c", "@1 below anchor"]);

        let mut store = DocumentStore::new();
        let doc = store.load(&id, Some(1)).unwrap();
        let mut walker = Walker::new(&mut store, Some(dir.path()));
        assert!(find(&mut walker, &doc, 1, 0).unwrap().is_none());
        assert_eq!(walker.visited().len(), 2);
    }

    #[test]
    fn unreadable_include_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "a.mml", &["@3 above", "#Include gone.mml", "A @3"]);

        let found = lookup(dir.path(), &id, 2, 3).unwrap();
        assert_eq!(found.location.line, 0);
        assert_eq!(found.definition, "above");
    }

    #[test]
    fn directive_without_env_dir_fails_the_query() {
        let dir = tempfile::tempdir().unwrap();
        let id = write(dir.path(), "a.mml", &["#Include b.mml", "A c"]);
        let mut store = DocumentStore::new();
        let doc = store.load(&id, None).unwrap();
        let mut walker = Walker::new(&mut store, None);
        assert!(matches!(find(&mut walker, &doc, 1, 0), Err(Error::ConfigurationMissing)));
    }
}
