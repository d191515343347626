//! Follows directives from one document to the next during a single search.

use std::collections::HashSet;
use std::path::Path;

use crate::directive::ReferenceDirective;
use crate::document::{DocumentStore, LoadedDocument};
use crate::error::Error;
use crate::types::DocumentIdentity;

/// Documents already entered by the current search pass.
pub type VisitedSet = HashSet<DocumentIdentity>;

/// One search pass over the include graph. The visited set lives as long as
/// the walker and is shared by every nested call that borrows it.
pub struct Walker<'a> {
    env_dir: Option<&'a Path>,
    store: &'a mut DocumentStore,
    visited: VisitedSet,
}

impl<'a> Walker<'a> {
    /// Mark `document` as entered. Returns `false` if it already was, in
    /// which case the caller must not search it again.
    pub fn enter(&mut self, document: &LoadedDocument) -> bool {
        return self.visited.insert(document.identity().clone());
    }

    /// Start a pass with an empty visited set.
    pub fn new(store: &'a mut DocumentStore, env_dir: Option<&'a Path>) -> Self {
        return Self {
            env_dir,
            store,
            visited: VisitedSet::new(),
        };
    }

    /// Load the document a directive points at, anchored at its last line.
    /// An unreadable target yields `Ok(None)` so the search can go on.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigurationMissing` when no environment directory is set.
    pub fn open(&mut self, directive: &ReferenceDirective) -> Result<Option<LoadedDocument>, Error> {
        let env_dir = self.env_dir.ok_or(Error::ConfigurationMissing)?;
        let identity = DocumentIdentity::new(directive.target_path(env_dir));
        return match self.store.load(&identity, None) {
            Ok(document) => Ok(Some(document)),
            Err(e) => {
                tracing::warn!(directive = directive.display_name(), error = %e, "skipping unreadable reference");
                Ok(None)
            },
        };
    }

    /// Documents entered so far.
    pub const fn visited(&self) -> &VisitedSet {
        return &self.visited;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_refuses_second_visit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mml");
        std::fs::write(&path, "x").unwrap();
        let mut store = DocumentStore::new();
        let doc = store.load(&DocumentIdentity::new(&path), None).unwrap();

        let mut walker = Walker::new(&mut store, Some(dir.path()));
        assert!(walker.enter(&doc));
        assert!(!walker.enter(&doc.with_anchor(0)));
        assert_eq!(walker.visited().len(), 1);
    }

    #[test]
    fn open_without_env_dir_is_configuration_missing() {
        let mut store = DocumentStore::new();
        let mut walker = Walker::new(&mut store, None);
        let directive = ReferenceDirective::Include { name: "x.mml".to_string() };
        assert!(matches!(walker.open(&directive), Err(Error::ConfigurationMissing)));
    }

    #[test]
    fn open_unreadable_target_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::new();
        let mut walker = Walker::new(&mut store, Some(dir.path()));
        let directive = ReferenceDirective::Include { name: "missing.mml".to_string() };
        assert!(walker.open(&directive).unwrap().is_none());
    }

    #[test]
    fn open_anchors_at_last_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("inc.mml"), "a\nb\nc").unwrap();
        let mut store = DocumentStore::new();
        let mut walker = Walker::new(&mut store, Some(dir.path()));
        let directive = ReferenceDirective::Include { name: "inc.mml".to_string() };
        let doc = walker.open(&directive).unwrap().unwrap();
        assert_eq!(doc.anchor(), 2);
    }
}
