//! Line-indexed document snapshots with an mtime-validated cache.
//!
//! Files on disk are cached by identity and re-read only when their
//! modification time changes. The host's active buffer is never cached:
//! its text can change faster than mtime polling would notice.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::Error;
use crate::types::DocumentIdentity;

/// Live text of the document currently open in the host.
#[derive(Debug, Clone)]
pub struct ActiveBuffer {
    /// Identity of the open document.
    pub identity: DocumentIdentity,
    /// Current, possibly unsaved, contents.
    pub text: String,
}

/// A cached file: its lines and the mtime they were read at.
struct CachedDocument {
    lines: Arc<[String]>,
    modified: Option<SystemTime>,
}

/// Owns the process-wide document cache. Inject one per host; all lookups
/// borrow it mutably for the duration of a single query.
#[derive(Default)]
pub struct DocumentStore {
    active: Option<ActiveBuffer>,
    cache: HashMap<DocumentIdentity, CachedDocument>,
}

/// A stable snapshot of one document for the duration of a search.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    anchor: usize,
    identity: DocumentIdentity,
    lines: Arc<[String]>,
}

impl DocumentStore {
    /// Number of on-disk documents currently cached.
    pub fn cached_len(&self) -> usize {
        return self.cache.len();
    }

    /// Forget the active buffer; its identity falls back to disk reads.
    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// Drop one cache entry so the next load re-reads the file.
    pub fn invalidate(&mut self, identity: &DocumentIdentity) {
        self.cache.remove(identity);
    }

    /// Load a document, anchoring the search at `anchor` (clamped to the last
    /// line) or at the last line when `None`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unreadable` when the backing file cannot be read.
    pub fn load(
        &mut self,
        identity: &DocumentIdentity,
        anchor: Option<usize>,
    ) -> Result<LoadedDocument, Error> {
        let lines = match &self.active {
            Some(active) if active.identity == *identity => {
                tracing::debug!(path = %identity.path().display(), "reading active buffer");
                split_lines(&active.text)
            },
            _ => self.load_from_disk(identity)?,
        };
        return Ok(LoadedDocument::new(identity.clone(), lines, anchor));
    }

    /// Serve a file from cache, re-reading it when its mtime moved.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unreadable` when the file cannot be read.
    fn load_from_disk(&mut self, identity: &DocumentIdentity) -> Result<Arc<[String]>, Error> {
        let path = identity.path();
        if let Some(cached) = self.cache.get(identity) {
            let modified = modified_time(path);
            if modified.is_some() && modified == cached.modified {
                tracing::debug!(path = %path.display(), "document cache hit");
                return Ok(Arc::clone(&cached.lines));
            }
            tracing::debug!(path = %path.display(), "document changed on disk, reloading");
        } else {
            tracing::debug!(path = %path.display(), "document cache miss");
        }

        let text = std::fs::read_to_string(path).map_err(|source| {
            return Error::Unreadable {
                path: path.to_path_buf(),
                source,
            };
        })?;
        let lines = split_lines(&text);
        self.cache.insert(identity.clone(), CachedDocument {
            lines: Arc::clone(&lines),
            modified: modified_time(path),
        });
        return Ok(lines);
    }

    /// Create an empty store.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Route loads of `buffer.identity` to the given live text.
    pub fn set_active(&mut self, buffer: ActiveBuffer) {
        self.active = Some(buffer);
    }
}

impl LoadedDocument {
    /// Line the search starts from.
    pub const fn anchor(&self) -> usize {
        return self.anchor;
    }

    /// File name without its extension, used as the display name.
    pub fn display_stem(&self) -> String {
        return self
            .identity
            .path()
            .file_stem()
            .map(|stem| return stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    /// Identity the snapshot was loaded for.
    pub const fn identity(&self) -> &DocumentIdentity {
        return &self.identity;
    }

    /// Text of line `index`. Callers stay below `line_count()`.
    pub fn line_at(&self, index: usize) -> &str {
        return self.lines.get(index).map_or("", String::as_str);
    }

    /// Number of lines; at least one, since empty text is one empty line.
    pub fn line_count(&self) -> usize {
        return self.lines.len();
    }

    /// Wrap a line snapshot, clamping the anchor into range.
    fn new(identity: DocumentIdentity, lines: Arc<[String]>, anchor: Option<usize>) -> Self {
        let last = lines.len().saturating_sub(1);
        let anchor = anchor.map_or(last, |line| return line.min(last));
        return Self { anchor, identity, lines };
    }

    /// The same snapshot anchored elsewhere.
    pub fn with_anchor(&self, anchor: usize) -> Self {
        return Self::new(self.identity.clone(), Arc::clone(&self.lines), Some(anchor));
    }
}

/// Modification time of `path`, if the filesystem reports one.
fn modified_time(path: &Path) -> Option<SystemTime> {
    return std::fs::metadata(path).and_then(|meta| return meta.modified()).ok();
}

/// Split on `\n`, tolerating `\r\n`. Empty text yields a single empty line.
fn split_lines(text: &str) -> Arc<[String]> {
    return text
        .split('\n')
        .map(|line| return line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
}
