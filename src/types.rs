/// Core domain types shared by the resolvers and the query layer.
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

/// A document key. Two identities are equal when their absolute paths match
/// case-insensitively, so `SONG.MML`, `./song.mml` and `env/../song.mml`
/// share one cache slot.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentIdentity {
    /// Absolute, `.`/`..`-free, upper-cased path with `/` separators.
    /// Drives `Eq` and `Hash`.
    #[serde(skip)]
    key: String,
    /// The path as given, used for reads and display.
    path: PathBuf,
}

impl DocumentIdentity {
    /// Build an identity for a path on disk or for the active buffer's path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let key = normalize(&path).to_string_lossy().replace('\\', "/").to_uppercase();
        return Self { key, path };
    }

    /// The path this identity was created from.
    pub fn path(&self) -> &Path {
        return &self.path;
    }
}

impl Eq for DocumentIdentity {}

impl Hash for DocumentIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialEq for DocumentIdentity {
    fn eq(&self, other: &Self) -> bool {
        return self.key == other.key;
    }
}

/// Where a definition lives: a document and a zero-based line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Document containing the line.
    pub identity: DocumentIdentity,
    /// Zero-based line index.
    pub line: usize,
}

/// A definition found by one of the resolvers. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionDescriptor {
    /// Raw trailing text of the defining line.
    pub definition: String,
    /// Display name of the file the definition came from.
    pub file_name: String,
    /// Position of the defining line.
    pub location: Location,
    /// The key equals the queried token exactly.
    pub perfect_match: bool,
}

/// What a variable reference names: a numeral or a bare name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `!name` style reference.
    Named(String),
    /// `!12` or `!$0C` style reference, already decoded.
    Numeric(u32),
}

impl Token {
    /// Decode command-line or cursor text: numerals become `Numeric`.
    pub fn from_text(text: &str) -> Self {
        return match crate::number::parse(text) {
            Some(value) => Token::Numeric(value),
            None => Token::Named(text.to_string()),
        };
    }
}

/// Candidates collected by one variable search, nearest first.
/// `short_circuited` is set when the last candidate is an exact match
/// and the search stopped there.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    /// Descriptors in the order they were encountered.
    pub candidates: Vec<DefinitionDescriptor>,
    /// The search stopped on a perfect match.
    pub short_circuited: bool,
}

impl SearchOutcome {
    /// A single perfect match that ends the search.
    pub fn perfect(descriptor: DefinitionDescriptor) -> Self {
        return Self {
            candidates: vec![descriptor],
            short_circuited: true,
        };
    }
}

/// Absolute form of `path` with `.` and `..` folded away. Falls back to the
/// path as given when the working directory is unavailable.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_err| return path.to_path_buf());
    let mut folded = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                folded.pop();
            },
            Component::Normal(_) | Component::Prefix(_) | Component::RootDir => folded.push(component),
        }
    }
    return folded;
}
