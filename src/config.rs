use std::path::{Path, PathBuf};

use crate::error::Error;

/// Project configuration loaded from `.pmdref.toml`.
/// Directives resolve against the environment directory: `env_dir` when set,
/// otherwise the directory holding the PMD batch file.
#[derive(Debug, Default)]
pub struct Config {
    batch_path: Option<PathBuf>,
    env_dir: Option<PathBuf>,
}

/// Raw TOML structure for `.pmdref.toml`.
#[derive(serde::Deserialize)]
struct PmdrefTomlConfig {
    #[serde(default)]
    batch_path: Option<PathBuf>,
    #[serde(default)]
    env_dir: Option<PathBuf>,
}

impl Config {
    /// Directory that `#Include` and `#FFFile` paths are relative to.
    pub fn env_dir(&self) -> Option<&Path> {
        if let Some(dir) = &self.env_dir {
            return Some(dir);
        }
        return self
            .batch_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| return !dir.as_os_str().is_empty());
    }

    /// Load config from `.pmdref.toml` in the given root directory.
    /// Returns an empty config if the file doesn't exist. A file that exists
    /// but is malformed is an error, never a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".pmdref.toml");
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        return Self::parse(&content);
    }

    /// Parse `.pmdref.toml` content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: PmdrefTomlConfig = toml::from_str(content)?;
        return Ok(Self {
            batch_path: raw.batch_path,
            env_dir: raw.env_dir,
        });
    }

    /// Replace the environment directory, as the `--env-dir` flag does.
    #[must_use]
    pub fn with_env_dir(mut self, dir: PathBuf) -> Self {
        self.env_dir = Some(dir);
        return self;
    }
}
