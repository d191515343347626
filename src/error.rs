/// Crate-level error types for pmdref lookups.
use std::path::PathBuf;

/// Every failure a lookup can hit. Only `ConfigurationMissing` escapes a
/// search; unreadable branches are logged and treated as "no candidates".
#[allow(clippy::error_impl_error, reason = "the crate has a single error type")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A directive was reached but no environment directory is configured.
    #[error("environment directory not configured (set `batch_path` in .pmdref.toml)")]
    ConfigurationMissing,

    /// Underlying I/O error from the filesystem or stdin.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// A token under the cursor or on the command line is not a valid numeral.
    #[error("malformed token: `{token}`")]
    MalformedToken {
        /// The raw token text.
        token: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A document in the include graph could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        /// Path of the document that failed to load.
        path: PathBuf,
        /// The I/O error reported by the filesystem.
        source: std::io::Error,
    },
}
