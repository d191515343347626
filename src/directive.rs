//! `#FFFile` and `#Include` directives.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// `#FFFile name.FF` / `#FFFile name.FFL`, or `#Include name`, case-insensitive.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?i)^#FFFile\s+(.+)\.FFL?|^#Include\s+(.+)").expect("valid regex");
});

/// A directive pointing the search at another document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceDirective {
    /// Terminal instrument bank. Its MML source sits in the environment
    /// directory as `<name>.MML`.
    ExternalDefinitions {
        /// Bank name without the `.FF`/`.FFL` extension.
        name: String,
    },
    /// Another document whose lines are searched in place.
    Include {
        /// Path relative to the environment directory.
        name: String,
    },
}

impl ReferenceDirective {
    /// The name shown to the user for results found through this directive.
    pub fn display_name(&self) -> &str {
        return match self {
            Self::ExternalDefinitions { name } | Self::Include { name } => name,
        };
    }

    /// Where the directive's document lives on disk.
    pub fn target_path(&self, env_dir: &Path) -> PathBuf {
        return match self {
            Self::ExternalDefinitions { name } => env_dir.join(format!("{name}.MML")),
            Self::Include { name } => env_dir.join(name),
        };
    }
}

/// Recognize a directive at the start of `line`.
pub fn parse_directive(line: &str) -> Option<ReferenceDirective> {
    let captures = DIRECTIVE.captures(line)?;
    if let Some(bank) = captures.get(1) {
        return Some(ReferenceDirective::ExternalDefinitions {
            name: bank.as_str().to_string(),
        });
    }
    let included = captures.get(2)?.as_str().trim_end();
    if included.is_empty() {
        return None;
    }
    return Some(ReferenceDirective::Include {
        name: included.to_string(),
    });
}
