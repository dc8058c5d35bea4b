//! Spec pattern resolution

use crate::error::{CliError, CliResult};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Where the bundle comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spec {
    /// Matched spec files, sorted and de-duplicated
    Files(Vec<PathBuf>),
    /// Read the bundle from standard input
    Stdin,
}

impl Spec {
    /// Matched files; empty for stdin
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Self::Files(files) => files,
            Self::Stdin => &[],
        }
    }
}

/// Expand glob `patterns` into a sorted file list, or [`Spec::Stdin`] for `-`
pub fn resolve_spec(patterns: &[String]) -> CliResult<Spec> {
    if patterns.iter().any(|pattern| pattern == "-") {
        if patterns.len() > 1 {
            return Err(CliError::invalid_argument(
                "`-` reads the bundle from stdin and cannot be combined with spec patterns",
            ));
        }
        return Ok(Spec::Stdin);
    }

    let mut files = BTreeSet::new();
    for pattern in patterns {
        let entries = glob::glob(pattern).map_err(|e| {
            CliError::invalid_argument(format!("bad spec pattern {pattern:?}: {e}"))
        })?;
        let before = files.len();
        for entry in entries {
            let path = entry.map_err(glob::GlobError::into_error)?;
            if !path.is_dir() {
                files.insert(path);
            }
        }
        tracing::debug!(pattern = %pattern, matched = files.len() - before, "resolved spec pattern");
    }
    Ok(Spec::Files(files.into_iter().collect()))
}
