//! Extraction options

use serde::{Deserialize, Serialize};

/// Options controlling one extraction call
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Recursively delete the target directory before extraction begins
    /// (default: false)
    #[serde(default)]
    pub overwrite: bool,

    /// Only extract entries whose archive-internal name starts with this
    /// prefix, with the prefix stripped from the output path
    ///
    /// The match is a literal-string anchor at the start of the entry name,
    /// not a path-segment-aware match: a `source_path` of `"lib"` also
    /// matches an entry named `"libfoo/"`.
    #[serde(default)]
    pub source_path: Option<String>,
}
