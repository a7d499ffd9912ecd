//! Case and mask discovery
//!
//! Cases are directories matching a glob pattern under the data root:
//! - `<root>/<case_pattern>` (default `*/*`)
//!
//! Masks are files in the case's mask subfolder ending with the mask
//! extension; the file name minus the extension is the segment name:
//! - `<root>/<case>/<mask_subfolder>/<segment_name><extension>`

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Ordered case folders, relative to the data root
#[derive(Debug, Clone, Default)]
pub struct CaseSet {
    root: PathBuf,
    cases: Vec<PathBuf>,
}

impl CaseSet {
    pub fn new(root: impl Into<PathBuf>, cases: Vec<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cases,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.cases.get(index).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.cases.iter().map(PathBuf::as_path)
    }
}

/// Case-insensitive include list over segment names.
///
/// An empty filter matches every name.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    patterns: Vec<Pattern>,
}

impl NameFilter {
    /// Parse a comma-separated pattern list such as `"liver*, kidney_?"`.
    /// Blank entries are ignored.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let patterns = list
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                Pattern::new(&p.to_lowercase()).map_err(|e| ConfigError::InvalidNamePattern {
                    pattern: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let name = name.trim().to_lowercase();
        self.patterns.iter().any(|p| p.matches(&name))
    }
}

/// A mask file selected for import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskFile {
    pub path: PathBuf,
    /// File name with the mask extension stripped, untrimmed so that export
    /// writes back to `path`
    pub segment_name: String,
}

/// Enumerate case folders matching `case_pattern` under `root`.
///
/// Only directories are kept; paths are returned relative to `root` in
/// lexical order. An empty result is not an error here.
pub fn resolve_cases(root: &Path, case_pattern: &str) -> Result<CaseSet, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidCasePattern {
        pattern: case_pattern.to_string(),
        reason,
    };

    let root_pattern = Pattern::escape(&root.to_string_lossy());
    let full_pattern = format!("{}/{}", root_pattern.trim_end_matches('/'), case_pattern);
    // Hidden folders are only matched by patterns that spell out the dot
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let entries = glob::glob_with(&full_pattern, options).map_err(|e| invalid(e.to_string()))?;

    let mut cases = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_dir() => {
                if let Ok(relative) = path.strip_prefix(root) {
                    cases.push(relative.to_path_buf());
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable path while resolving cases: {}", e),
        }
    }
    cases.sort();

    debug!("Resolved {} cases in {:?} with {:?}", cases.len(), root, case_pattern);
    Ok(CaseSet::new(root, cases))
}

/// Strip `extension` from a file name, returning `None` if it does not end with it
pub fn strip_extension<'a>(file_name: &'a str, extension: &str) -> Option<&'a str> {
    file_name.strip_suffix(extension)
}

/// List the mask files of one case that pass `filter`, sorted by file name.
///
/// A missing mask directory yields an empty list.
pub fn resolve_mask_files(mask_dir: &Path, filter: &NameFilter, extension: &str) -> Vec<MaskFile> {
    let entries = match std::fs::read_dir(mask_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No masks read from {:?}: {}", mask_dir, e);
            return Vec::new();
        }
    };

    let mut masks: Vec<MaskFile> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let file_name = entry.file_name().to_str()?.to_string();
            let segment_name = strip_extension(&file_name, extension)?.to_string();
            filter.matches(&segment_name).then(|| MaskFile {
                path: entry.path(),
                segment_name,
            })
        })
        .collect();
    masks.sort_by(|a, b| a.path.cmp(&b.path));

    debug!("Found {} mask files in {:?}", masks.len(), mask_dir);
    masks
}
