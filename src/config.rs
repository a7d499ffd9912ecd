//! Iterator configuration
//!
//! Built in code with [`IteratorConfig::new`] or loaded from environment
//! variables with [`IteratorConfig::from_env`].

use std::env;
use std::path::{Path, PathBuf};

use crate::discovery::NameFilter;
use crate::error::ConfigError;

pub const DEFAULT_CASE_PATTERN: &str = "*/*";
pub const DEFAULT_IMAGE_FILENAME: &str = "ct.nii.gz";
pub const DEFAULT_MASK_SUBFOLDER: &str = "segmentations";
pub const DEFAULT_FILE_EXTENSION: &str = ".nii.gz";
pub const LABELS_FILENAME: &str = "labels.csv";

#[derive(Debug, Clone)]
pub struct IteratorConfig {
    /// Data directory holding the case folders and `labels.csv`
    pub root: PathBuf,
    /// Glob pattern for case folders, relative to `root`
    pub case_pattern: String,
    /// Image file name inside each case folder
    pub image_filename: String,
    /// Mask folder name inside each case folder, read from and written to
    pub mask_subfolder: String,
    /// Segment names to load; empty loads all
    pub segment_names: NameFilter,
    /// Overwrite each mask's index-to-physical transform with the image's
    pub force_mask_geometry: bool,
    /// Extension shared by image and mask files
    pub file_extension: String,
    /// Color table file name inside `root`
    pub labels_filename: String,
}

impl IteratorConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            case_pattern: DEFAULT_CASE_PATTERN.to_string(),
            image_filename: DEFAULT_IMAGE_FILENAME.to_string(),
            mask_subfolder: DEFAULT_MASK_SUBFOLDER.to_string(),
            segment_names: NameFilter::default(),
            force_mask_geometry: true,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            labels_filename: LABELS_FILENAME.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `CASE_ITERATOR_ROOT` is required; every other variable falls back to
    /// its default when unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let root = non_empty_var("CASE_ITERATOR_ROOT").ok_or(ConfigError::MissingRoot)?;
        let mut config = Self::new(root);

        if let Some(pattern) = non_empty_var("CASE_ITERATOR_CASE_PATTERN") {
            config.case_pattern = pattern;
        }
        if let Some(name) = non_empty_var("CASE_ITERATOR_IMAGE_FILENAME") {
            config.image_filename = name;
        }
        if let Some(folder) = non_empty_var("CASE_ITERATOR_MASK_SUBFOLDER") {
            config.mask_subfolder = folder;
        }
        if let Some(names) = non_empty_var("CASE_ITERATOR_SEGMENT_NAMES") {
            config.segment_names = NameFilter::parse(&names)?;
        }
        if let Some(val) = non_empty_var("CASE_ITERATOR_FORCE_MASK_GEOMETRY") {
            config.force_mask_geometry = parse_flag(&val);
        }

        Ok(config)
    }

    pub fn with_case_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.case_pattern = pattern.into();
        self
    }

    pub fn with_image_filename(mut self, name: impl Into<String>) -> Self {
        self.image_filename = name.into();
        self
    }

    pub fn with_mask_subfolder(mut self, folder: impl Into<String>) -> Self {
        self.mask_subfolder = folder.into();
        self
    }

    /// Set the include list from a comma-separated pattern string
    pub fn with_segment_names(mut self, names: &str) -> Result<Self, ConfigError> {
        self.segment_names = NameFilter::parse(names)?;
        Ok(self)
    }

    pub fn with_force_mask_geometry(mut self, force: bool) -> Self {
        self.force_mask_geometry = force;
        self
    }

    pub fn case_dir(&self, case: &Path) -> PathBuf {
        self.root.join(case)
    }

    pub fn image_path(&self, case: &Path) -> PathBuf {
        self.case_dir(case).join(&self.image_filename)
    }

    pub fn mask_dir(&self, case: &Path) -> PathBuf {
        self.case_dir(case).join(&self.mask_subfolder)
    }

    pub fn mask_path(&self, case: &Path, segment_name: &str) -> PathBuf {
        self.mask_dir(case)
            .join(format!("{}{}", segment_name, self.file_extension))
    }

    pub fn labels_path(&self) -> PathBuf {
        self.root.join(&self.labels_filename)
    }

    /// Image display name: the image file name without its extension
    pub fn image_name(&self) -> &str {
        self.image_filename
            .strip_suffix(&self.file_extension)
            .unwrap_or(&self.image_filename)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(val: &str) -> bool {
    let val = val.trim().to_lowercase();
    val == "true" || val == "1" || val == "yes" || val == "on"
}
