use std::path::PathBuf;

use thiserror::Error;

use crate::segmentation::SegmentId;

/// The batch cannot start
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No data directory configured")]
    MissingRoot,

    #[error("Data directory is not a directory: {0:?}")]
    RootNotDirectory(PathBuf),

    #[error("Invalid case folder pattern {pattern:?}: {reason}")]
    InvalidCasePattern { pattern: String, reason: String },

    #[error("Invalid segment name pattern {pattern:?}: {reason}")]
    InvalidNamePattern { pattern: String, reason: String },

    #[error("No case folders match {pattern:?} under {root:?}")]
    NoCases { root: PathBuf, pattern: String },
}

/// Failure of a volume codec collaborator
#[derive(Debug, Error)]
pub enum VolumeIoError {
    #[error("Volume not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Unreadable volume {path:?}: {reason}")]
    Format { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LabelTableError {
    #[error("Failed to read label table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid label table row {line}: {reason}")]
    InvalidRow { line: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("Label volume geometry {found:?} does not match reference geometry {expected:?}")]
    GeometryMismatch {
        expected: crate::geometry::Geometry,
        found: crate::geometry::Geometry,
    },

    #[error("Segment not found: {0}")]
    UnknownSegment(SegmentId),
}

/// Aborts the open attempt of a single case
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Case index {index} out of range (case count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Image not found at {0:?}")]
    MissingInput(PathBuf),

    #[error("Labels file not found at {0:?}")]
    MissingLabelTable(PathBuf),

    #[error("Labels file {path:?} could not be loaded: {source}")]
    LabelTable {
        path: PathBuf,
        #[source]
        source: LabelTableError,
    },

    #[error("Failed to load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: VolumeIoError,
    },
}

/// One mask file that could not be imported; the rest of the case still loads
#[derive(Debug, Error)]
pub enum MaskImportError {
    #[error("Failed to read mask {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: VolumeIoError,
    },

    #[error("Failed to import mask {path:?}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: SegmentationError,
    },
}

/// One segment (or the output directory) that could not be written
#[derive(Debug, Error)]
pub enum ExportWriteError {
    #[error("Failed to create output directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rasterize segment {name:?}: {source}")]
    Rasterize {
        name: String,
        #[source]
        source: SegmentationError,
    },

    #[error("Failed to write segment {name:?} to {path:?}: {source}")]
    Write {
        name: String,
        path: PathBuf,
        #[source]
        source: VolumeIoError,
    },
}
