//! Volume codec seam.
//!
//! Reading and writing image and label files (NIfTI, NRRD, ...) is done by
//! the host through [`VolumeStore`]. [`MemoryStore`] keeps volumes in a map
//! keyed by path and is meant for dry runs and tests. Images need no file on
//! disk; masks are still found by listing the case's mask folder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::VolumeIoError;
use crate::volume::{ImageVolume, LabelVolume};

/// A file that does not exist is reported as [`VolumeIoError::NotFound`];
/// the case loader treats a missing image as a missing case input.
pub trait VolumeStore {
    /// Load an intensity image
    fn load_image(&self, path: &Path) -> Result<ImageVolume, VolumeIoError>;

    /// Load a label map, keeping its voxel values as stored
    fn load_label_volume(&self, path: &Path) -> Result<LabelVolume, VolumeIoError>;

    /// Write a label map to `path`, replacing any existing file
    fn save_label_volume(&mut self, volume: &LabelVolume, path: &Path) -> Result<(), VolumeIoError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    images: HashMap<PathBuf, ImageVolume>,
    labels: HashMap<PathBuf, LabelVolume>,
    writes: Vec<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_image(&mut self, path: impl Into<PathBuf>, image: ImageVolume) {
        self.images.insert(path.into(), image);
    }

    pub fn insert_label_volume(&mut self, path: impl Into<PathBuf>, labels: LabelVolume) {
        self.labels.insert(path.into(), labels);
    }

    pub fn label_volume(&self, path: &Path) -> Option<&LabelVolume> {
        self.labels.get(path)
    }

    /// Paths passed to `save_label_volume`, in call order
    pub fn writes(&self) -> &[PathBuf] {
        &self.writes
    }
}

impl VolumeStore for MemoryStore {
    fn load_image(&self, path: &Path) -> Result<ImageVolume, VolumeIoError> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| VolumeIoError::NotFound(path.to_path_buf()))
    }

    fn load_label_volume(&self, path: &Path) -> Result<LabelVolume, VolumeIoError> {
        self.labels
            .get(path)
            .cloned()
            .ok_or_else(|| VolumeIoError::NotFound(path.to_path_buf()))
    }

    fn save_label_volume(&mut self, volume: &LabelVolume, path: &Path) -> Result<(), VolumeIoError> {
        debug!("Storing label volume {:?} at {:?}", volume.name, path);
        self.labels.insert(path.to_path_buf(), volume.clone());
        self.writes.push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IjkToRas;
    use ndarray::Array3;

    #[test]
    fn test_memory_store_round_trip_and_missing() {
        let mut store = MemoryStore::new();
        let path = Path::new("/data/case/segmentations/spleen.nii.gz");
        assert!(matches!(
            store.load_label_volume(path),
            Err(VolumeIoError::NotFound(_))
        ));

        let volume = LabelVolume::new("spleen", Array3::zeros((1, 2, 2)), IjkToRas::identity());
        store.save_label_volume(&volume, path).unwrap();

        assert_eq!(store.load_label_volume(path).unwrap().dim(), (1, 2, 2));
        assert_eq!(store.writes(), &[path.to_path_buf()]);
        assert!(store.load_image(path).is_err());
    }
}
