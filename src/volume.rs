use crate::geometry::{Geometry, IjkToRas};

use ndarray::Array3;
use rayon::prelude::*;

/// A named voxel volume placed in physical space.
#[derive(Debug, Clone, Default)]
pub struct Volume<T> {
    pub name: String,
    pub data: Array3<T>,
    pub ijk_to_ras: IjkToRas,
}

/// Intensity image, e.g. a CT scan
pub type ImageVolume = Volume<i16>;

/// Label map where every non-zero voxel belongs to a structure
pub type LabelVolume = Volume<u8>;

impl<T> Volume<T> {
    pub fn new(name: impl Into<String>, data: Array3<T>, ijk_to_ras: IjkToRas) -> Self {
        Self {
            name: name.into(),
            data,
            ijk_to_ras,
        }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying data
    pub fn data_mut(&mut self) -> &mut Array3<T> {
        &mut self.data
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.dim(), self.ijk_to_ras)
    }

    /// Replace the index-to-physical transform, keeping the voxel data as is
    pub fn set_ijk_to_ras(&mut self, ijk_to_ras: IjkToRas) {
        self.ijk_to_ras = ijk_to_ras;
    }
}

impl<T: Default + PartialEq + Sync> Volume<T> {
    pub fn count_nonzero(&self) -> usize {
        let zero = T::default();
        self.data.par_iter().filter(|&v| *v != zero).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_follows_data() {
        let volume = LabelVolume::new("mask", Array3::zeros((2, 3, 4)), IjkToRas::identity());
        assert_eq!(volume.dim(), (2, 3, 4));
        assert_eq!(volume.geometry().dim, (2, 3, 4));
    }

    #[test]
    fn test_count_nonzero() {
        let mut volume = LabelVolume::new("mask", Array3::zeros((2, 2, 2)), IjkToRas::identity());
        volume.data_mut()[[0, 0, 0]] = 1;
        volume.data_mut()[[1, 1, 1]] = 7;
        assert_eq!(volume.count_nonzero(), 2);
    }
}
