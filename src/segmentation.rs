//! Multi-label segmentation bound to the voxel grid of a reference image.
//!
//! Segments are imported as binary masks. Once all masks of a case are in,
//! [`Segmentation::collapse_to_shared`] packs non-overlapping segments into
//! shared `u16` label layers so a case with a hundred structures does not
//! hold a hundred full-size boolean arrays. Editing a segment moves it back to
//! its own binary mask.

use std::fmt;

use ndarray::{Array3, ArrayViewMut3, Zip};
use tracing::debug;

use crate::enums::SegmentStatus;
use crate::error::SegmentationError;
use crate::geometry::Geometry;
use crate::volume::{LabelVolume, Volume};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(String);

impl SegmentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

/// Colors handed out to segments that get no color from a label table
const DEFAULT_COLORS: &[Rgb] = &[
    Rgb([128, 174, 128]),
    Rgb([241, 214, 145]),
    Rgb([177, 122, 101]),
    Rgb([111, 184, 210]),
    Rgb([216, 101, 79]),
    Rgb([221, 130, 101]),
    Rgb([144, 238, 144]),
    Rgb([192, 104, 88]),
];

#[derive(Debug, Clone)]
enum Representation {
    Binary(Array3<bool>),
    Shared { layer: usize, value: u16 },
}

/// One named, colored region of a segmentation
#[derive(Debug, Clone)]
pub struct Segment {
    id: SegmentId,
    name: String,
    color: Rgb,
    status: SegmentStatus,
    representation: Representation,
}

impl Segment {
    pub fn id(&self) -> &SegmentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }

    pub fn status(&self) -> SegmentStatus {
        self.status
    }

    pub fn set_status(&mut self, status: SegmentStatus) {
        self.status = status;
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.representation, Representation::Shared { .. })
    }
}

#[derive(Debug)]
pub struct Segmentation {
    name: String,
    reference: Geometry,
    segments: Vec<Segment>,
    layers: Vec<Array3<u16>>,
    // Highest label value handed out per layer
    layer_values: Vec<u16>,
    next_id: usize,
}

impl Segmentation {
    /// Create an empty segmentation whose reference geometry is `reference`
    pub fn new(name: impl Into<String>, reference: Geometry) -> Self {
        Self {
            name: name.into(),
            reference,
            segments: Vec::new(),
            layers: Vec::new(),
            layer_values: Vec::new(),
            next_id: 1,
        }
    }

    /// Create an empty segmentation on the grid of `volume`
    pub fn for_volume<T>(name: impl Into<String>, volume: &Volume<T>) -> Self {
        Self::new(name, volume.geometry())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference_geometry(&self) -> &Geometry {
        &self.reference
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments in insertion order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| &s.id == id)
    }

    pub fn segment_mut(&mut self, id: &SegmentId) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| &s.id == id)
    }

    pub fn segment_by_name(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name == name)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Add an empty segment, e.g. for a structure that has no mask file yet
    pub fn add_segment(&mut self, name: impl Into<String>, color: Option<Rgb>) -> SegmentId {
        let mask = Array3::from_elem(self.reference.dim, false);
        self.push_segment(name.into(), color, mask)
    }

    /// Import a label volume as one new segment.
    ///
    /// Every non-zero voxel belongs to the segment. The volume must sit on
    /// the reference grid; no resampling is done.
    pub fn import_label_volume(
        &mut self,
        labels: &LabelVolume,
    ) -> Result<SegmentId, SegmentationError> {
        let found = labels.geometry();
        if !found.is_aligned_with(&self.reference) {
            return Err(SegmentationError::GeometryMismatch {
                expected: self.reference,
                found,
            });
        }

        let mask = Zip::from(labels.data()).par_map_collect(|&v| v != 0);
        Ok(self.push_segment(labels.name.clone(), None, mask))
    }

    fn push_segment(&mut self, name: String, color: Option<Rgb>, mask: Array3<bool>) -> SegmentId {
        let id = SegmentId(format!("Segment_{}", self.next_id));
        self.next_id += 1;
        let color = color.unwrap_or(DEFAULT_COLORS[self.segments.len() % DEFAULT_COLORS.len()]);

        self.segments.push(Segment {
            id: id.clone(),
            name,
            color,
            status: SegmentStatus::NotStarted,
            representation: Representation::Binary(mask),
        });
        id
    }

    /// Pack all binary segments into shared label layers.
    ///
    /// A segment goes into the first layer none of whose voxels it overlaps.
    /// Names, colors, ids and statuses are untouched.
    pub fn collapse_to_shared(&mut self) {
        let Self {
            reference,
            segments,
            layers,
            layer_values,
            ..
        } = self;

        for segment in segments.iter_mut() {
            let Representation::Binary(mask) = &segment.representation else {
                continue;
            };

            let free_layer = layers.iter().zip(layer_values.iter()).position(|(layer, &used)| {
                used < u16::MAX && Zip::from(layer).and(mask).all(|&l, &m| !(m && l != 0))
            });
            let layer = match free_layer {
                Some(layer) => layer,
                None => {
                    layers.push(Array3::zeros(reference.dim));
                    layer_values.push(0);
                    layers.len() - 1
                }
            };

            layer_values[layer] += 1;
            let value = layer_values[layer];
            Zip::from(&mut layers[layer]).and(mask).par_for_each(|l, &m| {
                if m {
                    *l = value;
                }
            });
            segment.representation = Representation::Shared { layer, value };
        }

        debug!(
            "Collapsed {} segments into {} layers",
            segments.len(),
            layers.len()
        );
    }

    /// Binary mask of a single segment on the reference grid
    pub fn mask(&self, id: &SegmentId) -> Result<Array3<bool>, SegmentationError> {
        let segment = self
            .segment(id)
            .ok_or_else(|| SegmentationError::UnknownSegment(id.clone()))?;

        Ok(match &segment.representation {
            Representation::Binary(mask) => mask.clone(),
            Representation::Shared { layer, value } => {
                let value = *value;
                Zip::from(&self.layers[*layer]).par_map_collect(|&v| v == value)
            }
        })
    }

    /// Rasterize one segment alone into a single-label volume (label value 1)
    /// sized to the reference geometry
    pub fn rasterize_segment(&self, id: &SegmentId) -> Result<LabelVolume, SegmentationError> {
        let segment = self
            .segment(id)
            .ok_or_else(|| SegmentationError::UnknownSegment(id.clone()))?;

        let data = match &segment.representation {
            Representation::Binary(mask) => Zip::from(mask).par_map_collect(|&m| u8::from(m)),
            Representation::Shared { layer, value } => {
                let value = *value;
                Zip::from(&self.layers[*layer]).par_map_collect(|&v| u8::from(v == value))
            }
        };

        Ok(LabelVolume::new(
            segment.name.clone(),
            data,
            self.reference.ijk_to_ras,
        ))
    }

    /// Apply an edit to a segment's voxels.
    ///
    /// The segment leaves the shared representation and, if it was
    /// `NotStarted`, becomes `InProgress`.
    pub fn edit_segment<F>(&mut self, id: &SegmentId, edit: F) -> Result<(), SegmentationError>
    where
        F: FnOnce(ArrayViewMut3<'_, bool>),
    {
        let mut mask = self.mask(id)?;
        let index = self
            .segments
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| SegmentationError::UnknownSegment(id.clone()))?;

        if let Representation::Shared { layer, value } = self.segments[index].representation {
            self.layers[layer].par_mapv_inplace(|v| if v == value { 0 } else { v });
        }

        edit(mask.view_mut());

        let segment = &mut self.segments[index];
        segment.representation = Representation::Binary(mask);
        if segment.status == SegmentStatus::NotStarted {
            segment.status = SegmentStatus::InProgress;
        }
        Ok(())
    }
}
