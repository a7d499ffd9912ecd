use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::IteratorConfig;
use crate::discovery::{MaskFile, resolve_mask_files};
use crate::error::{CaseError, MaskImportError, VolumeIoError};
use crate::events::ProgressReporter;
use crate::geometry::IjkToRas;
use crate::labels::LabelTable;
use crate::segmentation::Segmentation;
use crate::store::VolumeStore;
use crate::volume::ImageVolume;

/// State of the currently open case. Owns the image and the segmentation.
#[derive(Debug)]
pub struct CaseContext {
    pub index: usize,
    /// Case folder relative to the data root
    pub case: PathBuf,
    pub image: ImageVolume,
    pub segmentation: Segmentation,
}

/// Outcome of a successful case load
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Segment names in import order
    pub imported: Vec<String>,
    /// Mask files that were skipped
    pub failures: Vec<MaskImportError>,
}

pub struct CaseLoader<'a, S: ?Sized> {
    config: &'a IteratorConfig,
    store: &'a S,
}

impl<'a, S: VolumeStore + ?Sized> CaseLoader<'a, S> {
    pub fn new(config: &'a IteratorConfig, store: &'a S) -> Self {
        Self { config, store }
    }

    /// Load one case: its image, a segmentation on the image grid and one
    /// segment per matching mask file.
    ///
    /// # Errors
    ///
    /// Fails if the store reports the image as missing or unreadable, or if
    /// the batch label
    /// table is missing or malformed. A mask that cannot be imported only
    /// ends up in [`LoadReport::failures`].
    pub fn load(
        &self,
        index: usize,
        case: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> Result<(CaseContext, LoadReport), CaseError> {
        let image_path = self.config.image_path(case);
        let mut image = match self.store.load_image(&image_path) {
            Ok(image) => image,
            Err(VolumeIoError::NotFound(_)) => return Err(CaseError::MissingInput(image_path)),
            Err(source) => {
                return Err(CaseError::ImageLoad {
                    path: image_path,
                    source,
                });
            }
        };
        image.name = self.config.image_name().to_string();

        let forced_transform = self
            .config
            .force_mask_geometry
            .then_some(image.ijk_to_ras);

        let mut segmentation =
            Segmentation::for_volume(format!("Segmentation_{}", case.display()), &image);

        let labels_path = self.config.labels_path();
        let labels = LabelTable::load(&labels_path)
            .map_err(|source| CaseError::LabelTable {
                path: labels_path.clone(),
                source,
            })?
            .ok_or(CaseError::MissingLabelTable(labels_path))?;

        let masks = resolve_mask_files(
            &self.config.mask_dir(case),
            &self.config.segment_names,
            &self.config.file_extension,
        );

        let mut report = LoadReport::default();
        for (i, mask) in masks.iter().enumerate() {
            progress.status(&format!(
                "Reading segment ({}/{}): {}",
                i + 1,
                masks.len(),
                mask.segment_name
            ));
            match self.import_mask(&mut segmentation, mask, forced_transform, &labels) {
                Ok(()) => report.imported.push(mask.segment_name.clone()),
                Err(e) => {
                    warn!("Skipping mask: {}", e);
                    report.failures.push(e);
                }
            }
        }

        if !masks.is_empty() {
            progress.status("Collapsing binary labelmaps...");
            segmentation.collapse_to_shared();
        }
        drop(labels);

        progress.status(&format!(
            "Case {} loaded from {}.",
            index + 1,
            case.display()
        ));
        info!(
            "Loaded case {} ({:?}): {} segments, {} masks skipped",
            index,
            case,
            segmentation.len(),
            report.failures.len()
        );

        let context = CaseContext {
            index,
            case: case.to_path_buf(),
            image,
            segmentation,
        };
        Ok((context, report))
    }

    fn import_mask(
        &self,
        segmentation: &mut Segmentation,
        mask: &MaskFile,
        forced_transform: Option<IjkToRas>,
        labels: &LabelTable,
    ) -> Result<(), MaskImportError> {
        let mut volume =
            self.store
                .load_label_volume(&mask.path)
                .map_err(|source| MaskImportError::Read {
                    path: mask.path.clone(),
                    source,
                })?;

        if let Some(transform) = forced_transform {
            volume.set_ijk_to_ras(transform);
        }

        let id = segmentation
            .import_label_volume(&volume)
            .map_err(|source| MaskImportError::Import {
                path: mask.path.clone(),
                source,
            })?;

        if let Some(segment) = segmentation.segment_mut(&id) {
            segment.set_name(mask.segment_name.as_str());
            match labels.color_for_name(&mask.segment_name) {
                Some(color) => segment.set_color(color),
                None => debug!("No color for {:?} in label table", mask.segment_name),
            }
        }
        Ok(())
    }
}
