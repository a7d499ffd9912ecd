use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::IteratorConfig;
use crate::error::ExportWriteError;
use crate::events::ProgressReporter;
use crate::loader::CaseContext;
use crate::store::VolumeStore;

/// Outcome of exporting one case
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    /// Segments left untouched on disk because they were never edited
    pub unchanged: usize,
    pub failures: Vec<ExportWriteError>,
}

pub struct CaseExporter<'a, S: ?Sized> {
    config: &'a IteratorConfig,
    store: &'a mut S,
}

impl<'a, S: VolumeStore + ?Sized> CaseExporter<'a, S> {
    pub fn new(config: &'a IteratorConfig, store: &'a mut S) -> Self {
        Self { config, store }
    }

    /// Write every edited segment of `context` to the case's mask folder as
    /// `<segment name><extension>`.
    ///
    /// Segments still `NotStarted` are skipped. A failing segment is recorded
    /// in the report and the remaining segments are still written.
    pub fn export(
        &mut self,
        context: &CaseContext,
        progress: &mut dyn ProgressReporter,
    ) -> ExportReport {
        let mut report = ExportReport::default();
        let segmentation = &context.segmentation;
        if segmentation.is_empty() {
            debug!("Nothing to export for {:?}", context.case);
            return report;
        }

        let output_dir = self.config.mask_dir(&context.case);
        if let Err(source) = fs::create_dir_all(&output_dir) {
            warn!("Cannot create output directory {:?}: {}", output_dir, source);
            report.failures.push(ExportWriteError::CreateDir {
                path: output_dir,
                source,
            });
            return report;
        }

        let total = segmentation.len();
        for (i, segment) in segmentation.segments().iter().enumerate() {
            if !segment.status().is_started() {
                report.unchanged += 1;
                continue;
            }

            let name = segment.name().to_string();
            progress.status(&format!("Writing segment {}/{}: {}", i + 1, total, name));

            let raster = match segmentation.rasterize_segment(segment.id()) {
                Ok(raster) => raster,
                Err(source) => {
                    warn!("Cannot rasterize segment {:?}: {}", name, source);
                    report
                        .failures
                        .push(ExportWriteError::Rasterize { name, source });
                    continue;
                }
            };

            let path = self.config.mask_path(&context.case, &name);
            match self.store.save_label_volume(&raster, &path) {
                Ok(()) => {
                    debug!("Wrote segment {:?} to {:?}", name, path);
                    report.written.push(path);
                }
                Err(source) => {
                    warn!("Cannot write segment {:?} to {:?}: {}", name, path, source);
                    report
                        .failures
                        .push(ExportWriteError::Write { name, path, source });
                }
            }
        }

        progress.status("Export segments completed");
        info!(
            "Exported case {:?}: {} written, {} unchanged, {} failed",
            context.case,
            report.written.len(),
            report.unchanged,
            report.failures.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::SegmentStatus;
    use crate::error::VolumeIoError;
    use crate::events::NoProgress;
    use crate::geometry::{Geometry, IjkToRas};
    use crate::segmentation::Segmentation;
    use crate::store::MemoryStore;
    use crate::volume::{ImageVolume, LabelVolume};
    use ndarray::Array3;
    use std::path::Path;

    const DIM: (usize, usize, usize) = (2, 2, 2);

    fn context(root: &Path) -> (IteratorConfig, CaseContext) {
        let config = IteratorConfig::new(root);
        let geometry = Geometry::new(DIM, IjkToRas::identity());
        let mut segmentation = Segmentation::new("seg", geometry);
        for name in ["spleen", "liver"] {
            let mut data = Array3::<u8>::zeros(DIM);
            data[[1, 1, 1]] = 1;
            segmentation
                .import_label_volume(&LabelVolume::new(name, data, IjkToRas::identity()))
                .unwrap();
        }
        segmentation.collapse_to_shared();

        let context = CaseContext {
            index: 0,
            case: PathBuf::from("site/s0001"),
            image: ImageVolume::new("ct", Array3::zeros(DIM), IjkToRas::identity()),
            segmentation,
        };
        (config, context)
    }

    fn start(context: &mut CaseContext, name: &str) {
        let id = context
            .segmentation
            .segment_by_name(name)
            .unwrap()
            .id()
            .clone();
        context
            .segmentation
            .edit_segment(&id, |mut mask| mask[[0, 0, 0]] = true)
            .unwrap();
    }

    #[test]
    fn test_exports_only_started_segments() {
        let dir = tempfile::tempdir().unwrap();
        let (config, mut context) = context(dir.path());
        start(&mut context, "spleen");

        let mut store = MemoryStore::new();
        let report = CaseExporter::new(&config, &mut store).export(&context, &mut NoProgress);

        let expected = dir.path().join("site/s0001/segmentations/spleen.nii.gz");
        assert_eq!(report.written, vec![expected.clone()]);
        assert_eq!(report.unchanged, 1);
        assert!(report.failures.is_empty());
        assert_eq!(store.writes(), &[expected.clone()]);
        assert_eq!(store.label_volume(&expected).unwrap().count_nonzero(), 2);
        assert!(dir.path().join("site/s0001/segmentations").is_dir());
    }

    #[test]
    fn test_untouched_case_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (config, context) = context(dir.path());
        let mut store = MemoryStore::new();

        let report = CaseExporter::new(&config, &mut store).export(&context, &mut NoProgress);
        assert!(report.written.is_empty());
        assert_eq!(report.unchanged, 2);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_empty_segmentation_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let (config, mut context) = context(dir.path());
        context.segmentation = Segmentation::new("seg", Geometry::new(DIM, IjkToRas::identity()));
        let mut store = MemoryStore::new();

        let report = CaseExporter::new(&config, &mut store).export(&context, &mut NoProgress);
        assert!(report.written.is_empty());
        assert!(!dir.path().join("site/s0001/segmentations").exists());
    }

    #[test]
    fn test_output_dir_blocked_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let (config, mut context) = context(dir.path());
        start(&mut context, "spleen");
        let blocked = config.mask_dir(&context.case);
        fs::create_dir_all(blocked.parent().unwrap()).unwrap();
        fs::write(&blocked, b"not a folder").unwrap();

        let mut store = MemoryStore::new();
        let report = CaseExporter::new(&config, &mut store).export(&context, &mut NoProgress);

        assert!(report.written.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            ExportWriteError::CreateDir { path, .. } if *path == blocked
        ));
        assert!(store.writes().is_empty());
    }

    struct RejectingStore {
        inner: MemoryStore,
        reject: &'static str,
    }

    impl VolumeStore for RejectingStore {
        fn load_image(&self, path: &Path) -> Result<ImageVolume, VolumeIoError> {
            self.inner.load_image(path)
        }

        fn load_label_volume(&self, path: &Path) -> Result<LabelVolume, VolumeIoError> {
            self.inner.load_label_volume(path)
        }

        fn save_label_volume(
            &mut self,
            volume: &LabelVolume,
            path: &Path,
        ) -> Result<(), VolumeIoError> {
            if volume.name == self.reject {
                return Err(VolumeIoError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            self.inner.save_label_volume(volume, path)
        }
    }

    #[test]
    fn test_write_failure_does_not_stop_export() {
        let dir = tempfile::tempdir().unwrap();
        let (config, mut context) = context(dir.path());
        start(&mut context, "spleen");
        start(&mut context, "liver");
        context
            .segmentation
            .segments()
            .iter()
            .for_each(|s| assert_eq!(s.status(), SegmentStatus::InProgress));

        let mut store = RejectingStore {
            inner: MemoryStore::new(),
            reject: "spleen",
        };
        let report = CaseExporter::new(&config, &mut store).export(&context, &mut NoProgress);

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            ExportWriteError::Write { name, .. } if name == "spleen"
        ));
        assert_eq!(
            report.written,
            vec![dir.path().join("site/s0001/segmentations/liver.nii.gz")]
        );
    }
}
