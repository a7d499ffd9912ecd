//! Shared fixtures for the integration tests
//!
//! Builds a temporary TotalSegmentator-style tree on disk and registers the
//! matching volumes in a `MemoryStore`, wrapped so every store call and
//! listener callback lands in one ordered log.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ndarray::Array3;
use volume_case_iterator::{
    CaseEventListener, IjkToRas, ImageVolume, IteratorConfig, LabelVolume, MemoryStore,
    Segmentation, VolumeIoError, VolumeStore,
};

pub const DIM: (usize, usize, usize) = (3, 4, 4);

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn transform() -> IjkToRas {
    IjkToRas::from_spacing_origin((1.5, 1.5, 3.0), (-120.0, -120.0, 0.0))
}

/// `MemoryStore` that logs every call
pub struct LoggingStore {
    pub inner: MemoryStore,
    pub log: Log,
}

impl VolumeStore for LoggingStore {
    fn load_image(&self, path: &Path) -> Result<ImageVolume, VolumeIoError> {
        self.log
            .borrow_mut()
            .push(format!("load_image {}", path.display()));
        self.inner.load_image(path)
    }

    fn load_label_volume(&self, path: &Path) -> Result<LabelVolume, VolumeIoError> {
        self.log
            .borrow_mut()
            .push(format!("load_mask {}", path.display()));
        self.inner.load_label_volume(path)
    }

    fn save_label_volume(&mut self, volume: &LabelVolume, path: &Path) -> Result<(), VolumeIoError> {
        self.log.borrow_mut().push(format!("save {}", path.display()));
        self.inner.save_label_volume(volume, path)
    }
}

pub struct RecordingListener {
    pub log: Log,
    pub fail: bool,
}

impl CaseEventListener for RecordingListener {
    fn case_loaded(
        &mut self,
        image: &ImageVolume,
        segmentation: &Segmentation,
    ) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!(
            "loaded {} with {} segments",
            image.name,
            segmentation.len()
        ));
        if self.fail {
            anyhow::bail!("viewer not ready");
        }
        Ok(())
    }

    fn case_about_to_close(&mut self) -> anyhow::Result<()> {
        self.log.borrow_mut().push("about_to_close".to_string());
        if self.fail {
            anyhow::bail!("viewer not ready");
        }
        Ok(())
    }
}

pub struct Batch {
    pub dir: tempfile::TempDir,
    pub store: MemoryStore,
    pub log: Log,
}

impl Batch {
    /// Empty data root with a label table
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("labels.csv"),
            "LabelValue,Name,Color_R,Color_G,Color_B,Color_A\n1,spleen,157,108,162,255\n2,liver,221,130,101,255\n",
        )
        .unwrap();
        Self {
            dir,
            store: MemoryStore::new(),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> IteratorConfig {
        IteratorConfig::new(self.root())
    }

    /// Add a case folder with an image and one single-voxel mask per name
    pub fn add_case(&mut self, case: &str, masks: &[&str]) -> PathBuf {
        let config = self.config();
        let case = PathBuf::from(case);
        fs::create_dir_all(config.mask_dir(&case)).unwrap();

        let image_path = config.image_path(&case);
        self.store.insert_image(
            image_path,
            ImageVolume::new("ct.nii.gz", Array3::zeros(DIM), transform()),
        );

        for (i, name) in masks.iter().enumerate() {
            let mut data = Array3::<u8>::zeros(DIM);
            data[[i % DIM.0, 0, 0]] = 1;
            let path = config.mask_path(&case, name);
            fs::write(&path, b"").unwrap();
            self.store
                .insert_label_volume(path, LabelVolume::new(*name, data, transform()));
        }
        case
    }

    /// Case folder whose image file is absent
    pub fn add_case_without_image(&mut self, case: &str) -> PathBuf {
        let case = PathBuf::from(case);
        fs::create_dir_all(self.config().mask_dir(&case)).unwrap();
        case
    }

    pub fn logging_store(&mut self) -> LoggingStore {
        LoggingStore {
            inner: std::mem::take(&mut self.store),
            log: self.log.clone(),
        }
    }

    pub fn listener(&self, fail: bool) -> RecordingListener {
        RecordingListener {
            log: self.log.clone(),
            fail,
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}
