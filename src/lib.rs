//! # Volume case iterator
//!
//! This crate walks a directory of imaging cases one case at a time. For each
//! case it loads the primary image volume and turns every per-structure mask
//! file into a named, colored segment of a single multi-label segmentation.
//! When the case is closed, only the segments that were edited are written
//! back; masks nobody touched stay on disk as they are.
//!
//! The on-disk layout follows TotalSegmentator output:
//!
//! ```text
//! <root>/labels.csv                                   color table, required
//! <root>/<case>/ct.nii.gz                             image
//! <root>/<case>/segmentations/<structure>.nii.gz      one mask per structure
//! ```
//!
//! Reading and writing volume files is left to the host through the
//! [`VolumeStore`] trait, so any codec can be plugged in. Hosts that render
//! the open case register a [`CaseEventListener`].
//!
//! Some guarantees:
//!  - At most one case is open. Opening another case exports and releases
//!    the open one first.
//!  - A missing image or label table aborts only the case being opened.
//!  - A bad mask file or a failed segment write is reported and skipped.
//!
//! # Examples
//!
//! ## Iterating a batch
//!
//! ```no_run
//! # use volume_case_iterator::{CaseError, CaseIterator, IteratorConfig, MemoryStore};
//! let config = IteratorConfig::new("/data/totalsegmentator")
//!     .with_segment_names("liver*, spleen")
//!     .expect("should have parsed segment names");
//! let mut iterator =
//!     CaseIterator::new(config, MemoryStore::new()).expect("should have found cases");
//!
//! loop {
//!     match iterator.open_next() {
//!         Ok(_) => {
//!             let case = iterator.current_mut().expect("should have an open case");
//!             // hand `case.segmentation` to an editor here
//!             let _ = case;
//!         }
//!         // a case without an image is skipped, the next one is tried
//!         Err(CaseError::MissingInput(path)) => eprintln!("skipping {}", path.display()),
//!         Err(CaseError::IndexOutOfRange { .. }) => break,
//!         Err(e) => panic!("batch stopped: {e}"),
//!     }
//! }
//! iterator.finish();
//! ```

pub mod config;
pub mod controller;
pub mod discovery;
pub mod enums;
pub mod error;
pub mod events;
pub mod exporter;
pub mod geometry;
pub mod labels;
pub mod loader;
pub mod segmentation;
pub mod store;
pub mod volume;

pub use config::IteratorConfig;
pub use controller::CaseIterator;
pub use discovery::{CaseSet, MaskFile, NameFilter, resolve_cases, resolve_mask_files};
pub use enums::{BatchState, SegmentStatus};
pub use error::{
    CaseError, ConfigError, ExportWriteError, LabelTableError, MaskImportError,
    SegmentationError, VolumeIoError,
};
pub use events::{CaseEventListener, NoProgress, ProgressReporter};
pub use exporter::{CaseExporter, ExportReport};
pub use geometry::{Geometry, IjkToRas};
pub use labels::LabelTable;
pub use loader::{CaseContext, CaseLoader, LoadReport};
pub use segmentation::{Rgb, Segment, SegmentId, Segmentation};
pub use store::{MemoryStore, VolumeStore};
pub use volume::{ImageVolume, LabelVolume, Volume};
