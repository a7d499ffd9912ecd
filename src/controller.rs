//! Batch controller
//!
//! [`CaseIterator`] owns the case list and at most one open case. Opening a
//! case while another is open closes (and exports) the previous one first.

use tracing::{debug, error, info, warn};

use crate::config::IteratorConfig;
use crate::discovery::{CaseSet, resolve_cases};
use crate::enums::BatchState;
use crate::error::{CaseError, ConfigError};
use crate::events::{CaseEventListener, NoProgress, ProgressReporter};
use crate::exporter::{CaseExporter, ExportReport};
use crate::loader::{CaseContext, CaseLoader, LoadReport};
use crate::store::VolumeStore;

pub struct CaseIterator<S: VolumeStore> {
    config: IteratorConfig,
    cases: CaseSet,
    store: S,
    listeners: Vec<Box<dyn CaseEventListener>>,
    progress: Box<dyn ProgressReporter>,
    current: Option<CaseContext>,
    /// Index of the last in-range open attempt, successful or not
    cursor: Option<usize>,
}

impl<S: VolumeStore> CaseIterator<S> {
    /// Resolve the case list once and create an idle iterator.
    ///
    /// # Errors
    ///
    /// Fails if the root is missing or not a directory, if the case pattern
    /// is invalid, or if no case folder matches (the batch is not runnable).
    pub fn new(config: IteratorConfig, store: S) -> Result<Self, ConfigError> {
        if config.root.as_os_str().is_empty() {
            return Err(ConfigError::MissingRoot);
        }
        if !config.root.is_dir() {
            return Err(ConfigError::RootNotDirectory(config.root.clone()));
        }

        let cases = resolve_cases(&config.root, &config.case_pattern)?;
        if cases.is_empty() {
            return Err(ConfigError::NoCases {
                root: config.root.clone(),
                pattern: config.case_pattern.clone(),
            });
        }
        info!("Found {} cases in {:?}", cases.len(), config.root);

        Ok(Self {
            config,
            cases,
            store,
            listeners: Vec::new(),
            progress: Box::new(NoProgress),
            current: None,
            cursor: None,
        })
    }

    pub fn with_progress(mut self, progress: impl ProgressReporter + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Listeners are notified in registration order
    pub fn register_listener(&mut self, listener: impl CaseEventListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn config(&self) -> &IteratorConfig {
        &self.config
    }

    pub fn cases(&self) -> &CaseSet {
        &self.cases
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn state(&self) -> BatchState {
        match self.current {
            Some(_) => BatchState::Open,
            None => BatchState::Idle,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|c| c.index)
    }

    /// The open case, if any
    pub fn current(&self) -> Option<&CaseContext> {
        self.current.as_ref()
    }

    /// The open case for editing its segmentation
    pub fn current_mut(&mut self) -> Option<&mut CaseContext> {
        self.current.as_mut()
    }

    /// Open case `index`, closing the open case first.
    ///
    /// An out-of-range index leaves the iterator untouched. Any other error
    /// leaves it idle with nothing of the failed attempt kept.
    pub fn open_case(&mut self, index: usize) -> Result<LoadReport, CaseError> {
        let Some(case) = self.cases.get(index).map(|c| c.to_path_buf()) else {
            warn!("Case index {} out of range", index);
            return Err(CaseError::IndexOutOfRange {
                index,
                count: self.cases.len(),
            });
        };

        if self.current.is_some() {
            self.close_case();
        }
        self.cursor = Some(index);

        let loader = CaseLoader::new(&self.config, &self.store);
        let (context, report) = match loader.load(index, &case, self.progress.as_mut()) {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("Failed to open case {} ({:?}): {}", index, case, e);
                return Err(e);
            }
        };

        let context = self.current.insert(context);
        for listener in self.listeners.iter_mut() {
            if let Err(e) = listener.case_loaded(&context.image, &context.segmentation) {
                warn!("Case loaded listener failed: {:#}", e);
            }
        }
        Ok(report)
    }

    /// Index of the last case an open was attempted on
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Open the case after the last attempted one, or the first case when
    /// nothing was opened yet. A case that failed to open is stepped over.
    pub fn open_next(&mut self) -> Result<LoadReport, CaseError> {
        let next = self.cursor.map_or(0, |i| i + 1);
        self.open_case(next)
    }

    /// Export edited segments of the open case, release it and notify
    /// listeners. Returns `None` when no case is open.
    pub fn close_case(&mut self) -> Option<ExportReport> {
        let context = self.current.take()?;
        debug!("Closing case {} ({:?})", context.index, context.case);

        let report =
            CaseExporter::new(&self.config, &mut self.store).export(&context, self.progress.as_mut());
        let index = context.index;
        drop(context);

        for listener in self.listeners.iter_mut() {
            if let Err(e) = listener.case_about_to_close() {
                warn!("Case close listener failed: {:#}", e);
            }
        }
        info!("Closed case {}", index);
        Some(report)
    }

    /// Close the open case at the end of a batch
    pub fn finish(mut self) -> Option<ExportReport> {
        self.close_case()
    }
}
