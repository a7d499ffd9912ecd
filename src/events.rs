use crate::segmentation::Segmentation;
use crate::volume::ImageVolume;

/// Observer of the case lifecycle, e.g. a viewer that shows the loaded case.
///
/// Errors are logged by the iterator and never change its state.
pub trait CaseEventListener {
    fn case_loaded(
        &mut self,
        image: &ImageVolume,
        segmentation: &Segmentation,
    ) -> anyhow::Result<()>;

    fn case_about_to_close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Receives status text between file operations so a host UI can refresh.
pub trait ProgressReporter {
    fn status(&mut self, message: &str);
}

impl<F: FnMut(&str)> ProgressReporter for F {
    fn status(&mut self, message: &str) {
        self(message)
    }
}

/// Discards all status messages
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn status(&mut self, _message: &str) {}
}
