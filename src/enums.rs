/// Modification status of a segment.
///
/// Segments imported from mask files start as `NotStarted`. Any other status
/// marks the segment as edited, which makes it eligible for export.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Flagged,
}

impl SegmentStatus {
    pub fn is_started(self) -> bool {
        !matches!(self, SegmentStatus::NotStarted)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    #[default]
    Idle,
    Open,
}
