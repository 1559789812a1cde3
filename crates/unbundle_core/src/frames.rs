use std::path::PathBuf;

/// One stack frame as reported by the host runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerFrame {
    pub absolute_path: Option<PathBuf>,
}

impl CallerFrame {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { absolute_path: Some(path.into()) }
    }

    /// A frame without a source location (native code, `eval`).
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Read-only view of the call stack of the thread issuing a load.
///
/// `skip` counts frames from the engine's entry point, so `frames(0, n)`
/// starts at the engine itself.
pub trait CallerStack {
    fn frames(&self, skip: usize, window: usize) -> Vec<CallerFrame>;
}

/// A stack captured up front, innermost frame first.
#[derive(Debug, Clone, Default)]
pub struct RecordedStack {
    frames: Vec<CallerFrame>,
}

impl RecordedStack {
    pub fn new(frames: Vec<CallerFrame>) -> Self {
        Self { frames }
    }

    /// Builds a stack from the frames above the engine's own internals,
    /// innermost first. The internal frames are padded with unknown locations.
    pub fn above_engine(frames: Vec<CallerFrame>) -> Self {
        let mut all = vec![CallerFrame::unknown(); crate::engine::CALLER_SKIP];
        all.extend(frames);
        Self { frames: all }
    }
}

impl CallerStack for RecordedStack {
    fn frames(&self, skip: usize, window: usize) -> Vec<CallerFrame> {
        self.frames.iter().skip(skip).take(window).cloned().collect()
    }
}
