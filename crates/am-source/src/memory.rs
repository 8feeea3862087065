use std::collections::VecDeque;

use am_core::error::ConvertError;
use am_core::frame::FrameBuffer;
use am_core::traits::Source;

/// Source de frames déjà décodées, consommées dans l'ordre.
///
/// # Example
/// ```
/// use am_core::frame::FrameBuffer;
/// use am_core::traits::Source;
/// use am_source::memory::MemorySource;
/// let mut source = MemorySource::new(vec![FrameBuffer::new(2, 2), FrameBuffer::new(2, 2)]);
/// assert_eq!(source.native_size(), (2, 2));
/// assert!(source.next_frame().unwrap().is_some());
/// assert!(source.next_frame().unwrap().is_some());
/// assert!(source.next_frame().unwrap().is_none());
/// ```
pub struct MemorySource {
    frames: VecDeque<FrameBuffer>,
    size: (u32, u32),
    interval_ms: Option<u64>,
}

impl MemorySource {
    #[must_use]
    pub fn new(frames: Vec<FrameBuffer>) -> Self {
        let size = frames.first().map_or((0, 0), |f| (f.width, f.height));
        Self {
            frames: frames.into(),
            size,
            interval_ms: None,
        }
    }

    /// Attach a native frame interval.
    #[must_use]
    pub fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }
}

impl Source for MemorySource {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, ConvertError> {
        Ok(self.frames.pop_front())
    }

    fn native_size(&self) -> (u32, u32) {
        self.size
    }

    fn frame_interval_hint(&self) -> Option<u64> {
        self.interval_ms
    }
}
