use std::collections::VecDeque;

/// One raw frame payload as received from the camera. Never parsed.
pub type Frame = Vec<u8>;

/// Bounded, arrival-ordered frames waiting for the next chunk.
///
/// At capacity the oldest frame is evicted to make room. Evictions are
/// counted so the connection summary can report them.
#[derive(Debug)]
pub struct FrameBuffer {
    frames: VecDeque<Frame>,
    capacity: usize,
    dropped: u64,
}

impl FrameBuffer {
    /// Create a buffer holding at most `capacity` frames (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append a frame, evicting the oldest one when full.
    ///
    /// Returns `true` if a frame was evicted.
    pub fn append(&mut self, frame: Frame) -> bool {
        let evicted = if self.frames.len() == self.capacity {
            self.frames.pop_front();
            self.dropped += 1;
            true
        } else {
            false
        };
        self.frames.push_back(frame);
        evicted
    }

    /// Take every buffered frame in arrival order, leaving the buffer empty.
    pub fn drain_all(&mut self) -> Vec<Frame> {
        self.frames.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total frames evicted since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
