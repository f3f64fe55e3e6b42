use {
    crate::buffer::{Frame, FrameBuffer},
    std::time::Duration,
    tokio::time::Instant,
};

/// A batch of frames cut from the buffer, with its window in seconds
/// relative to connection start.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 1-based index of this chunk within the connection.
    pub index: u64,
    pub frames: Vec<Frame>,
    pub start_s: f64,
    pub end_s: f64,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Decides, frame by frame, when the accumulated window becomes a chunk.
///
/// A cut happens only when the inference slot is free, the buffer holds at
/// least one frame and the window has lasted at least `chunk_duration`.
/// Chunks are never queued: while inference is busy, frames keep
/// accumulating in the buffer until the slot frees up.
#[derive(Debug)]
pub struct ChunkScheduler {
    connection_start: Instant,
    window_start: Instant,
    chunk_duration: Duration,
    chunks: u64,
}

impl ChunkScheduler {
    pub fn new(connection_start: Instant, chunk_duration: Duration) -> Self {
        Self {
            connection_start,
            window_start: connection_start,
            chunk_duration,
            chunks: 0,
        }
    }

    /// Whether a chunk should be cut at `now`.
    pub fn is_due(&self, now: Instant, slot_empty: bool, buffered: usize) -> bool {
        slot_empty
            && buffered > 0
            && now.saturating_duration_since(self.window_start) >= self.chunk_duration
    }

    /// Cut the buffer into a chunk if one is due, and start the next window.
    pub fn cut(&mut self, now: Instant, slot_empty: bool, buffer: &mut FrameBuffer) -> Option<Chunk> {
        if !self.is_due(now, slot_empty, buffer.len()) {
            return None;
        }

        let start_s = self
            .window_start
            .saturating_duration_since(self.connection_start)
            .as_secs_f64();
        let end_s = now
            .saturating_duration_since(self.connection_start)
            .as_secs_f64()
            .max(start_s);

        self.window_start = now;
        self.chunks += 1;

        Some(Chunk {
            index: self.chunks,
            frames: buffer.drain_all(),
            start_s,
            end_s,
        })
    }

    /// Number of chunks cut so far.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }
}
