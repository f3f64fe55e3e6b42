use {
    crate::{
        ack::{Ack, AckComposer},
        buffer::{Frame, FrameBuffer},
        config::VisionConfig,
        lifecycle::{self, CloseReason, ConnectionState, Lifecycle, Summary},
        scheduler::ChunkScheduler,
        session::{ConnectInfo, InferenceSession, SessionFactory},
        slot::InferenceSlot,
    },
    std::{sync::Arc, time::Duration},
    tokio::time::Instant,
};

// log a progress line every this many frames
const PROGRESS_EVERY: u64 = 30;

/// Per-connection overlap coordinator.
///
/// Each frame is processed to completion by `on_frame` without awaiting
/// anything: append, collect a finished inference, maybe cut and launch a
/// chunk, compose the ack. Inference runs on its own task in between.
pub struct Coordinator {
    buffer: FrameBuffer,
    scheduler: ChunkScheduler,
    slot: InferenceSlot,
    composer: AckComposer,
    lifecycle: Lifecycle,
    prompt: Arc<str>,
    teardown_timeout: Option<Duration>,
    frame_count: u64,
    started: Instant,
}

impl Coordinator {
    /// Open an inference session through `factory` and start streaming.
    pub async fn open(config: &VisionConfig, factory: &dyn SessionFactory, info: &ConnectInfo) -> Self {
        let lifecycle = Lifecycle::open(factory, info).await;
        Self::with_lifecycle(config, lifecycle, Instant::now())
    }

    /// Start streaming against an already opened session.
    pub fn new(config: &VisionConfig, session: Arc<dyn InferenceSession>) -> Self {
        Self::starting_at(config, session, Instant::now())
    }

    /// Like `new`, with an explicit connection start time.
    pub fn starting_at(
        config: &VisionConfig,
        session: Arc<dyn InferenceSession>,
        started: Instant,
    ) -> Self {
        Self::with_lifecycle(config, Lifecycle::with_session(session), started)
    }

    fn with_lifecycle(config: &VisionConfig, lifecycle: Lifecycle, started: Instant) -> Self {
        Self {
            buffer: FrameBuffer::new(config.max_buffer_frames),
            scheduler: ChunkScheduler::new(started, config.chunk_duration),
            slot: InferenceSlot::new(),
            composer: AckComposer::new(),
            lifecycle,
            prompt: Arc::from(config.prompt.as_str()),
            teardown_timeout: config.teardown_timeout,
            frame_count: 0,
            started,
        }
    }

    /// Process one received frame and return its ack.
    pub fn on_frame(&mut self, frame: Frame) -> Ack {
        self.on_frame_at(frame, Instant::now())
    }

    /// Process one frame received at `now`.
    pub fn on_frame_at(&mut self, frame: Frame, now: Instant) -> Ack {
        self.frame_count += 1;
        let bytes = frame.len();
        self.buffer.append(frame);

        if let Some(result) = self.slot.poll_and_drain(self.frame_count) {
            self.composer.set_pending(result);
        }

        if let Some(chunk) = self.scheduler.cut(now, self.slot.is_empty(), &mut self.buffer) {
            log::debug!(
                "Launching chunk {} with {} frames [{:.3}s, {:.3}s)",
                chunk.index,
                chunk.len(),
                chunk.start_s,
                chunk.end_s
            );
            let session = Arc::clone(self.lifecycle.session());
            if let Err(occupied) =
                self.slot
                    .launch(session, chunk, Arc::clone(&self.prompt), self.frame_count)
            {
                log::error!("{}", occupied);
            }
        }

        if self.frame_count % PROGRESS_EVERY == 0 {
            log::info!(
                "Vision stream: {} frames, {:.1} fps",
                self.frame_count,
                lifecycle::fps(self.frame_count, now.saturating_duration_since(self.started))
            );
        }

        self.composer.compose(self.frame_count, bytes)
    }

    /// Tear down the connection and return its totals.
    pub async fn close(mut self, reason: CloseReason) -> Summary {
        self.lifecycle
            .close(reason, &mut self.slot, self.frame_count, self.teardown_timeout)
            .await;

        let summary = Summary {
            frames: self.frame_count,
            chunks: self.scheduler.chunks(),
            inference_failures: self.slot.failures(),
            dropped_frames: self.buffer.dropped(),
            elapsed: self.started.elapsed(),
        };
        log::info!("Vision stream summary: {}", summary);
        summary
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle.state()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn chunk_count(&self) -> u64 {
        self.scheduler.chunks()
    }

    pub fn inference_failures(&self) -> u64 {
        self.slot.failures()
    }

    pub fn inference_in_flight(&self) -> bool {
        !self.slot.is_empty()
    }

    pub fn buffered_frames(&self) -> usize {
        self.buffer.len()
    }

    pub fn dropped_frames(&self) -> u64 {
        self.buffer.dropped()
    }

    pub fn session_kind(&self) -> &'static str {
        self.lifecycle.session().kind()
    }
}
