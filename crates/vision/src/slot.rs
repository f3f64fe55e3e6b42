use {
    crate::{
        error::InferError,
        result::InferenceResult,
        scheduler::Chunk,
        session::InferenceSession,
    },
    futures_util::FutureExt,
    std::{fmt, sync::Arc, time::Duration},
    tokio::task::JoinHandle,
};

/// Returned by `InferenceSlot::launch` when a computation is still unresolved.
/// Hands the chunk back to the caller.
#[derive(Debug)]
pub struct SlotOccupied(pub Chunk);

impl fmt::Display for SlotOccupied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inference slot occupied; chunk {} rejected", self.0.index)
    }
}

impl std::error::Error for SlotOccupied {}

struct Inflight {
    handle: JoinHandle<Result<InferenceResult, InferError>>,
    chunk_index: u64,
    launched_at_frame: u64,
}

/// Holds at most one in-flight inference computation.
///
/// The computation runs on its own task; the owner only ever synchronizes with
/// it through the non-blocking `poll_and_drain`, or through `await_or_cancel`
/// at teardown.
#[derive(Default)]
pub struct InferenceSlot {
    inflight: Option<Inflight>,
    failures: u64,
}

impl InferenceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_none()
    }

    /// Total computations that failed or reported `inference_error`.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Start inference on `chunk` without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn launch(
        &mut self,
        session: Arc<dyn InferenceSession>,
        chunk: Chunk,
        prompt: Arc<str>,
        frame_count: u64,
    ) -> Result<(), SlotOccupied> {
        if self.inflight.is_some() {
            return Err(SlotOccupied(chunk));
        }

        let chunk_index = chunk.index;
        let handle = tokio::spawn(async move { session.run(chunk, &prompt).await });
        self.inflight = Some(Inflight {
            handle,
            chunk_index,
            launched_at_frame: frame_count,
        });
        Ok(())
    }

    /// Consume the computation if it has finished; never waits.
    ///
    /// A failed computation becomes a result carrying `inference_error`.
    pub fn poll_and_drain(&mut self, frame_count: u64) -> Option<InferenceResult> {
        if !self
            .inflight
            .as_ref()
            .is_some_and(|inflight| inflight.handle.is_finished())
        {
            return None;
        }

        let mut inflight = self.inflight.take()?;
        match (&mut inflight.handle).now_or_never() {
            Some(joined) => Some(self.settle(&inflight, joined, frame_count)),
            None => {
                // is_finished() raced ahead of the output; try again next frame
                self.inflight = Some(inflight);
                None
            }
        }
    }

    /// Teardown only: drain a finished computation, otherwise cancel it and
    /// wait for the cancellation to settle.
    ///
    /// With `limit`, waiting gives up after that long and the task is left to
    /// wind down on its own.
    pub async fn await_or_cancel(
        &mut self,
        frame_count: u64,
        limit: Option<Duration>,
    ) -> Option<InferenceResult> {
        let mut inflight = self.inflight.take()?;

        if inflight.handle.is_finished() {
            let joined = (&mut inflight.handle).await;
            return Some(self.settle(&inflight, joined, frame_count));
        }

        log::debug!(
            "Cancelling inference for chunk {} (launched at frame {})",
            inflight.chunk_index,
            inflight.launched_at_frame
        );
        inflight.handle.abort();

        let joined = match limit {
            Some(limit) => match tokio::time::timeout(limit, &mut inflight.handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    log::warn!(
                        "Inference for chunk {} did not settle within {:?} of cancellation",
                        inflight.chunk_index,
                        limit
                    );
                    return None;
                }
            },
            None => (&mut inflight.handle).await,
        };

        match joined {
            Err(error) if error.is_cancelled() => None,
            // finished before the abort took effect
            joined => Some(self.settle(&inflight, joined, frame_count)),
        }
    }

    fn settle(
        &mut self,
        inflight: &Inflight,
        joined: Result<Result<InferenceResult, InferError>, tokio::task::JoinError>,
        frame_count: u64,
    ) -> InferenceResult {
        match joined.map_err(InferError::from).and_then(|result| result) {
            Ok(result) if result.is_error() => {
                self.failures += 1;
                log::warn!(
                    "Vision inference reported an error at frame {} (chunk {})",
                    frame_count,
                    inflight.chunk_index
                );
                result
            }
            Ok(result) => {
                log::debug!(
                    "Inference for chunk {} finished at frame {} (launched at frame {})",
                    inflight.chunk_index,
                    frame_count,
                    inflight.launched_at_frame
                );
                result
            }
            Err(error) => {
                self.failures += 1;
                log::warn!(
                    "Vision inference failed at frame {} (chunk {}): {}",
                    frame_count,
                    inflight.chunk_index,
                    error
                );
                InferenceResult::error(error.to_string())
            }
        }
    }
}
