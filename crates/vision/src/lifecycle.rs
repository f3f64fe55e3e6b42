use {
    crate::{
        session::{ConnectInfo, InferenceSession, SessionFactory},
        slot::InferenceSlot,
    },
    std::{fmt, sync::Arc, time::Duration},
};

/// Where a connection is in its life.
///
/// `Streaming` is the only state in which frames are accepted. Both closing
/// states run the same teardown before reaching `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Streaming,
    ClosingClean,
    ClosingOnError,
    Closed,
}

/// Why streaming stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed the connection.
    PeerClosed,
    /// The server is shutting down.
    Shutdown,
    /// Receiving or acknowledging failed.
    Error(String),
}

/// Connection totals, produced once at teardown.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub frames: u64,
    pub chunks: u64,
    pub inference_failures: u64,
    pub dropped_frames: u64,
    pub elapsed: Duration,
}

impl Summary {
    /// Average frames per second over the connection's lifetime.
    pub fn fps(&self) -> f64 {
        fps(self.frames, self.elapsed)
    }
}

pub(crate) fn fps(frames: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { frames as f64 / secs } else { 0.0 }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames={} chunks={} inference_failures={} dropped_frames={} fps={:.1}",
            self.frames,
            self.chunks,
            self.inference_failures,
            self.dropped_frames,
            self.fps()
        )
    }
}

/// Owns the connection's inference session from open to release.
pub struct Lifecycle {
    state: ConnectionState,
    session: Arc<dyn InferenceSession>,
}

impl Lifecycle {
    /// Open the session for a new connection and start streaming.
    ///
    /// The factory degrades to a no-op session on its own, so the connection
    /// is never refused here.
    pub async fn open(factory: &dyn SessionFactory, info: &ConnectInfo) -> Self {
        let mut state = ConnectionState::Connecting;
        let session = factory.open(info).await;
        transition(&mut state, ConnectionState::Streaming);
        log::info!(
            "Vision stream connected (peer={}, inference={})",
            info.peer
                .map(|peer| peer.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            session.kind()
        );
        Self { state, session }
    }

    /// Stream against an already opened session.
    pub fn with_session(session: Arc<dyn InferenceSession>) -> Self {
        Self {
            state: ConnectionState::Streaming,
            session,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session(&self) -> &Arc<dyn InferenceSession> {
        &self.session
    }

    /// Tear the connection down: settle in-flight inference, then release
    /// the session. Never fails; problems are logged.
    pub async fn close(
        &mut self,
        reason: CloseReason,
        slot: &mut InferenceSlot,
        frame_count: u64,
        teardown_timeout: Option<Duration>,
    ) {
        if self.state != ConnectionState::Streaming {
            return;
        }

        match reason {
            CloseReason::PeerClosed => {
                log::info!("Vision stream disconnected after {} frames", frame_count);
                transition(&mut self.state, ConnectionState::ClosingClean);
            }
            CloseReason::Shutdown => {
                log::info!("Vision stream stopped by server shutdown after {} frames", frame_count);
                transition(&mut self.state, ConnectionState::ClosingClean);
            }
            CloseReason::Error(message) => {
                log::warn!(
                    "Vision stream closed on error after {} frames: {}",
                    frame_count,
                    message
                );
                transition(&mut self.state, ConnectionState::ClosingOnError);
            }
        }

        if let Some(result) = slot.await_or_cancel(frame_count, teardown_timeout).await {
            log::debug!(
                "Discarding inference result with {} fields drained at teardown",
                result.len()
            );
        }

        if let Err(error) = self.session.close().await {
            log::warn!("Failed to close {} inference session: {}", self.session.kind(), error);
        }

        transition(&mut self.state, ConnectionState::Closed);
    }
}

fn transition(state: &mut ConnectionState, next: ConnectionState) {
    log::debug!("Connection state {:?} -> {:?}", state, next);
    *state = next;
}
