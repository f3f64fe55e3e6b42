#![allow(dead_code)]

use {
    async_trait::async_trait,
    std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    },
    tokio::sync::Semaphore,
    vision::{Chunk, ConnectInfo, InferError, InferenceResult, InferenceSession, SessionFactory},
};

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub frames: Vec<Vec<u8>>,
    pub start_s: f64,
    pub end_s: f64,
    pub prompt: String,
}

/// Scriptable inference session.
#[derive(Default)]
pub struct StubSession {
    result: InferenceResult,
    error: Option<String>,
    close_error: Option<String>,
    delay: Duration,
    blocking_delay: Duration,
    gate: Option<Semaphore>,
    pub runs: Mutex<Vec<RunRecord>>,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub cancelled: AtomicUsize,
    pub closes: AtomicUsize,
}

impl StubSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, result: InferenceResult) -> Self {
        self.result = result;
        self
    }

    pub fn with_caption(self, caption: &str) -> Self {
        self.with_result(InferenceResult::new().with("caption", caption))
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    pub fn with_close_error(mut self, message: &str) -> Self {
        self.close_error = Some(message.to_string());
        self
    }

    /// Sleep asynchronously before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Block the worker thread before answering; cannot be cancelled.
    pub fn with_blocking_delay(mut self, delay: Duration) -> Self {
        self.blocking_delay = delay;
        self
    }

    /// Hold every run until `release` is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self, runs: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(runs);
        }
    }

    pub fn runs(&self) -> Vec<RunRecord> {
        self.runs.lock().unwrap().clone()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

// tracks concurrency and notices runs dropped before finishing
struct RunGuard<'a> {
    session: &'a StubSession,
    finished: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.session.active.fetch_sub(1, Ordering::SeqCst);
        if !self.finished {
            self.session.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl InferenceSession for StubSession {
    fn kind(&self) -> &'static str {
        "stub"
    }

    async fn run(&self, chunk: Chunk, prompt: &str) -> Result<InferenceResult, InferError> {
        self.runs.lock().unwrap().push(RunRecord {
            frames: chunk.frames.clone(),
            start_s: chunk.start_s,
            end_s: chunk.end_s,
            prompt: prompt.to_string(),
        });
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        let mut guard = RunGuard {
            session: self,
            finished: false,
        };

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if !self.blocking_delay.is_zero() {
            std::thread::sleep(self.blocking_delay);
        }
        guard.finished = true;
        drop(guard);

        if let Some(message) = &self.error {
            return Err(InferError::Remote(message.clone()));
        }
        let mut result = self.result.clone();
        if result.get("chunk_start_s").is_none() {
            result.insert("chunk_start_s", chunk.start_s);
        }
        if result.get("chunk_end_s").is_none() {
            result.insert("chunk_end_s", chunk.end_s);
        }
        Ok(result)
    }

    async fn close(&self) -> Result<(), InferError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match &self.close_error {
            Some(message) => Err(InferError::Remote(message.clone())),
            None => Ok(()),
        }
    }
}

/// Hands every connection the same stub session.
pub struct StubFactory {
    pub session: Arc<StubSession>,
    pub opened: AtomicUsize,
}

impl StubFactory {
    pub fn new(session: Arc<StubSession>) -> Self {
        Self {
            session,
            opened: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SessionFactory for StubFactory {
    async fn open(&self, _info: &ConnectInfo) -> Arc<dyn InferenceSession> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.session.clone()
    }
}

/// Give spawned inference tasks time to finish.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
