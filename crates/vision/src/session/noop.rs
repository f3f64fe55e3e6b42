use {
    super::{ConnectInfo, InferenceSession, SessionFactory},
    crate::{error::InferError, result::InferenceResult, scheduler::Chunk},
    async_trait::async_trait,
    std::sync::Arc,
};

/// Stand-in session used when no inference backend is available.
/// Every chunk succeeds with an empty result.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSession;

#[async_trait]
impl InferenceSession for NoopSession {
    fn kind(&self) -> &'static str {
        "noop"
    }

    async fn run(&self, _chunk: Chunk, _prompt: &str) -> Result<InferenceResult, InferError> {
        Ok(InferenceResult::new())
    }

    async fn close(&self) -> Result<(), InferError> {
        Ok(())
    }
}

/// Factory that always hands out a `NoopSession`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSessionFactory;

#[async_trait]
impl SessionFactory for NoopSessionFactory {
    async fn open(&self, _info: &ConnectInfo) -> Arc<dyn InferenceSession> {
        Arc::new(NoopSession)
    }
}
