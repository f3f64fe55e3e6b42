use {
    crate::result::InferenceResult,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

/// Per-frame acknowledgment sent back to the camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    /// 1-based arrival index of the acknowledged frame.
    pub frame: u64,
    /// Byte length of the acknowledged frame.
    pub bytes: usize,
    /// Inference fields merged from a completed chunk, if any.
    #[serde(flatten)]
    pub inference: Map<String, Value>,
}

impl Ack {
    pub fn caption(&self) -> Option<&str> {
        self.inference.get("caption").and_then(Value::as_str)
    }

    pub fn has_inference(&self) -> bool {
        !self.inference.is_empty()
    }
}

/// Builds acks and splices each completed inference result into exactly one.
#[derive(Debug, Default)]
pub struct AckComposer {
    pending: Option<InferenceResult>,
}

impl AckComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a result for the next ack.
    pub fn set_pending(&mut self, result: InferenceResult) {
        if let Some(unsent) = self.pending.replace(result) {
            log::warn!(
                "Replacing undelivered inference result with {} fields",
                unsent.len()
            );
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Build the ack for one frame, consuming any pending result.
    ///
    /// Null fields are skipped, and a result can never overwrite `frame` or
    /// `bytes`.
    pub fn compose(&mut self, frame: u64, bytes: usize) -> Ack {
        let inference = self
            .pending
            .take()
            .map(|result| {
                result
                    .into_iter()
                    .filter(|(key, value)| !value.is_null() && key != "frame" && key != "bytes")
                    .collect()
            })
            .unwrap_or_default();
        Ack {
            frame,
            bytes,
            inference,
        }
    }
}
