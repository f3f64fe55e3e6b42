use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

/// Field name carrying an inference failure message.
pub const INFERENCE_ERROR: &str = "inference_error";

/// Opaque field map produced by one chunk's inference.
///
/// Typical fields are `caption`, `latency_ms` and `tokens_generated`; a failed
/// chunk carries `inference_error` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceResult(Map<String, Value>);

impl InferenceResult {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// A result that reports `message` as the chunk's failure.
    pub fn error(message: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(INFERENCE_ERROR.to_string(), Value::String(message.into()));
        Self(map)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn caption(&self) -> Option<&str> {
        self.0.get("caption").and_then(Value::as_str)
    }

    /// Whether `inference_error` is present and non-empty. Null, `false`,
    /// zero and empty values do not count.
    pub fn is_error(&self) -> bool {
        match self.0.get(INFERENCE_ERROR) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(number)) => number.as_f64() != Some(0.0),
            Some(Value::String(message)) => !message.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(fields)) => !fields.is_empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Map<String, Value>> for InferenceResult {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl IntoIterator for InferenceResult {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
