use {
    super::{ConnectInfo, InferenceSession, NoopSession, SessionFactory},
    crate::{error::InferError, result::InferenceResult, scheduler::Chunk},
    async_trait::async_trait,
    com::WsClient,
    serde_json::{Value, json},
    std::{collections::HashMap, sync::Arc, time::Instant},
    tokio::sync::Mutex,
    url::Url,
};

pub const DEFAULT_APP_NAME: &str = "foresight-gemma3-vlm";
pub const DEFAULT_CLASS_NAME: &str = "Gemma3VLMSession";

// field suffixes, see RemoteConfig::resolve
const TOKEN: &str = "token";
const ENDPOINT: &str = "endpoint";
const APP: &str = "app";
const CLASS: &str = "class";

/// Where and as whom to reach the remote inference service.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub token: Option<String>,
    pub endpoint: Option<String>,
    pub app_name: String,
    pub class_name: String,
}

impl RemoteConfig {
    /// Resolve credentials for one connection.
    ///
    /// Per field, the first non-empty source wins: handshake header, handshake
    /// query parameter, `INFERENCE_*` env, `FORESIGHT_INFERENCE_*` env.
    pub fn resolve(info: &ConnectInfo, env: &HashMap<String, String>) -> Self {
        let lookup = |suffix: &str| -> Option<String> {
            let upper = suffix.to_ascii_uppercase();
            info.header(&format!("x-inference-{suffix}"))
                .or_else(|| info.query_param(&format!("inference-{suffix}")))
                .or_else(|| env_value(env, &format!("INFERENCE_{upper}")))
                .or_else(|| env_value(env, &format!("FORESIGHT_INFERENCE_{upper}")))
        };
        Self {
            token: lookup(TOKEN),
            endpoint: lookup(ENDPOINT),
            app_name: lookup(APP).unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            class_name: lookup(CLASS).unwrap_or_else(|| DEFAULT_CLASS_NAME.to_string()),
        }
    }

    /// WebSocket URL for a new session, credentials in the query string.
    pub fn session_url(&self) -> Result<Url, InferError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| InferError::Config("no endpoint configured".to_string()))?;
        let mut url = Url::parse(endpoint)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(token) = &self.token {
                pairs.append_pair("token", token);
            }
            pairs.append_pair("app", &self.app_name);
            pairs.append_pair("class", &self.class_name);
        }
        Ok(url)
    }
}

fn env_value(env: &HashMap<String, String>, name: &str) -> Option<String> {
    env.get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Stateful session against the remote vision-language model.
///
/// One WebSocket per session. A chunk is sent as a JSON request followed by
/// one binary message per frame; the reply is a single JSON object.
pub struct RemoteSession {
    client: Mutex<WsClient>,
    app_name: String,
    class_name: String,
}

impl RemoteSession {
    pub async fn connect(config: &RemoteConfig) -> Result<Self, InferError> {
        let url = config.session_url()?;
        let client = WsClient::connect(url.as_str()).await?;
        Ok(Self {
            client: Mutex::new(client),
            app_name: config.app_name.clone(),
            class_name: config.class_name.clone(),
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

#[async_trait]
impl InferenceSession for RemoteSession {
    fn kind(&self) -> &'static str {
        "remote"
    }

    async fn run(&self, chunk: Chunk, prompt: &str) -> Result<InferenceResult, InferError> {
        let started = Instant::now();
        let mut client = self.client.lock().await;

        let request = json!({
            "op": "infer_chunk",
            "start_ts_s": chunk.start_s,
            "end_ts_s": chunk.end_s,
            "prompt": prompt,
            "frames": chunk.frames.len(),
        });
        client.send_text(request.to_string()).await?;
        for frame in chunk.frames {
            client.send_binary(frame).await?;
        }

        let reply = client.recv_text().await?;
        let Value::Object(mut map) = serde_json::from_str::<Value>(&reply)? else {
            return Err(InferError::Protocol(
                "remote inference returned a non-object payload".to_string(),
            ));
        };
        if let Some(Value::String(message)) = map.get("error") {
            return Err(InferError::Remote(message.clone()));
        }

        map.entry("latency_ms")
            .or_insert_with(|| json!(started.elapsed().as_millis() as u64));
        Ok(InferenceResult::from(map))
    }

    async fn close(&self) -> Result<(), InferError> {
        let mut client = self.client.lock().await;
        let sent = client.send_text(json!({ "op": "close" }).to_string()).await;
        let closed = client.close().await;
        sent?;
        closed?;
        Ok(())
    }
}

/// Opens `RemoteSession`s, falling back to `NoopSession` when credentials are
/// missing or the service cannot be reached.
#[derive(Debug, Clone, Default)]
pub struct RemoteSessionFactory {
    env: HashMap<String, String>,
}

impl RemoteSessionFactory {
    /// Use an explicit environment snapshot.
    pub fn new(env: HashMap<String, String>) -> Self {
        Self { env }
    }

    /// Snapshot the `INFERENCE_*` and `FORESIGHT_INFERENCE_*` variables of
    /// the current process.
    pub fn from_env() -> Self {
        let env = std::env::vars()
            .filter(|(key, _)| {
                key.starts_with("INFERENCE_") || key.starts_with("FORESIGHT_INFERENCE_")
            })
            .collect();
        Self { env }
    }
}

#[async_trait]
impl SessionFactory for RemoteSessionFactory {
    async fn open(&self, info: &ConnectInfo) -> Arc<dyn InferenceSession> {
        let config = RemoteConfig::resolve(info, &self.env);
        if config.token.is_none() || config.endpoint.is_none() {
            log::info!("Inference credentials not configured; vision inference disabled");
            return Arc::new(NoopSession);
        }

        match RemoteSession::connect(&config).await {
            Ok(session) => {
                log::info!(
                    "Remote inference session opened (app={} class={})",
                    config.app_name,
                    config.class_name
                );
                Arc::new(session)
            }
            Err(error) => {
                log::warn!(
                    "Failed to initialize remote inference session (app={} class={}): {}",
                    config.app_name,
                    config.class_name,
                    error
                );
                Arc::new(NoopSession)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_defaults() {
        let config = RemoteConfig::resolve(&ConnectInfo::default(), &HashMap::new());
        assert_eq!(config.token, None);
        assert_eq!(config.endpoint, None);
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert_eq!(config.class_name, DEFAULT_CLASS_NAME);
    }

    #[test]
    fn test_resolve_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-inference-app", "header-app".parse().unwrap());
        let info = ConnectInfo::new(
            None,
            headers,
            Some("inference-app=query-app&inference-class=query-class"),
        );
        let env = env(&[
            ("INFERENCE_TOKEN", "plain-token"),
            ("FORESIGHT_INFERENCE_TOKEN", "prefixed-token"),
            ("FORESIGHT_INFERENCE_ENDPOINT", "ws://127.0.0.1:9/infer"),
            ("INFERENCE_CLASS", "env-class"),
        ]);

        let config = RemoteConfig::resolve(&info, &env);
        assert_eq!(config.app_name, "header-app");
        assert_eq!(config.class_name, "query-class");
        assert_eq!(config.token.as_deref(), Some("plain-token"));
        assert_eq!(config.endpoint.as_deref(), Some("ws://127.0.0.1:9/infer"));
    }

    #[test]
    fn test_blank_env_values_are_skipped() {
        let env = env(&[("INFERENCE_TOKEN", "  "), ("FORESIGHT_INFERENCE_TOKEN", "t")]);
        let config = RemoteConfig::resolve(&ConnectInfo::default(), &env);
        assert_eq!(config.token.as_deref(), Some("t"));
    }

    #[test]
    fn test_session_url_carries_credentials() {
        let config = RemoteConfig {
            token: Some("a b".to_string()),
            endpoint: Some("ws://127.0.0.1:7000/infer".to_string()),
            app_name: "app".to_string(),
            class_name: "Cls".to_string(),
        };
        let url = config.session_url().expect("url");
        assert_eq!(url.path(), "/infer");
        assert_eq!(url.query(), Some("token=a+b&app=app&class=Cls"));
    }

    #[test]
    fn test_session_url_requires_endpoint() {
        let config = RemoteConfig::resolve(&ConnectInfo::default(), &HashMap::new());
        assert!(matches!(config.session_url(), Err(InferError::Config(_))));
    }
}
