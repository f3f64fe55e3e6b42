use {
    crate::error::ConfigError,
    std::{path::PathBuf, time::Duration},
};

pub const DEFAULT_CHUNK_SECONDS: f64 = 1.0;
pub const DEFAULT_MAX_BUFFER_FRAMES: usize = 120;
pub const DEFAULT_TEARDOWN_TIMEOUT_SECONDS: f64 = 10.0;
pub const DEFAULT_PROMPT: &str =
    "Provide a concise present-tense narration of the wearer's current actions and surroundings.";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Per-connection coordinator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionConfig {
    /// Minimum window length before a chunk is cut. Zero cuts on every frame
    /// that finds the inference slot free.
    pub chunk_duration: Duration,
    /// Frame buffer capacity, at least 1.
    pub max_buffer_frames: usize,
    /// Narration prompt passed with every chunk.
    pub prompt: String,
    /// Bound on waiting for a cancelled inference at teardown. `None` waits
    /// as long as the session takes to acknowledge.
    pub teardown_timeout: Option<Duration>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            chunk_duration: Duration::from_secs_f64(DEFAULT_CHUNK_SECONDS),
            max_buffer_frames: DEFAULT_MAX_BUFFER_FRAMES,
            prompt: DEFAULT_PROMPT.to_string(),
            teardown_timeout: Some(Duration::from_secs_f64(DEFAULT_TEARDOWN_TIMEOUT_SECONDS)),
        }
    }
}

impl VisionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Malformed values fall back to their
    /// default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let chunk_seconds = parse_or_default(&lookup, "VISION_CHUNK_SECONDS", DEFAULT_CHUNK_SECONDS);
        let max_buffer_frames =
            parse_or_default(&lookup, "VISION_MAX_BUFFER_FRAMES", DEFAULT_MAX_BUFFER_FRAMES);
        let teardown_seconds = parse_or_default(
            &lookup,
            "VISION_TEARDOWN_TIMEOUT_SECONDS",
            DEFAULT_TEARDOWN_TIMEOUT_SECONDS,
        );
        let prompt = lookup("VISION_PROMPT").unwrap_or_else(|| DEFAULT_PROMPT.to_string());

        Self::default()
            .with_chunk_seconds(chunk_seconds)
            .with_max_buffer_frames(max_buffer_frames)
            .with_teardown_seconds(teardown_seconds)
            .with_prompt(prompt)
    }

    /// Set the chunk duration; negative and non-finite values become zero.
    pub fn with_chunk_seconds(mut self, seconds: f64) -> Self {
        self.chunk_duration = seconds_or_zero(seconds);
        self
    }

    pub fn with_max_buffer_frames(mut self, frames: usize) -> Self {
        self.max_buffer_frames = frames.max(1);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Bound the teardown wait; zero or negative disables the bound.
    pub fn with_teardown_seconds(mut self, seconds: f64) -> Self {
        self.teardown_timeout = Some(seconds_or_zero(seconds)).filter(|limit| !limit.is_zero());
        self
    }
}

/// Listener and process-level settings for the server binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("VISION_HOST")
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or_default(&lookup, "VISION_PORT", DEFAULT_PORT);
        let log_dir = lookup("VISION_LOG_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        Self {
            host,
            port,
            log_dir,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn seconds_or_zero(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

/// Parse a variable if present.
pub fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                name: name.to_string(),
                value: raw,
            }),
    }
}

fn parse_or_default<T: std::str::FromStr + std::fmt::Display + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> T {
    match parse_var(lookup, name) {
        Ok(value) => value.unwrap_or(default),
        Err(error) => {
            log::warn!("{}, falling back to {}", error, default);
            default
        }
    }
}
