use {
    std::{collections::HashMap, path::PathBuf, time::Duration},
    vision::{ServerConfig, VisionConfig, config::DEFAULT_PROMPT},
};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn test_vision_defaults() {
    let config = VisionConfig::from_lookup(lookup(&[]));
    assert_eq!(config, VisionConfig::default());
    assert_eq!(config.chunk_duration, Duration::from_secs(1));
    assert_eq!(config.max_buffer_frames, 120);
    assert_eq!(config.prompt, DEFAULT_PROMPT);
    assert_eq!(config.teardown_timeout, Some(Duration::from_secs(10)));
}

#[test]
fn test_vision_overrides() {
    let config = VisionConfig::from_lookup(lookup(&[
        ("VISION_CHUNK_SECONDS", "2.5"),
        ("VISION_MAX_BUFFER_FRAMES", "30"),
        ("VISION_PROMPT", "What is in front of me?"),
        ("VISION_TEARDOWN_TIMEOUT_SECONDS", "0"),
    ]));
    assert_eq!(config.chunk_duration, Duration::from_millis(2500));
    assert_eq!(config.max_buffer_frames, 30);
    assert_eq!(config.prompt, "What is in front of me?");
    assert_eq!(config.teardown_timeout, None);
}

#[test]
fn test_vision_malformed_values_fall_back() {
    let config = VisionConfig::from_lookup(lookup(&[
        ("VISION_CHUNK_SECONDS", "soon"),
        ("VISION_MAX_BUFFER_FRAMES", "-4"),
    ]));
    assert_eq!(config.chunk_duration, Duration::from_secs(1));
    assert_eq!(config.max_buffer_frames, 120);
}

#[test]
fn test_vision_values_are_clamped() {
    let config = VisionConfig::default()
        .with_chunk_seconds(-3.0)
        .with_max_buffer_frames(0)
        .with_teardown_seconds(f64::NAN);
    assert_eq!(config.chunk_duration, Duration::ZERO);
    assert_eq!(config.max_buffer_frames, 1);
    assert_eq!(config.teardown_timeout, None);

    let config = VisionConfig::default().with_chunk_seconds(f64::INFINITY);
    assert_eq!(config.chunk_duration, Duration::MAX);
}

#[test]
fn test_server_defaults_and_overrides() {
    let config = ServerConfig::from_lookup(lookup(&[]));
    assert_eq!(config.addr(), "0.0.0.0:8000");
    assert_eq!(config.log_dir, None);

    let config = ServerConfig::from_lookup(lookup(&[
        ("VISION_HOST", " 127.0.0.1 "),
        ("VISION_PORT", "9100"),
        ("VISION_LOG_DIR", "/var/log/vision"),
    ]));
    assert_eq!(config.addr(), "127.0.0.1:9100");
    assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/vision")));
}

#[test]
fn test_server_bad_port_falls_back() {
    let config = ServerConfig::from_lookup(lookup(&[("VISION_PORT", "70000")]));
    assert_eq!(config.port, 8000);
}
