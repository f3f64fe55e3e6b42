use {
    std::time::Duration,
    tokio::time::Instant,
    vision::{AckComposer, ChunkScheduler, FrameBuffer, InferenceResult},
};

#[test]
fn test_buffer_evicts_oldest_at_capacity() {
    let mut buffer = FrameBuffer::new(3);
    for i in 0..3u8 {
        assert!(!buffer.append(vec![i]));
    }
    assert!(buffer.append(vec![3]));
    assert!(buffer.append(vec![4]));

    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.dropped(), 2);
    assert_eq!(buffer.drain_all(), vec![vec![2], vec![3], vec![4]]);
    assert!(buffer.is_empty());
}

#[test]
fn test_buffer_drain_preserves_arrival_order() {
    let mut buffer = FrameBuffer::new(10);
    buffer.append(b"a".to_vec());
    buffer.append(Vec::new());
    buffer.append(b"c".to_vec());
    assert_eq!(buffer.drain_all(), vec![b"a".to_vec(), Vec::new(), b"c".to_vec()]);
    assert_eq!(buffer.drain_all(), Vec::<Vec<u8>>::new());
}

#[test]
fn test_buffer_stays_bounded_under_flood() {
    let mut buffer = FrameBuffer::new(120);
    for i in 0..10_000u32 {
        buffer.append(i.to_le_bytes().to_vec());
    }
    assert_eq!(buffer.len(), 120);
    assert_eq!(buffer.dropped(), 10_000 - 120);
}

#[test]
fn test_scheduler_requires_free_slot_and_frames() {
    let start = Instant::now();
    let scheduler = ChunkScheduler::new(start, Duration::ZERO);

    assert!(scheduler.is_due(start, true, 1));
    assert!(!scheduler.is_due(start, false, 1));
    assert!(!scheduler.is_due(start, true, 0));
}

#[test]
fn test_scheduler_waits_for_duration() {
    let start = Instant::now();
    let mut scheduler = ChunkScheduler::new(start, Duration::from_secs(2));
    let mut buffer = FrameBuffer::new(10);
    buffer.append(vec![1]);

    assert!(scheduler.cut(start + Duration::from_millis(1999), true, &mut buffer).is_none());
    assert_eq!(buffer.len(), 1);

    let chunk = scheduler
        .cut(start + Duration::from_secs(2), true, &mut buffer)
        .expect("chunk due");
    assert_eq!(chunk.index, 1);
    assert_eq!(chunk.frames, vec![vec![1]]);
    assert_eq!(chunk.start_s, 0.0);
    assert_eq!(chunk.end_s, 2.0);
    assert!(buffer.is_empty());
    assert_eq!(scheduler.chunks(), 1);
}

#[test]
fn test_scheduler_windows_are_contiguous() {
    let start = Instant::now();
    let mut scheduler = ChunkScheduler::new(start, Duration::from_secs(1));
    let mut buffer = FrameBuffer::new(10);

    buffer.append(vec![1]);
    let first = scheduler
        .cut(start + Duration::from_millis(1500), true, &mut buffer)
        .expect("first chunk");

    buffer.append(vec![2]);
    // a busy slot holds the window open past its duration
    assert!(scheduler.cut(start + Duration::from_secs(3), false, &mut buffer).is_none());
    buffer.append(vec![3]);
    let second = scheduler
        .cut(start + Duration::from_millis(3500), true, &mut buffer)
        .expect("second chunk");

    assert_eq!(first.end_s, second.start_s);
    assert_eq!(second.index, 2);
    assert_eq!(second.frames, vec![vec![2], vec![3]]);
    assert_eq!(second.end_s, 3.5);
}

#[test]
fn test_scheduler_never_reports_end_before_start() {
    let start = Instant::now();
    let mut scheduler = ChunkScheduler::new(start, Duration::ZERO);
    let mut buffer = FrameBuffer::new(4);

    buffer.append(vec![1]);
    scheduler.cut(start + Duration::from_secs(5), true, &mut buffer);

    // clock reading older than the window start
    buffer.append(vec![2]);
    let chunk = scheduler
        .cut(start + Duration::from_secs(4), true, &mut buffer)
        .expect("zero duration is always due");
    assert_eq!(chunk.start_s, 5.0);
    assert_eq!(chunk.end_s, 5.0);
}

#[test]
fn test_composer_delivers_pending_once() {
    let mut composer = AckComposer::new();
    assert!(!composer.compose(1, 10).has_inference());

    composer.set_pending(
        InferenceResult::new()
            .with("caption", "crossing the street")
            .with("latency_ms", 812)
            .with("tokens_generated", serde_json::Value::Null),
    );
    assert!(composer.has_pending());

    let ack = composer.compose(2, 20);
    assert_eq!(ack.caption(), Some("crossing the street"));
    assert_eq!(ack.inference["latency_ms"], 812);
    assert!(!ack.inference.contains_key("tokens_generated"));
    assert!(!composer.has_pending());

    assert!(!composer.compose(3, 30).has_inference());
}

#[test]
fn test_ack_json_shape() {
    let mut composer = AckComposer::new();
    let plain = serde_json::to_value(composer.compose(1, 3)).unwrap();
    assert_eq!(plain, serde_json::json!({ "frame": 1, "bytes": 3 }));

    composer.set_pending(InferenceResult::error("remote inference failed: quota"));
    let failed = serde_json::to_value(composer.compose(2, 0)).unwrap();
    assert_eq!(
        failed,
        serde_json::json!({
            "frame": 2,
            "bytes": 0,
            "inference_error": "remote inference failed: quota",
        })
    );
}
