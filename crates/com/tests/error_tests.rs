use {com::ComError, std::io};

#[test]
fn test_from_io_error() {
    let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe broken");
    let com_err: ComError = io_err.into();
    match com_err {
        ComError::Io(_) => {} // Expected
        _ => panic!("Expected ComError::Io variant"),
    }
}

#[test]
fn test_from_invalid_uri() {
    let uri_err = "ws://bad uri".parse::<http::Uri>().unwrap_err();
    let com_err: ComError = uri_err.into();
    match com_err {
        ComError::InvalidUri(_) => {} // Expected
        _ => panic!("Expected ComError::InvalidUri variant"),
    }
}

#[test]
fn test_display_io() {
    let err = ComError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
    assert!(format!("{}", err).contains("io error"));
}

#[test]
fn test_display_connection_closed() {
    let err = ComError::ConnectionClosed;
    assert!(format!("{}", err).contains("connection closed"));
}

#[test]
fn test_display_message_too_large() {
    let err = ComError::MessageTooLarge(100_000_000);
    let display = format!("{}", err);
    assert!(display.contains("message too large"));
    assert!(display.contains("100000000"));
}
