//! Shared process plumbing for the vision workspace.

pub mod logging;

pub use logging::{
    FileLogger, StdoutLogger, UtcStamp, init_file_logger, init_stdout_logger, max_level,
};
