//! Overlap coordinator for live wearable-camera video streams.
//!
//! Each connection pushes binary frames and receives one JSON ack per frame.
//! Frames are batched into time-boxed chunks that are narrated by a remote
//! vision-language model while ingestion continues; a finished narration is
//! spliced into the next outgoing ack.

pub mod ack;
pub mod buffer;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod result;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod slot;

pub use ack::{Ack, AckComposer};
pub use buffer::{Frame, FrameBuffer};
pub use config::{ServerConfig, VisionConfig};
pub use coordinator::Coordinator;
pub use error::{ConfigError, InferError};
pub use lifecycle::{CloseReason, ConnectionState, Lifecycle, Summary};
pub use result::{INFERENCE_ERROR, InferenceResult};
pub use scheduler::{Chunk, ChunkScheduler};
pub use server::{STREAM_PATH, VisionServer};
pub use session::{
    ConnectInfo, InferenceSession, NoopSession, NoopSessionFactory, SessionFactory,
    remote::{RemoteConfig, RemoteSession, RemoteSessionFactory},
};
pub use slot::{InferenceSlot, SlotOccupied};
