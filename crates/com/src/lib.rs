pub mod error;
pub mod ws;

pub use error::ComError;
pub use ws::{Incoming, MAX_MESSAGE_SIZE, WsClient, WsConnection, WsServer};
