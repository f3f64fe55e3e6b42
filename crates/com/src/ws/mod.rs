pub mod client;
pub mod server;

pub use client::WsClient;
pub use server::{WsConnection, WsServer};

use tokio_websockets::Message;

/// Largest data message accepted from a peer.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024; // 64 MB

/// A data message received from a peer.
///
/// Control frames (ping, pong, close) never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Binary(Vec<u8>),
    Text(String),
}

impl Incoming {
    pub(crate) fn from_message(msg: Message) -> Option<Self> {
        if msg.is_binary() {
            Some(Incoming::Binary(msg.into_payload().to_vec()))
        } else if msg.is_text() {
            msg.as_text().map(|text| Incoming::Text(text.to_owned()))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Incoming::Binary(data) => data.len(),
            Incoming::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
