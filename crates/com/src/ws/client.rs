use {
    super::{Incoming, MAX_MESSAGE_SIZE},
    crate::ComError,
    futures_util::{SinkExt, StreamExt},
    std::net::SocketAddr,
    tokio_websockets::{ClientBuilder, MaybeTlsStream, Message, WebSocketStream},
};

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl WsClient {
    /// Connect to a WebSocket endpoint such as `ws://host:port/path?query`.
    pub async fn connect(uri: &str) -> Result<Self, ComError> {
        let parsed_uri: http::Uri = uri.parse()?;
        let (stream, _response) = ClientBuilder::from_uri(parsed_uri).connect().await?;
        Ok(Self { stream })
    }

    /// Connect to a server at `addr`, requesting `path_and_query`.
    pub async fn connect_addr(addr: SocketAddr, path_and_query: &str) -> Result<Self, ComError> {
        Self::connect(&format!("ws://{}{}", addr, path_and_query)).await
    }

    pub async fn send_binary(&mut self, payload: Vec<u8>) -> Result<(), ComError> {
        self.stream.send(Message::binary(payload)).await?;
        Ok(())
    }

    pub async fn send_text(&mut self, text: String) -> Result<(), ComError> {
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    /// Receive the next data message from the server.
    ///
    /// Returns `ComError::ConnectionClosed` if the server closes the connection.
    /// Control frames are skipped.
    pub async fn recv(&mut self) -> Result<Incoming, ComError> {
        loop {
            match self.stream.next().await {
                Some(Ok(msg)) => {
                    if let Some(incoming) = Incoming::from_message(msg) {
                        if incoming.len() > MAX_MESSAGE_SIZE {
                            return Err(ComError::MessageTooLarge(incoming.len()));
                        }
                        return Ok(incoming);
                    }
                }
                Some(Err(e)) => return Err(ComError::from(e)),
                None => return Err(ComError::ConnectionClosed),
            }
        }
    }

    /// Receive the next text message, skipping binary ones.
    pub async fn recv_text(&mut self) -> Result<String, ComError> {
        loop {
            if let Incoming::Text(text) = self.recv().await? {
                return Ok(text);
            }
        }
    }

    /// Start the closing handshake and flush it.
    pub async fn close(&mut self) -> Result<(), ComError> {
        self.stream.close().await?;
        Ok(())
    }
}
