use {
    super::{Incoming, MAX_MESSAGE_SIZE},
    crate::ComError,
    futures_util::{SinkExt, StreamExt},
    http::HeaderMap,
    std::{
        future::Future,
        net::SocketAddr,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    },
    tokio::{
        net::{TcpListener, TcpStream, ToSocketAddrs},
        task::JoinHandle,
    },
    tokio_websockets::{Message, ServerBuilder, WebSocketStream},
};

/// One accepted WebSocket connection, together with its handshake request.
pub struct WsConnection {
    stream: WebSocketStream<TcpStream>,
    peer: SocketAddr,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
}

impl WsConnection {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Request path of the handshake, e.g. `/vision/stream`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string of the handshake, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Receive the next data message.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection. Control
    /// frames are skipped. Oversized messages are an error.
    pub async fn recv(&mut self) -> Result<Option<Incoming>, ComError> {
        loop {
            match self.stream.next().await {
                Some(Ok(msg)) => {
                    let Some(incoming) = Incoming::from_message(msg) else {
                        continue;
                    };
                    if incoming.len() > MAX_MESSAGE_SIZE {
                        return Err(ComError::MessageTooLarge(incoming.len()));
                    }
                    return Ok(Some(incoming));
                }
                Some(Err(e)) => return Err(ComError::from(e)),
                None => return Ok(None),
            }
        }
    }

    pub async fn send_text(&mut self, text: String) -> Result<(), ComError> {
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    pub async fn send_binary(&mut self, payload: Vec<u8>) -> Result<(), ComError> {
        self.stream.send(Message::binary(payload)).await?;
        Ok(())
    }

    /// Start the closing handshake and flush it.
    pub async fn close(&mut self) -> Result<(), ComError> {
        self.stream.close().await?;
        Ok(())
    }
}

// decrements the open connection count when the handler finishes or panics
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct WsServer {
    connections: Arc<AtomicUsize>,
    _accept_task: JoinHandle<()>,
    local_addr: SocketAddr,
}

impl WsServer {
    /// Bind a TCP listener and start accepting WebSocket connections.
    ///
    /// Every accepted TCP stream gets its own task that performs the WebSocket
    /// handshake and then runs `handler` to completion on the connection.
    /// Connections are independent; nothing is shared between handlers except
    /// what `handler` itself captures.
    pub async fn bind<F, Fut>(addr: impl ToSocketAddrs, handler: F) -> Result<Self, ComError>
    where
        F: Fn(WsConnection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let connections = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(handler);

        let accept_task = tokio::spawn({
            let connections = Arc::clone(&connections);
            async move {
                loop {
                    let (tcp_stream, peer) = match listener.accept().await {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            log::warn!("Accept error: {}", e);
                            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                            continue;
                        }
                    };

                    let handler = Arc::clone(&handler);
                    let connections = Arc::clone(&connections);
                    tokio::spawn(async move {
                        let (request, stream) = match ServerBuilder::new().accept(tcp_stream).await {
                            Ok(accepted) => accepted,
                            Err(e) => {
                                log::warn!("WebSocket handshake failed for {}: {}", peer, e);
                                return;
                            }
                        };

                        connections.fetch_add(1, Ordering::SeqCst);
                        let _guard = ConnectionGuard(connections);

                        let (parts, _) = request.into_parts();
                        let connection = WsConnection {
                            stream,
                            peer,
                            path: parts.uri.path().to_string(),
                            query: parts.uri.query().map(str::to_string),
                            headers: parts.headers,
                        };
                        handler(connection).await;
                    });
                }
            }
        });

        Ok(Self {
            connections,
            _accept_task: accept_task,
            local_addr,
        })
    }

    /// Return the number of connections whose handler is still running.
    pub fn client_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Return the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for WsServer {
    fn drop(&mut self) {
        self._accept_task.abort();
    }
}
