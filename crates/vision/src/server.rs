use {
    crate::{
        config::VisionConfig,
        coordinator::Coordinator,
        lifecycle::CloseReason,
        session::{ConnectInfo, SessionFactory},
    },
    com::{ComError, Incoming, WsConnection, WsServer},
    std::{net::SocketAddr, sync::Arc, time::Duration},
    tokio::{net::ToSocketAddrs, sync::watch},
};

/// The only path served.
pub const STREAM_PATH: &str = "/vision/stream";

// how often shutdown checks for connections still tearing down
const DRAIN_POLL: Duration = Duration::from_millis(10);

/// WebSocket server running one independent coordinator per connection.
pub struct VisionServer {
    server: WsServer,
    stop: watch::Sender<bool>,
}

impl VisionServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        config: VisionConfig,
        factory: Arc<dyn SessionFactory>,
    ) -> Result<Self, ComError> {
        let config = Arc::new(config);
        let (stop_tx, stop) = watch::channel(false);
        let server = WsServer::bind(addr, move |connection| {
            let config = Arc::clone(&config);
            let factory = Arc::clone(&factory);
            let stop = stop.clone();
            async move { handle_connection(connection, &config, factory.as_ref(), stop).await }
        })
        .await?;
        Ok(Self { server, stop: stop_tx })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Number of connections currently streaming or tearing down.
    pub fn client_count(&self) -> usize {
        self.server.client_count()
    }

    /// Ask every connection to stop streaming and run its teardown, then wait
    /// for all of them to finish.
    ///
    /// Returns `false` if connections were still open when `limit` ran out.
    pub async fn shutdown(&self, limit: Option<Duration>) -> bool {
        self.stop.send_replace(true);
        let drained = async {
            while self.client_count() > 0 {
                tokio::time::sleep(DRAIN_POLL).await;
            }
        };
        match limit {
            Some(limit) => tokio::time::timeout(limit, drained).await.is_ok(),
            None => {
                drained.await;
                true
            }
        }
    }
}

// resolves once shutdown is requested; never if the server is gone
async fn shutdown_requested(stop: &mut watch::Receiver<bool>) {
    loop {
        let stopping = *stop.borrow_and_update();
        if stopping {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn handle_connection(
    mut connection: WsConnection,
    config: &VisionConfig,
    factory: &dyn SessionFactory,
    mut stop: watch::Receiver<bool>,
) {
    if connection.path() != STREAM_PATH {
        log::warn!(
            "Rejecting connection from {} to unknown path {}",
            connection.peer(),
            connection.path()
        );
        if let Err(error) = connection.close().await {
            log::debug!("Failed to close rejected connection from {}: {}", connection.peer(), error);
        }
        return;
    }

    let info = ConnectInfo::new(
        Some(connection.peer()),
        connection.headers().clone(),
        connection.query(),
    );
    let mut coordinator = Coordinator::open(config, factory, &info).await;

    let reason = loop {
        let incoming = tokio::select! {
            incoming = connection.recv() => incoming,
            _ = shutdown_requested(&mut stop) => break CloseReason::Shutdown,
        };
        let frame = match incoming {
            Ok(Some(Incoming::Binary(frame))) => frame,
            Ok(Some(Incoming::Text(text))) => {
                log::debug!("Ignoring {} byte text message from {}", text.len(), connection.peer());
                continue;
            }
            Ok(None) => break CloseReason::PeerClosed,
            Err(error) => break CloseReason::Error(error.to_string()),
        };

        let ack = coordinator.on_frame(frame);
        let text = match serde_json::to_string(&ack) {
            Ok(text) => text,
            Err(error) => break CloseReason::Error(format!("failed to encode ack: {error}")),
        };
        if let Err(error) = connection.send_text(text).await {
            break CloseReason::Error(error.to_string());
        }
    };

    let server_closing = reason == CloseReason::Shutdown;
    coordinator.close(reason).await;

    if server_closing {
        if let Err(error) = connection.close().await {
            log::debug!("Failed to close connection from {}: {}", connection.peer(), error);
        }
    }
}
