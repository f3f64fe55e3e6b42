use {
    std::{sync::Arc, time::Duration},
    vision::{RemoteSessionFactory, ServerConfig, VisionConfig, VisionServer},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_config = ServerConfig::from_env();
    match &server_config.log_dir {
        Some(dir) => base::init_file_logger(dir)?,
        None => base::init_stdout_logger(),
    }

    let config = VisionConfig::from_env();
    log::info!(
        "chunk duration {:?}, buffer capacity {} frames, teardown timeout {:?}",
        config.chunk_duration,
        config.max_buffer_frames,
        config.teardown_timeout
    );

    // connections get their own teardown bound plus this much to finish up
    let shutdown_limit = config
        .teardown_timeout
        .map(|timeout| timeout.saturating_add(Duration::from_secs(5)));

    let factory = Arc::new(RemoteSessionFactory::from_env());
    let server = VisionServer::bind(server_config.addr(), config, factory).await?;
    log::info!(
        "Listening on ws://{}{}",
        server.local_addr(),
        vision::STREAM_PATH
    );

    tokio::signal::ctrl_c().await?;
    log::info!(
        "Shutting down with {} open connections",
        server.client_count()
    );
    if !server.shutdown(shutdown_limit).await {
        log::warn!(
            "{} connections still open after {:?}",
            server.client_count(),
            shutdown_limit
        );
    }
    Ok(())
}
