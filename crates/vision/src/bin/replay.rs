//! Replay a directory of encoded frames to a running vision server.
//!
//! Usage: replay <ws-url> <frame-dir> [--fps N]
//!
//! Every regular file in `frame-dir`, sorted by name, is sent as one binary
//! frame. Each ack is printed as it arrives.

use {
    com::WsClient,
    std::{path::PathBuf, time::Duration},
};

const DEFAULT_FPS: f64 = 10.0;

struct Args {
    url: String,
    dir: PathBuf,
    fps: f64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let usage = "usage: replay <ws-url> <frame-dir> [--fps N]".to_string();
    let url = args.next().ok_or_else(|| usage.clone())?;
    let dir = PathBuf::from(args.next().ok_or_else(|| usage.clone())?);
    let mut fps = DEFAULT_FPS;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fps" => {
                let raw = args.next().ok_or_else(|| usage.clone())?;
                fps = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|fps| fps.is_finite() && *fps > 0.0)
                    .ok_or_else(|| format!("invalid --fps value: {raw}"))?;
            }
            other => return Err(format!("unexpected argument: {other}\n{usage}")),
        }
    }
    Ok(Args { url, dir, fps })
}

async fn frame_paths(dir: &PathBuf) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    base::init_stdout_logger();

    let args = parse_args()?;
    let paths = frame_paths(&args.dir).await?;
    log::info!("replaying {} frames from {:?} at {} fps", paths.len(), args.dir, args.fps);

    let mut client = WsClient::connect(&args.url).await?;
    let period = Duration::try_from_secs_f64(1.0 / args.fps).unwrap_or(Duration::MAX);
    let mut ticker = tokio::time::interval(period);

    for path in &paths {
        ticker.tick().await;
        let frame = tokio::fs::read(path).await?;
        client.send_binary(frame).await?;
        let ack = client.recv_text().await?;
        println!("{}", ack);
    }

    client.close().await?;
    log::info!("replay finished");
    Ok(())
}
