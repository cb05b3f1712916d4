use tracing_subscriber::EnvFilter;

use fieldform_pipeline::config::WorkerConfig;
use fieldform_pipeline::handler::HandlerSet;
use fieldform_pipeline::worker::run_process_worker;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let health_port = std::env::var("HEALTH_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000u16);
    tokio::spawn(serve_health(health_port));

    if let Err(e) = run_process_worker(config, HandlerSet::logging()).await {
        tracing::error!(error = %e, "form processing worker exited with error");
        std::process::exit(1);
    }
}

/// Answer every connection with `200 OK` for liveness probes.
async fn serve_health(port: u16) {
    use tokio::io::AsyncWriteExt;

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, port, "failed to bind health endpoint");
            return;
        }
    };
    tracing::info!(port, "health endpoint listening");

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Length: 2\r\n\r\nOK")
                    .await;
            }
            Err(e) => tracing::warn!(error = %e, "failed to accept health connection"),
        }
    }
}
