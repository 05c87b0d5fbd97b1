//! Satellite mirror demo host.
//!
//! Serves a small application whose every response is mirrored to the
//! configured satellite.
//!
//! ```text
//!     Client ──▶ TraceLayer ──▶ TimeoutLayer ──▶ mirror_middleware ──▶ handler
//!                                                   │                     │
//!                                                   │ snapshot            │ res.send / res.end
//!                                                   ▼                     ▼
//!                                            Mirror emitter ──▶ Direct emitter ──▶ Client
//!                                                   │
//!                                                   └──▶ detached POST {satellite}/requests
//! ```

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use satellite_mirror::config::{load_config, AppConfig};
use satellite_mirror::http::{HttpServer, Res};
use satellite_mirror::lifecycle::{trigger_on_ctrl_c, Shutdown};
use satellite_mirror::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "satellite-mirror")]
#[command(about = "Demo application mirrored to a satellite", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `mirror.satellite_host`.
    #[arg(short, long)]
    satellite_host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(host) = cli.satellite_host {
        config.mirror.satellite_host = host;
    }

    logging::init_logging(&config.observability);
    tracing::info!(
        bind_address = %config.listener.bind_address,
        satellite_host = %config.mirror.satellite_host,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, demo_app())?;

    let shutdown = Shutdown::new();
    trigger_on_ctrl_c(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo_app() -> Router {
    let level2 = Router::new().route("/level3", get(text));
    let level1 = Router::new().nest("/level2", level2);

    Router::new()
        .route("/", get(text))
        .route("/json", get(structured))
        .route("/missing", get(not_found))
        .route("/echo", post(echo))
        .nest("/level1", level1)
}

async fn text(mut res: Res) -> Res {
    res.send("Hello from the mirrored app");
    res
}

async fn structured(mut res: Res) -> Res {
    res.json(&json!({ "example": "response" }));
    res
}

async fn not_found(mut res: Res) -> Res {
    res.status(StatusCode::NOT_FOUND).end("Not found!");
    res
}

async fn echo(mut res: Res, Json(body): Json<Value>) -> Res {
    res.json(&body);
    res
}
