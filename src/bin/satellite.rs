//! Minimal satellite: accepts mirrored notifications and logs them.

use axum::{http::StatusCode, routing::post, Json, Router};
use clap::Parser;
use serde_json::Value;
use tokio::net::TcpListener;

use satellite_mirror::config::ObservabilityConfig;
use satellite_mirror::lifecycle::{trigger_on_ctrl_c, Shutdown};
use satellite_mirror::observability::logging;

#[derive(Parser)]
#[command(name = "satellite")]
#[command(about = "Collection endpoint for mirrored requests", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:4000")]
    bind: String,

    /// Pretty-print each notification to stdout.
    #[arg(short, long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(&ObservabilityConfig::default());

    let pretty = cli.pretty;
    let app = Router::new().route(
        "/requests",
        post(move |Json(notification): Json<Value>| async move {
            tracing::info!(
                method = %notification["req"]["method"],
                path = %notification["req"]["path"],
                "Notification received"
            );
            if pretty {
                match serde_json::to_string_pretty(&notification) {
                    Ok(text) => println!("{text}"),
                    Err(e) => tracing::warn!(error = %e, "Failed to format notification"),
                }
            }
            StatusCode::NO_CONTENT
        }),
    );

    let listener = TcpListener::bind(&cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Satellite listening");

    let shutdown = Shutdown::new();
    trigger_on_ctrl_c(shutdown.clone());
    let mut stop = shutdown.subscribe();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = stop.recv().await;
        })
        .await?;

    Ok(())
}
