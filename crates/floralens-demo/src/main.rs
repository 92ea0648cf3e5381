mod cli;
mod routes;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use cli::Cli;
use floralens_core::LabelTable;
use floralens_engine::{EngineConfig, InferenceEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = EngineConfig {
        device: cli.device.clone(),
        ..Default::default()
    };
    if let Some(base_url) = cli.base_url.clone() {
        config.base_url = base_url;
    }
    if let Some(cache_dir) = cli.cache_dir.clone() {
        config.cache_dir = cache_dir;
    }

    let engine = Arc::new(InferenceEngine::new(config, LabelTable::flowers()));

    if cli.preload {
        tracing::info!("preloading model");
        engine.load().await?;
    }

    let addr: SocketAddr = format!("{}:{}", cli.address, cli.port).parse()?;
    let app = build_app(engine);

    println!();
    println!("  Floralens — flower identification");
    println!("  Open http://{} in your browser", addr);
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the Axum application
fn build_app(engine: routes::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::index))
        .route("/api/health", get(routes::health))
        .route("/api/predict", post(routes::predict))
        .layer(cors)
        .with_state(engine)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "floralens=debug,floralens_engine=debug,tower_http=debug"
    } else {
        "floralens=info,floralens_engine=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
