use std::sync::Arc;

use axum::http::Method;
use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing;
use weightlog::config::{Cli, Config, default_config_dir, default_config_path};
use weightlog::handler::{AppState, healthcheck, read_measurements, write_measurement};
use weightlog::store::DynamoStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let config_path = match args.config_path {
        Some(path) => std::path::PathBuf::from(path),
        None => {
            let dir = default_config_dir();
            if let Err(e) = std::fs::create_dir_all(&dir) {
                eprintln!("failed to create config directory {:?}: {}", dir, e);
                std::process::exit(1);
            }
            default_config_path()
        }
    };

    tracing_subscriber::fmt().json().init();
    tracing::info!("weightlog.svc starting");

    let cfg = Config::new(config_path.to_str().unwrap()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });
    let store = Arc::new(DynamoStore::new(&cfg).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup measurement store");
        std::process::exit(1);
    }));

    if cfg.app.create_table {
        if let Err(e) = store.ensure_table().await {
            tracing::error!(error = %e, table = cfg.app.get_table(), "failed to create table");
            std::process::exit(1);
        }
        tracing::info!(table = cfg.app.get_table(), "measurements table is ready");
    }

    let address = format!("0.0.0.0:{}", cfg.app.get_port().to_string());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(healthcheck))
        .route("/:name", get(read_measurements))
        .route("/:name", post(write_measurement))
        .layer(cors)
        .with_state(AppState { store });

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("weightlog.svc running on {}", &address);
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                tracing::error!(error = %err, "server exited with error");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
        }
    }

    tracing::info!("weightlog.svc going off");
}
