use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use axum::Router;
use camera_gallery::{
    config::{AppConfig, BackendKind},
    routes,
    services::{bucket_store::BucketStore, disk_store::DiskStore, store::DynImageStore},
};
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting camera-gallery with config: {:?}", cfg);

    // --- Initialize storage backend ---
    let store = build_store(&cfg).await?;

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(store);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Construct the configured storage backend behind the shared trait handle.
async fn build_store(cfg: &AppConfig) -> Result<DynImageStore> {
    match cfg.backend {
        BackendKind::Disk => {
            if !Path::new(&cfg.storage_dir).exists() {
                fs::create_dir_all(&cfg.storage_dir)?;
                tracing::info!("Created storage directory at {}", cfg.storage_dir);
            }
            Ok(Arc::new(DiskStore::new(cfg.storage_dir.clone())))
        }
        BackendKind::Bucket => {
            let bucket = cfg
                .bucket
                .clone()
                .context("bucket backend requires a bucket name")?;
            let aws_cfg = aws_config::load_defaults(BehaviorVersion::latest()).await;
            let client = aws_sdk_s3::Client::new(&aws_cfg);
            tracing::info!("Using bucket backend {}", bucket);
            Ok(Arc::new(BucketStore::new(client, bucket)))
        }
    }
}
