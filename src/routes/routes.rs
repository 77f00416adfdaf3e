//! Defines routes for the camera gallery service.
//!
//! ## Structure
//! - `GET  /`               — HTML gallery, newest first
//! - `POST /upload`         — raw-body ingest (server variant)
//! - `POST /ingest`         — function-URL event ingest (cloud variant)
//! - `GET  /uploads/{name}` — stream one stored image
//! - `GET  /healthz`        — liveness
//! - `GET  /readyz`         — readiness (storage probe)
//!
//! The camera posts complete frames with no size negotiation, so the default
//! request body limit is disabled.

use crate::{
    handlers::{
        gallery_handlers::{gallery, serve_image},
        health_handlers::{healthz, readyz},
        upload_handlers::{ingest_event, upload_image},
    },
    services::store::DynImageStore,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build and return the router for all gallery routes.
///
/// The router carries shared state (`DynImageStore`) to all handlers, keeping
/// the disk and bucket backends interchangeable.
pub fn routes() -> Router<DynImageStore> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // gallery surface
        .route("/", get(gallery))
        .route("/uploads/{name}", get(serve_image))
        // ingest surface
        .route("/upload", post(upload_image))
        .route("/ingest", post(ingest_event))
        .layer(DefaultBodyLimit::disable())
}
