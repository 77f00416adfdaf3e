//! HTTP handlers for the two ingest surfaces.
//!
//! - `POST /upload` — server variant: the body is the raw image bytes.
//! - `POST /ingest` — cloud-function variant: a function-URL-style JSON event
//!   whose body may be base64-encoded.
//!
//! Both assign `IMG_<unix-seconds>.jpg` from the current clock and store
//! through the shared `ImageStore`. Uploads landing in the same second share
//! a name; the later write replaces the earlier one.

use crate::{errors::AppError, models::image::StoredImage, services::store::DynImageStore};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};

/// Function-URL event shape carried by `POST /ingest`.
#[derive(Debug, Deserialize)]
pub struct FunctionEvent {
    /// Payload, either plain text or base64 depending on the flag.
    pub body: Option<String>,

    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
}

/// POST `/upload` — store the raw request body under a timestamped name.
///
/// No required headers, no content-type check, no size cap. Replies with a
/// terse plain-text `OK`.
pub async fn upload_image(
    State(store): State<DynImageStore>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let name = StoredImage::name_for_now();
    let image = store.put(&name, body).await?;
    tracing::info!("stored {} ({} bytes)", image.name, image.size_bytes);
    Ok((StatusCode::OK, "OK"))
}

/// POST `/ingest` — cloud-function event variant of the ingest contract.
///
/// Decodes the event body (base64 when flagged) and stores it under the same
/// timestamped naming scheme. Replies with a JSON acknowledgement carrying
/// the assigned name and byte length.
pub async fn ingest_event(
    State(store): State<DynImageStore>,
    Json(event): Json<FunctionEvent>,
) -> Result<Json<Value>, AppError> {
    let payload = decode_event_body(&event)?;
    let name = StoredImage::name_for_now();
    let image = store.put(&name, payload).await?;
    tracing::info!("stored {} ({} bytes) via event", image.name, image.size_bytes);

    Ok(Json(json!({
        "status": "Success",
        "file": image.name,
        "size": image.size_bytes,
    })))
}

/// Extract the payload bytes from a function event.
///
/// Malformed base64 collapses into a generic server error carrying the
/// decoder's message, matching the single-taxonomy error contract of the
/// function variant.
fn decode_event_body(event: &FunctionEvent) -> Result<Bytes, AppError> {
    let raw = event.body.as_deref().unwrap_or("");
    if event.is_base64_encoded {
        let decoded = general_purpose::STANDARD
            .decode(raw)
            .map_err(|err| AppError::internal(err.to_string()))?;
        Ok(Bytes::from(decoded))
    } else {
        Ok(Bytes::copy_from_slice(raw.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_event_body_passes_through_verbatim() {
        let event = FunctionEvent {
            body: Some("raw-bytes".into()),
            is_base64_encoded: false,
        };
        assert_eq!(decode_event_body(&event).unwrap(), "raw-bytes".as_bytes());
    }

    #[test]
    fn base64_event_body_is_decoded() {
        let event = FunctionEvent {
            body: Some(general_purpose::STANDARD.encode(b"\xff\xd8\xff")),
            is_base64_encoded: true,
        };
        assert_eq!(decode_event_body(&event).unwrap(), &b"\xff\xd8\xff"[..]);
    }

    #[test]
    fn malformed_base64_is_a_server_error() {
        let event = FunctionEvent {
            body: Some("!!!not-base64!!!".into()),
            is_base64_encoded: true,
        };
        let err = decode_event_body(&event).unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn absent_event_body_is_empty_payload() {
        let event = FunctionEvent {
            body: None,
            is_base64_encoded: false,
        };
        assert!(decode_event_body(&event).unwrap().is_empty());
    }
}
