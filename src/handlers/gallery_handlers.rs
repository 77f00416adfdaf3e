//! HTTP handlers for the gallery page and direct image retrieval.
//! Streams image bodies to avoid buffering in memory and delegates storage
//! concerns to the injected `ImageStore`.

use crate::{
    errors::AppError,
    models::image::StoredImage,
    services::store::DynImageStore,
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, Response},
};

/// GET `/` — HTML gallery of every stored image, newest first.
///
/// The whole namespace is enumerated on every call; there is no pagination.
/// An empty namespace renders an empty gallery rather than an error.
pub async fn gallery(State(store): State<DynImageStore>) -> Result<Html<String>, AppError> {
    let names = store.list().await?;
    Ok(Html(render_gallery(&names)))
}

/// GET `/uploads/{name}` — stream the named image back.
pub async fn serve_image(
    State(store): State<DynImageStore>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let (image, stream) = store.get(&name).await?;

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    set_image_headers(response.headers_mut(), &image);
    Ok(response)
}

fn set_image_headers(headers: &mut HeaderMap, image: &StoredImage) {
    let content_type = image
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&image.size_bytes.max(0).to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );

    headers.insert(
        header::LAST_MODIFIED,
        HeaderValue::from_str(&image.stored_at.to_rfc2822())
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );
}

/// Render the gallery page. Each name becomes an `<img>` pointing at the
/// retrieval route plus a text caption.
fn render_gallery(names: &[String]) -> String {
    let mut html = String::from(concat!(
        "<html><head>",
        r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#,
        "<style>",
        "body{background:#0f172a; color:#f8fafc; font-family:sans-serif; text-align:center; padding:20px;}",
        ".gallery{display:grid; grid-template-columns: repeat(auto-fill, minmax(150px, 1fr)); gap:15px;}",
        ".card{background:#1e293b; border-radius:12px; padding:10px; border:1px solid #334155;}",
        "img{width:100%; height:130px; object-fit:cover; border-radius:8px;}",
        "</style></head><body>",
        "<h2>Camera Gallery</h2>",
        r#"<div class="gallery">"#,
    ));

    for name in names {
        let escaped = html_escape(name);
        html.push_str(&format!(
            r#"<div class="card"><img src="/uploads/{escaped}"><span>{escaped}</span></div>"#
        ));
    }

    html.push_str("</div></body></html>");
    html
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gallery_embeds_each_name_as_source_and_caption() {
        let names = vec!["IMG_1700000001.jpg".to_string(), "IMG_1700000000.jpg".to_string()];
        let html = render_gallery(&names);
        assert!(html.contains(r#"<img src="/uploads/IMG_1700000001.jpg">"#));
        assert!(html.contains("<span>IMG_1700000000.jpg</span>"));
        // Order of appearance matches the listing order.
        let first = html.find("IMG_1700000001.jpg").unwrap();
        let second = html.find("IMG_1700000000.jpg").unwrap();
        assert!(first < second);
    }

    #[test]
    fn gallery_escapes_hostile_names() {
        let names = vec!["<script>alert(1)</script>.jpg".to_string()];
        let html = render_gallery(&names);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_namespace_renders_empty_gallery() {
        let html = render_gallery(&[]);
        assert!(html.contains(r#"<div class="gallery">"#));
        assert!(!html.contains(r#"<div class="card">"#));
    }
}
