//! Admin dashboard files compiled into the binary.

use axum::{
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets/admin/"]
struct AdminAssets;

/// Serve one embedded admin file
pub async fn admin_asset(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    match AdminAssets::get(path) {
        Some(file) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], file.data).into_response()
        },
        None => super::server::not_found_handler().await.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_embedded() {
        assert!(AdminAssets::get("index.html").is_some());
        assert!(AdminAssets::get("admin.js").is_some());
        assert!(AdminAssets::get("missing.html").is_none());
    }
}
