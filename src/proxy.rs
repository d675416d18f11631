//! Server-side image fetch so the browser can show pictures from hosts that
//! do not send CORS headers. No caching, auth or rate limiting.

use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    url: Option<String>,
}

/// GET /image-proxy?url=...
pub async fn image_proxy(State(client): State<Client>, Query(query): Query<ProxyQuery>) -> Response {
    let Some(url) = query.url.filter(|u| !u.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing image URL").into_response();
    };

    debug!("proxying {}", url);
    let fetched = async {
        // Non-success upstream statuses count as fetch failures.
        let response = client.get(&url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await?;
        Ok::<_, reqwest::Error>((content_type, bytes))
    }
    .await;

    match fetched {
        Ok((content_type, bytes)) => (
            [
                (header::CONTENT_TYPE, content_type),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
            ],
            Body::from(bytes),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch image {}: {}", url, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch image: {}", e),
            )
                .into_response()
        }
    }
}

pub fn proxy_routes(client: Client) -> Router {
    Router::new()
        .route("/image-proxy", get(image_proxy))
        .with_state(client)
}
