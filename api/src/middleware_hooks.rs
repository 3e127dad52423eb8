use crate::error::DetailedError;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;
use tracing::{debug, info};

pub const VERSION_HEADER: &str = "x-showcase-version";
pub const ELAPSED_HEADER: &str = "x-showcase-elapsed-ms";

/// Logs each request with its status and duration, and reports the
/// duration in a response header.
pub async fn request_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    debug!("Processing {} {}", method, uri);

    let mut response = next.run(request).await;

    let elapsed = start.elapsed();
    info!(
        "{} {} -> {} in {:?}",
        method,
        uri.path(),
        response.status().as_u16(),
        elapsed
    );
    if let Ok(value) = HeaderValue::from_str(&elapsed.as_millis().to_string()) {
        response.headers_mut().insert(ELAPSED_HEADER, value);
    }
    response
}

/// Stamps the API version on every response.
pub async fn response_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}

/// Swaps the public error envelope for the detailed one when `expose` is
/// set. Responses without a `DetailedError` pass through untouched, and the
/// extension is dropped either way.
pub async fn error_detail_middleware(
    State(expose): State<bool>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let Some(DetailedError(detailed)) = response.extensions_mut().remove::<DetailedError>()
    else {
        return response;
    };
    if !expose {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Json(detailed).into_response().into_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_headers_are_added() {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn(request_middleware))
            .layer(middleware::from_fn(response_middleware));

        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(VERSION_HEADER).unwrap(),
            env!("CARGO_PKG_VERSION")
        );
        assert!(response.headers().contains_key(ELAPSED_HEADER));
    }

    async fn failing_message(expose: bool) -> String {
        use crate::error::{ApiError, ApiErrorResponse};
        use authz::AuthzError;

        let app = Router::new()
            .route(
                "/fail",
                get(|| async {
                    ApiError::from(AuthzError::Unavailable("database is locked".into()))
                }),
            )
            .layer(middleware::from_fn_with_state(expose, error_detail_middleware));

        let response = app
            .oneshot(Request::builder().uri("/fail").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.extensions().get::<DetailedError>().is_none());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice::<ApiErrorResponse>(&bytes)
            .unwrap()
            .message
    }

    #[tokio::test]
    async fn test_error_detail_follows_router_setting() {
        assert_eq!(failing_message(false).await, "Service temporarily unavailable");
        assert_eq!(
            failing_message(true).await,
            "Service temporarily unavailable (database is locked)"
        );
        // A second router with the opposite setting leaves the first alone
        assert_eq!(failing_message(false).await, "Service temporarily unavailable");
    }
}
