//! # Integration Flows
//!
//! End-to-end callbacks from the simulated platform through the real router.
//!
//! - `handshake_flows`: plain and encrypted URL verification
//! - `message_flows`: message pushes, passive replies, sealed replies

pub mod message_flows;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

/// Send `req` through `app` and collect status and body text.
pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(req).await.expect("router is infallible");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    (status, String::from_utf8_lossy(&body).into_owned())
}

/// GET `uri` through `app`.
pub async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::get(uri).body(Body::empty()).expect("valid uri");
    send(app, req).await
}

/// POST `body` to `uri` through `app`.
pub async fn post(app: Router, uri: &str, body: String) -> (StatusCode, String) {
    let req = Request::post(uri).body(Body::from(body)).expect("valid uri");
    send(app, req).await
}
