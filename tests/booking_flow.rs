//! End-to-end booking flow over the HTTP surface.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use slipway::config::EngineConfig;
use slipway::engine::Engine;
use slipway::http::{AppState, create_router};
use slipway::partner::NoPartnerFeed;

const ADMIN_TOKEN: &str = "dockmaster";

fn test_wal_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("slipway_test_http");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn app(name: &str) -> Router {
    let engine = Engine::new(
        test_wal_path(name),
        EngineConfig::default(),
        Arc::new(NoPartnerFeed),
    )
    .unwrap();
    create_router(AppState {
        engine: Arc::new(engine),
        admin_token: Some(ADMIN_TOKEN.into()),
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn hold_body(product: &str, slot: &str) -> Value {
    json!({
        "product": product,
        "slot": slot,
        "date": "2030-06-10",
        "guests": 4,
        "customer": {"name": "Ada Seaborn", "email": "ada@example.com"}
    })
}

#[tokio::test]
async fn full_booking_flow() {
    let app = app("flow.wal");

    let (status, _) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    // Day starts fully open.
    let (status, days) = send(
        &app,
        "GET",
        "/v1/availability?from=2030-06-10&to=2030-06-10",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(days[0]["sold_out"], json!(false));
    assert_eq!(days[0]["available"].as_array().unwrap().len(), 4);

    // Quote with an extra guest and the excursion add-on.
    let (status, quote) = send(
        &app,
        "POST",
        "/v1/quote",
        Some(json!({"product": "day", "slot": "DAY", "guests": 7, "excursion": true})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["currency"], json!("USD"));
    assert_eq!(quote["total_cents"], json!(220_000 + 10_000 + 25_000));
    assert_eq!(quote["breakdown"].as_array().unwrap().len(), 3);

    // Hold the full day.
    let (status, hold) = send(&app, "POST", "/v1/holds", Some(hold_body("day", "DAY")), None).await;
    assert_eq!(status, StatusCode::OK);
    let id = hold["reservation_id"].as_str().unwrap().to_string();
    assert!(!hold["hold_expires_at"].as_str().unwrap().is_empty());

    // A competing hold on the same day is a conflict.
    let (status, err) = send(
        &app,
        "POST",
        "/v1/holds",
        Some(hold_body("half-day", "HALF_AM")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], json!("SLOT_TAKEN"));

    // Confirm; retry is a no-op success.
    let confirm_uri = format!("/v1/reservations/{id}/confirm");
    let (status, body) = send(&app, "POST", &confirm_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    let (status, body) = send(&app, "POST", &confirm_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));

    // The day is sold out now.
    let (_, days) = send(
        &app,
        "GET",
        "/v1/availability?from=2030-06-10&to=2030-06-10",
        None,
        None,
    )
    .await;
    assert_eq!(days[0]["sold_out"], json!(true));

    // Cancel requires the admin token.
    let cancel_uri = format!("/v1/reservations/{id}/cancel");
    let (status, _) = send(&app, "POST", &cancel_uri, Some(json!({"reason": "refit"})), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = send(
        &app,
        "POST",
        &cancel_uri,
        Some(json!({"reason": "refit"})),
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));

    // The day is open again and the record survives as CANCELLED.
    let (_, days) = send(
        &app,
        "GET",
        "/v1/availability?from=2030-06-10&to=2030-06-10",
        None,
        None,
    )
    .await;
    assert_eq!(days[0]["sold_out"], json!(false));

    let (status, reservation) =
        send(&app, "GET", &format!("/v1/reservations/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reservation["status"], json!("CANCELLED"));
    assert_eq!(reservation["cancel_reason"], json!("refit"));

    let (status, all) = send(&app, "GET", "/v1/reservations", None, Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    // Confirm from CANCELLED is a 400 on this endpoint.
    let (status, err) = send(&app, "POST", &confirm_uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], json!("INVALID_STATE"));
}

#[tokio::test]
async fn validation_surface() {
    let app = app("validation.wal");

    // Inverted date range.
    let (status, err) = send(
        &app,
        "GET",
        "/v1/availability?from=2030-06-12&to=2030-06-10",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], json!("VALIDATION"));

    // Missing date params are rejected before reaching the engine.
    let (status, _) = send(&app, "GET", "/v1/availability?from=2030-06-10", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown product: 404 on quote, 400 on hold.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/quote",
        Some(json!({"product": "submarine", "slot": "DAY", "guests": 2})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        "POST",
        "/v1/holds",
        Some(hold_body("submarine", "DAY")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Option illegal for the slot.
    let (status, err) = send(
        &app,
        "POST",
        "/v1/quote",
        Some(json!({"product": "sunset", "slot": "SUNSET", "guests": 2, "excursion": true})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], json!("VALIDATION"));

    // Guest count out of bounds.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/quote",
        Some(json!({"product": "day", "slot": "DAY", "guests": 9})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown reservation ids.
    let unknown = ulid::Ulid::new();
    let (status, _) = send(
        &app,
        "POST",
        &format!("/v1/reservations/{unknown}/confirm"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/v1/reservations/not-a-ulid", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Wrong admin token.
    let (status, _) = send(&app, "GET", "/v1/reservations", None, Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
