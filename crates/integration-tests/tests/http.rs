//! Request validation, health, CORS and request ids. No database needed.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use priceworth_integration_tests::{ALLOWED_ORIGIN, TestApp, request};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health() {
    let app = TestApp::without_database();
    let (status, body) = app.send(request(Method::GET, "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn test_readiness_without_database() {
    let app = TestApp::without_database();
    let (status, _) = app
        .send(request(Method::GET, "/health/ready", None, None))
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_non_positive_quantity_rejected_before_database() {
    let app = TestApp::without_database();

    for (uri, method) in [
        ("/cart/items/add", Method::POST),
        ("/cart/items/update", Method::PUT),
    ] {
        for quantity in [0, -3] {
            let (status, body) = app
                .send(request(
                    method.clone(),
                    uri,
                    None,
                    Some(&json!({
                        "shoppingCartId": "6f1c2b1e-7d4a-4a53-9a57-0c3b8e2f1d10",
                        "productVariantId": 1,
                        "quantity": quantity,
                    })),
                ))
                .await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {quantity}");
            assert_eq!(body["message"], "product quantity should be more than 0");
            assert_eq!(body["error"], "Bad Request");
        }
    }
}

#[tokio::test]
async fn test_order_with_non_positive_item_rejected() {
    let app = TestApp::without_database();

    let (status, body) = app
        .send(request(
            Method::POST,
            "/order",
            None,
            Some(&json!({
                "billingAddress": "1 Test St",
                "shippingMethodId": 1,
                "items": [{ "productVariantId": 4, "quantity": 0 }],
            })),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .is_some_and(|m| m.contains("variant 4"))
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::without_database();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/cart/items/add")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"quantity\":"))
        .unwrap_or_else(|e| panic!("{e}"));
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
}

#[tokio::test]
async fn test_invalid_path_id_is_bad_request() {
    let app = TestApp::without_database();

    let (status, body) = app
        .send(request(Method::GET, "/product/abc", None, None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    let (status, _) = app
        .send(request(Method::GET, "/cart/not-a-uuid", None, None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::without_database();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-42")
        .body(Body::empty())
        .unwrap_or_else(|e| panic!("{e}"));
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|e| match e {});
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("edge-42")
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap_or_else(|e| panic!("{e}")),
        )
        .await
        .unwrap_or_else(|e| match e {});
    let generated = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let app = TestApp::without_database();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/cart/items/add")
        .header(header::ORIGIN, ALLOWED_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap_or_else(|e| panic!("{e}"));
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|e| match e {});

    let headers = response.headers();
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(ALLOWED_ORIGIN)
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}

#[tokio::test]
async fn test_cors_ignores_unknown_origin() {
    let app = TestApp::without_database();

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap_or_else(|e| panic!("{e}"));
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|e| match e {});

    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
