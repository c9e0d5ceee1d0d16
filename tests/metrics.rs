// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

// Build full in-process app with /metrics enabled and in-memory state.
async fn build_app() -> Router {
    std::env::set_var("METRICS_ENABLED", "1");
    std::env::remove_var("SNAPSHOT_PATH");
    grub_guardians::app()
        .await
        .expect("app() should build Router in tests")
}

async fn body_text(resp: axum::response::Response) -> String {
    // axum::body::to_bytes requires an explicit limit
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[serial_test::serial]
#[tokio::test]
async fn metrics_endpoint_reports_board_activity() {
    let app = build_app().await;

    let resp = app
        .clone()
        .oneshot(
            Request::post("/notifications")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"Veg Pulao","source_location":"hA"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    for expected in [StatusCode::OK, StatusCode::CONFLICT] {
        let resp = app
            .clone()
            .oneshot(
                Request::post(format!("/notifications/{id}/claim"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
    }

    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = body_text(resp).await;

    for needle in [
        "notifications_posted_total",
        "claims_total",
        "claim_conflicts_total",
        "food_lifespan_secs",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }

    std::env::remove_var("METRICS_ENABLED");
}

#[serial_test::serial]
#[tokio::test]
async fn metrics_route_absent_when_disabled() {
    std::env::remove_var("METRICS_ENABLED");
    let app = grub_guardians::app().await.unwrap();
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
