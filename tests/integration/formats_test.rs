//! Integration tests for `GET /formats`, `GET /health`, and routing.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use helpers::{TestApp, sample_input, sample_png};
use imgshift_convert::FormatId;

#[tokio::test]
async fn test_formats_listing() {
    let app = TestApp::new();
    let response = app.get("/formats").await;

    assert_eq!(response.status, StatusCode::OK);
    let inputs: Vec<&str> = response.body["input_formats"]
        .as_array()
        .expect("input_formats")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(inputs.len(), FormatId::ALL.len());
    for token in ["png", "svg", "pdf", "raw", "dxf", "heif"] {
        assert!(inputs.contains(&token), "{token}");
    }

    let png_targets = &response.body["output_formats"]["png"];
    assert!(png_targets.as_array().expect("png").contains(&"jpg".into()));
    assert!(!png_targets.as_array().expect("png").contains(&"png".into()));
    assert_eq!(response.body["output_formats"]["raw"].as_array().expect("raw").len(), 4);
}

#[tokio::test]
async fn test_every_listed_pair_converts() {
    let app = TestApp::new();
    let listing = app.get("/formats").await;
    let outputs = listing.body["output_formats"]
        .as_object()
        .expect("output_formats")
        .clone();

    let mut pairs = 0;
    for (source, targets) in outputs {
        let format = FormatId::from_token(&source).expect("known source");
        let data = sample_input(format);
        let filename = format!("sample.{source}");

        for target in targets.as_array().expect("targets") {
            let target = target.as_str().expect("token");
            let response = app.convert_file(&filename, &data, target).await;
            assert_eq!(response.status, StatusCode::OK, "{source} -> {target}");

            let expected = FormatId::from_token(target).expect("known target");
            assert_eq!(response.header(header::CONTENT_TYPE), expected.mime_type());
            pairs += 1;
        }
    }

    assert_eq!(pairs, imgshift_convert::StrategyTable::global().len());
    assert_eq!(app.residue(), 0);
}

#[tokio::test]
async fn test_health_reports_metrics() {
    let app = TestApp::new();

    let before = app.get("/health").await;
    assert_eq!(before.status, StatusCode::OK);
    assert_eq!(before.body["status"], "healthy");
    assert_eq!(before.body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(before.body["conversions"]["started"], 0);

    app.convert_file("a.png", &sample_png(), "jpg").await;
    app.convert_file("a.png", &sample_png(), "xyz").await;

    let after = app.get("/health").await;
    assert_eq!(after.body["conversions"]["started"], 2);
    assert_eq!(after.body["conversions"]["succeeded"], 1);
    assert_eq!(after.body["conversions"]["rejected"], 1);
    assert!(after.body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = TestApp::new();
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/convert")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .expect("request");

    let response = app.request(req).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new();
    assert_eq!(app.get("/convert/extra").await.status, StatusCode::NOT_FOUND);
}
