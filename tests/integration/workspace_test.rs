//! Integration tests for workspace isolation and cleanup.

mod helpers;

use axum::http::StatusCode;
use helpers::{MockTools, TestApp, sample_png};
use imgshift_convert::Workspace;
use imgshift_convert::workspace::WORKSPACE_PREFIX;

#[tokio::test]
async fn test_concurrent_conversions_leave_no_residue() {
    let app = TestApp::new();
    let png = sample_png();

    let requests = (0..16).map(|i| {
        let target = ["jpg", "webp", "gif", "bmp"][i % 4];
        let filename = format!("photo-{i}.png");
        let app = &app;
        let png = &png;
        async move { app.convert_file(&filename, png, target).await }
    });

    for response in futures::future::join_all(requests).await {
        assert_eq!(response.status, StatusCode::OK);
    }
    assert_eq!(app.residue(), 0);
}

#[tokio::test]
async fn test_failed_conversions_leave_no_residue() {
    let app = TestApp::with_tools(MockTools::failing(), |_| {});
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#;

    let requests = (0..8).map(|_| app.convert_file("logo.svg", svg, "png"));
    for response in futures::future::join_all(requests).await {
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    assert_eq!(app.tools.call_count(), 8);
    assert_eq!(app.residue(), 0);
}

#[tokio::test]
async fn test_workspace_lifecycle() {
    let root = tempfile::tempdir().expect("root");

    let first = Workspace::create(root.path()).expect("first");
    let second = Workspace::create(root.path()).expect("second");
    assert_ne!(first.path(), second.path());

    let name = first
        .path()
        .file_name()
        .and_then(|n| n.to_str())
        .expect("name");
    assert!(name.starts_with(WORKSPACE_PREFIX));

    let staged = first
        .stage_input(imgshift_convert::FormatId::Png, &sample_png())
        .await
        .expect("stage");
    assert!(staged.starts_with(first.path()));
    assert!(staged.exists());

    drop(first);
    second.close().expect("close");
    assert_eq!(std::fs::read_dir(root.path()).expect("root").count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_tool_timeout_is_backend_error() {
    use std::os::unix::fs::PermissionsExt;

    let bin = tempfile::tempdir().expect("bin");
    let script = bin.path().join("slow-rsvg");
    std::fs::write(&script, "#!/bin/sh\nsleep 10\n").expect("write script");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).expect("chmod");

    let temp_root = tempfile::tempdir().expect("root");
    let mut config = helpers::test_config(temp_root.path());
    config.tools.rsvg_convert.command = script.to_string_lossy().to_string();
    config.tools.rsvg_convert.timeout_seconds = Some(1);
    let backends = imgshift_convert::Backends::standard(&config.conversion, &config.tools);
    let app = TestApp::with_backends(temp_root, config, backends);

    let started = std::time::Instant::now();
    let response = app
        .convert_file("logo.svg", br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#, "png")
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error_code(), "CONVERSION_BACKEND_ERROR");
    assert!(started.elapsed() < std::time::Duration::from_secs(8));
    assert_eq!(app.residue(), 0);

    let health = app.get("/health").await;
    assert_eq!(health.body["conversions"]["timed_out"], 1);
    assert_eq!(health.body["conversions"]["failed"], 1);
}
