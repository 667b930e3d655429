//! Integration tests for `POST /convert`.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use helpers::{MockTools, Part, TestApp, sample_png, sample_raster};
use image::ImageFormat;

#[tokio::test]
async fn test_png_to_jpeg() {
    let app = TestApp::new();
    let png = sample_png();

    let response = app
        .convert(&[
            Part::file("image", "holiday photo.png", "image/png", &png),
            Part::text("target_format", "jpg"),
            Part::text("quality", "80"),
        ])
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "image/jpeg");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"holiday_photo.jpg\""
    );
    assert_eq!(
        response.header(header::CONTENT_LENGTH),
        response.bytes.len().to_string()
    );
    assert_eq!(
        image::guess_format(&response.bytes).expect("guess"),
        ImageFormat::Jpeg
    );
    assert_eq!(app.residue(), 0);
}

#[tokio::test]
async fn test_unknown_target_rejected() {
    let app = TestApp::new();
    let response = app.convert_file("photo.png", &sample_png(), "xyz").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "INVALID_PARAMETER");
    assert!(response.body["error"].as_str().expect("error").contains("xyz"));
}

#[tokio::test]
async fn test_input_only_format_is_not_a_target() {
    let app = TestApp::new();
    let response = app.convert_file("photo.png", &sample_png(), "psd").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_missing_image_field() {
    let app = TestApp::new();
    let response = app.convert(&[Part::text("target_format", "png")]).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "MISSING_INPUT");
    assert_eq!(response.body["error"], "No image file provided");
}

#[tokio::test]
async fn test_empty_image_field() {
    let app = TestApp::new();
    let response = app.convert_file("photo.png", b"", "jpg").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "MISSING_INPUT");
}

#[tokio::test]
async fn test_non_multipart_body() {
    let app = TestApp::new();
    let req = Request::builder()
        .method("POST")
        .uri("/convert")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"target_format":"png"}"#))
        .expect("request");

    let response = app.request(req).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "MISSING_INPUT");
}

#[tokio::test]
async fn test_missing_input_wins_over_bad_target() {
    let app = TestApp::new();
    let response = app
        .convert(&[
            Part::text("target_format", "xyz"),
            Part::text("quality", "500"),
        ])
        .await;

    assert_eq!(response.error_code(), "MISSING_INPUT");
}

#[tokio::test]
async fn test_unrecognized_source() {
    let app = TestApp::new();
    let response = app
        .convert_file("notes.txt", b"just some words", "png")
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "UNSUPPORTED_FORMAT");
}

#[tokio::test]
async fn test_unsupported_pair() {
    let app = TestApp::new();
    let response = app.convert_file("photo.png", &sample_png(), "png").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "UNSUPPORTED_CONVERSION");
}

#[tokio::test]
async fn test_quality_out_of_range() {
    let app = TestApp::new();
    let png = sample_png();

    for quality in ["0", "101", "high"] {
        let response = app
            .convert(&[
                Part::file("image", "photo.png", "image/png", &png),
                Part::text("target_format", "jpg"),
                Part::text("quality", quality),
            ])
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{quality}");
        assert_eq!(response.error_code(), "INVALID_PARAMETER");
    }
}

async fn sizes_at_quality(app: &TestApp, png: &[u8], target: &str) -> Vec<usize> {
    let mut sizes = Vec::new();
    for quality in ["10", "95"] {
        let response = app
            .convert(&[
                Part::file("image", "detail.png", "image/png", png),
                Part::text("target_format", target),
                Part::text("quality", quality),
            ])
            .await;
        assert_eq!(response.status, StatusCode::OK, "{target} q{quality}");
        sizes.push(response.bytes.len());
    }
    sizes
}

#[tokio::test]
async fn test_lower_quality_gives_smaller_jpeg() {
    let app = TestApp::new();
    let png = sample_raster(ImageFormat::Png, 256, 256);

    let sizes = sizes_at_quality(&app, &png, "jpeg").await;
    assert!(sizes[0] < sizes[1], "q10 {} >= q95 {}", sizes[0], sizes[1]);
}

#[tokio::test]
async fn test_lower_quality_gives_smaller_webp() {
    let app = TestApp::new();
    let png = sample_raster(ImageFormat::Png, 256, 256);

    let sizes = sizes_at_quality(&app, &png, "webp").await;
    assert!(sizes[0] < sizes[1], "q10 {} >= q95 {}", sizes[0], sizes[1]);
}

#[tokio::test]
async fn test_non_ascii_filename_falls_back() {
    let app = TestApp::new();
    let response = app.convert_file("фото.png", &sample_png(), "jpg").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"converted.jpg\""
    );
}

#[tokio::test]
async fn test_extension_wins_over_content() {
    let app = TestApp::new();
    let response = app
        .convert_file("actually_a_png.jpg", &sample_png(), "png")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"actually_a_png.png\""
    );
    assert_eq!(
        image::guess_format(&response.bytes).expect("guess"),
        ImageFormat::Png
    );
}

#[tokio::test]
async fn test_content_sniffed_without_extension() {
    let app = TestApp::new();
    let response = app.convert_file("upload", &sample_png(), "gif").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "image/gif");
}

#[tokio::test]
async fn test_corrupt_input_is_backend_error_every_time() {
    let app = TestApp::new();
    let corrupt = b"\x89PNG\r\n\x1a\nthis is not really a png";

    for _ in 0..2 {
        let response = app.convert_file("broken.png", corrupt, "jpg").await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.error_code(), "CONVERSION_BACKEND_ERROR");
        assert_eq!(response.body["error"], "Conversion failed");
        assert_eq!(app.residue(), 0);
    }
}

#[tokio::test]
async fn test_vector_source_uses_rasterizer() {
    let app = TestApp::new();
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#;

    let response = app.convert_file("logo.svg", svg, "webp").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "image/webp");
    assert_eq!(app.tools.call_count(), 1);
}

#[tokio::test]
async fn test_pdf_to_multipage_tiff() {
    let app = TestApp::new();
    let response = app
        .convert_file("report.pdf", b"%PDF-1.4\n%mock\n", "tiff")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "image/tiff");
    assert_eq!(
        image::guess_format(&response.bytes).expect("guess"),
        ImageFormat::Tiff
    );
}

#[tokio::test]
async fn test_tool_failure_hides_details() {
    let app = TestApp::with_tools(MockTools::failing(), |_| {});
    let response = app
        .convert_file("report.pdf", b"%PDF-1.4\n", "png")
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error_code(), "CONVERSION_BACKEND_ERROR");
    let raw = String::from_utf8_lossy(&response.bytes);
    assert!(!raw.contains("mock-tool"));
    assert!(!raw.contains("/secret/path"));
    assert_eq!(app.residue(), 0);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let app = TestApp::with_tools(MockTools::default(), |config| {
        config.server.max_upload_size_bytes = 64 * 1024;
    });
    let big = vec![0u8; 256 * 1024];

    let response = app.convert_file("huge.png", &big, "jpg").await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.error_code(), "PAYLOAD_TOO_LARGE");
    assert_eq!(app.residue(), 0);
}
