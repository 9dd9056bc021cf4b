//! Router tests driven through `tower::ServiceExt::oneshot`, no socket needed.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ocr_preprocessor::config::Config;
use ocr_preprocessor::server::{build_router, AppState};
use std::io::Cursor;
use tower::ServiceExt;

const BOUNDARY: &str = "ocr-preprocessor-test-boundary";

struct TestResponse {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }
}

fn router(max_file_size: usize) -> axum::Router {
    build_router(AppState::new(Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_file_size,
    }))
}

async fn send(router: axum::Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.expect("Request failed");

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

fn multipart_request(field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/preprocess")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        if (x / 6 + y / 6) % 2 == 0 {
            Rgb([30, 40, 50])
        } else {
            Rgb([220, 215, 200])
        }
    });
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

#[tokio::test]
async fn test_health_returns_ok() {
    let response = send(
        router(1024 * 1024),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "ok");
}

#[tokio::test]
async fn test_info_reports_pipeline_parameters() {
    let response = send(
        router(4096),
        Request::get("/info").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["max_file_size_bytes"], 4096);
    assert_eq!(json["output_format"], "image/png");
    assert_eq!(json["parameters"]["max_dimension"], 2000);
    assert_eq!(json["parameters"]["denoise_template_window"], 7);
    assert_eq!(json["parameters"]["denoise_search_window"], 21);
    assert_eq!(json["parameters"]["clahe_tile_grid"][0], 8);
    assert_eq!(json["parameters"]["sharpen_kernel"][4], 9.0);
}

#[tokio::test]
async fn test_preprocess_returns_png_of_same_size() {
    let response = send(
        router(1024 * 1024),
        multipart_request("file", &png_fixture(48, 36)),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["content-type"], "image/png");
    assert_eq!(response.headers["x-original-dimensions"], "48x36");
    assert_eq!(response.headers["x-output-dimensions"], "48x36");
    assert!(response.headers.contains_key("x-processing-time-ms"));

    let output = image::load_from_memory_with_format(&response.body, ImageFormat::Png)
        .expect("Response should be a PNG");
    assert_eq!((output.width(), output.height()), (48, 36));
    assert_eq!(output.color(), image::ColorType::Rgb8);
}

#[tokio::test]
async fn test_preprocess_rejects_undecodable_upload() {
    let response = send(
        router(1024 * 1024),
        multipart_request("file", b"\x00\x01garbage bytes"),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "DECODE_ERROR");
}

#[tokio::test]
async fn test_preprocess_requires_file_field() {
    let response = send(
        router(1024 * 1024),
        multipart_request("attachment", &png_fixture(8, 8)),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "MISSING_FILE");
}

#[tokio::test]
async fn test_preprocess_rejects_oversized_upload() {
    let response = send(router(100), multipart_request("file", &[0u8; 500])).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json()["code"], "IMAGE_TOO_LARGE");
}
