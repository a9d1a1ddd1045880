use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use eternal_tools::domain::model::VisionInput;
use eternal_tools::domain::ports::VisionModel;
use eternal_tools::server::detect::{self, DetectState, GENERATE_PATH};
use http_body_util::BodyExt;
use serde_json::Value;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BOUNDARY: &str = "eternal-test-boundary";

/// 固定回傳一段 Florence 輸出，並記錄收到的影像尺寸
struct FakeFlorence {
    output: String,
    seen: Mutex<Vec<(String, u32, u32)>>,
}

impl FakeFlorence {
    fn new(output: &str) -> Arc<Self> {
        Arc::new(Self {
            output: output.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl VisionModel for FakeFlorence {
    async fn generate(&self, task: &str, image: &VisionInput) -> eternal_tools::Result<String> {
        self.seen
            .lock()
            .unwrap()
            .push((task.to_string(), image.width, image.height));
        Ok(self.output.clone())
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 10, 10]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(GENERATE_PATH)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(model: Arc<FakeFlorence>, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let app = detect::router(DetectState { model }, 1024 * 1024);
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn test_detects_objects_in_uploaded_png() -> Result<()> {
    let model = FakeFlorence::new("</s><s>car<loc_52><loc_333><loc_932><loc_774>door<loc_710><loc_203><loc_920><loc_740></s>");
    let request = upload(multipart_body("file", "car.png", &png_bytes(512, 512)));

    let (status, body) = send(model.clone(), request).await?;

    assert_eq!(status, StatusCode::OK);
    let od = &body["<OD>"];
    assert_eq!(od["labels"], serde_json::json!(["car", "door"]));

    let first = od["bboxes"][0].as_array().unwrap();
    assert_eq!(first.len(), 4);
    assert!((first[0].as_f64().unwrap() - 26.88).abs() < 1e-3);
    assert!((first[3].as_f64().unwrap() - 396.544).abs() < 1e-3);

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[("<OD>".to_string(), 512, 512)]);
    Ok(())
}

#[tokio::test]
async fn test_missing_file_field_is_rejected() -> Result<()> {
    let model = FakeFlorence::new("");
    let request = upload(multipart_body("image", "car.png", &png_bytes(8, 8)));

    let (status, body) = send(model.clone(), request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file part in the request");
    assert!(model.seen.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_non_multipart_request_is_rejected() -> Result<()> {
    let request = Request::builder()
        .method("POST")
        .uri(GENERATE_PATH)
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = send(FakeFlorence::new(""), request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file part in the request");
    Ok(())
}

#[tokio::test]
async fn test_empty_filename_is_rejected() -> Result<()> {
    let request = upload(multipart_body("file", "", &png_bytes(8, 8)));

    let (status, body) = send(FakeFlorence::new(""), request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No selected file");
    Ok(())
}

#[tokio::test]
async fn test_undecodable_image_is_rejected() -> Result<()> {
    let model = FakeFlorence::new("");
    let request = upload(multipart_body("file", "notes.txt", b"plain text, not pixels"));

    let (status, body) = send(model.clone(), request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()));
    assert!(model.seen.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let request = Request::builder().uri("/health").body(Body::empty())?;

    let (status, body) = send(FakeFlorence::new(""), request).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_upload_over_body_limit_is_payload_too_large() -> Result<()> {
    let model = FakeFlorence::new("");
    let app = detect::router(
        DetectState {
            model: model.clone(),
        },
        1024,
    );
    let request = upload(multipart_body("file", "big.bin", &vec![7u8; 8 * 1024]));

    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let bytes = response.into_body().collect().await?.to_bytes();
    let body: Value = serde_json::from_slice(&bytes)?;
    assert!(body["error"].is_string());
    assert!(model.seen.lock().unwrap().is_empty());
    Ok(())
}
