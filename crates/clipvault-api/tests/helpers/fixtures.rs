//! Test fixtures: upload bodies and draft records.

use axum_test::multipart::{MultipartForm, Part};
use serde_json::json;
use uuid::Uuid;

use super::auth::TestUser;
use super::TestApp;

/// Bytes standing in for an MP4 upload; the fake tools never parse them.
pub fn sample_video() -> Vec<u8> {
    b"\x00\x00\x00\x18ftypmp42 raw video payload".to_vec()
}

pub fn minimal_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE,
    ]
}

pub fn video_form(data: Vec<u8>, mime_type: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name("clip.mp4")
        .mime_type(mime_type);
    MultipartForm::new().add_part("video", part)
}

pub fn thumbnail_form(data: Vec<u8>) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name("thumb.png")
        .mime_type("image/png");
    MultipartForm::new().add_part("thumbnail", part)
}

/// Create a draft record through the API and return its id.
pub async fn create_video(app: &TestApp, user: &TestUser, title: &str) -> Uuid {
    let response = app
        .client()
        .post("/api/videos")
        .add_header("Authorization", user.bearer())
        .json(&json!({ "title": title, "description": "integration test" }))
        .await;
    assert_eq!(response.status_code(), 201);

    let body: serde_json::Value = response.json();
    Uuid::parse_str(body["id"].as_str().expect("Expected 'id' in response"))
        .expect("Invalid UUID in response")
}
