use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::PathRejection,
    extract::{Multipart, Path, State},
    http::header::CONTENT_LENGTH,
    Json,
};
use clipvault_core::constants::VIDEO_FORM_FIELD;
use clipvault_core::models::VideoRecord;
use clipvault_core::AppError;
use clipvault_processing::UploadRequest;
use std::sync::Arc;
use uuid::Uuid;

/// Upload the video file for an existing record.
///
/// The file is probed, remuxed for progressive playback and published under a key
/// prefixed by its orientation. The response carries a freshly signed `video_url`.
#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video record to attach the upload to")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video uploaded and published", body = VideoRecord),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 422, description = "File could not be processed", body = ErrorResponse),
        (status = 502, description = "Storage or database failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, video_id, multipart), fields(user_id = %user.user_id))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    video_id: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoRecord>, HttpAppError> {
    let Path(video_id) = video_id?;
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FORM_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let declared_length = field
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let record = state
            .ingest
            .ingest(UploadRequest {
                owner: user.user_id,
                video_id,
                content_type,
                declared_length,
                body: field,
            })
            .await?;

        return Ok(Json(record));
    }

    Err(AppError::InvalidInput(format!(
        "Missing multipart field '{}'",
        VIDEO_FORM_FIELD
    ))
    .into())
}
