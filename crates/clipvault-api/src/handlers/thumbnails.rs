use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::Thumbnail;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::multipart::MultipartRejection,
    extract::rejection::PathRejection,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use bytes::BytesMut;
use clipvault_core::constants::THUMBNAIL_FORM_FIELD;
use clipvault_core::models::VideoRecord;
use clipvault_core::AppError;
use clipvault_processing::UploadValidator;
use std::sync::Arc;
use uuid::Uuid;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "thumbnails",
    params(
        ("video_id" = Uuid, Path, description = "Video the thumbnail belongs to")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoRecord),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, video_id, multipart), fields(user_id = %user.user_id))]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    video_id: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoRecord>, HttpAppError> {
    let Path(video_id) = video_id?;
    state.ingest.authorize(user.user_id, video_id).await?;

    let validator = UploadValidator::new(
        state.config.max_thumbnail_size_bytes(),
        FALLBACK_CONTENT_TYPE,
    );
    let mut multipart = multipart?;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(THUMBNAIL_FORM_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await? {
            validator.validate_running_total((data.len() + chunk.len()) as u64)?;
            data.extend_from_slice(&chunk);
        }
        validator.validate_not_empty(data.len() as u64)?;

        let record = state
            .thumbnails
            .attach(
                video_id,
                Thumbnail {
                    content_type,
                    data: data.freeze(),
                },
            )
            .await?;
        let record = state.catalog.sign(record).await?;

        return Ok(Json(record));
    }

    Err(AppError::InvalidInput(format!(
        "Missing multipart field '{}'",
        THUMBNAIL_FORM_FIELD
    ))
    .into())
}

#[utoipa::path(
    get,
    path = "/api/thumbnails/{video_id}",
    tag = "thumbnails",
    params(
        ("video_id" = Uuid, Path, description = "Video the thumbnail belongs to")
    ),
    responses(
        (status = 200, description = "Thumbnail image", content_type = "application/octet-stream"),
        (status = 404, description = "No thumbnail stored", body = ErrorResponse)
    )
)]
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    video_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, HttpAppError> {
    let Path(video_id) = video_id?;
    let thumbnail = state
        .thumbnails
        .get(video_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No thumbnail for video {}", video_id)))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, thumbnail.content_type.as_str())
        .header(header::CACHE_CONTROL, "public, max-age=300")
        .body(Body::from(thumbnail.data))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })
}
