//! Signed-link route for the local storage backend.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::rejection::QueryRejection,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use clipvault_core::{AppError, StorageBackend};
use clipvault_storage::verify_local_link;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignedLinkQuery {
    pub expires: u64,
    pub signature: String,
}

/// Fallback for objects published without a recorded content type.
fn content_type_for(storage_key: &str) -> String {
    match storage_key.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains('/') && ext != "bin" => {
            format!("video/{}", ext)
        }
        _ => "application/octet-stream".to_string(),
    }
}

/// Serve a stored object when the link's signature and expiry check out. No auth required.
#[tracing::instrument(skip(state, query), fields(operation = "get_media"))]
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(storage_key): Path<String>,
    query: Result<Query<SignedLinkQuery>, QueryRejection>,
) -> Result<Response, HttpAppError> {
    if state.storage.backend_type() != StorageBackend::Local {
        return Err(AppError::NotFound("Not found".to_string()).into());
    }

    let Query(query) = query
        .map_err(|_| AppError::Forbidden("Missing or malformed link signature".to_string()))?;

    verify_local_link(
        state.config.link_signing_secret().as_bytes(),
        &storage_key,
        query.expires,
        &query.signature,
    )?;

    let stream = state.storage.download_stream(&storage_key).await?;
    let content_type = state
        .storage
        .content_type(&storage_key)
        .await?
        .unwrap_or_else(|| content_type_for(&storage_key));
    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "private, max-age=60")
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })
}
