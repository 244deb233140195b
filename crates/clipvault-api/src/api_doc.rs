//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use clipvault_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clipvault API",
        version = "0.1.0",
        description = "Video ingestion API: upload a video for an existing record, have it remuxed for progressive playback, and receive a time-limited signed link to the published file."
    ),
    paths(
        handlers::video_upload::upload_video,
        handlers::videos::create_video,
        handlers::videos::list_videos,
        handlers::videos::get_video,
        handlers::videos::delete_video,
        handlers::thumbnails::upload_thumbnail,
        handlers::thumbnails::get_thumbnail,
    ),
    components(schemas(
        models::VideoRecord,
        models::CreateVideoRequest,
        models::OrientationClass,
        error::ErrorResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "videos", description = "Video records and uploads"),
        (name = "thumbnails", description = "Thumbnail images"),
    )
)]
pub struct ApiDoc;
