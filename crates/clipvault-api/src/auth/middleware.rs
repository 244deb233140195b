use crate::auth::jwt::JwtService;
use crate::auth::models::AuthUser;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use clipvault_core::AppError;
use std::sync::Arc;

/// Require `Authorization: Bearer <jwt>` and attach the caller as [`AuthUser`].
pub async fn auth_middleware(
    State(jwt): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match jwt.validate_token(token.trim()) {
        Ok(claims) => {
            tracing::debug!(user_id = %claims.sub, "Authenticated request");
            request
                .extensions_mut()
                .insert(AuthUser { user_id: claims.sub });
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
