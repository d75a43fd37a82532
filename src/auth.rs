use crate::errors::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Single-user gate in front of the API. Identity is issued elsewhere; this
/// only checks the shared bearer token when one is configured.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    if provided != Some(expected) {
        warn!(path = %request.uri().path(), "rejected request without a valid token");
        return Err(AppError::unauthorized("missing or invalid bearer token"));
    }

    Ok(next.run(request).await)
}
