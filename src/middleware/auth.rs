use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{token_from_headers, Claims};
use crate::error::ApiError;

/// Authenticated user extracted from the session token
#[derive(Clone, Debug)]
pub struct SessionUser {
    pub uid: String,
}

impl From<Claims> for SessionUser {
    fn from(claims: Claims) -> Self {
        Self { uid: claims.uid }
    }
}

/// Session guard: validates the token from the cookie or Authorization
/// header and injects a `SessionUser` into request extensions
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = token_from_headers(&headers).ok_or_else(|| ApiError::unauthorized("Not Authenticated"))?;
    let claims = state.jwt.validate(&token)?;

    request.extensions_mut().insert(SessionUser::from(claims));
    Ok(next.run(request).await)
}
