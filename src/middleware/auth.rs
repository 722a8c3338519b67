use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::{Error, Result};
use crate::services::auth_service::AuthService;

fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("missing authorization header".to_string()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| Error::Unauthorized("authorization header is not valid text".to_string()))?;
    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::Unauthorized("expected a Bearer token".to_string()))
}

/// Verifies the bearer token against the stored account and puts the
/// refreshed claims in the request extensions for `Extension<Claims>`.
pub async fn require_bearer_auth(
    State(auth): State<AuthService>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let claims = auth.authenticate(bearer_token(req.headers())?).await?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
