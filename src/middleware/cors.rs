use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{Error, Result};

/// Any origin when none is configured, otherwise exactly the given one.
pub fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allowed_origin {
        None => Ok(layer.allow_origin(Any)),
        Some(origin) => {
            let origin = HeaderValue::from_str(origin).map_err(|_| {
                Error::Config(format!("Invalid CORS_ALLOWED_ORIGIN: {}", origin))
            })?;
            Ok(layer.allow_origin(origin))
        }
    }
}
