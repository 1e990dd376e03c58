use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use qualigate_core::{AppError, UserIdentity};

use crate::error::ApiResult;

/// Builds the actor identity from the forwarded identity headers.
///
/// Authentication happens upstream; this service trusts the gateway's
/// `x-actor-*` headers and refuses requests that arrive without a subject.
pub async fn require_identity(mut request: Request, next: Next) -> ApiResult<Response> {
    let headers = request.headers();

    let subject = header_text(headers, "x-actor-subject")?
        .ok_or_else(|| AppError::Unauthorized("x-actor-subject header is required".to_owned()))?;
    let display_name = header_text(headers, "x-actor-name")?.unwrap_or_else(|| subject.clone());
    let email = header_text(headers, "x-actor-email")?;

    let identity = UserIdentity::new(subject, display_name, email);
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn header_text(headers: &HeaderMap, name: &str) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };

    let text = value
        .to_str()
        .map_err(|_| AppError::Unauthorized(format!("{name} header is not valid UTF-8")))?
        .trim();

    Ok((!text.is_empty()).then(|| text.to_owned()))
}
