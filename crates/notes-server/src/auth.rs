use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use notes_core::auth::Principal;

use crate::error::AppError;
use crate::state::AppState;

/// Axum middleware that resolves the caller into a [`Principal`] and stores
/// it in the request extensions.
///
/// Auth flow:
/// 1. No tokens configured → the local editor principal
/// 2. `Authorization: Bearer <token>` matching a configured token → that principal
/// 3. Anything else → 401
pub async fn auth_middleware(State(app): State<AppState>, mut req: Request, next: Next) -> Response {
    if !app.config.auth.enabled() {
        req.extensions_mut().insert(Principal::local());
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    let Some(entry) = presented.and_then(|t| app.config.auth.lookup(t)) else {
        tracing::debug!(path = %req.uri().path(), "rejected request without a valid token");
        return AppError::unauthorized().into_response();
    };

    req.extensions_mut().insert(Principal {
        name: entry.name.clone(),
        role: entry.role,
    });
    next.run(req).await
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
