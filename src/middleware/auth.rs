// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase authentication middleware.

use crate::error::AppError;
use crate::services::firebase_auth::{extract_bearer_token, AuthError, FirebaseIdentity};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie Firebase Hosting forwards to backends.
pub const SESSION_COOKIE: &str = "__session";

/// Authenticated user extracted from a Firebase ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Firebase UID (token `sub`)
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl From<FirebaseIdentity> for AuthUser {
    fn from(identity: FirebaseIdentity) -> Self {
        Self {
            uid: identity.uid,
            email: identity.email,
            name: identity.name,
            picture: identity.picture,
        }
    }
}

/// Middleware that requires a valid Firebase ID token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Cookie first, then header
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => extract_bearer_token(request.headers().get(header::AUTHORIZATION))
            .map_err(|_| AppError::Unauthorized)?
            .to_string(),
    };

    let identity = state
        .firebase_verifier
        .verify_token(&token)
        .await
        .map_err(|err| match err {
            AuthError::Rejected(reason) => {
                tracing::debug!(reason = %reason, "Rejected Firebase token");
                AppError::InvalidToken
            }
            AuthError::Transient(reason) => {
                AppError::Internal(anyhow::anyhow!("Firebase key fetch failed: {}", reason))
            }
        })?;

    request.extensions_mut().insert(AuthUser::from(identity));

    Ok(next.run(request).await)
}

/// Callers may only touch their own user document.
pub fn ensure_owner(auth: &AuthUser, user_id: &str) -> Result<(), AppError> {
    if auth.uid == user_id {
        Ok(())
    } else {
        tracing::warn!(
            uid = %auth.uid,
            requested = %user_id,
            "Blocked access to another user's document"
        );
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(uid: &str) -> AuthUser {
        AuthUser {
            uid: uid.to_string(),
            email: None,
            name: None,
            picture: None,
        }
    }

    #[test]
    fn owner_check() {
        assert!(ensure_owner(&auth("abc"), "abc").is_ok());
        assert!(matches!(
            ensure_owner(&auth("abc"), "xyz"),
            Err(AppError::Forbidden)
        ));
    }
}
