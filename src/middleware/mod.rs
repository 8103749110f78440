// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware and extractors (authentication, security headers, validation).

pub mod auth;
pub mod security;
pub mod validation;

pub use auth::{ensure_owner, require_auth, AuthUser};
pub use validation::ValidatedJson;
