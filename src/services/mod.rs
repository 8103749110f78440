// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external identity and payment integrations.

pub mod firebase_auth;
pub mod stripe;

pub use firebase_auth::{AuthError, FirebaseIdentity, FirebaseVerifier};
pub use stripe::{verify_signature, SignatureError, StripeEvent};
