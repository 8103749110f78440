// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token verification.
//!
//! ID tokens are RS256 JWTs signed by the `securetoken` service account.
//! The verifier checks signature, issuer (`https://securetoken.google.com/<project>`),
//! audience (the project id), expiry, and that `iat`/`auth_time` are not in
//! the future. Google's signing keys are cached for the `max-age` the key
//! endpoint advertises.

use crate::config::Config;
use anyhow::Context;
use axum::http::HeaderValue;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::{HeaderMap, CACHE_CONTROL};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const SECURETOKEN_ISSUER: &str = "https://securetoken.google.com";
const KEY_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Used when the key response carries no usable `max-age`.
const FALLBACK_KEY_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;
const MAX_UID_LEN: usize = 128;

/// Identity extracted from a verified Firebase ID token.
#[derive(Debug, Clone)]
pub struct FirebaseIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AuthError {
    /// The token is malformed, forged, expired or for another project.
    Rejected(String),
    /// Signing keys could not be fetched, so the token was not judged.
    Transient(String),
}

fn rejected(reason: impl Into<String>) -> AuthError {
    AuthError::Rejected(reason.into())
}

/// Claims the verifier reads beyond what `jsonwebtoken` validates.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    iat: Option<u64>,
    auth_time: Option<u64>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl IdTokenClaims {
    fn check(&self, now: u64) -> Result<(), AuthError> {
        if self.sub.is_empty() || self.sub.len() > MAX_UID_LEN {
            return Err(rejected("sub must be 1-128 characters"));
        }
        for (claim, value) in [("iat", self.iat), ("auth_time", self.auth_time)] {
            match value {
                None => return Err(rejected(format!("missing {claim} claim"))),
                Some(t) if t > now + CLOCK_SKEW_SECS => {
                    return Err(rejected(format!("{claim} is in the future")))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn into_identity(self) -> FirebaseIdentity {
        FirebaseIdentity {
            uid: self.sub,
            email: self.email,
            name: self.name,
            picture: self.picture,
        }
    }
}

/// Where signing keys come from.
enum KeySource {
    Google(GoogleKeys),
    /// A single fixed key, for tests and local development.
    Static { kid: String, key: Arc<DecodingKey> },
}

/// Verifier for Firebase Authentication ID tokens.
pub struct FirebaseVerifier {
    project_id: String,
    validation: Validation,
    keys: KeySource,
}

impl FirebaseVerifier {
    /// Verifier that trusts Google's published `securetoken` keys.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(KEY_FETCH_TIMEOUT)
            .build()
            .context("failed to build key fetch HTTP client")?;

        let verifier = Self::build(config, KeySource::Google(GoogleKeys::new(http)))?;
        tracing::info!(project_id = %verifier.project_id, "Firebase token verifier ready");
        Ok(verifier)
    }

    /// Verifier that trusts exactly one RSA public key under `kid`.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        anyhow::ensure!(!kid.trim().is_empty(), "static key id must not be empty");

        Self::build(
            config,
            KeySource::Static {
                kid,
                key: Arc::new(key),
            },
        )
    }

    fn build(config: &Config, keys: KeySource) -> anyhow::Result<Self> {
        let project_id = config.firebase_project_id.trim().to_string();
        anyhow::ensure!(!project_id.is_empty(), "Firebase project id must not be empty");

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[format!("{}/{}", SECURETOKEN_ISSUER, project_id)]);
        validation.set_audience(&[project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        Ok(Self {
            project_id,
            validation,
            keys,
        })
    }

    /// Verify a raw ID token and return the identity it carries.
    pub async fn verify_token(&self, token: &str) -> Result<FirebaseIdentity, AuthError> {
        let header =
            decode_header(token).map_err(|e| rejected(format!("unreadable JWT header: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(rejected(format!("unsupported JWT alg {:?}", header.alg)));
        }
        let kid = header.kid.ok_or_else(|| rejected("JWT has no kid"))?;

        let key = match &self.keys {
            KeySource::Static { kid: known, key } if *known == kid => key.clone(),
            KeySource::Static { .. } => return Err(rejected(format!("unknown kid {kid}"))),
            KeySource::Google(google) => google.key(&kid).await?,
        };

        let claims = decode::<IdTokenClaims>(token, &key, &self.validation)
            .map_err(|e| rejected(format!("JWT validation failed: {e}")))?
            .claims;
        claims.check(unix_now())?;

        tracing::debug!(uid = %claims.sub, "Firebase token verified");
        Ok(claims.into_identity())
    }
}

/// Google's signing keys with a TTL, refreshed by one task at a time.
struct GoogleKeys {
    http: reqwest::Client,
    current: RwLock<Option<KeySet>>,
    refresh: Mutex<()>,
}

struct KeySet {
    keys: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Instant,
    ttl: Duration,
}

impl KeySet {
    /// The key for `kid` if this set is still fresh.
    fn lookup(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        if self.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        self.keys.get(kid).cloned()
    }
}

impl GoogleKeys {
    fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    async fn cached(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        self.current.read().await.as_ref()?.lookup(kid)
    }

    /// Find the key for `kid`, fetching the key set at most once per miss.
    ///
    /// An unknown `kid` triggers a fetch even when the cached set is fresh.
    async fn key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }

        let _refreshing = self.refresh.lock().await;
        // Another task may have refreshed while we waited.
        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }

        let set = self.fetch().await?;
        let key = set.keys.get(kid).cloned();
        *self.current.write().await = Some(set);

        key.ok_or_else(|| rejected(format!("kid {kid} not among Google's signing keys")))
    }

    async fn fetch(&self) -> Result<KeySet, AuthError> {
        tracing::debug!(url = SECURETOKEN_JWKS_URL, "Fetching Firebase signing keys");

        let response = self
            .http
            .get(SECURETOKEN_JWKS_URL)
            .send()
            .await
            .map_err(|e| AuthError::Transient(format!("key fetch failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Transient(format!("key fetch returned {status}")));
        }

        let ttl = max_age(response.headers()).unwrap_or(FALLBACK_KEY_TTL);
        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| AuthError::Transient(format!("unreadable key set: {e}")))?;

        let keys = jwks.signing_keys();
        if keys.is_empty() {
            return Err(AuthError::Transient(
                "key set has no RS256 signing keys".to_string(),
            ));
        }

        tracing::debug!(keys = keys.len(), ttl_secs = ttl.as_secs(), "Firebase signing keys cached");
        Ok(KeySet {
            keys,
            fetched_at: Instant::now(),
            ttl,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
    n: String,
    e: String,
}

impl Jwk {
    fn is_rs256_signing_key(&self) -> bool {
        self.kty == "RSA"
            && !self.kid.trim().is_empty()
            && self.alg.as_deref().map_or(true, |alg| alg == "RS256")
            && self.key_use.as_deref().map_or(true, |u| u == "sig")
    }
}

impl Jwks {
    fn signing_keys(self) -> HashMap<String, Arc<DecodingKey>> {
        self.keys
            .into_iter()
            .filter(Jwk::is_rs256_signing_key)
            .filter_map(|jwk| match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => Some((jwk.kid, Arc::new(key))),
                Err(e) => {
                    tracing::warn!(kid = %jwk.kid, error = %e, "Ignoring malformed signing key");
                    None
                }
            })
            .collect()
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn extract_bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = header.ok_or_else(|| rejected("missing Authorization header"))?;
    match value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(rejected("Authorization header is not a Bearer token")),
    }
}

/// `max-age` from a `Cache-Control` header.
fn max_age(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(CACHE_CONTROL)?.to_str().ok()?;
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim_matches('"').parse().ok())
        .map(Duration::from_secs)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
