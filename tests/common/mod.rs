// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use studylist::config::Config;
use studylist::db::UserStore;
use studylist::routes::create_router;
use studylist::services::FirebaseVerifier;
use studylist::AppState;
use tower::ServiceExt;

/// Key id the test verifier trusts.
#[allow(dead_code)]
pub const TEST_KID: &str = "test-key-1";

const PRIVATE_KEY_PEM: &[u8] = include_bytes!("../fixtures/firebase_test_key.pem");
const PUBLIC_KEY_PEM: &[u8] = include_bytes!("../fixtures/firebase_test_key.pub.pem");

/// Check if a MongoDB test server is configured.
#[allow(dead_code)]
pub fn mongo_available() -> bool {
    std::env::var("MONGODB_TEST_URI").is_ok()
}

/// Skip test with message if MongoDB is not available.
#[macro_export]
macro_rules! require_mongo {
    () => {
        if !crate::common::mongo_available() {
            eprintln!("⚠️  Skipping: MONGODB_TEST_URI not set");
            return;
        }
    };
}

/// Verifier that trusts the fixture key instead of Google's JWKS.
#[allow(dead_code)]
pub fn test_verifier(config: &Config) -> FirebaseVerifier {
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM).expect("fixture public key");
    FirebaseVerifier::new_with_static_key(config, TEST_KID, key).expect("static verifier")
}

/// Create a test app with the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let firebase_verifier = Arc::new(test_verifier(&config));

    let state = Arc::new(AppState {
        config,
        db: UserStore::new_in_memory(),
        firebase_verifier,
    });

    (create_router(state.clone()), state)
}

#[derive(Serialize)]
pub struct TestClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub auth_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[allow(dead_code)]
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Claims that the test verifier accepts for `uid`.
#[allow(dead_code)]
pub fn valid_claims(uid: &str) -> TestClaims {
    let now = now_secs();
    let project = Config::test_default().firebase_project_id;
    TestClaims {
        iss: format!("https://securetoken.google.com/{}", project),
        aud: project,
        sub: uid.to_string(),
        iat: now,
        exp: now + 3600,
        auth_time: now,
        email: Some(format!("{}@example.com", uid)),
        name: Some("Test User".to_string()),
    }
}

/// Sign arbitrary claims with the fixture key under `kid`.
#[allow(dead_code)]
pub fn sign_token(claims: &TestClaims, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM).expect("fixture private key");
    encode(&header, claims, &key).expect("sign token")
}

/// A valid Firebase-style ID token for `uid`.
#[allow(dead_code)]
pub fn create_test_token(uid: &str) -> String {
    sign_token(&valid_claims(uid), TEST_KID)
}

/// Send one request through the router and decode the JSON response.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Sign up `uid` and return its token.
#[allow(dead_code)]
pub async fn sign_up(app: &axum::Router, uid: &str) -> String {
    let token = create_test_token(uid);
    let (status, _) = send(
        app,
        Method::POST,
        "/api/users",
        Some(&token),
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    token
}

/// Create a topic and return its id.
#[allow(dead_code)]
pub async fn create_topic(app: &axum::Router, uid: &str, token: &str, name: &str) -> String {
    let (status, user) = send(
        app,
        Method::POST,
        &format!("/api/users/{}/topics", uid),
        Some(token),
        Some(serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    topic_by_name(&user, name)["_id"].as_str().unwrap().to_string()
}

/// Add a material and return its id.
#[allow(dead_code)]
pub async fn add_material(
    app: &axum::Router,
    uid: &str,
    token: &str,
    topic_id: &str,
    body: Value,
) -> String {
    let title = body["title"].as_str().unwrap().to_string();
    let (status, user) = send(
        app,
        Method::POST,
        &format!("/api/users/{}/topics/{}/materials", uid, topic_id),
        Some(token),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "add material failed: {}", user);
    material_by_title(&user, topic_id, &title)["_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[allow(dead_code)]
pub fn topic_by_name<'a>(user: &'a Value, name: &str) -> &'a Value {
    user["topics"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == name)
        .expect("topic present")
}

#[allow(dead_code)]
pub fn topic_by_id<'a>(user: &'a Value, topic_id: &str) -> &'a Value {
    user["topics"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["_id"] == topic_id)
        .expect("topic present")
}

#[allow(dead_code)]
pub fn material_by_title<'a>(user: &'a Value, topic_id: &str, title: &str) -> &'a Value {
    topic_by_id(user, topic_id)["materials"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["title"] == title)
        .expect("material present")
}

#[allow(dead_code)]
pub fn material_titles(user: &Value, topic_id: &str) -> Vec<String> {
    topic_by_id(user, topic_id)["materials"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect()
}

/// Today's ledger record, if any.
#[allow(dead_code)]
pub fn today_record(user: &Value) -> Option<&Value> {
    let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
    user["contributions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["date"] == today.as_str())
}
