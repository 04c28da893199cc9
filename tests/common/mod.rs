// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use gift_wishlist::config::{Config, CredentialMode};
use gift_wishlist::db::{Directory, FirestoreDb, MemoryDb};
use gift_wishlist::models::Photo;
use gift_wishlist::routes::create_router;
use gift_wishlist::services::{
    Handshake, IdentityProvider, ProviderError, ProviderProfile,
};
use gift_wishlist::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> Directory {
    Directory::firestore(
        FirestoreDb::new("test-project")
            .await
            .expect("Failed to connect to Firestore emulator"),
    )
}

/// Identity provider fixture.
///
/// The authorization code is the provider id; `"denied"` is refused and
/// `"flaky"` fails as if Google were down.
#[allow(dead_code)]
pub struct FakeProvider;

#[allow(dead_code)]
pub const FAKE_AUTHORIZE_URL: &str = "https://accounts.example.test/auth";

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorize_url(&self, scopes: &[&str], state: &str) -> String {
        format!(
            "{}?scope={}&state={}",
            FAKE_AUTHORIZE_URL,
            urlencoding::encode(&scopes.join(" ")),
            state
        )
    }

    async fn complete_handshake(&self, code: &str) -> Result<Handshake, ProviderError> {
        match code {
            "denied" => Err(ProviderError::Rejected("invalid_grant".to_string())),
            "flaky" => Err(ProviderError::Transient("connection reset".to_string())),
            id => Ok(Handshake {
                access_token: format!("access-{id}"),
                refresh_token: None,
                profile: ProviderProfile {
                    id: id.to_string(),
                    display_name: display_name_for(id),
                    photos: vec![Photo {
                        value: format!("https://photos.example.test/{id}.jpg"),
                    }],
                },
            }),
        }
    }
}

/// Display name the fake provider reports for a provider id.
#[allow(dead_code)]
pub fn display_name_for(id: &str) -> String {
    format!("User {id}")
}

/// Create a test app backed by an in-memory directory.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(mode: CredentialMode) -> (Router, Arc<AppState>) {
    let config = Config {
        credential_mode: mode,
        ..Config::test_default()
    };
    let db = Directory::memory(Arc::new(MemoryDb::new()));
    let state = Arc::new(
        AppState::new(config, db, Arc::new(FakeProvider)).expect("test config is valid"),
    );
    (create_router(state.clone()), state)
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// `name=value` part of a Set-Cookie header, suitable for a Cookie header.
#[allow(dead_code)]
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

#[allow(dead_code)]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

#[allow(dead_code)]
pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn post_form(app: &Router, uri: &str, cookie: Option<&str>, form: &str) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(form.to_string())).unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Start a login and return the `state` parameter and the nonce cookie pair.
#[allow(dead_code)]
pub async fn start_login(app: &Router) -> (String, String) {
    let response = get(app, "/login/google", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let target = location(&response);
    assert!(target.starts_with(FAKE_AUTHORIZE_URL));
    let state = target
        .split("state=")
        .nth(1)
        .expect("authorize url carries state")
        .to_string();

    let nonce = cookie_pair(&find_cookie(&set_cookie_headers(&response), "oauth_nonce"));
    (state, nonce)
}

/// Run the whole login flow for provider id `code` and return the
/// credential as a Cookie header value.
#[allow(dead_code)]
pub async fn login(app: &Router, code: &str, credential_cookie: &str) -> String {
    let (state, nonce) = start_login(app).await;

    let response = get(
        app,
        &format!("/login/google/return?code={code}&state={state}"),
        Some(&nonce),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    cookie_pair(&find_cookie(&set_cookie_headers(&response), credential_cookie))
}
