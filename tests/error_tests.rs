// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};
use gift_wishlist::error::AppError;

async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_not_found_is_reported_as_internal() {
    let (status, body) = body_json(AppError::no_such_friend()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
    assert_eq!(body["message"], "No such friend");
    assert_eq!(body["type"], "internal");
}

#[tokio::test]
async fn test_self_friendship_is_bad_request() {
    let (status, body) = body_json(AppError::SelfFriendship).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot add yourself as a friend");
    assert_eq!(body["type"], "bad_request");
}

#[tokio::test]
async fn test_database_error_hides_details() {
    let (status, body) = body_json(AppError::Database("connection reset".to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["type"], "database_error");
    assert!(!body["message"].as_str().unwrap().contains("connection reset"));
}

#[test]
fn test_auth_failures_redirect_to_login() {
    for err in [
        AppError::Unauthorized,
        AppError::ProviderRejected("access_denied".to_string()),
    ] {
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }
}
