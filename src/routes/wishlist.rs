// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wishlist routes: home view, gifts, friends and claiming.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::User;
use crate::services::wishlist::HomeUser;
use crate::services::NewGift;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/gifts", post(add_gift))
        .route("/friends", post(add_friend))
        .route("/friends/{google_id}", get(friend_page))
        .route(
            "/friends/{friend_id}/gifts/{gift_id}/complete",
            post(complete_gift),
        )
}

#[derive(Serialize)]
pub struct HomeResponse {
    pub user: Option<HomeUser>,
}

/// Home view: anonymous callers get `{user: null}`.
async fn home(
    State(state): State<Arc<AppState>>,
    auth: Option<AuthUser>,
) -> Result<Json<HomeResponse>> {
    let Some(auth) = auth else {
        return Ok(Json(HomeResponse { user: None }));
    };

    let user = match state.wishlist.home(&auth).await {
        Ok(user) => Some(user),
        Err(AppError::NotFound(_)) => {
            tracing::debug!(user_id = %auth.user_id, "Credential names a missing user");
            None
        }
        Err(e) => return Err(e),
    };

    Ok(Json(HomeResponse { user }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GiftForm {
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(url)]
    #[serde(default)]
    pub url: Option<String>,
}

async fn add_gift(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    WithRejection(Form(mut form), _): WithRejection<Form<GiftForm>, AppError>,
) -> Result<Redirect> {
    // Browsers submit an empty field rather than omitting it
    form.url = form.url.filter(|u| !u.trim().is_empty());
    form.validate()?;

    state
        .wishlist
        .add_gift(
            &auth,
            NewGift {
                description: form.description,
                url: form.url,
            },
        )
        .await?;

    Ok(Redirect::to("/"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct FriendForm {
    #[validate(length(min = 1, max = 255))]
    pub google_id: String,
}

async fn add_friend(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    WithRejection(Form(form), _): WithRejection<Form<FriendForm>, AppError>,
) -> Result<Redirect> {
    form.validate()?;
    state.wishlist.add_friend(&auth, &form.google_id).await?;
    Ok(Redirect::to("/"))
}

#[derive(Serialize)]
pub struct FriendResponse {
    pub friend: User,
}

async fn friend_page(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(google_id): Path<String>,
) -> Result<Json<FriendResponse>> {
    let friend = state.wishlist.friend_page(&google_id).await?;
    Ok(Json(FriendResponse { friend }))
}

async fn complete_gift(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((friend_id, gift_id)): Path<(String, String)>,
) -> Result<Redirect> {
    let friend = state
        .wishlist
        .complete_gift(&auth, &friend_id, &gift_id)
        .await?;

    Ok(Redirect::to(&format!(
        "/friends/{}",
        urlencoding::encode(&friend.google_id)
    )))
}
