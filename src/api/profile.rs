//! Profile endpoints, mounted at `/api/profile`
//!
//! - `GET  /me`                  caller's profile (auth)
//! - `POST /`                    create or update caller's profile (auth)
//! - `GET  /`                    all profiles
//! - `GET  /user/{user_id}`      profile by user id
//! - `GET  /getreddit/{user_id}` relay the top-news listing

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use super::error::ApiError;
use super::validation::ValidatedJson;
use crate::AppState;
use crate::auth::AuthUser;
use crate::db::{PopulatedProfile, ProfileRecord, UpsertProfile};

/// Body of `POST /api/profile`.
///
/// Every field is optional; a key left out (or sent as `null`) keeps the stored value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileInput {
    /// Comma-separated subreddit names
    #[serde(rename = "favSubreddits")]
    #[validate(length(max = 2000, message = "Subreddit list is too long"))]
    pub fav_subreddits: Option<String>,

    #[serde(rename = "newsletterSendTime")]
    #[validate(length(min = 1, max = 32, message = "Newsletter send time must be 1 to 32 characters"))]
    pub newsletter_send_time: Option<String>,

    #[serde(rename = "wantsNewsletter")]
    pub wants_newsletter: Option<bool>,
}

impl From<ProfileInput> for UpsertProfile {
    fn from(input: ProfileInput) -> Self {
        Self {
            fav_subreddits: input.fav_subreddits.as_deref().map(split_subreddits),
            newsletter_send_time: input.newsletter_send_time,
            wants_newsletter: input.wants_newsletter,
        }
    }
}

/// Split a comma-separated list, trimming each entry. Order, duplicates and empty
/// entries are kept. A blank string is the empty list.
pub fn split_subreddits(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

/// Get the current user's profile
async fn get_own_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PopulatedProfile>, ApiError> {
    let profile = state
        .db
        .profiles()
        .get_populated_by_user(auth.user_id)
        .await?
        .ok_or(ApiError::NotFound("There is no profile for this user"))?;

    Ok(Json(profile))
}

/// Create or update the current user's profile
async fn upsert_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<ProfileInput>,
) -> Result<Json<ProfileRecord>, ApiError> {
    let profile = state.db.profiles().upsert(auth.user_id, input.into()).await?;

    tracing::debug!(user_id = %auth.user_id, profile_id = %profile.id, "Profile saved");
    Ok(Json(profile))
}

/// List all profiles
async fn list_profiles(State(state): State<AppState>) -> Result<Json<Vec<PopulatedProfile>>, ApiError> {
    Ok(Json(state.db.profiles().list_populated().await?))
}

/// Get a profile by user id. Malformed ids are reported the same way as missing profiles.
async fn get_profile_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PopulatedProfile>, ApiError> {
    let user_id =
        Uuid::parse_str(&user_id).map_err(|_| ApiError::NotFound("Profile not found"))?;

    let profile = state
        .db
        .profiles()
        .get_populated_by_user(user_id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;

    Ok(Json(profile))
}

/// Relay the top-news listing. The user id in the path is accepted but not used.
async fn get_feed(
    State(state): State<AppState>,
    Path(_user_id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    Ok(Json(state.feed.top_listing().await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_profiles).post(upsert_profile))
        .route("/me", get(get_own_profile))
        .route("/user/{user_id}", get(get_profile_by_user))
        .route("/getreddit/{user_id}", get(get_feed))
}
