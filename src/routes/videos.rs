// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Video library routes.

use axum::{
    extract::{Extension, Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{authenticate, AuthUser};
use crate::models::{PlanTier, Video, VideoCategory};
use crate::AppState;

/// Listing is open to everyone; locked entries are marked.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/videos", get(list_videos))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/videos/{id}", get(get_video))
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub category: Option<String>,
}

/// Catalog entry as seen by a particular caller.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub category: VideoCategory,
    pub required_tier: PlanTier,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vimeo_id: Option<String>,
}

impl VideoListItem {
    fn for_tier(video: &Video, tier: PlanTier) -> Self {
        let locked = !video.is_accessible_to(tier);
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            duration: video.duration,
            category: video.category,
            required_tier: video.required_tier,
            locked,
            vimeo_id: (!locked).then(|| video.vimeo_id.clone()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListResponse {
    pub tier: PlanTier,
    pub videos: Vec<VideoListItem>,
}

/// List the catalog. Callers without a usable session see the bronze view.
async fn list_videos(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<VideoListResponse>> {
    let category = match params.category.as_deref().filter(|c| !c.is_empty()) {
        Some(raw) => Some(
            VideoCategory::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown category: {}", raw)))?,
        ),
        None => None,
    };

    let tier = match authenticate(&state, &headers) {
        Ok(user) => user.subscription.effective_tier(),
        Err(AppError::TokenMissing) => PlanTier::Bronze,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unusable session on video listing");
            PlanTier::Bronze
        }
    };

    let videos = state
        .catalog
        .list(category)
        .map(|v| VideoListItem::for_tier(v, tier))
        .collect();

    Ok(Json(VideoListResponse { tier, videos }))
}

/// Full video, including the player ID, if the caller's plan allows it.
///
/// The plan is read from the stored user, not the token snapshot.
async fn get_video(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Video>> {
    let video = state
        .catalog
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("video {}", id)))?;

    let user = state
        .db
        .get_user(&auth_user.id())
        .await?
        .ok_or(AppError::UserNotFound)?;
    let tier = user.subscription.effective_tier();

    if !video.is_accessible_to(tier) {
        tracing::info!(
            user_id = %user.id,
            video_id = %video.id,
            tier = %tier,
            required = %video.required_tier,
            "Video access denied"
        );
        return Err(AppError::TierRequired {
            required: video.required_tier,
        });
    }

    Ok(Json(video.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(required_tier: PlanTier) -> Video {
        Video {
            id: "tree-pose".to_string(),
            title: "Tree Pose".to_string(),
            description: String::new(),
            duration: 300,
            category: VideoCategory::Balance,
            required_tier,
            vimeo_id: "1002".to_string(),
        }
    }

    #[test]
    fn test_locked_item_hides_player_id() {
        let item = VideoListItem::for_tier(&video(PlanTier::Gold), PlanTier::Silver);
        assert!(item.locked);
        assert!(item.vimeo_id.is_none());

        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("vimeoId").is_none());
        assert_eq!(json["requiredTier"], "gold");
    }

    #[test]
    fn test_unlocked_item_has_player_id() {
        let item = VideoListItem::for_tier(&video(PlanTier::Silver), PlanTier::Gold);
        assert!(!item.locked);
        assert_eq!(item.vimeo_id.as_deref(), Some("1002"));
    }
}
