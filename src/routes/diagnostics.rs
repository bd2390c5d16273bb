// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Operational endpoints: SMTP check and the Vimeo library proxy.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::services::vimeo::VimeoVideoSummary;
use crate::AppState;

const DEFAULT_PER_PAGE: u32 = 25;
const MAX_PER_PAGE: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/test/smtp", get(test_smtp))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/vimeo", get(list_vimeo_videos))
}

#[derive(Serialize)]
pub struct SmtpCheckResponse {
    pub success: bool,
    pub host: String,
    pub port: u16,
}

/// Connect to the configured relay.
async fn test_smtp(State(state): State<Arc<AppState>>) -> Result<Json<SmtpCheckResponse>> {
    let (host, port) = state.mailer.test_connection().await?;
    tracing::info!(host = %host, port = port, "SMTP connection test succeeded");

    Ok(Json(SmtpCheckResponse {
        success: true,
        host,
        port,
    }))
}

#[derive(Deserialize)]
pub struct VimeoParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VimeoListResponse {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub videos: Vec<VimeoVideoSummary>,
}

async fn list_vimeo_videos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VimeoParams>,
) -> Result<Json<VimeoListResponse>> {
    let page = params.page.max(1);
    let per_page = params.per_page.clamp(1, MAX_PER_PAGE);

    let result = state.vimeo.list_videos(page, per_page).await?;

    Ok(Json(VimeoListResponse {
        total: result.total,
        page,
        per_page,
        videos: result.data.iter().map(VimeoVideoSummary::from).collect(),
    }))
}
