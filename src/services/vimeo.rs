// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Vimeo API client used by the library proxy endpoint.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Vimeo API client.
#[derive(Clone)]
pub struct VimeoClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl VimeoClient {
    pub fn new(access_token: Option<String>, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// List videos owned by the authenticated Vimeo account.
    pub async fn list_videos(&self, page: u32, per_page: u32) -> Result<VimeoVideoPage, AppError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(AppError::Misconfigured("VIMEO_ACCESS_TOKEN"))?;

        let url = format!("{}/me/videos", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/vnd.vimeo.*+json;version=3.4")
            .query(&[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                (
                    "fields",
                    "uri,name,description,duration,link,pictures.sizes".to_string(),
                ),
            ])
            .send()
            .await
            .map_err(|e| AppError::VimeoApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::VimeoApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::VimeoApi(format!("JSON parse error: {}", e)))
    }
}

/// One page of `/me/videos`.
#[derive(Debug, Clone, Deserialize)]
pub struct VimeoVideoPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub data: Vec<VimeoVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VimeoVideo {
    /// e.g. `/videos/812340011`
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub pictures: Option<VimeoPictures>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VimeoPictures {
    #[serde(default)]
    pub sizes: Vec<VimeoPictureSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VimeoPictureSize {
    pub width: u32,
    pub link: String,
}

impl VimeoVideo {
    /// Numeric video ID taken from the URI.
    pub fn id(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or(&self.uri)
    }

    /// Largest thumbnail no wider than 640px, or the smallest available.
    pub fn thumbnail(&self) -> Option<&str> {
        let sizes = &self.pictures.as_ref()?.sizes;
        sizes
            .iter()
            .filter(|s| s.width <= 640)
            .max_by_key(|s| s.width)
            .or_else(|| sizes.iter().min_by_key(|s| s.width))
            .map(|s| s.link.as_str())
    }
}

/// Simplified video entry returned by the proxy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VimeoVideoSummary {
    pub vimeo_id: String,
    pub name: String,
    pub description: Option<String>,
    pub duration: u32,
    pub link: Option<String>,
    pub thumbnail: Option<String>,
}

impl From<&VimeoVideo> for VimeoVideoSummary {
    fn from(video: &VimeoVideo) -> Self {
        Self {
            vimeo_id: video.id().to_string(),
            name: video.name.clone(),
            description: video.description.clone(),
            duration: video.duration,
            link: video.link.clone(),
            thumbnail: video.thumbnail().map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(sizes: &[u32]) -> VimeoVideo {
        serde_json::from_value(serde_json::json!({
            "uri": "/videos/812340011",
            "name": "Sun Salutation Basics",
            "duration": 480,
            "pictures": {
                "sizes": sizes.iter().map(|w| serde_json::json!({
                    "width": w,
                    "link": format!("https://i.vimeocdn.com/{}.jpg", w)
                })).collect::<Vec<_>>()
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_id_from_uri() {
        assert_eq!(video(&[]).id(), "812340011");
    }

    #[test]
    fn test_thumbnail_selection() {
        assert_eq!(
            video(&[100, 295, 640, 1280]).thumbnail(),
            Some("https://i.vimeocdn.com/640.jpg")
        );
        assert_eq!(
            video(&[1280, 1920]).thumbnail(),
            Some("https://i.vimeocdn.com/1280.jpg")
        );
        assert_eq!(video(&[]).thumbnail(), None);
    }

    #[tokio::test]
    async fn test_missing_token_is_config_error() {
        let client = VimeoClient::new(None, "http://127.0.0.1:9".to_string());
        let err = client.list_videos(1, 10).await.unwrap_err();
        assert!(matches!(err, AppError::Misconfigured("VIMEO_ACCESS_TOKEN")));
    }
}
