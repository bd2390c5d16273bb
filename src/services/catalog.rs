// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Static video catalog, loaded once at startup.

use crate::models::{Video, VideoCategory};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Service holding the video library and answering access questions.
#[derive(Default, Clone)]
pub struct VideoCatalog {
    videos: Vec<Video>,
}

impl VideoCatalog {
    /// Load the catalog from a JSON file (an array of videos).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load the catalog from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let videos: Vec<Video> =
            serde_json::from_str(json_data).map_err(|e| CatalogError::ParseError(e.to_string()))?;
        Self::from_videos(videos)
    }

    /// Build a catalog, rejecting duplicate IDs.
    pub fn from_videos(videos: Vec<Video>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for video in &videos {
            if !seen.insert(video.id.as_str()) {
                return Err(CatalogError::DuplicateId(video.id.clone()));
            }
        }

        tracing::info!(count = videos.len(), "Loaded video catalog");
        Ok(Self { videos })
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn get(&self, id: &str) -> Option<&Video> {
        self.videos.iter().find(|v| v.id == id)
    }

    /// Videos, optionally limited to one category, in catalog order.
    pub fn list(&self, category: Option<VideoCategory>) -> impl Iterator<Item = &Video> {
        self.videos
            .iter()
            .filter(move |v| category.map_or(true, |c| v.category == c))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Duplicate video id: {0}")]
    DuplicateId(String),
}
