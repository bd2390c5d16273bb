//! Video catalog entries.

use crate::models::user::PlanTier;
use serde::{Deserialize, Serialize};

/// Lesson category shown as a filter in the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCategory {
    WarmUp,
    Flow,
    Balance,
    Strength,
    Breathing,
    Relaxation,
    Partner,
    Classroom,
}

impl VideoCategory {
    pub fn parse(value: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(value.to_string())).ok()
    }
}

/// A video in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Length in seconds
    pub duration: u32,
    pub category: VideoCategory,
    pub required_tier: PlanTier,
    /// Video ID at the hosting provider
    pub vimeo_id: String,
}

impl Video {
    pub fn is_accessible_to(&self, tier: PlanTier) -> bool {
        tier.grants(self.required_tier)
    }
}
