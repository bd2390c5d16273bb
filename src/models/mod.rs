// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Data models for the application.

pub mod user;
pub mod video;

pub use user::{normalize_email, PlanTier, Subscription, SubscriptionStatus, User};
pub use video::{Video, VideoCategory};
