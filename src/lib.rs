// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! PE Yoga: subscription video library for school PE teachers.
//!
//! This crate provides the backend API: email/password accounts, Stripe
//! subscriptions kept in sync by webhooks, and a tier-gated video catalog.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{Mailer, StripeClient, VideoCatalog, VimeoClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub catalog: VideoCatalog,
    pub stripe: StripeClient,
    pub vimeo: VimeoClient,
    pub mailer: Mailer,
}
