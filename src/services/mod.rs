// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Services module - business logic layer.

pub mod catalog;
pub mod mailer;
pub mod password;
pub mod stripe;
pub mod subscriptions;
pub mod vimeo;
pub mod webhook;

pub use catalog::VideoCatalog;
pub use mailer::Mailer;
pub use stripe::StripeClient;
pub use subscriptions::{EventOutcome, SubscriptionSync};
pub use vimeo::VimeoClient;
