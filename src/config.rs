// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup. A `.env` file is honored for local development.

use crate::models::PlanTier;
use std::env;

const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_VIMEO_API_BASE: &str = "https://api.vimeo.com";
const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Outbound mail settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address, e.g. `PE Yoga <no-reply@example.com>`
    pub from: String,
}

/// Vimeo API credentials.
#[derive(Debug, Clone)]
pub struct VimeoConfig {
    pub access_token: Option<String>,
    pub api_base: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Public site URL, used for redirects and links in emails
    pub base_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Path to the static video catalog
    pub video_catalog_path: String,
    /// Stripe publishable key (handed to the frontend)
    pub stripe_publishable_key: Option<String>,
    pub stripe_silver_price_id: String,
    pub stripe_gold_price_id: String,
    pub stripe_api_base: String,

    // --- Secrets ---
    /// Session token signing secret. Requests needing it fail with a
    /// server configuration error when unset.
    pub jwt_secret: Option<Vec<u8>>,
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret (`whsec_...`)
    pub stripe_webhook_secret: String,

    pub smtp: Option<SmtpConfig>,
    pub vimeo: VimeoConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: optional("SMTP_PORT")
                    .map(|p| p.parse().map_err(|_| ConfigError::Invalid("SMTP_PORT")))
                    .transpose()?
                    .unwrap_or(587),
                username: optional("SMTP_USER"),
                password: optional("SMTP_PASSWORD"),
                from: optional("SMTP_FROM").ok_or(ConfigError::Missing("SMTP_FROM"))?,
            }),
            None => None,
        };

        Ok(Self {
            base_url: optional("BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            video_catalog_path: env::var("VIDEO_CATALOG_PATH")
                .unwrap_or_else(|_| "data/videos.json".to_string()),
            stripe_publishable_key: optional("STRIPE_PUBLISHABLE_KEY"),
            stripe_silver_price_id: required("STRIPE_SILVER_PRICE_ID")?,
            stripe_gold_price_id: required("STRIPE_GOLD_PRICE_ID")?,
            stripe_api_base: optional("STRIPE_API_BASE")
                .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),

            jwt_secret: optional("JWT_SECRET").map(String::into_bytes),
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,

            smtp,
            vimeo: VimeoConfig {
                access_token: optional("VIMEO_ACCESS_TOKEN"),
                api_base: optional("VIMEO_API_BASE")
                    .unwrap_or_else(|| DEFAULT_VIMEO_API_BASE.to_string()),
            },
        })
    }

    /// Config for tests: every secret set, no SMTP, no Vimeo token, and
    /// provider base URLs that refuse connections.
    pub fn test_default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            video_catalog_path: "data/videos.json".to_string(),
            stripe_publishable_key: Some("pk_test_123".to_string()),
            stripe_silver_price_id: "price_silver_test".to_string(),
            stripe_gold_price_id: "price_gold_test".to_string(),
            stripe_api_base: "http://127.0.0.1:9".to_string(),
            jwt_secret: Some(b"test_jwt_key_32_bytes_minimum!!".to_vec()),
            stripe_secret_key: "sk_test_123".to_string(),
            stripe_webhook_secret: "whsec_test_secret".to_string(),
            smtp: None,
            vimeo: VimeoConfig {
                access_token: None,
                api_base: "http://127.0.0.1:9".to_string(),
            },
        }
    }

    /// Stripe price for a purchasable tier.
    pub fn price_id_for(&self, tier: PlanTier) -> Option<&str> {
        match tier {
            PlanTier::Bronze => None,
            PlanTier::Silver => Some(&self.stripe_silver_price_id),
            PlanTier::Gold => Some(&self.stripe_gold_price_id),
        }
    }

    /// Reverse lookup of [`Config::price_id_for`].
    pub fn tier_for_price(&self, price_id: &str) -> Option<PlanTier> {
        if price_id == self.stripe_silver_price_id {
            Some(PlanTier::Silver)
        } else if price_id == self.stripe_gold_price_id {
            Some(PlanTier::Gold)
        } else {
            None
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

/// Read a variable, treating blank values as unset.
fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("STRIPE_SECRET_KEY", "sk_test_env");
        env::set_var("STRIPE_WEBHOOK_SECRET", "whsec_env");
        env::set_var("STRIPE_SILVER_PRICE_ID", "price_s");
        env::set_var("STRIPE_GOLD_PRICE_ID", "price_g");
        env::set_var("JWT_SECRET", "test_jwt_key_32_bytes_minimum!!");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.stripe_secret_key, "sk_test_env");
        assert_eq!(config.tier_for_price("price_g"), Some(PlanTier::Gold));
        assert_eq!(config.price_id_for(PlanTier::Silver), Some("price_s"));
        assert_eq!(config.price_id_for(PlanTier::Bronze), None);
        assert!(config.jwt_secret.is_some());
    }

    #[test]
    fn test_price_lookup_unknown() {
        let config = Config::test_default();
        assert_eq!(config.tier_for_price("price_other"), None);
    }
}
