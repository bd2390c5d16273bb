// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Stripe webhook signature verification and event payloads.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>,v1=<hex>`.
//! Each `v1` is HMAC-SHA256 over `"{t}.{raw body}"` keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed payload, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: u64 = 300;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing Stripe-Signature header")]
    MissingHeader,
    #[error("no timestamp in signature header")]
    MissingTimestamp,
    #[error("no v1 signatures in header")]
    NoSignatures,
    #[error("timestamp outside the tolerance window")]
    TimestampOutsideTolerance,
    #[error("no signature matches the payload")]
    Mismatch,
    #[error("webhook secret cannot be used as an HMAC key")]
    InvalidKey,
}

fn compute_signature(
    payload: &[u8],
    secret: &str,
    timestamp: i64,
) -> Result<Vec<u8>, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Build a `Stripe-Signature` header value for a payload.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(compute_signature(payload, secret, timestamp)?)
    ))
}

/// Verify a `Stripe-Signature` header against the raw request body.
pub fn verify_signature(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::MissingHeader)?;

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => {
                if let Ok(sig) = hex::decode(value) {
                    signatures.push(sig);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(SignatureError::NoSignatures);
    }
    if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::TimestampOutsideTolerance);
    }

    let expected = compute_signature(payload, secret, timestamp)?;
    let matched = signatures
        .iter()
        .any(|sig| bool::from(sig.as_slice().ct_eq(expected.as_slice())));

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

// ─── Event Payloads ──────────────────────────────────────────

/// Top-level webhook event.
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// `checkout.session.completed` object.
#[derive(Debug, Deserialize)]
pub struct CheckoutSessionObject {
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// `customer.subscription.*` object.
#[derive(Debug, Deserialize)]
pub struct SubscriptionObject {
    #[serde(default)]
    pub id: Option<String>,
    pub customer: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub items: Option<SubscriptionItems>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SubscriptionObject {
    /// Price of the first subscription item.
    pub fn price_id(&self) -> Option<&str> {
        self.items
            .as_ref()?
            .data
            .first()?
            .price
            .as_ref()
            .map(|p| p.id.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionItem {
    #[serde(default)]
    pub price: Option<Price>,
}

#[derive(Debug, Deserialize)]
pub struct Price {
    pub id: String,
}

/// `invoice.*` object.
#[derive(Debug, Deserialize)]
pub struct InvoiceObject {
    pub customer: String,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const NOW: i64 = 1_750_000_000;

    #[test]
    fn test_valid_signature() {
        let body = br#"{"type":"ping"}"#;
        let header = sign_payload(body, SECRET, NOW).unwrap();
        assert_eq!(verify_signature(body, Some(&header), SECRET, NOW), Ok(()));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let header = sign_payload(b"original", SECRET, NOW).unwrap();
        assert_eq!(
            verify_signature(b"tampered", Some(&header), SECRET, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let header = sign_payload(b"body", "whsec_other", NOW).unwrap();
        assert_eq!(
            verify_signature(b"body", Some(&header), SECRET, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let header = sign_payload(b"body", SECRET, NOW - SIGNATURE_TOLERANCE_SECS as i64 - 1).unwrap();
        assert_eq!(
            verify_signature(b"body", Some(&header), SECRET, NOW),
            Err(SignatureError::TimestampOutsideTolerance)
        );
    }

    #[test]
    fn test_any_v1_may_match() {
        let good = sign_payload(b"body", SECRET, NOW).unwrap();
        let good_sig = good.split_once(",v1=").unwrap().1;
        let header = format!("t={},v1={},v1={}", NOW, "00".repeat(32), good_sig);
        assert_eq!(verify_signature(b"body", Some(&header), SECRET, NOW), Ok(()));
    }

    #[test]
    fn test_malformed_headers() {
        assert_eq!(
            verify_signature(b"body", None, SECRET, NOW),
            Err(SignatureError::MissingHeader)
        );
        assert_eq!(
            verify_signature(b"body", Some("v1=abcd"), SECRET, NOW),
            Err(SignatureError::MissingTimestamp)
        );
        assert_eq!(
            verify_signature(b"body", Some(&format!("t={}", NOW)), SECRET, NOW),
            Err(SignatureError::NoSignatures)
        );
    }

    #[test]
    fn test_extreme_timestamps_rejected() {
        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={},v1={}", t, "00".repeat(32));
            assert_eq!(
                verify_signature(b"body", Some(&header), SECRET, NOW),
                Err(SignatureError::TimestampOutsideTolerance)
            );
        }
    }

    #[test]
    fn test_subscription_price_id() {
        let obj: SubscriptionObject = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "customer": "cus_1",
            "items": {"data": [{"price": {"id": "price_gold"}}]}
        }))
        .unwrap();
        assert_eq!(obj.price_id(), Some("price_gold"));
    }
}
