//! Stripe webhook signature verification.
//!
//! Stripe signs webhook requests using HMAC-SHA256 over the raw body.
//! Reference: https://docs.stripe.com/webhooks#verify-manually

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Why a `Stripe-Signature` header failed verification.
///
/// Display strings are surfaced verbatim in the 400 response body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing Stripe-Signature header")]
    MissingHeader,
    #[error("malformed Stripe-Signature header")]
    MalformedHeader,
    #[error("invalid timestamp in Stripe-Signature header")]
    InvalidTimestamp,
    #[error("timestamp outside the tolerance zone")]
    StaleTimestamp,
    #[error("no signatures found matching the expected signature for payload")]
    NoMatch,
}

/// Verify a Stripe webhook signature.
///
/// The `Stripe-Signature` header carries comma-separated elements:
/// - `t`: Unix epoch seconds when Stripe generated the signature
/// - `v1`: HMAC-SHA256 hex digest of `"{t}.{raw_body}"` (may repeat
///   during secret rotation; any matching candidate passes)
///
/// The payload must be the exact bytes Stripe sent. Verifying a
/// re-serialized body is the classic way this check breaks.
///
/// # Arguments
///
/// * `secret` - The webhook signing secret (`whsec_...`)
/// * `header` - The raw `Stripe-Signature` header value
/// * `payload` - The raw request body bytes
/// * `max_age_seconds` - Maximum allowed age of the timestamp (prevents replay attacks)
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    max_age_seconds: u64,
) -> Result<(), SignatureError> {
    if secret.is_empty() || header.is_empty() {
        warn!(
            has_secret = !secret.is_empty(),
            has_header = !header.is_empty(),
            "stripe_signature_missing_fields"
        );
        return Err(SignatureError::MalformedHeader);
    }

    let (timestamp, candidates) = parse_header(header)?;

    // Verify timestamp is not stale (prevents replay attacks)
    let webhook_time: u64 = match timestamp.parse() {
        Ok(t) => t,
        Err(_) => {
            warn!(timestamp = %timestamp, "stripe_signature_invalid_timestamp");
            return Err(SignatureError::InvalidTimestamp);
        }
    };

    let current_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let age = current_time.abs_diff(webhook_time);

    if age > max_age_seconds {
        warn!(
            webhook_time = webhook_time,
            current_time = current_time,
            age_seconds = age,
            max_age_seconds = max_age_seconds,
            "stripe_signature_stale"
        );
        return Err(SignatureError::StaleTimestamp);
    }

    // Compute expected signature: HMAC-SHA256(secret, timestamp + "." + body)
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("stripe_signature_invalid_key");
            return Err(SignatureError::NoMatch);
        }
    };

    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    let expected = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks
    let valid = candidates
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate));

    if !valid {
        warn!(
            candidate_count = candidates.len(),
            "stripe_signature_mismatch"
        );
        return Err(SignatureError::NoMatch);
    }

    Ok(())
}

/// Split the header into its timestamp and `v1` signature candidates.
///
/// Elements for other schemes (e.g. `v0` from test mode) are ignored, but
/// a header without a `t` element and at least one `v1` is malformed.
fn parse_header(header: &str) -> Result<(&str, Vec<&str>), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for element in header.split(',') {
        match element.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            Some(_) => {} // unknown scheme, skip
            None => {
                warn!("stripe_signature_malformed_header");
                return Err(SignatureError::MalformedHeader);
            }
        }
    }

    match timestamp {
        Some(t) if !candidates.is_empty() => Ok((t, candidates)),
        _ => {
            warn!(
                has_timestamp = timestamp.is_some(),
                candidate_count = candidates.len(),
                "stripe_signature_malformed_header"
            );
            Err(SignatureError::MalformedHeader)
        }
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: u64, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.", timestamp).as_bytes());
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn test_verify_valid_signature() {
        let secret = "whsec_test_secret";
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let t = now();
        let header = format!("t={},v1={}", t, sign(secret, t, payload));

        assert_eq!(verify_signature(secret, &header, payload, 300), Ok(()));
    }

    #[test]
    fn test_verify_tampered_payload() {
        let secret = "whsec_test_secret";
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let t = now();
        let header = format!("t={},v1={}", t, sign(secret, t, payload));

        let mut tampered = payload.to_vec();
        tampered[0] ^= 0x01;

        assert_eq!(
            verify_signature(secret, &header, &tampered, 300),
            Err(SignatureError::NoMatch)
        );
    }

    #[test]
    fn test_verify_tampered_signature() {
        let secret = "whsec_test_secret";
        let payload = b"payload";
        let t = now();
        let mut sig = sign(secret, t, payload);
        // Flip one hex digit
        let last = if sig.ends_with('0') { '1' } else { '0' };
        sig.pop();
        sig.push(last);
        let header = format!("t={},v1={}", t, sig);

        assert_eq!(
            verify_signature(secret, &header, payload, 300),
            Err(SignatureError::NoMatch)
        );
    }

    #[test]
    fn test_verify_wrong_secret() {
        let payload = b"payload";
        let t = now();
        let header = format!("t={},v1={}", t, sign("whsec_other_secret", t, payload));

        assert_eq!(
            verify_signature("whsec_test_secret", &header, payload, 300),
            Err(SignatureError::NoMatch)
        );
    }

    #[test]
    fn test_verify_stale_timestamp() {
        let secret = "whsec_test_secret";
        let payload = b"payload";
        // Year 2000
        let t = 946684800;
        let header = format!("t={},v1={}", t, sign(secret, t, payload));

        assert_eq!(
            verify_signature(secret, &header, payload, 300),
            Err(SignatureError::StaleTimestamp)
        );
    }

    #[test]
    fn test_verify_rotated_secret_candidates() {
        let secret = "whsec_new_secret";
        let payload = b"payload";
        let t = now();
        let header = format!(
            "t={},v1={},v1={}",
            t,
            sign("whsec_old_secret", t, payload),
            sign(secret, t, payload)
        );

        assert_eq!(verify_signature(secret, &header, payload, 300), Ok(()));
    }

    #[test]
    fn test_verify_malformed_header() {
        assert_eq!(
            verify_signature("secret", "not-a-signature-header", b"x", 300),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify_signature("secret", "v1=deadbeef", b"x", 300),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify_signature("secret", "t=12345", b"x", 300),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify_signature("secret", "", b"x", 300),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn test_verify_invalid_timestamp() {
        assert_eq!(
            verify_signature("secret", "t=not-a-number,v1=deadbeef", b"x", 300),
            Err(SignatureError::InvalidTimestamp)
        );
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
