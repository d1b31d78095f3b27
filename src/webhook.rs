//! Wire-level webhook delivery handling
//!
//! Header extraction and signature verification for inbound deliveries.

use axum::http::HeaderMap;
use hex::decode as hex_decode;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};
use crate::event::Event;

type HmacSha256 = Hmac<Sha256>;

pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Verify a webhook signature header (`sha256=<hex>`) over the raw body.
pub fn verify_signature(secret: &str, payload: &[u8], signature_header: &str) -> bool {
    let expected_prefix = "sha256=";
    if !signature_header.starts_with(expected_prefix) {
        return false;
    }
    let signature_hex = &signature_header[expected_prefix.len()..];

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    // Constant-time comparison
    match hex_decode(signature_hex) {
        Ok(signature) => mac.verify_slice(&signature).is_ok(),
        Err(_) => false,
    }
}

/// Build an [`Event`] from delivery headers and the raw request body.
///
/// The event name header is required; a missing delivery id is
/// synthesized so every delivery stays traceable.
pub fn parse_delivery(headers: &HeaderMap, body: &[u8]) -> Result<Event> {
    let name = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::InvalidEvent(format!("missing {} header", EVENT_HEADER)))?;

    let payload: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| Error::InvalidEvent(format!("payload is not valid JSON: {}", e)))?;

    let event = match headers.get(DELIVERY_HEADER).and_then(|v| v.to_str().ok()) {
        Some(delivery_id) => Event::with_delivery_id(name, delivery_id, payload),
        None => Event::new(name, payload),
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signatures_are_accepted() {
        let body = br#"{"action":"opened"}"#;
        let header = sign("s3cret", body);
        assert!(verify_signature("s3cret", body, &header));
    }

    #[test]
    fn tampered_bodies_are_rejected() {
        let header = sign("s3cret", br#"{"action":"opened"}"#);
        assert!(!verify_signature("s3cret", br#"{"action":"closed"}"#, &header));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = br#"{}"#;
        let header = sign("s3cret", body);
        assert!(!verify_signature("other", body, &header));
    }

    #[test]
    fn malformed_signature_headers_are_rejected() {
        assert!(!verify_signature("s3cret", b"{}", "sha1=abcdef"));
        assert!(!verify_signature("s3cret", b"{}", "sha256=not-hex"));
        assert!(!verify_signature("s3cret", b"{}", ""));
    }

    #[test]
    fn parse_delivery_reads_event_and_delivery_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_HEADER, "issues".parse().unwrap());
        headers.insert(DELIVERY_HEADER, "72d3162e-cc78-11e3".parse().unwrap());

        let event = parse_delivery(&headers, br#"{"action":"opened"}"#).unwrap();
        assert_eq!(event.name(), "issues");
        assert_eq!(event.delivery_id(), "72d3162e-cc78-11e3");
        assert_eq!(event.action(), Some("opened"));
    }

    #[test]
    fn missing_delivery_header_gets_a_synthesized_id() {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_HEADER, "push".parse().unwrap());

        let event = parse_delivery(&headers, b"{}").unwrap();
        assert!(!event.delivery_id().is_empty());
    }

    #[test]
    fn missing_event_header_is_rejected() {
        let err = parse_delivery(&HeaderMap::new(), b"{}").unwrap_err();
        assert!(matches!(err, Error::InvalidEvent(_)));
    }

    #[test]
    fn non_json_bodies_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_HEADER, "push".parse().unwrap());

        let err = parse_delivery(&headers, b"not json").unwrap_err();
        assert!(matches!(err, Error::InvalidEvent(_)));
    }
}
