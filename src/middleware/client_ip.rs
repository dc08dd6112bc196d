use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::convert::Infallible;
use std::net::SocketAddr;

type HmacSha256 = Hmac<Sha256>;

pub const UNKNOWN_IP: &str = "unknown";

/// Caller address: first `X-Forwarded-For` hop, else the socket peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => UNKNOWN_IP.to_string(),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp(resolve_client_ip(&parts.headers, peer)))
    }
}

/// Replaces IPs with a keyed HMAC-SHA256 digest before they are stored.
/// Without a salt addresses pass through unchanged.
#[derive(Clone)]
pub struct IpPseudonymizer {
    mac: Option<HmacSha256>,
}

impl IpPseudonymizer {
    pub fn new(salt: Option<&str>) -> Result<Self, hmac::digest::InvalidLength> {
        let mac = match salt {
            Some(salt) => Some(HmacSha256::new_from_slice(salt.as_bytes())?),
            None => None,
        };
        Ok(Self { mac })
    }

    pub fn is_enabled(&self) -> bool {
        self.mac.is_some()
    }

    pub fn apply(&self, ip: &str) -> String {
        match &self.mac {
            Some(mac) => {
                let mut mac = mac.clone();
                mac.update(ip.as_bytes());
                general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
            }
            None => ip.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_header_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let peer = Some("192.168.1.10:5123".parse().unwrap());
        assert_eq!(resolve_client_ip(&headers, peer), "203.0.113.7");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let headers = HeaderMap::new();
        let peer = Some("192.168.1.10:5123".parse().unwrap());
        assert_eq!(resolve_client_ip(&headers, peer), "192.168.1.10");
        assert_eq!(resolve_client_ip(&headers, None), UNKNOWN_IP);
    }

    #[test]
    fn pseudonyms_are_stable_and_salt_dependent() {
        let a = IpPseudonymizer::new(Some("sal-a")).unwrap();
        let b = IpPseudonymizer::new(Some("sal-b")).unwrap();

        let first = a.apply("203.0.113.7");
        assert_eq!(first, a.apply("203.0.113.7"));
        assert_ne!(first, a.apply("203.0.113.8"));
        assert_ne!(first, b.apply("203.0.113.7"));
        assert!(!first.contains("203"));
        assert!(!first.contains('+') && !first.contains('/'));
    }

    #[test]
    fn without_salt_ip_is_kept() {
        let plain = IpPseudonymizer::new(None).unwrap();
        assert!(!plain.is_enabled());
        assert_eq!(plain.apply("203.0.113.7"), "203.0.113.7");
    }
}
