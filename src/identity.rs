use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;

pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Rate-limit key for the caller: first `X-Forwarded-For` hop, else the peer address,
/// else `"unknown"`. Callers without an address all share one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    pub fn from_parts(parts: &Parts) -> Self {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = forwarded {
            return ClientIdentity(ip.to_string());
        }

        match parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(addr)) => ClientIdentity(addr.ip().to_string()),
            None => ClientIdentity(UNKNOWN_IDENTITY.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(forwarded: Option<&str>, peer: Option<SocketAddr>) -> Parts {
        let mut builder = Request::builder().uri("/api/analyze");
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        if let Some(addr) = peer {
            parts.extensions.insert(ConnectInfo(addr));
        }
        parts
    }

    #[test]
    fn test_forwarded_header_wins() {
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        let parts = parts_with(Some(" 203.0.113.7 , 10.0.0.1"), Some(peer));
        assert_eq!(ClientIdentity::from_parts(&parts).as_str(), "203.0.113.7");
    }

    #[test]
    fn test_peer_address_fallback() {
        let peer: SocketAddr = "192.168.1.20:43210".parse().unwrap();
        let parts = parts_with(None, Some(peer));
        assert_eq!(ClientIdentity::from_parts(&parts).as_str(), "192.168.1.20");
    }

    #[test]
    fn test_unknown_when_nothing_available() {
        let parts = parts_with(Some("  "), None);
        assert_eq!(ClientIdentity::from_parts(&parts).as_str(), UNKNOWN_IDENTITY);
    }
}
