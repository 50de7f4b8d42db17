use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Raw caller details. Hash the address before it goes anywhere near a log
/// line or the database.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub address: String,
    pub user_agent: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let address = forwarded_address(&parts.headers)
            .or(peer)
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        Ok(Self {
            address,
            user_agent,
        })
    }
}

/// First hop of `x-forwarded-for`, then `x-real-ip`.
pub fn forwarded_address(headers: &HeaderMap) -> Option<String> {
    let first_hop = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    first_hop("x-forwarded-for").or_else(|| first_hop("x-real-ip"))
}
