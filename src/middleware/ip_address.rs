use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::Config;

/// Extracted client IP address, trusting a reverse-proxy header when
/// `HTTP_USING_CLOUDFLARE` says to (§6.3).
pub struct ClientIp(pub IpAddr);

const CLOUDFLARE_HEADER: &str = "CF-Connecting-IP";
const REAL_IP_HEADER: &str = "X-Real-IP";

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = IpAddressError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = parts
            .extensions
            .get::<Arc<Config>>()
            .expect("config extension missing");

        let header_name = if config.http.using_cloudflare {
            CLOUDFLARE_HEADER
        } else {
            REAL_IP_HEADER
        };

        if let Some(ip) = extract_header(&parts.headers, header_name) {
            return Ok(Self(ip));
        }

        let ConnectInfo(addr) = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .map_err(|_| IpAddressError::MissingHeader)?;
        Ok(Self(addr.ip()))
    }
}

fn extract_header(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

#[derive(Debug, Error)]
pub enum IpAddressError {
    #[error("client IP could not be determined")]
    MissingHeader,
}

impl IntoResponse for IpAddressError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}
