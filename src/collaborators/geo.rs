//! Geo lookup collaborator (§6.4): resolves a country code and
//! approximate coordinates for an IP. Errors and timeouts fall back to
//! the safe default rather than blocking login (§5 suspension points,
//! §7 CollaboratorFailure).

use std::net::IpAddr;
use std::time::Duration;

use axum::async_trait;
use serde::Deserialize;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoLocation {
    pub country_code: [u8; 2],
    pub latitude: f32,
    pub longitude: f32,
}

impl GeoLocation {
    pub const UNKNOWN: GeoLocation = GeoLocation {
        country_code: *b"XX",
        latitude: 0.0,
        longitude: 0.0,
    };
}

#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup(&self, ip: IpAddr) -> GeoLocation;
}

pub struct Ip2LocationLookup {
    http: reqwest::Client,
    api_key: String,
}

impl Ip2LocationLookup {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("building the geo HTTP client never fails with these options");
        Self { http, api_key }
    }
}

#[derive(Deserialize)]
struct Ip2LocationResponse {
    country_code: String,
    latitude: f32,
    longitude: f32,
}

#[async_trait]
impl GeoLookup for Ip2LocationLookup {
    async fn lookup(&self, ip: IpAddr) -> GeoLocation {
        if self.api_key.is_empty() {
            return GeoLocation::UNKNOWN;
        }

        let url = format!(
            "https://api.ip2location.io/?key={}&ip={}",
            self.api_key, ip
        );

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(_) => return GeoLocation::UNKNOWN,
        };

        let body: Ip2LocationResponse = match response.json().await {
            Ok(body) => body,
            Err(_) => return GeoLocation::UNKNOWN,
        };

        let mut country_code = *b"XX";
        let bytes = body.country_code.as_bytes();
        if bytes.len() == 2 {
            country_code.copy_from_slice(bytes);
        }

        GeoLocation {
            country_code,
            latitude: body.latitude,
            longitude: body.longitude,
        }
    }
}
