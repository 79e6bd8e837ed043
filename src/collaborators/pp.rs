//! PP (performance points) service collaborator (§6.4). Delegated
//! opaquely: this core never recomputes accuracy or star rating itself
//! (§1 Non-goals), it only forwards the inputs the protocol already
//! carries and relays back whatever the service returns. A timeout is
//! treated as zero PP (§5, §7).

use std::time::Duration;

use axum::async_trait;
use serde::{Deserialize, Serialize};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct PpResult {
    pub pp: f32,
    pub stars: f32,
    pub ar: f32,
    pub od: f32,
    pub max_combo: i32,
}

#[derive(Serialize)]
struct PpRequest {
    beatmap_id: i32,
    mode: u8,
    mods: i32,
    max_combo: i32,
    accuracy: f32,
    miss_count: i32,
    passed_objects: i32,
}

#[async_trait]
pub trait PerformanceService: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn calculate(
        &self,
        beatmap_id: i32,
        mode: u8,
        mods: i32,
        max_combo: i32,
        accuracy: f32,
        miss_count: i32,
        passed_objects: i32,
    ) -> PpResult;
}

pub struct RemotePerformanceService {
    http: reqwest::Client,
    base_url: String,
}

impl RemotePerformanceService {
    pub fn new(base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("building the PP HTTP client never fails with these options");
        Self { http, base_url }
    }
}

#[async_trait]
impl PerformanceService for RemotePerformanceService {
    async fn calculate(
        &self,
        beatmap_id: i32,
        mode: u8,
        mods: i32,
        max_combo: i32,
        accuracy: f32,
        miss_count: i32,
        passed_objects: i32,
    ) -> PpResult {
        let request = PpRequest {
            beatmap_id,
            mode,
            mods,
            max_combo,
            accuracy,
            miss_count,
            passed_objects,
        };

        let url = format!("{}/api/v1/calculate", self.base_url);
        let response = match self.http.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(_) => return PpResult::default(),
        };

        response.json::<PpResult>().await.unwrap_or_default()
    }
}
