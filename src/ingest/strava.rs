//! Strava API source. Exchanges a long lived refresh token for an access token and then reads
//! the most recent page of the athlete's activities.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ActivitySource, RawActivity};

const STRAVA_BASE_URL: &str = "https://www.strava.com";
const DEFAULT_PAGE_SIZE: u32 = 30;

/// An entry of `GET /athlete/activities`. Distances are metres, times are seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StravaActivity {
    #[serde(default)]
    pub name: Option<String>,
    /// Newer accounts report `sport_type`, `type` is the deprecated coarse variant.
    #[serde(default)]
    pub sport_type: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub start_date_local: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub moving_time: u32,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct StravaCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl StravaCredentials {
    /// Reads `STRAVA_CLIENT_ID`, `STRAVA_CLIENT_SECRET` and `STRAVA_REFRESH_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} is not set"))
        };
        Ok(Self {
            client_id: get("STRAVA_CLIENT_ID")?,
            client_secret: get("STRAVA_CLIENT_SECRET")?,
            refresh_token: get("STRAVA_REFRESH_TOKEN")?,
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct StravaSource {
    client: Client,
    base_url: String,
    credentials: StravaCredentials,
    per_page: u32,
}

impl StravaSource {
    pub fn new(credentials: StravaCredentials) -> Result<Self> {
        Self::new_with_base_url(credentials, STRAVA_BASE_URL)
    }

    /// Points the client at another host, used to test against a mock server.
    #[doc(hidden)]
    pub fn new_with_base_url(credentials: StravaCredentials, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            per_page: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(self, per_page: u32) -> Self {
        Self { per_page, ..self }
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn refresh_access_token(&self) -> Result<String> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credentials.refresh_token.as_str()),
        ];
        let response = self
            .client
            .post(self.build_url("/oauth/token"))
            .form(&params)
            .send()
            .await
            .context("Token refresh request failed")?;
        let token: TokenResponse = check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse token response")?;
        debug!("Refreshed Strava access token");
        Ok(token.access_token)
    }

    async fn fetch_activity_page(&self, access_token: &str) -> Result<Vec<StravaActivity>> {
        let response = self
            .client
            .get(self.build_url("/api/v3/athlete/activities"))
            .query(&[("per_page", self.per_page)])
            .bearer_auth(access_token)
            .send()
            .await
            .context("Activity list request failed")?;
        check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse activity list")
    }
}

async fn check_status(response: Response) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => bail!("Strava rejected the credentials"),
        StatusCode::TOO_MANY_REQUESTS => bail!("Strava rate limit reached, try again later"),
        status => {
            let body = response.text().await.unwrap_or_default();
            bail!("Strava API error {status}: {body}")
        }
    }
}

#[async_trait]
impl ActivitySource for StravaSource {
    fn name(&self) -> String {
        "strava".into()
    }

    async fn fetch_recent_activities(&self) -> Result<Vec<RawActivity>> {
        let token = self.refresh_access_token().await?;
        let activities = self.fetch_activity_page(&token).await?;
        info!("Fetched {} activities from Strava", activities.len());
        Ok(activities.into_iter().map(RawActivity::Strava).collect())
    }
}
