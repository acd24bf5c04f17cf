//! reqwest-backed qBittorrent Web API v2 client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::error::{GatewayError, Result};
use crate::models::{Torrent, TorrentFilter, TorrentSummary, Tracker};
use crate::TorrentClient;

/// Per-request timeout. qBittorrent answers locally in milliseconds; a hung
/// client should stall one request, not the whole bot.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// qBittorrent Web API client with cookie-session authentication.
pub struct QbtClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct Preferences {
    queueing_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct MainData {
    server_state: ServerState,
}

#[derive(Debug, Deserialize)]
struct ServerState {
    #[serde(default)]
    free_space_on_disk: i64,
}

impl QbtClient {
    /// Builds a client for the given Web UI base URL (e.g.
    /// `http://localhost:8080`). No network traffic happens here; the first
    /// call authenticates.
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let base = Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        Ok(Self {
            http,
            base,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base.as_str().trim_end_matches('/');
        format!("{base}/api/v2/{path}")
    }

    /// Logs in and stores the session cookie.
    async fn login(&self) -> Result<()> {
        let resp = self
            .http
            .post(self.endpoint("auth/login"))
            .form(&[("username", self.username.as_str()), ("password", self.password.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GatewayError::Rejected {
                status: resp.status().as_u16(),
                detail: "login request failed".to_string(),
            });
        }

        let body = resp.text().await.unwrap_or_default();
        if !body.to_ascii_lowercase().contains("ok") {
            return Err(GatewayError::Rejected {
                status: 403,
                detail: "authentication failed".to_string(),
            });
        }

        debug!("authenticated with qBittorrent");
        Ok(())
    }

    /// Sends a request, re-authenticating once on a 403 (expired session).
    async fn send(&self, build: impl Fn() -> reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let resp = build().send().await?;
        if resp.status().as_u16() != 403 {
            return Ok(resp);
        }

        warn!("qBittorrent session expired, re-authenticating");
        self.login().await?;
        Ok(build().send().await?)
    }

    /// Maps non-success statuses to the gateway taxonomy. `hash` gives 404
    /// responses their NotFound meaning.
    async fn checked(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
        hash: Option<&str>,
    ) -> Result<reqwest::Response> {
        let resp = self.send(build).await?;
        let status = resp.status();

        if status.is_success() {
            return Ok(resp);
        }
        if status.as_u16() == 404 {
            if let Some(hash) = hash {
                return Err(GatewayError::NotFound {
                    hash: hash.to_string(),
                });
            }
        }
        let detail = resp.text().await.unwrap_or_default();
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }

    /// POSTs a form-encoded mutation and discards the body.
    async fn post_form(&self, path: &str, form: &[(&str, &str)], hash: Option<&str>) -> Result<()> {
        let url = self.endpoint(path);
        self.checked(|| self.http.post(&url).form(form), hash).await?;
        Ok(())
    }
}

#[async_trait]
impl TorrentClient for QbtClient {
    async fn version(&self) -> Result<String> {
        // First call of the process: authenticate, then probe.
        self.login().await?;
        let url = self.endpoint("app/version");
        let resp = self.checked(|| self.http.get(&url), None).await?;
        Ok(resp.text().await?)
    }

    async fn list(&self, filter: TorrentFilter) -> Result<Vec<TorrentSummary>> {
        let url = self.endpoint("torrents/info");
        let resp = self
            .checked(|| self.http.get(&url).query(&[("filter", filter.as_str())]), None)
            .await?;
        Ok(resp.json().await?)
    }

    async fn get(&self, hash: &str) -> Result<Torrent> {
        let url = self.endpoint("torrents/info");
        let resp = self
            .checked(|| self.http.get(&url).query(&[("hashes", hash)]), Some(hash))
            .await?;
        let mut torrents: Vec<Torrent> = resp.json().await?;
        torrents.pop().ok_or_else(|| GatewayError::NotFound {
            hash: hash.to_string(),
        })
    }

    async fn pause(&self, hash: &str) -> Result<()> {
        self.post_form("torrents/pause", &[("hashes", hash)], Some(hash)).await
    }

    async fn resume(&self, hash: &str) -> Result<()> {
        self.post_form("torrents/resume", &[("hashes", hash)], Some(hash)).await
    }

    async fn set_force_start(&self, hash: &str, value: bool) -> Result<()> {
        let value = if value { "true" } else { "false" };
        self.post_form(
            "torrents/setForceStart",
            &[("hashes", hash), ("value", value)],
            Some(hash),
        )
        .await
    }

    async fn recheck(&self, hash: &str) -> Result<()> {
        self.post_form("torrents/recheck", &[("hashes", hash)], Some(hash)).await
    }

    async fn delete(&self, hash: &str, with_files: bool) -> Result<()> {
        let delete_files = if with_files { "true" } else { "false" };
        self.post_form(
            "torrents/delete",
            &[("hashes", hash), ("deleteFiles", delete_files)],
            Some(hash),
        )
        .await
    }

    async fn increase_priority(&self, hash: &str) -> Result<()> {
        // Returns 409 when queueing is disabled client-side; surfaced as
        // Rejected so the user sees why nothing moved.
        self.post_form("torrents/increasePrio", &[("hashes", hash)], Some(hash)).await
    }

    async fn max_priority(&self, hash: &str) -> Result<()> {
        self.post_form("torrents/topPrio", &[("hashes", hash)], Some(hash)).await
    }

    async fn trackers(&self, hash: &str) -> Result<Vec<Tracker>> {
        let url = self.endpoint("torrents/trackers");
        let resp = self
            .checked(|| self.http.get(&url).query(&[("hash", hash)]), Some(hash))
            .await?;
        Ok(resp.json().await?)
    }

    async fn queueing_enabled(&self) -> Result<bool> {
        let url = self.endpoint("app/preferences");
        let resp = self.checked(|| self.http.get(&url), None).await?;
        let prefs: Preferences = resp.json().await?;
        Ok(prefs.queueing_enabled)
    }

    async fn set_queueing_enabled(&self, enabled: bool) -> Result<()> {
        let prefs = json!({ "queueing_enabled": enabled }).to_string();
        self.post_form("app/setPreferences", &[("json", prefs.as_str())], None).await
    }

    async fn create_tag(&self, name: &str) -> Result<()> {
        self.post_form("torrents/createTags", &[("tags", name)], None).await
    }

    async fn free_space(&self) -> Result<u64> {
        let url = self.endpoint("sync/maindata");
        let resp = self.checked(|| self.http.get(&url), None).await?;
        let data: MainData = resp.json().await?;
        Ok(data.server_state.free_space_on_disk.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_and_path() {
        let client = QbtClient::new("http://localhost:8080", "admin", "pw").unwrap();
        assert_eq!(
            client.endpoint("torrents/info"),
            "http://localhost:8080/api/v2/torrents/info"
        );
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = QbtClient::new("not a url", "admin", "pw");
        assert!(matches!(result, Err(GatewayError::InvalidUrl(_))));
    }
}
