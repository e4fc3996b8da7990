// iControl REST HTTP client.
//
// Wraps `reqwest::Client` with catalog-validated URL construction, the
// token login exchange, and a bounded retry loop for transient HTTP
// failures. One client instance means one session and one token, held
// for the full duration of a discovery pass.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::catalog::{self, Module};
use crate::error::Error;
use crate::stats::{self, StatsRecord};
use crate::transport::TransportConfig;
use crate::types::{DataGroup, IruleDefinition, Listing};

const AUTH_TOKEN_HEADER: &str = "X-F5-Auth-Token";

/// Bounded-retry policy for transient HTTP failures.
///
/// Applies only to the configured status set; any other non-2xx surfaces
/// immediately. Exhausting the budget still yields `Error::Request` --
/// retries sit beneath the error surface, not beside it.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    /// Backoff seed; attempt `n` waits `backoff * 2^(n-1)` before retrying.
    pub backoff: Duration,
    /// HTTP statuses considered transient.
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    fn should_retry(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << (attempt - 1).min(16))
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: LoginToken,
}

#[derive(Debug, Deserialize)]
struct LoginToken {
    token: String,
}

/// Authenticated client for the BIG-IP management REST API.
///
/// Construction performs the login exchange eagerly -- there is no
/// usable unauthenticated state. The token is reused for every request
/// and never refreshed; if it expires mid-session, requests fail with
/// `Error::Request` and the caller starts a fresh client.
pub struct BigIpClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    retry: RetryPolicy,
}

impl BigIpClient {
    /// Connect and authenticate against `base_url`.
    ///
    /// `POST mgmt/shared/authn/login` with the `tmos` login provider; a
    /// non-2xx response fails with `Error::Authentication` carrying the
    /// status and body.
    pub async fn connect(
        base_url: Url,
        username: &str,
        password: &SecretString,
        transport: &TransportConfig,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = transport.build_client()?;
        let token = Self::login(&http, &base_url, username, password).await?;

        Ok(Self {
            http,
            base_url,
            token,
            retry,
        })
    }

    /// The management endpoint base URL (always with a trailing slash).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Object listings ──────────────────────────────────────────────

    /// Fetch a configuration listing: `GET mgmt/tm/<module>/<category>`.
    ///
    /// `expand_subcollections` adds the `expandSubcollections=true` query
    /// flag so nested collections (e.g. pool members) come inline.
    /// Category validation happens before any I/O.
    pub async fn get_object(
        &self,
        module: Module,
        category: &str,
        expand_subcollections: bool,
        params: &[(&str, &str)],
    ) -> Result<Value, Error> {
        let path = catalog::resolve(module, category)?;
        let url = self.base_url.join(&path)?;

        let mut query: Vec<(&str, &str)> = params.to_vec();
        if expand_subcollections {
            query.push(("expandSubcollections", "true"));
        }
        self.get(url, &query).await
    }

    /// Fetch an operational stats listing: `GET mgmt/tm/<module>/<category>/stats`.
    ///
    /// The raw payload is normalized into flat records, one per entry,
    /// with the `~partition~name` composite key decoded.
    pub async fn get_object_stats(
        &self,
        module: Module,
        category: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<StatsRecord>, Error> {
        let path = format!("{}/stats", catalog::resolve(module, category)?);
        let url = self.base_url.join(&path)?;
        let payload = self.get(url, params).await?;
        stats::normalize_stats(&payload)
    }

    /// Fetch all internal data groups: `GET mgmt/tm/ltm/data-group/internal`.
    pub async fn get_data_group_internal(&self) -> Result<Vec<DataGroup>, Error> {
        let url = self.base_url.join("mgmt/tm/ltm/data-group/internal")?;
        let payload = self.get(url, &[]).await?;
        let listing: Listing<DataGroup> = decode(payload)?;
        Ok(listing.items)
    }

    /// Fetch all iRule definitions (with bodies): `GET mgmt/tm/ltm/rule`.
    pub async fn get_rules(&self) -> Result<Vec<IruleDefinition>, Error> {
        let payload = self.get_object(Module::Ltm, "rule", false, &[]).await?;
        let listing: Listing<IruleDefinition> = decode(payload)?;
        Ok(listing.items)
    }

    // ── Request plumbing ─────────────────────────────────────────────

    async fn login(
        http: &reqwest::Client,
        base_url: &Url,
        username: &str,
        password: &SecretString,
    ) -> Result<String, Error> {
        let url = base_url.join("mgmt/shared/authn/login")?;
        debug!(%url, username, "logging in");

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
            "loginProviderName": "tmos",
        });

        let resp = http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let login: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("unexpected login response shape: {e}"),
                body,
            })?;

        debug!("login successful");
        Ok(login.token.token)
    }

    /// Send a GET through the retry loop and decode the JSON body.
    ///
    /// This is the single place call failures surface: any non-2xx left
    /// after the retry budget becomes `Error::Request`.
    async fn get(&self, url: Url, params: &[(&str, &str)]) -> Result<Value, Error> {
        let resp = self.send_with_retry(&url, params).await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Request {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    async fn send_with_retry(
        &self,
        url: &Url,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Response, Error> {
        let mut attempt = 1u32;
        loop {
            debug!(%url, attempt, "GET");

            let resp = self
                .http
                .get(url.clone())
                .query(params)
                .header(AUTH_TOKEN_HEADER, &self.token)
                .send()
                .await
                .map_err(Error::Transport)?;

            let status = resp.status().as_u16();
            if self.retry.should_retry(status) && attempt < self.retry.max_attempts {
                let delay = self.retry.delay(attempt);
                warn!(%url, status, attempt, ?delay, "transient HTTP failure, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }
            return Ok(resp);
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, Error> {
    serde_json::from_value(payload.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: payload.to_string(),
    })
}
