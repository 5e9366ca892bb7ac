use std::env;
use std::thread::sleep;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::config::HubConfig;
use crate::model::{ContentItem, ContentItemStatus, ContentRepository, Folder, PublishJob};

const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

pub trait HubReadApi {
    fn get_content_item(&mut self, id: &str) -> Result<ContentItem>;
    fn get_content_repository(&mut self, id: &str) -> Result<ContentRepository>;
    fn get_folder(&mut self, id: &str) -> Result<Folder>;
    fn list_content_repositories(&mut self) -> Result<Vec<ContentRepository>>;
    fn list_repository_items(
        &mut self,
        repository_id: &str,
        status: ContentItemStatus,
    ) -> Result<Vec<ContentItem>>;
    fn list_folder_items(
        &mut self,
        folder_id: &str,
        status: ContentItemStatus,
    ) -> Result<Vec<ContentItem>>;
    fn request_count(&self) -> usize;
}

/// State transitions on a single content item. Each call sends the item's
/// current `version` and returns the item as the hub now holds it.
pub trait HubWriteApi: HubReadApi {
    fn unarchive(&mut self, item: &ContentItem) -> Result<ContentItem>;
    fn update(&mut self, item: &ContentItem) -> Result<ContentItem>;
    fn archive(&mut self, item: &ContentItem) -> Result<ContentItem>;
    fn publish(&mut self, item: &ContentItem) -> Result<PublishJob>;
}

/// One page of a listing, already decoded.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub total_pages: usize,
}

/// Drain a paged listing into one vector. `fetch_page` receives the zero-based
/// page number; collection stops after the last page the server reports, or
/// at the first empty page.
pub fn paginate<T, F>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Result<Page<T>>,
{
    let mut collected = Vec::new();
    let mut page_number = 0;
    loop {
        let page = fetch_page(page_number)?;
        let received = page.items.len();
        collected.extend(page.items);
        page_number = page.number + 1;
        if received == 0 || page_number >= page.total_pages {
            break;
        }
    }
    Ok(collected)
}

#[derive(Debug, Clone)]
pub struct HubClientConfig {
    pub api_url: String,
    pub auth_url: String,
    pub hub_id: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub page_size: usize,
    pub timeout_ms: u64,
    pub rate_limit_read_ms: u64,
    pub rate_limit_write_ms: u64,
    pub max_retries: usize,
    pub max_write_retries: usize,
    pub retry_delay_ms: u64,
}

impl HubClientConfig {
    pub fn from_config(config: &HubConfig) -> Result<Self> {
        Self::from_config_with_lookup(config, |key| env::var(key).ok())
    }

    pub fn from_config_with_lookup<F>(config: &HubConfig, lookup_env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = config.resolve_with_lookup(&lookup_env);
        let Some(client_id) = settings.client_id else {
            bail!(
                "missing client id: pass --clientId, set HUB_CLIENT_ID, or add hub.client_id to the config file"
            );
        };
        let Some(client_secret) = settings.client_secret else {
            bail!(
                "missing client secret: pass --clientSecret, set HUB_CLIENT_SECRET, or add hub.client_secret to the config file"
            );
        };
        let tunable = |key: &str, default: u64| {
            lookup_env(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            auth_url: settings.auth_url,
            hub_id: settings.hub_id,
            client_id,
            client_secret,
            user_agent: settings.user_agent,
            page_size: settings.page_size,
            timeout_ms: tunable("HUB_HTTP_TIMEOUT_MS", 30_000),
            rate_limit_read_ms: tunable("HUB_RATE_LIMIT_READ", 100),
            rate_limit_write_ms: tunable("HUB_RATE_LIMIT_WRITE", 300),
            max_retries: tunable("HUB_HTTP_RETRIES", 2) as usize,
            max_write_retries: tunable("HUB_HTTP_WRITE_RETRIES", 1) as usize,
            retry_delay_ms: tunable("HUB_HTTP_RETRY_DELAY_MS", 500),
        })
    }
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

pub struct HubClient {
    client: Client,
    config: HubClientConfig,
    token: Option<AccessToken>,
    last_request_at: Option<Instant>,
    request_count: usize,
}

impl HubClient {
    pub fn new(config: HubClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("failed to build hub HTTP client")?;

        Ok(Self {
            client,
            config,
            token: None,
            last_request_at: None,
            request_count: 0,
        })
    }

    fn ensure_token(&mut self) -> Result<String> {
        if let Some(token) = &self.token
            && token.expires_at > Instant::now()
        {
            return Ok(token.value.clone());
        }

        self.apply_rate_limit(false);
        tracing::debug!(auth_url = %self.config.auth_url, "requesting access token");
        let response = self
            .client
            .post(&self.config.auth_url)
            .header("User-Agent", self.config.user_agent.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .context("failed to call hub auth endpoint")?;
        let status = response.status();
        if !status.is_success() {
            bail!("hub authentication failed with HTTP {status}");
        }
        let parsed: TokenResponse = response
            .json()
            .context("failed to decode hub auth response")?;

        let lifetime = Duration::from_secs(parsed.expires_in.unwrap_or(300));
        let expires_at = Instant::now() + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN);
        self.token = Some(AccessToken {
            value: parsed.access_token.clone(),
            expires_at,
        });
        Ok(parsed.access_token)
    }

    fn send(
        &mut self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Response> {
        let is_write = method != Method::GET;
        let max_retries = if is_write {
            self.config.max_write_retries
        } else {
            self.config.max_retries
        };
        let url = Url::parse(&format!("{}{}", self.config.api_url, path))
            .with_context(|| format!("invalid hub API URL: {}{path}", self.config.api_url))?;

        for attempt in 0..=max_retries {
            let token = self.ensure_token()?;
            self.apply_rate_limit(is_write);
            tracing::debug!(%method, %url, attempt, "hub request");

            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .header("User-Agent", self.config.user_agent.clone())
                .bearer_auth(token);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if status == StatusCode::UNAUTHORIZED && attempt < max_retries {
                        self.token = None;
                        continue;
                    }
                    if attempt < max_retries && is_retryable_status(status) {
                        self.wait_before_retry(attempt, is_write);
                        continue;
                    }
                    let detail = response.text().unwrap_or_default();
                    bail!(
                        "hub API {method} {path} failed with HTTP {status}{}",
                        error_detail(&detail)
                    );
                }
                Err(error) => {
                    if attempt < max_retries && is_retryable_error(&error) {
                        self.wait_before_retry(attempt, is_write);
                        continue;
                    }
                    return Err(error).with_context(|| format!("failed to call hub API {path}"));
                }
            }
        }

        bail!("hub API request exhausted retry budget")
    }

    fn request_json<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T> {
        let response = self.send(method, path, query, body)?;
        response
            .json::<T>()
            .with_context(|| format!("failed to decode hub API response for {path}"))
    }

    fn list_paged<T: DeserializeOwned>(
        &mut self,
        path: &str,
        collection: &str,
        status: Option<ContentItemStatus>,
    ) -> Result<Vec<T>> {
        let page_size = self.config.page_size;
        paginate(|page_number| {
            let mut query = vec![
                ("page", page_number.to_string()),
                ("size", page_size.to_string()),
            ];
            if let Some(status) = status {
                query.push(("status", status.as_str().to_string()));
            }
            let payload: HalPage = self.request_json(Method::GET, path, &query, None)?;
            payload.into_page(collection)
        })
    }

    fn transition(&mut self, item: &ContentItem, action: &str) -> Result<ContentItem> {
        let path = format!("/content-items/{}/{action}", item.id);
        let body = json!({ "version": item.version });
        self.request_json(Method::POST, &path, &[], Some(&body))
    }

    fn apply_rate_limit(&mut self, is_write: bool) {
        let delay = if is_write {
            Duration::from_millis(self.config.rate_limit_write_ms)
        } else {
            Duration::from_millis(self.config.rate_limit_read_ms)
        };
        if let Some(last) = self.last_request_at {
            let elapsed = last.elapsed();
            if elapsed < delay {
                sleep(delay - elapsed);
            }
        }
        self.last_request_at = Some(Instant::now());
        self.request_count += 1;
    }

    fn wait_before_retry(&self, attempt: usize, is_write: bool) {
        let exponent = u32::try_from(attempt).unwrap_or(16);
        let base = self
            .config
            .retry_delay_ms
            .saturating_mul(2u64.saturating_pow(exponent));
        let jitter = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| u64::from(duration.subsec_millis() % 100))
            .unwrap_or(0);
        let multiplier = if is_write { 2u64 } else { 1u64 };
        let delay = base.saturating_mul(multiplier).saturating_add(jitter);
        tracing::debug!(attempt, delay_ms = delay, "retrying hub request");
        sleep(Duration::from_millis(delay));
    }
}

impl HubReadApi for HubClient {
    fn get_content_item(&mut self, id: &str) -> Result<ContentItem> {
        self.request_json(Method::GET, &format!("/content-items/{id}"), &[], None)
    }

    fn get_content_repository(&mut self, id: &str) -> Result<ContentRepository> {
        self.request_json(
            Method::GET,
            &format!("/content-repositories/{id}"),
            &[],
            None,
        )
    }

    fn get_folder(&mut self, id: &str) -> Result<Folder> {
        self.request_json(Method::GET, &format!("/folders/{id}"), &[], None)
    }

    fn list_content_repositories(&mut self) -> Result<Vec<ContentRepository>> {
        let Some(hub_id) = self.config.hub_id.clone() else {
            bail!("missing hub id: pass --hubId, set HUB_ID, or add hub.hub_id to the config file");
        };
        self.list_paged(
            &format!("/hubs/{hub_id}/content-repositories"),
            "content-repositories",
            None,
        )
    }

    fn list_repository_items(
        &mut self,
        repository_id: &str,
        status: ContentItemStatus,
    ) -> Result<Vec<ContentItem>> {
        self.list_paged(
            &format!("/content-repositories/{repository_id}/content-items"),
            "content-items",
            Some(status),
        )
    }

    fn list_folder_items(
        &mut self,
        folder_id: &str,
        status: ContentItemStatus,
    ) -> Result<Vec<ContentItem>> {
        self.list_paged(
            &format!("/folders/{folder_id}/content-items"),
            "content-items",
            Some(status),
        )
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

impl HubWriteApi for HubClient {
    fn unarchive(&mut self, item: &ContentItem) -> Result<ContentItem> {
        self.transition(item, "unarchive")
    }

    fn update(&mut self, item: &ContentItem) -> Result<ContentItem> {
        let body = json!({
            "body": item.body,
            "label": item.label,
            "version": item.version,
        });
        self.request_json(
            Method::PATCH,
            &format!("/content-items/{}", item.id),
            &[],
            Some(&body),
        )
    }

    fn archive(&mut self, item: &ContentItem) -> Result<ContentItem> {
        self.transition(item, "archive")
    }

    fn publish(&mut self, item: &ContentItem) -> Result<PublishJob> {
        let response = self.send(
            Method::POST,
            &format!("/content-items/{}/publish", item.id),
            &[],
            None,
        )?;
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Ok(PublishJob {
            content_item_id: item.id.clone(),
            location,
        })
    }
}

fn error_detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(trimmed)
        && let Some(first) = parsed.errors.first()
    {
        let code = first.code.as_deref().unwrap_or("unknown_error");
        let message = first.message.as_deref().unwrap_or("no message");
        return format!(": [{code}] {message}");
    }
    let snippet: String = trimmed.chars().take(200).collect();
    format!(": {snippet}")
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct HalPage {
    #[serde(default, rename = "_embedded")]
    embedded: Map<String, Value>,
    #[serde(default)]
    page: Option<PageInfo>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    number: usize,
    #[serde(default)]
    total_pages: usize,
}

impl HalPage {
    fn into_page<T: DeserializeOwned>(mut self, collection: &str) -> Result<Page<T>> {
        let items = match self.embedded.remove(collection) {
            Some(value) => serde_json::from_value::<Vec<T>>(value)
                .with_context(|| format!("failed to decode `{collection}` page"))?,
            None => Vec::new(),
        };
        let info = self.page.unwrap_or_default();
        Ok(Page {
            items,
            number: info.number,
            total_pages: info.total_pages,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    code: Option<String>,
    message: Option<String>,
}
