// ABOUTME: Blocking HTTP client for the FANBOX post API
// ABOUTME: Handles throttling, session cookies, CSRF and fail-fast errors

use crate::config::Credentials;
use crate::model::{Post, PostSummary};
use crate::{Error, Result};
use rand::Rng;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.fanbox.cc";
const DEFAULT_ORIGIN: &str = "https://www.fanbox.cc";

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}

/// Every API response wraps its payload in `{"body": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
    body: T,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    origin: String,
    session_id: String,
    csrf_token: Option<String>,
    user_agent: String,
    throttle_min: u64,
    throttle_max: u64,
}

impl ApiClient {
    pub fn new(credentials: &Credentials, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let origin = credentials
            .creator_id
            .as_ref()
            .map(|creator| format!("https://{}.fanbox.cc", creator))
            .unwrap_or_else(|| DEFAULT_ORIGIN.into());

        Ok(ApiClient {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            origin,
            session_id: credentials.session_id.clone(),
            csrf_token: credentials.csrf_token.clone(),
            user_agent: credentials.user_agent.clone(),
            throttle_min: 100,
            throttle_max: 300,
        })
    }

    pub fn with_throttle(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.throttle_min = min_ms;
        self.throttle_max = max_ms;
        self
    }

    pub fn disable_throttle(mut self) -> Self {
        self.throttle_min = 0;
        self.throttle_max = 0;
        self
    }

    fn throttle(&self) {
        if self.throttle_max > 0 {
            let sleep_ms = rand::thread_rng().gen_range(self.throttle_min..=self.throttle_max);
            std::thread::sleep(Duration::from_millis(sleep_ms));
        }
    }

    fn require_csrf(&self) -> Result<&str> {
        self.csrf_token.as_deref().ok_or_else(|| {
            Error::Auth("A CSRF token is required to modify posts. Provide via --csrf-token".into())
        })
    }

    fn with_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header("Origin", &self.origin)
            .header("Cookie", format!("FANBOXSESSID={}", self.session_id))
            .header("Accept", "application/json")
            .header("User-Agent", &self.user_agent);

        match &self.csrf_token {
            Some(token) => builder.header("X-CSRF-Token", token),
            None => builder,
        }
    }

    fn execute(&self, builder: RequestBuilder, endpoint: &str) -> Result<String> {
        let response = self.with_headers(builder).send()?;

        self.throttle();

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            let preview = truncate_str(&message, 100);
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: preview,
            });
        }

        Ok(response.text()?)
    }

    fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, endpoint: &str) -> Result<T> {
        let body = self.execute(builder, endpoint)?;
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                endpoint,
                error = %e,
                body = %truncate_str(&body, 500),
                "Failed to parse response"
            );
            Error::Parse(e)
        })?;
        Ok(envelope.body)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    pub fn list_posts(&self) -> Result<Vec<PostSummary>> {
        let endpoint = "/post.listManaged";
        self.send(self.client.get(self.url(endpoint)), endpoint)
    }

    pub fn get_post(&self, post_id: &str) -> Result<Post> {
        let endpoint = "/post.getEditable";
        let builder = self
            .client
            .get(self.url(endpoint))
            .query(&[("postId", post_id)]);
        self.send(builder, endpoint)
    }

    /// Create an empty article and return its id.
    pub fn create_post(&self) -> Result<String> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Created {
            post_id: String,
        }

        self.require_csrf()?;
        let endpoint = "/post.create";
        let builder = self
            .client
            .post(self.url(endpoint))
            .json(&json!({ "type": "article" }));
        let created: Created = self.send(builder, endpoint)?;
        Ok(created.post_id)
    }

    pub fn update_post(&self, post: &Post) -> Result<Post> {
        let tt = self.require_csrf()?;
        let endpoint = "/post.update";

        let commenting_scope = if post.fee_required == 0 {
            "everyone"
        } else {
            "supporters"
        };
        let body = serde_json::to_string(&post.body.blocks)?;

        let builder = self.client.post(self.url(endpoint)).json(&json!({
            "postId": post.id,
            "status": post.status.as_str(),
            "feeRequired": post.fee_required.to_string(),
            "title": post.title,
            "commentingPermissionScope": commenting_scope,
            "body": body,
            "tags": [],
            "tt": tt,
        }));
        self.send(builder, endpoint)
    }

    pub fn delete_post(&self, post_id: &str) -> Result<()> {
        self.require_csrf()?;
        let endpoint = "/post.delete";
        let builder = self
            .client
            .post(self.url(endpoint))
            .json(&json!({ "postId": post_id }));
        self.execute(builder, endpoint)?;
        Ok(())
    }
}
