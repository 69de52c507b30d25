// ABOUTME: Resolves iframely redirect links to their target URL
// ABOUTME: Blocking lookup against the iframely CDN JSON endpoint

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://cdn.iframe.ly";

static IFRAMELY_URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https://cdn\.iframe\.ly/(\w+)").unwrap());

/// Turns the intermediate link found in an embed card into the URL the card
/// points at.
pub trait EmbedResolver {
    fn resolve(&self, intermediate_url: &str) -> Result<String>;
}

pub struct IframelyClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct IframelyResponse {
    url: String,
}

impl IframelyClient {
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(IframelyClient {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        })
    }
}

fn iframely_id(url: &str) -> Option<&str> {
    IFRAMELY_URL_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

impl EmbedResolver for IframelyClient {
    fn resolve(&self, intermediate_url: &str) -> Result<String> {
        let id = iframely_id(intermediate_url)
            .ok_or_else(|| Error::Resolve(format!("unexpected iframely url: {}", intermediate_url)))?;

        let endpoint = format!("/{}.json", id);
        let response = self
            .client
            .get(format!("{}{}", self.base_url, endpoint))
            .header("Accept", "application/json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                endpoint,
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }

        let body: IframelyResponse = serde_json::from_str(&response.text()?)?;
        tracing::debug!(id, url = %body.url, "Resolved iframely link");
        Ok(body.url)
    }
}
