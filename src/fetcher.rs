// src/fetcher.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{null_as_default, Snapshot};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("page returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("page has no __NEXT_DATA__ script")]
    MissingData,
    #[error("unmarshal error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of page snapshots for one profile
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch(&self, account_id: &str) -> Result<Snapshot, FetchError>;
}

// Only the path down to the transaction groups is modelled; the rest of the
// page payload is ignored.
#[derive(Deserialize)]
struct NextData {
    props: Props,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Props {
    page_props: PageProps,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageProps {
    page_data: PageData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageData {
    #[serde(default, deserialize_with = "null_as_default")]
    bank_account_transactions: Snapshot,
}

/// Pull the embedded snapshot out of a profile page's HTML.
pub fn extract_snapshot(html: &str) -> Result<Snapshot, FetchError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#__NEXT_DATA__").expect("static selector");
    let body: String = document
        .select(&selector)
        .next()
        .ok_or(FetchError::MissingData)?
        .text()
        .collect();
    let data: NextData = serde_json::from_str(body.trim())?;
    Ok(data.props.page_props.page_data.bank_account_transactions)
}

/// Fetches `{base_url}/{account_id}` over HTTP
pub struct PageFetcher {
    client: Client,
    base_url: String,
}

impl PageFetcher {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SnapshotFetcher for PageFetcher {
    async fn fetch(&self, account_id: &str) -> Result<Snapshot, FetchError> {
        let url = format!("{}/{}", self.base_url, account_id);
        info!("📡 Fetching {}", url);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        let html = resp.text().await?;
        debug!("📩 Page body {} bytes", html.len());

        extract_snapshot(&html)
    }
}
