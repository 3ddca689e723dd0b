// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Client for the feed service.
//!
//! Endpoints:
//! - GET /api/posts

use crate::error::{Result, TipError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_FEED_TIMEOUT_MS: u64 = 20_000;
const CONVERSATION_BASE_URL: &str = "https://warpcast.com/~/conversations";

/// A post as returned by the feed service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: Author,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    pub text: String,
    pub timestamp: String,
    #[serde(default)]
    pub reactions: Reactions,
    #[serde(default)]
    pub replies: Replies,
}

impl Post {
    /// Link to the post's conversation on Warpcast.
    pub fn conversation_url(&self) -> String {
        format!("{CONVERSATION_BASE_URL}/{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub pfp_url: Option<String>,
    #[serde(default)]
    pub power_badge: bool,
    #[serde(default)]
    pub custody_address: Option<String>,
    #[serde(default)]
    pub verified_addresses: VerifiedAddresses,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifiedAddresses {
    #[serde(default)]
    pub eth_addresses: Vec<String>,
    #[serde(default)]
    pub sol_addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub metadata: Option<EmbedMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedMetadata {
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub recasts_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Replies {
    #[serde(default)]
    pub count: u64,
}

/// One page of the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    #[serde(default)]
    pub next: Option<Cursor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Feed service client.
pub struct FeedClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl FeedClient {
    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Result<Self> {
        let timeout = Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_FEED_TIMEOUT_MS));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                error!("Failed to build the feed http client: {err:?}");
                TipError::Configuration(format!("could not build the feed client: {err}"))
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    /// Fetch a page of posts, optionally continuing from a cursor.
    ///
    /// Any failure, including a non-success status, is reported as `FeedUnavailable`.
    pub async fn fetch_posts(&self, cursor: Option<&str>) -> Result<FeedPage> {
        let url = format!("{}/api/posts", self.base_url);
        let mut request = self.client.get(&url).timeout(self.timeout);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let resp = request.send().await.map_err(|err| {
            error!("Feed request to {url} failed: {err:?}");
            TipError::FeedUnavailable(format!("feed request failed: {err}"))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            error!("Feed service returned status {status}");
            return Err(TipError::FeedUnavailable(format!(
                "feed service returned status {status}"
            )));
        }

        let page: FeedPage = resp.json().await.map_err(|err| {
            error!("Failed to parse feed response: {err:?}");
            TipError::FeedUnavailable(format!("failed to parse feed response: {err}"))
        })?;

        debug!("Fetched {} posts from the feed", page.posts.len());
        Ok(page)
    }

    /// Find a post by id on the first page of the feed.
    pub async fn find_post(&self, post_id: &str) -> Result<Option<Post>> {
        let page = self.fetch_posts(None).await?;
        Ok(page.posts.into_iter().find(|post| post.id == post_id))
    }
}
