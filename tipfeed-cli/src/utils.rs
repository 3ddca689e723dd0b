// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::opt::Opt;
use chrono::{DateTime, Local};
use color_eyre::eyre::{Context, Result};
use color_eyre::Section;
use tiplib::utils::{get_feed_url_from_env, FEED_URL};

/// The `--feed-url` flag, falling back to the environment.
pub fn feed_url(opt: &Opt) -> Result<String> {
    match &opt.feed_url {
        Some(url) => Ok(url.trim_end_matches('/').to_string()),
        None => get_feed_url_from_env()
            .wrap_err("Failed to read the feed url")
            .with_suggestion(|| format!("make sure the {FEED_URL} env var holds a valid url")),
    }
}

/// Local time of an RFC 3339 post timestamp. Unparseable values are shown as they are.
pub fn format_timestamp(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|time| {
            time.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| timestamp.to_string())
}
