// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::opt::Opt;
use color_eyre::eyre::{eyre, Context, Result};
use tiplib::feed::FeedClient;
use tiplib::tipper::TipAmount;

pub fn tip_amount(amount: &Option<String>, percent: Option<f64>) -> TipAmount {
    match (amount, percent) {
        (Some(amount), _) => TipAmount::Custom(amount.clone()),
        (None, Some(ratio)) => TipAmount::Percentage(ratio),
        (None, None) => TipAmount::Preset,
    }
}

pub async fn tip(opt: &Opt, feed_url: &str, post_id: &str, amount: TipAmount) -> Result<()> {
    let post = FeedClient::new(feed_url, None)?
        .find_post(post_id)
        .await
        .wrap_err("Failed to load the feed")?
        .ok_or_else(|| eyre!("No post with id {post_id} in the latest posts"))?;

    let mut session = crate::actions::connect(opt).await?;
    if let TipAmount::Percentage(_) = amount {
        let balance = session.refresh_balance().await?;
        info!("Tipping a share of {balance}");
    }

    let handle = session
        .tipper
        .tip_post(&session.tracker, &post, &amount)
        .await
        .wrap_err(format!("Failed to tip @{}", post.author.username))?;
    println!("Transfer: {handle}");
    session.balance_after_transfer().await;
    Ok(())
}
