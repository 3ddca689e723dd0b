// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

mod balance;
mod feed;
mod send;
mod tip;

use clap::Subcommand;
use color_eyre::Result;

use crate::opt::Opt;

#[derive(Subcommand, Debug)]
pub enum SubCmd {
    /// List the latest posts of the feed.
    Feed {
        /// Continue from the cursor printed after a previous page.
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Tip the author of a post.
    ///
    /// Sends the preset tip unless an amount or a share of your balance is given.
    Tip {
        /// The id of the post, as listed by the `feed` command.
        post_id: String,
        /// The amount to tip, e.g. 0.25
        #[arg(long, conflicts_with = "percent")]
        amount: Option<String>,
        /// Tip this share of your balance, between 0 and 1.
        #[arg(long)]
        percent: Option<f64>,
    },

    /// Send tokens to an address.
    Send {
        /// The recipient, a 0x prefixed address.
        to: String,
        /// The amount to send, e.g. 1.5
        amount: String,
    },

    /// Show the tip token balance of your wallet.
    Balance,
}

pub async fn handle_subcommand(opt: Opt) -> Result<()> {
    let feed_url = crate::utils::feed_url(&opt)?;

    match &opt.command {
        SubCmd::Feed { cursor } => feed::list(&feed_url, cursor.as_deref()).await,
        SubCmd::Tip {
            post_id,
            amount,
            percent,
        } => tip::tip(&opt, &feed_url, post_id, tip::tip_amount(amount, *percent)).await,
        SubCmd::Send { to, amount } => send::send(&opt, to, amount).await,
        SubCmd::Balance => balance::balance(&opt).await,
    }
}
