// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::utils::format_timestamp;
use color_eyre::eyre::{Context, Result};
use color_eyre::Section;
use tiplib::feed::{FeedClient, Post};
use tiplib::request::recipient_for;

pub async fn list(feed_url: &str, cursor: Option<&str>) -> Result<()> {
    let client = FeedClient::new(feed_url, None)?;
    let page = client
        .fetch_posts(cursor)
        .await
        .wrap_err("Failed to load the feed")
        .with_suggestion(|| format!("make sure the feed service is running at {feed_url}"))?;

    if page.posts.is_empty() {
        println!("No posts yet.");
    }
    for post in &page.posts {
        print_post(post);
    }
    if let Some(next) = page.next.and_then(|next| next.cursor) {
        println!("More posts: tipfeed feed --cursor {next}");
    }
    Ok(())
}

fn print_post(post: &Post) {
    let author = &post.author;
    println!(
        "{}  {} (@{})  {}",
        post.id,
        author.display_name,
        author.username,
        format_timestamp(&post.timestamp)
    );
    for line in post.text.lines() {
        println!("    {line}");
    }
    for url in post.embeds.iter().filter_map(|embed| embed.url.as_deref()) {
        println!("    [{url}]");
    }
    let tippable = if recipient_for(post).is_ok() {
        "tippable"
    } else {
        "no verified address"
    };
    println!(
        "    {} likes, {} recasts, {} replies, {tippable}  {}",
        post.reactions.likes_count,
        post.reactions.recasts_count,
        post.replies.count,
        post.conversation_url()
    );
    println!();
}
