// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::commands::SubCmd;
use clap::Parser;
use color_eyre::Result;
use std::time::Duration;
use tip_logging::{LogFormat, LogOutputDest};
use tiplib::tracker::DEFAULT_REQUIRED_CONFIRMATIONS;

// Please do not remove the blank lines in these doc comments.
// They are used for inserting line breaks when the help menu is rendered in the UI.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Opt {
    /// Available sub commands.
    #[clap(subcommand)]
    pub command: SubCmd,

    /// Base url of the feed service.
    ///
    /// Overrides the FEED_URL env var. Defaults to http://localhost:3000.
    #[clap(long, global = true, verbatim_doc_comment)]
    pub feed_url: Option<String>,

    /// Send transfers as a sponsored batch through the wallet at WALLET_RPC_URL.
    ///
    /// The sponsor is read from the PAYMASTER_SERVICE_URL env var.
    #[clap(long, global = true, verbatim_doc_comment)]
    pub sponsored: bool,

    /// Number of block confirmations to wait for before a transfer counts as done.
    #[clap(long, global = true, default_value_t = DEFAULT_REQUIRED_CONFIRMATIONS)]
    pub confirmations: u64,

    /// The maximum number of seconds to wait for a transfer to be confirmed.
    ///
    /// Waits indefinitely if not given.
    #[clap(long = "timeout", global = true, value_parser = |t: &str| -> Result<Duration> { Ok(t.parse().map(Duration::from_secs)?) })]
    pub confirmation_timeout: Option<Duration>,

    /// Specify the logging format.
    ///
    /// Valid values are "default" or "json".
    ///
    /// If the argument is not used, the default format will be applied.
    #[clap(long, value_parser = LogFormat::parse_from_str, verbatim_doc_comment)]
    pub log_format: Option<LogFormat>,

    /// Specify the logging output destination.
    ///
    /// Valid values are "stdout", "stderr", "data-dir", or a custom path.
    ///
    /// `data-dir` is the default value.
    ///
    /// The data directory location is platform specific:
    ///  - Linux: $HOME/.local/share/tipfeed/client/logs
    ///  - macOS: $HOME/Library/Application Support/tipfeed/client/logs
    ///  - Windows: C:\Users\<username>\AppData\Roaming\tipfeed\client\logs
    #[allow(rustdoc::invalid_html_tags)]
    #[clap(long, value_parser = LogOutputDest::parse_from_str, verbatim_doc_comment, default_value = "data-dir")]
    pub log_output_dest: LogOutputDest,
}
