// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Wires the wallet, confirmation watcher, tracker and tipper for one command.

use crate::notifier::ConsoleNotifier;
use crate::opt::Opt;
use color_eyre::eyre::{eyre, Context, Result};
use color_eyre::Section;
use std::sync::Arc;
use tiplib::amount::Balance;
use tiplib::common::Address;
use tiplib::notification::NotificationBridge;
use tiplib::request::SubmissionMode;
use tiplib::tipper::{BalanceSource, Tipper};
use tiplib::tracker::{TipTracker, TransferSubmitter};
use tiplib::utils::{
    get_chain_id, get_network_from_env, get_sponsor_from_env, get_wallet_rpc_url_from_env,
    EVM_NETWORK, PAYMASTER_SERVICE_URL, RPC_URL, WALLET_RPC_URL,
};
use tiplib::wallet::{BalanceReader, CallsWallet, ReceiptWatcher};
use tokio::sync::mpsc;

pub struct Session {
    pub tipper: Tipper,
    pub tracker: TipTracker,
    owner: Address,
    balances: BalanceReader,
    confirmed: mpsc::UnboundedReceiver<()>,
}

/// Load the wallet and everything a transfer goes through.
pub async fn connect(opt: &Opt) -> Result<Session> {
    let network = get_network_from_env()
        .wrap_err("Failed to read the network configuration")
        .with_suggestion(|| format!("check the {EVM_NETWORK} and {RPC_URL} env vars"))?;
    let wallet = crate::access::keys::load_wallet(network.clone())?;
    let owner = wallet.address();
    info!("Using wallet {owner:?} on {}", network.identifier());

    let wallet_rpc_url = get_wallet_rpc_url_from_env().wrap_err("Failed to read the wallet url")?;
    let mode = if opt.sponsored {
        let sponsor = get_sponsor_from_env()
            .wrap_err("Failed to read the sponsor service url")?
            .ok_or_else(|| eyre!("Sponsored transfers need a sponsor service"))
            .with_suggestion(|| format!("set the {PAYMASTER_SERVICE_URL} env var"))?;
        SubmissionMode::Sponsored(sponsor)
    } else {
        SubmissionMode::Direct
    };

    let mut watcher = ReceiptWatcher::new(&network);
    if let Some(timeout) = opt.confirmation_timeout {
        watcher = watcher.with_timeout(timeout);
    }
    let submitter: Arc<dyn TransferSubmitter> = match wallet_rpc_url {
        Some(url) => {
            let chain_id = get_chain_id(&network)
                .await
                .wrap_err("Failed to reach the network")?;
            watcher = watcher.with_wallet_rpc_url(url.clone());
            Arc::new(CallsWallet::new(url, owner, chain_id))
        }
        None if opt.sponsored => {
            return Err(
                eyre!("Sponsored transfers need a wallet that accepts batched calls")
                    .with_suggestion(|| format!("set the {WALLET_RPC_URL} env var")),
            );
        }
        None => Arc::new(wallet),
    };

    let bridge = NotificationBridge::new(Arc::new(ConsoleNotifier::new()));
    let (confirmed_tx, confirmed) = mpsc::unbounded_channel();
    let tracker = TipTracker::new(submitter, Arc::new(watcher), bridge.clone())
        .with_required_confirmations(opt.confirmations)
        .with_completion_callback(move || {
            let _ = confirmed_tx.send(());
        });

    Ok(Session {
        tipper: Tipper::new(network.tip_token(), mode, bridge),
        tracker,
        owner,
        balances: BalanceReader::new(network),
        confirmed,
    })
}

impl Session {
    pub fn owner(&self) -> Address {
        self.owner
    }

    pub async fn refresh_balance(&self) -> Result<Balance> {
        let balances: &dyn BalanceSource = &self.balances;
        self.tipper
            .refresh_balance(balances, self.owner)
            .await
            .wrap_err("Failed to read the wallet balance")
    }

    /// Print the balance again if a transfer was confirmed since the last call.
    pub async fn balance_after_transfer(&mut self) {
        if self.confirmed.try_recv().is_err() {
            return;
        }
        while self.confirmed.try_recv().is_ok() {}
        match self.refresh_balance().await {
            Ok(balance) => println!("Balance: {balance} {}", self.tipper.token().symbol()),
            Err(err) => println!("Could not refresh the balance: {err}"),
        }
    }
}
