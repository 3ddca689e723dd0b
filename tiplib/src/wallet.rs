// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Chain-backed collaborators of the tracker.

use crate::amount::Balance;
use crate::common::{Address, BatchId, EthereumWallet, TxHash};
use crate::contract::erc20::Erc20Token;
use crate::error::{Result, TipError};
use crate::request::{Call, Payload, SponsorService};
use crate::tipper::BalanceSource;
use crate::token::TokenDescriptor;
use crate::tracker::{
    ConfirmationEvent, ConfirmationSource, SubmissionError, TransactionHandle, TransferSubmitter,
};
use crate::utils::http_provider;
use crate::Network;
use alloy::network::{Ethereum, NetworkWallet, TransactionBuilder};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// EIP-1193 "User Rejected Request".
const USER_REJECTED_CODE: i64 = 4001;
const EIP5792_VERSION: &str = "1.0";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const CONFIRMATION_CHANNEL_CAPACITY: usize = 8;

/// A wallet signing with a local private key. Submits single calls only.
#[derive(Clone)]
pub struct Wallet {
    wallet: EthereumWallet,
    network: Network,
}

impl Wallet {
    pub fn new(network: Network, wallet: EthereumWallet) -> Self {
        Self { wallet, network }
    }

    /// Creates a new Wallet based on the given hex encoded private key.
    pub fn new_from_private_key(network: Network, private_key: &str) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.trim()).map_err(|err| {
            TipError::Configuration(format!("invalid private key: {err}"))
        })?;
        Ok(Self::new(network, EthereumWallet::from(signer)))
    }

    pub fn address(&self) -> Address {
        <EthereumWallet as NetworkWallet<Ethereum>>::default_signer_address(&self.wallet)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    async fn send_call(&self, call: &Call) -> std::result::Result<TxHash, SubmissionError> {
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(self.wallet.clone())
            .on_http(self.network.rpc_url().clone());

        let transaction = TransactionRequest::default()
            .with_to(call.to)
            .with_input(call.data.clone())
            .with_value(call.value);

        let pending = provider
            .send_transaction(transaction)
            .await
            .inspect_err(|err| error!("Error sending transaction to {:?}: {err:?}", call.to))
            .map_err(submission_error)?;

        Ok(*pending.tx_hash())
    }
}

#[async_trait]
impl TransferSubmitter for Wallet {
    async fn submit(
        &self,
        payload: &Payload,
    ) -> std::result::Result<TransactionHandle, SubmissionError> {
        match payload {
            Payload::Single(call) => {
                let hash = self.send_call(call).await?;
                debug!("Transaction {hash:?} sent from {:?}", self.address());
                Ok(TransactionHandle::Transaction(hash))
            }
            Payload::Batch { .. } => Err(SubmissionError::Connectivity(
                "a local key wallet cannot execute batched calls".to_string(),
            )),
        }
    }
}

// never prints the key
impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

/// Classify an RPC failure as a refusal to sign or a connectivity problem.
fn submission_error(err: RpcError<TransportErrorKind>) -> SubmissionError {
    match &err {
        RpcError::ErrorResp(payload) if payload.code == USER_REJECTED_CODE => {
            SubmissionError::Rejected(payload.message.to_string())
        }
        RpcError::LocalUsageError(_) => SubmissionError::Rejected(err.to_string()),
        _ => SubmissionError::Connectivity(err.to_string()),
    }
}

/// A smart wallet reached over EIP-5792 (`wallet_sendCalls`).
///
/// Batches are executed atomically, with fees paid by the sponsor when one is given.
/// A single call is sent as a batch of one.
pub struct CallsWallet {
    wallet_rpc_url: Url,
    from: Address,
    chain_id: u64,
}

impl CallsWallet {
    pub fn new(wallet_rpc_url: Url, from: Address, chain_id: u64) -> Self {
        Self {
            wallet_rpc_url,
            from,
            chain_id,
        }
    }

    fn send_calls_params(&self, calls: &[Call], sponsor: Option<&SponsorService>) -> Value {
        let mut params = json!({
            "version": EIP5792_VERSION,
            "chainId": format!("{:#x}", self.chain_id),
            "from": self.from,
            "calls": calls,
        });
        if let Some(sponsor) = sponsor {
            params["capabilities"] = json!({ "paymasterService": { "url": sponsor.url } });
        }
        json!([params])
    }
}

#[async_trait]
impl TransferSubmitter for CallsWallet {
    async fn submit(
        &self,
        payload: &Payload,
    ) -> std::result::Result<TransactionHandle, SubmissionError> {
        let params = self.send_calls_params(payload.calls(), payload.sponsor());
        let provider = ProviderBuilder::new().on_http(self.wallet_rpc_url.clone());

        let response: Value = provider
            .raw_request("wallet_sendCalls".into(), params)
            .await
            .inspect_err(|err| error!("Error calling wallet_sendCalls: {err:?}"))
            .map_err(submission_error)?;

        let id = calls_id(&response).ok_or_else(|| {
            error!("Unexpected wallet_sendCalls response: {response}");
            SubmissionError::Connectivity(format!("unexpected wallet_sendCalls response: {response}"))
        })?;
        debug!("Submitted {} call(s) as batch {id}", payload.calls().len());
        Ok(TransactionHandle::Batch(id))
    }
}

/// The batch identifier, returned as a bare string or as `{ "id": .. }`.
fn calls_id(response: &Value) -> Option<BatchId> {
    match response {
        Value::String(id) => Some(id.clone()),
        Value::Object(object) => object.get("id")?.as_str().map(str::to_string),
        _ => None,
    }
}

/// Map a `wallet_getCallsStatus` response onto a confirmation event.
fn batch_event(status: &Value) -> Option<ConfirmationEvent> {
    let receipts_succeeded = || {
        status
            .get("receipts")
            .and_then(Value::as_array)
            .map(|receipts| {
                receipts.iter().all(|receipt| {
                    matches!(
                        receipt.get("status").and_then(Value::as_str),
                        Some("0x1") | Some("success")
                    )
                })
            })
            .unwrap_or(true)
    };
    let confirmed = |succeeded: bool| {
        if succeeded {
            ConfirmationEvent::Confirmed
        } else {
            ConfirmationEvent::Failed("a call of the batch reverted".to_string())
        }
    };

    match status.get("status")? {
        Value::String(text) => match text.as_str() {
            "PENDING" => Some(ConfirmationEvent::Pending { confirmations: 0 }),
            "CONFIRMED" => Some(confirmed(receipts_succeeded())),
            other => Some(ConfirmationEvent::Failed(format!("batch status {other}"))),
        },
        Value::Number(code) => match code.as_u64()? {
            100..=199 => Some(ConfirmationEvent::Pending { confirmations: 0 }),
            200..=299 => Some(confirmed(receipts_succeeded())),
            other => Some(ConfirmationEvent::Failed(format!("batch status {other}"))),
        },
        _ => None,
    }
}

/// Polls the chain, or the wallet for batches, until a transfer is final.
#[derive(Clone)]
pub struct ReceiptWatcher {
    rpc_url: Url,
    wallet_rpc_url: Option<Url>,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl ReceiptWatcher {
    pub fn new(network: &Network) -> Self {
        Self {
            rpc_url: network.rpc_url().clone(),
            wallet_rpc_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }

    /// Endpoint answering `wallet_getCallsStatus`.
    pub fn with_wallet_rpc_url(mut self, url: Url) -> Self {
        self.wallet_rpc_url = Some(url);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Give up on a transfer that is not final after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn poll_transaction(
        self,
        hash: TxHash,
        confirmations: u64,
        events: mpsc::Sender<ConfirmationEvent>,
    ) {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let started = Instant::now();

        while !events.is_closed() {
            let event = match provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) if !receipt.status() => {
                    Some(ConfirmationEvent::Failed("transaction reverted".to_string()))
                }
                Ok(Some(receipt)) => match provider.get_block_number().await {
                    Ok(latest) => {
                        let included = receipt.block_number.unwrap_or(latest);
                        let depth = latest.saturating_sub(included) + 1;
                        if depth >= confirmations {
                            Some(ConfirmationEvent::Confirmed)
                        } else {
                            Some(ConfirmationEvent::Pending {
                                confirmations: depth,
                            })
                        }
                    }
                    Err(err) => {
                        warn!("Error getting the latest block number: {err:?}");
                        None
                    }
                },
                Ok(None) => Some(ConfirmationEvent::Pending { confirmations: 0 }),
                Err(err) => {
                    warn!("Error getting the receipt of {hash:?}: {err:?}");
                    None
                }
            };

            if self.forward(event, started, &events).await {
                return;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn poll_batch(self, id: BatchId, events: mpsc::Sender<ConfirmationEvent>) {
        let Some(wallet_rpc_url) = self.wallet_rpc_url.clone() else {
            error!("Cannot follow batch {id} without a wallet endpoint");
            let _ = events
                .send(ConfirmationEvent::Failed(
                    "no wallet endpoint to follow the batch".to_string(),
                ))
                .await;
            return;
        };
        let provider = ProviderBuilder::new().on_http(wallet_rpc_url);
        let started = Instant::now();

        while !events.is_closed() {
            let event = match provider
                .raw_request::<_, Value>("wallet_getCallsStatus".into(), [id.clone()])
                .await
            {
                Ok(status) => batch_event(&status).or_else(|| {
                    warn!("Unexpected wallet_getCallsStatus response: {status}");
                    None
                }),
                Err(err) => {
                    warn!("Error getting the status of batch {id}: {err:?}");
                    None
                }
            };

            if self.forward(event, started, &events).await {
                return;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Forward an event, returns true once the stream is finished.
    async fn forward(
        &self,
        event: Option<ConfirmationEvent>,
        started: Instant,
        events: &mpsc::Sender<ConfirmationEvent>,
    ) -> bool {
        let event = match event {
            Some(ConfirmationEvent::Pending { .. }) | None if self.timed_out(started) => {
                ConfirmationEvent::Failed("timed out waiting for confirmation".to_string())
            }
            Some(event) => event,
            None => return false,
        };
        let terminal = !matches!(event, ConfirmationEvent::Pending { .. });
        events.send(event).await.is_err() || terminal
    }

    fn timed_out(&self, started: Instant) -> bool {
        self.timeout.is_some_and(|timeout| started.elapsed() >= timeout)
    }
}

impl ConfirmationSource for ReceiptWatcher {
    fn watch(
        &self,
        handle: &TransactionHandle,
        confirmations: u64,
    ) -> mpsc::Receiver<ConfirmationEvent> {
        let (tx, rx) = mpsc::channel(CONFIRMATION_CHANNEL_CAPACITY);
        let watcher = self.clone();
        let _task = match handle.clone() {
            TransactionHandle::Transaction(hash) => {
                tokio::spawn(watcher.poll_transaction(hash, confirmations, tx))
            }
            TransactionHandle::Batch(id) => tokio::spawn(watcher.poll_batch(id, tx)),
        };
        rx
    }
}

/// Reads native and ERC-20 balances.
pub struct BalanceReader {
    network: Network,
}

impl BalanceReader {
    pub fn new(network: Network) -> Self {
        Self { network }
    }
}

#[async_trait]
impl BalanceSource for BalanceReader {
    async fn balance(&self, owner: Address, token: &TokenDescriptor) -> Result<Balance> {
        let provider = http_provider(self.network.rpc_url().clone());
        let raw = match token {
            TokenDescriptor::Native { .. } => provider
                .get_balance(owner)
                .await
                .inspect_err(|err| error!("Error getting the native balance of {owner:?}: {err:?}"))
                .map_err(|_| TipError::BalanceUnavailable)?,
            TokenDescriptor::Erc20 { address, .. } => Erc20Token::new(*address, provider)
                .balance_of(owner)
                .await
                .map_err(|_| TipError::BalanceUnavailable)?,
        };
        Ok(Balance::new(raw, token.decimals()))
    }
}
