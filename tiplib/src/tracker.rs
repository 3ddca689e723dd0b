// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Transfer lifecycle tracking.
//!
//! A `TipTracker` drives one transfer at a time through
//! `Idle -> Submitting -> AwaitingConfirmation -> Confirmed | Failed -> Idle`,
//! keeping the transfer's notification in step and calling the completion callback once a
//! transfer is confirmed.

use crate::common::{BatchId, TxHash};
use crate::error::{Result, TipError};
use crate::notification::{on_state_change, NotificationBridge, NotificationId, TransferContext};
use crate::request::Payload;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

pub const DEFAULT_REQUIRED_CONFIRMATIONS: u64 = 1;
const TRANSITION_CHANNEL_CAPACITY: usize = 16;
const CANCELLED: &str = "cancelled";

/// Identifies a submitted transfer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransactionHandle {
    Transaction(TxHash),
    /// An EIP-5792 calls bundle.
    Batch(BatchId),
}

impl fmt::Display for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionHandle::Transaction(hash) => write!(f, "{hash}"),
            TransactionHandle::Batch(id) => write!(f, "batch {id}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TransferState {
    #[default]
    Idle,
    Submitting,
    AwaitingConfirmation(TransactionHandle),
    Confirmed(TransactionHandle),
    Failed(TipError),
}

impl TransferState {
    /// A transfer is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            TransferState::Submitting | TransferState::AwaitingConfirmation(_)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Confirmed(_) | TransferState::Failed(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: TransferState,
    pub to: TransferState,
}

/// Why a wallet did not accept a payload.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    /// The user, or the local signer, refused to sign.
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Connectivity(String),
}

impl From<SubmissionError> for TipError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Rejected(reason) => TipError::WalletRejected(reason),
            SubmissionError::Connectivity(reason) => TipError::SubmissionFailed(reason),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmationEvent {
    Pending { confirmations: u64 },
    Confirmed,
    /// Reverted, dropped, replaced or a failed batch.
    Failed(String),
}

/// Hands payloads to a wallet.
#[async_trait]
pub trait TransferSubmitter: Send + Sync {
    async fn submit(
        &self,
        payload: &Payload,
    ) -> std::result::Result<TransactionHandle, SubmissionError>;
}

/// Reports the progress of a submitted transfer.
///
/// The stream yields zero or more `Pending` events followed by at least one terminal event.
pub trait ConfirmationSource: Send + Sync {
    fn watch(
        &self,
        handle: &TransactionHandle,
        confirmations: u64,
    ) -> mpsc::Receiver<ConfirmationEvent>;
}

pub type CompletionCallback = Box<dyn Fn() + Send + Sync>;

/// Tracks the transfers started from one UI control.
pub struct TipTracker {
    submitter: Arc<dyn TransferSubmitter>,
    confirmations: Arc<dyn ConfirmationSource>,
    bridge: NotificationBridge,
    on_confirmed: Option<CompletionCallback>,
    required_confirmations: u64,
    state: watch::Sender<TransferState>,
    transitions: broadcast::Sender<Transition>,
}

impl TipTracker {
    pub fn new(
        submitter: Arc<dyn TransferSubmitter>,
        confirmations: Arc<dyn ConfirmationSource>,
        bridge: NotificationBridge,
    ) -> Self {
        let (state, _) = watch::channel(TransferState::Idle);
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        Self {
            submitter,
            confirmations,
            bridge,
            on_confirmed: None,
            required_confirmations: DEFAULT_REQUIRED_CONFIRMATIONS,
            state,
            transitions,
        }
    }

    /// Called once for every confirmed transfer, typically to refresh balances.
    pub fn with_completion_callback(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_confirmed = Some(Box::new(callback));
        self
    }

    pub fn with_required_confirmations(mut self, confirmations: u64) -> Self {
        self.required_confirmations = confirmations.max(1);
        self
    }

    pub fn state(&self) -> TransferState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    /// Receiver for the latest state.
    pub fn watch_state(&self) -> watch::Receiver<TransferState> {
        self.state.subscribe()
    }

    /// Receiver for every transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.transitions.subscribe()
    }

    /// Submit a payload and follow it until it is confirmed or fails.
    ///
    /// Returns `TransferInProgress` straight away if a transfer is already in flight.
    pub async fn submit(
        &self,
        payload: &Payload,
        context: &TransferContext,
    ) -> Result<TransactionHandle> {
        let claimed = self.state.send_if_modified(|state| {
            if *state == TransferState::Idle {
                *state = TransferState::Submitting;
                true
            } else {
                false
            }
        });
        if !claimed {
            warn!("Ignoring submit, a transfer is already in progress");
            return Err(TipError::TransferInProgress);
        }

        let mut transfer = InFlight {
            tracker: self,
            context,
            notification: None,
            settled: false,
        };
        self.announce(
            TransferState::Idle,
            TransferState::Submitting,
            context,
            &mut transfer.notification,
        );

        debug!("Submitting payload with {} call(s)", payload.calls().len());
        let handle = match self.submitter.submit(payload).await {
            Ok(handle) => handle,
            Err(err) => {
                error!("Submission failed: {err:?}");
                let err = TipError::from(err);
                transfer.settle(TransferState::Failed(err.clone()));
                return Err(err);
            }
        };

        info!("Transfer submitted: {handle}");
        transfer.advance(TransferState::AwaitingConfirmation(handle.clone()));

        match self.await_confirmation(&handle).await {
            Ok(()) => {
                info!("Transfer {handle} confirmed");
                transfer.settle(TransferState::Confirmed(handle.clone()));
                Ok(handle)
            }
            Err(err) => {
                error!("Transfer {handle} failed: {err}");
                transfer.settle(TransferState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Consume confirmation events until the first terminal one.
    async fn await_confirmation(&self, handle: &TransactionHandle) -> Result<()> {
        let mut events = self
            .confirmations
            .watch(handle, self.required_confirmations);

        while let Some(event) = events.recv().await {
            match event {
                ConfirmationEvent::Pending { confirmations } => {
                    debug!(
                        "Transfer {handle} has {confirmations}/{} confirmations",
                        self.required_confirmations
                    );
                }
                ConfirmationEvent::Confirmed => return Ok(()),
                ConfirmationEvent::Failed(reason) => {
                    return Err(TipError::ConfirmationFailed(reason));
                }
            }
        }

        warn!("Confirmation stream for {handle} closed without a result");
        Err(TipError::ConfirmationFailed(
            "confirmation source closed".to_string(),
        ))
    }

    /// Enter a terminal state, run its side effects and return to `Idle`.
    fn finish(
        &self,
        terminal: TransferState,
        context: &TransferContext,
        notification: &mut Option<NotificationId>,
    ) {
        let confirmed = matches!(terminal, TransferState::Confirmed(_));
        self.transition(terminal, context, notification);
        if confirmed {
            if let Some(callback) = &self.on_confirmed {
                callback();
            }
        }
        self.transition(TransferState::Idle, context, notification);
    }

    fn transition(
        &self,
        to: TransferState,
        context: &TransferContext,
        notification: &mut Option<NotificationId>,
    ) {
        let from = self.state.send_replace(to.clone());
        self.announce(from, to, context, notification);
    }

    fn announce(
        &self,
        from: TransferState,
        to: TransferState,
        context: &TransferContext,
        notification: &mut Option<NotificationId>,
    ) {
        trace!("Transfer state {from:?} -> {to:?}");
        let action = on_state_change(&from, &to, context);
        *notification = self.bridge.apply(action, notification.take());
        // Nobody listening is fine.
        let _ = self.transitions.send(Transition { from, to });
    }
}

/// The transfer a `submit` call is driving.
///
/// Dropping it before a terminal state, e.g. when the `submit` future is cancelled, fails the
/// transfer so the tracker returns to `Idle` and its notification is resolved.
struct InFlight<'a> {
    tracker: &'a TipTracker,
    context: &'a TransferContext,
    notification: Option<NotificationId>,
    settled: bool,
}

impl InFlight<'_> {
    fn advance(&mut self, to: TransferState) {
        self.tracker
            .transition(to, self.context, &mut self.notification);
    }

    fn settle(&mut self, terminal: TransferState) {
        self.settled = true;
        self.tracker
            .finish(terminal, self.context, &mut self.notification);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Transfer abandoned in state {:?}", self.tracker.state());
            self.settle(TransferState::Failed(TipError::SubmissionFailed(
                CANCELLED.to_string(),
            )));
        }
    }
}
