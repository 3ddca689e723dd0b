// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::amount::{resolve, AmountMode, Balance, DEFAULT_TIP_AMOUNT};
use crate::common::Address;
use crate::error::{Result, TipError};
use crate::feed::Post;
use crate::notification::{NotificationBridge, TransferContext};
use crate::request::{
    build, parse_recipient, recipient_for, Payload, SubmissionMode, TransferRequest,
};
use crate::token::TokenDescriptor;
use crate::tracker::{TipTracker, TransactionHandle};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::watch;

/// Reads token balances.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn balance(&self, owner: Address, token: &TokenDescriptor) -> Result<Balance>;
}

/// How much to tip a post author.
#[derive(Clone, Debug, PartialEq)]
pub enum TipAmount {
    /// The "tip a penny" preset.
    Preset,
    Custom(String),
    /// A share of the last fetched balance.
    Percentage(f64),
}

/// The two user flows: tipping a post author and sending to an address.
///
/// Input is validated before anything reaches a tracker. A rejected input raises a
/// transient error notification and leaves the tracker untouched.
pub struct Tipper {
    token: TokenDescriptor,
    mode: SubmissionMode,
    bridge: NotificationBridge,
    balance: watch::Sender<Option<Balance>>,
}

impl Tipper {
    pub fn new(token: TokenDescriptor, mode: SubmissionMode, bridge: NotificationBridge) -> Self {
        let (balance, _) = watch::channel(None);
        Self {
            token,
            mode,
            bridge,
            balance,
        }
    }

    pub fn token(&self) -> &TokenDescriptor {
        &self.token
    }

    /// The last fetched balance, if any.
    pub fn balance(&self) -> Option<Balance> {
        *self.balance.borrow()
    }

    /// Fetch the balance of `owner`. A failed read keeps the previous value.
    pub async fn refresh_balance(
        &self,
        source: &dyn BalanceSource,
        owner: Address,
    ) -> Result<Balance> {
        let balance = source
            .balance(owner, &self.token)
            .await
            .inspect_err(|err| warn!("Failed to refresh the balance of {owner:?}: {err}"))?;
        debug!("Balance of {owner:?} is {balance} {}", self.token.symbol());
        self.balance.send_replace(Some(balance));
        Ok(balance)
    }

    /// Tip the author of `post`.
    pub async fn tip_post(
        &self,
        tracker: &TipTracker,
        post: &Post,
        amount: &TipAmount,
    ) -> Result<TransactionHandle> {
        let (payload, context) = self.validated(self.prepare_tip(post, amount))?;
        info!("Tipping @{} for post {}", post.author.username, post.id);
        tracker.submit(&payload, &context).await
    }

    /// Send `amount` of the token to the address typed by the user.
    pub async fn send(
        &self,
        tracker: &TipTracker,
        recipient: &str,
        amount: &str,
    ) -> Result<TransactionHandle> {
        let (payload, context) = self.validated(self.prepare_send(recipient, amount))?;
        info!("Sending {amount} {} to {recipient}", self.token.symbol());
        tracker.submit(&payload, &context).await
    }

    fn prepare_tip(&self, post: &Post, amount: &TipAmount) -> Result<(Payload, TransferContext)> {
        let recipient = recipient_for(post)?;
        let balance = self.balance();
        let mode = match amount {
            TipAmount::Preset => AmountMode::Fixed(DEFAULT_TIP_AMOUNT),
            TipAmount::Custom(text) => AmountMode::Custom(text),
            TipAmount::Percentage(ratio) => AmountMode::Percentage {
                balance: balance.as_ref(),
                ratio: *ratio,
            },
        };
        let amount = resolve(mode, &self.token)?;
        let request = TransferRequest::new(recipient, self.token.clone(), amount);
        let context = TransferContext::Tip {
            username: post.author.username.clone(),
        };
        Ok((build(&request, &self.mode)?, context))
    }

    fn prepare_send(&self, recipient: &str, amount: &str) -> Result<(Payload, TransferContext)> {
        let recipient = parse_recipient(recipient)?;
        let amount = resolve(AmountMode::Custom(amount), &self.token)?;
        let request = TransferRequest::new(recipient, self.token.clone(), amount);
        let context = TransferContext::Send {
            amount,
            symbol: self.token.symbol().to_string(),
            recipient,
        };
        Ok((build(&request, &self.mode)?, context))
    }

    fn validated<T>(&self, prepared: Result<T>) -> Result<T> {
        prepared.inspect_err(|err: &TipError| {
            if err.is_validation() {
                let _id = self.bridge.reject(err);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::U256;
    use crate::feed::{Author, Reactions, Replies, VerifiedAddresses};
    use crate::notification::test_utils::{NotifierCall, RecordingNotifier};
    use crate::notification::Severity;
    use crate::tracker::test_utils::ScriptedConfirmations;
    use crate::tracker::{ConfirmationEvent, SubmissionError, TransferState, TransferSubmitter};
    use alloy::primitives::{address, b256};
    use assert_matches::assert_matches;
    use mockall::mock;
    use mockall::predicate::*;
    use std::sync::Arc;

    mock! {
        pub Submitter {}
        #[async_trait]
        impl TransferSubmitter for Submitter {
            async fn submit(
                &self,
                payload: &Payload,
            ) -> std::result::Result<TransactionHandle, SubmissionError>;
        }
    }

    const OWNER: Address = address!("00000000000000000000000000000000000000ff");

    fn post(eth_addresses: Vec<&str>) -> Post {
        Post {
            id: "0xabc".to_string(),
            author: Author {
                username: "alice".to_string(),
                display_name: "Alice".to_string(),
                pfp_url: None,
                power_badge: false,
                custody_address: Some("0x0000000000000000000000000000000000000001".to_string()),
                verified_addresses: VerifiedAddresses {
                    eth_addresses: eth_addresses.into_iter().map(String::from).collect(),
                    sol_addresses: vec![],
                },
            },
            embeds: vec![],
            text: "gm".to_string(),
            timestamp: "2024-11-20T10:00:00.000Z".to_string(),
            reactions: Reactions::default(),
            replies: Replies::default(),
        }
    }

    fn handle() -> TransactionHandle {
        TransactionHandle::Transaction(b256!(
            "462ff33b01d7930b05dc87826b485f6f19884f1cf1c15694477be68ff7dda066"
        ))
    }

    fn setup(submitter: MockSubmitter) -> (Tipper, TipTracker, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let bridge = NotificationBridge::new(Arc::<RecordingNotifier>::clone(&notifier));
        let tracker = TipTracker::new(
            Arc::new(submitter),
            Arc::new(ScriptedConfirmations::new(vec![ConfirmationEvent::Confirmed])),
            bridge.clone(),
        );
        let tipper = Tipper::new(
            TokenDescriptor::usdc_base_sepolia(),
            SubmissionMode::Direct,
            bridge,
        );
        (tipper, tracker, notifier)
    }

    #[tokio::test]
    async fn author_without_address_is_rejected_before_the_tracker() {
        let mut submitter = MockSubmitter::new();
        submitter.expect_submit().never();
        let (tipper, tracker, notifier) = setup(submitter);
        let mut transitions = tracker.subscribe();

        let result = tipper
            .tip_post(&tracker, &post(vec![]), &TipAmount::Preset)
            .await;

        assert_eq!(result, Err(TipError::NoRecipientAddress("alice".to_string())));
        assert_eq!(tracker.state(), TransferState::Idle);
        assert!(transitions.try_recv().is_err());
        // only the transient validation error, nothing from the tracker
        assert_matches!(notifier.calls().as_slice(), [NotifierCall::Open(_, n)] => {
            assert_eq!(n.message, "Invalid input");
            assert_eq!(n.severity, Severity::Error);
            assert!(!n.sticky);
        });
    }

    #[tokio::test]
    async fn invalid_custom_amount_submits_nothing() {
        let mut submitter = MockSubmitter::new();
        submitter.expect_submit().never();
        let (tipper, tracker, notifier) = setup(submitter);
        let post = post(vec!["0x00000000000000000000000000000000000000aa"]);

        for text in ["", "abc", "-1", "0.0000001"] {
            let result = tipper
                .tip_post(&tracker, &post, &TipAmount::Custom(text.to_string()))
                .await;
            assert_matches!(result, Err(TipError::InvalidAmount(_)), "{text:?}");
        }
        assert_eq!(notifier.opened(), 4);
        assert_eq!(tracker.state(), TransferState::Idle);
    }

    #[tokio::test]
    async fn preset_tip_goes_to_the_first_verified_address() -> eyre::Result<()> {
        let mut submitter = MockSubmitter::new();
        submitter
            .expect_submit()
            .withf(|payload| {
                let token = TokenDescriptor::usdc_base_sepolia();
                matches!(payload, Payload::Single(call) if Some(call.to) == token.contract_address())
            })
            .times(1)
            .returning(|_| Ok(handle()));
        let (tipper, tracker, notifier) = setup(submitter);

        let post = post(vec![
            "0x00000000000000000000000000000000000000aa",
            "0x00000000000000000000000000000000000000bb",
        ]);
        assert_eq!(
            tipper.tip_post(&tracker, &post, &TipAmount::Preset).await?,
            handle()
        );
        assert_eq!(
            notifier.messages(),
            vec!["Sending tip...", "Tip sent successfully!"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn percentage_needs_a_fetched_balance() -> eyre::Result<()> {
        let mut submitter = MockSubmitter::new();
        submitter.expect_submit().times(1).returning(|_| Ok(handle()));
        let (tipper, tracker, _notifier) = setup(submitter);
        let post = post(vec!["0x00000000000000000000000000000000000000aa"]);

        assert_eq!(
            tipper
                .tip_post(&tracker, &post, &TipAmount::Percentage(0.5))
                .await,
            Err(TipError::BalanceUnavailable)
        );

        let mut balances = MockBalanceSource::new();
        balances
            .expect_balance()
            .with(eq(OWNER), always())
            .times(1)
            .returning(|_, _| Ok(Balance::new(U256::from(10_000_000), 6)));
        tipper.refresh_balance(&balances, OWNER).await?;

        tipper
            .tip_post(&tracker, &post, &TipAmount::Percentage(0.5))
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn failed_balance_read_keeps_the_previous_balance() -> eyre::Result<()> {
        let (tipper, _tracker, _notifier) = setup(MockSubmitter::new());
        let mut balances = MockBalanceSource::new();
        let mut reads = 0;
        balances.expect_balance().times(2).returning(move |_, _| {
            reads += 1;
            if reads == 1 {
                Ok(Balance::new(U256::from(5_000_000), 6))
            } else {
                Err(TipError::BalanceUnavailable)
            }
        });

        tipper.refresh_balance(&balances, OWNER).await?;
        assert!(tipper.refresh_balance(&balances, OWNER).await.is_err());
        assert_eq!(tipper.balance(), Some(Balance::new(U256::from(5_000_000), 6)));
        Ok(())
    }

    #[tokio::test]
    async fn send_to_malformed_address_is_rejected() {
        let mut submitter = MockSubmitter::new();
        submitter.expect_submit().never();
        let (tipper, tracker, notifier) = setup(submitter);

        assert_matches!(
            tipper.send(&tracker, "0x1234", "1").await,
            Err(TipError::InvalidRecipient(_))
        );
        assert_eq!(notifier.opened(), 1);
    }

    #[tokio::test]
    async fn send_reports_amount_and_recipient() -> eyre::Result<()> {
        let mut submitter = MockSubmitter::new();
        submitter.expect_submit().times(1).returning(|_| Ok(handle()));
        let (tipper, tracker, notifier) = setup(submitter);

        tipper
            .send(&tracker, "0x00000000000000000000000000000000000000aa", "2.5")
            .await?;

        assert_matches!(notifier.calls().first(), Some(NotifierCall::Open(_, n)) => {
            assert_eq!(n.message, "Sending USDC...");
            let recipient = address!("00000000000000000000000000000000000000aa");
            assert_eq!(n.description, format!("Sending 2.5 USDC to {recipient}"));
        });
        assert_eq!(
            notifier.messages().last().map(String::as_str),
            Some("Transaction successful!")
        );
        Ok(())
    }
}
