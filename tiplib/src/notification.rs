// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Maps tracker transitions onto a single, continuously updated user notification.

use crate::amount::DecimalAmount;
use crate::common::Address;
use crate::error::TipError;
use crate::tracker::TransferState;
#[cfg(test)]
use mockall::automock;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How long a success notification stays up before it is dismissed.
pub const SUCCESS_CLOSE_DELAY: Duration = Duration::from_millis(2000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub description: String,
    pub severity: Severity,
    /// Sticky notifications stay until replaced or dismissed.
    pub sticky: bool,
}

impl Notification {
    fn info(message: String, description: String) -> Self {
        Self {
            message,
            description,
            severity: Severity::Info,
            sticky: true,
        }
    }

    fn success(message: String, description: String) -> Self {
        Self {
            message,
            description,
            severity: Severity::Success,
            sticky: false,
        }
    }

    fn error(message: String, description: String) -> Self {
        Self {
            message,
            description,
            severity: Severity::Error,
            sticky: true,
        }
    }
}

/// What the user is doing, used to word the notifications of a transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferContext {
    /// Tipping the author of a post.
    Tip { username: String },
    /// Sending tokens to an address.
    Send {
        amount: DecimalAmount,
        symbol: String,
        recipient: Address,
    },
}

impl TransferContext {
    fn pending(&self) -> Notification {
        match self {
            TransferContext::Tip { username } => {
                Notification::info("Sending tip...".to_string(), format!("Tipping @{username}"))
            }
            TransferContext::Send {
                amount,
                symbol,
                recipient,
            } => Notification::info(
                format!("Sending {symbol}..."),
                format!("Sending {amount} {symbol} to {recipient}"),
            ),
        }
    }

    fn confirmed(&self) -> Notification {
        match self {
            TransferContext::Tip { username } => Notification::success(
                "Tip sent successfully!".to_string(),
                format!("You tipped @{username}"),
            ),
            TransferContext::Send {
                amount,
                symbol,
                recipient,
            } => Notification::success(
                "Transaction successful!".to_string(),
                format!("Sent {amount} {symbol} to {recipient}"),
            ),
        }
    }

    fn failed(&self, error: &TipError) -> Notification {
        match self {
            TransferContext::Tip { .. } => {
                Notification::error("Tip failed".to_string(), error.to_string())
            }
            TransferContext::Send { .. } => Notification::error(
                "Transaction failed".to_string(),
                format!("Please try again: {error}"),
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationAction {
    None,
    Open(Notification),
    Replace(Notification),
    ReplaceThenClose {
        notification: Notification,
        after: Duration,
    },
}

/// Decide what happens to the transfer's notification on a state transition.
pub fn on_state_change(
    previous: &TransferState,
    new: &TransferState,
    context: &TransferContext,
) -> NotificationAction {
    match (previous, new) {
        (TransferState::Idle, TransferState::Submitting) => {
            NotificationAction::Open(context.pending())
        }
        (_, TransferState::Confirmed(_)) => NotificationAction::ReplaceThenClose {
            notification: context.confirmed(),
            after: SUCCESS_CLOSE_DELAY,
        },
        (_, TransferState::Failed(error)) => NotificationAction::Replace(context.failed(error)),
        _ => NotificationAction::None,
    }
}

/// The surface notifications are shown on.
#[cfg_attr(test, automock)]
pub trait Notifier: Send + Sync {
    fn open(&self, notification: &Notification) -> NotificationId;
    fn update(&self, id: NotificationId, notification: &Notification);
    fn dismiss(&self, id: NotificationId);
}

/// Executes notification actions against a `Notifier`.
#[derive(Clone)]
pub struct NotificationBridge {
    notifier: Arc<dyn Notifier>,
}

impl NotificationBridge {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Apply `action` to the notification currently representing a transfer, if any.
    ///
    /// Returns the id that represents the transfer afterwards.
    pub fn apply(
        &self,
        action: NotificationAction,
        current: Option<NotificationId>,
    ) -> Option<NotificationId> {
        match action {
            NotificationAction::None => current,
            NotificationAction::Open(notification) | NotificationAction::Replace(notification) => {
                Some(self.show(&notification, current))
            }
            NotificationAction::ReplaceThenClose {
                notification,
                after,
            } => {
                let id = self.show(&notification, current);
                self.close_after(id, after);
                Some(id)
            }
        }
    }

    /// Surface a validation error. Nothing was submitted, so no transfer owns it.
    pub fn reject(&self, error: &TipError) -> NotificationId {
        debug!("Rejecting input: {error}");
        self.notifier.open(&Notification {
            message: "Invalid input".to_string(),
            description: error.to_string(),
            severity: Severity::Error,
            sticky: false,
        })
    }

    fn show(&self, notification: &Notification, current: Option<NotificationId>) -> NotificationId {
        match current {
            Some(id) => {
                self.notifier.update(id, notification);
                id
            }
            None => self.notifier.open(notification),
        }
    }

    fn close_after(&self, id: NotificationId, after: Duration) {
        let notifier = Arc::clone(&self.notifier);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let _handle = runtime.spawn(async move {
                    tokio::time::sleep(after).await;
                    notifier.dismiss(id);
                });
            }
            Err(_) => {
                warn!("No async runtime to delay closing notification {id}, closing it now");
                notifier.dismiss(id);
            }
        }
    }
}
