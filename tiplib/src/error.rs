// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use thiserror::Error;

/// Specialisation of `std::Result`.
pub type Result<T, E = TipError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
/// Errors raised while preparing, submitting or confirming a transfer.
pub enum TipError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("@{0} has no verified address to receive tips")]
    NoRecipientAddress(String),
    #[error("The amount has more fractional digits than the token supports ({decimals})")]
    PrecisionExceeded { decimals: u8 },
    #[error("The balance is unavailable")]
    BalanceUnavailable,
    #[error("The wallet rejected the transfer: {0}")]
    WalletRejected(String),
    #[error("Failed to submit the transfer: {0}")]
    SubmissionFailed(String),
    #[error("The transfer failed to confirm: {0}")]
    ConfirmationFailed(String),
    #[error("The feed is unavailable: {0}")]
    FeedUnavailable(String),
    #[error("A transfer is already in progress for this control")]
    TransferInProgress,
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TipError {
    /// Whether this error was raised before anything was submitted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TipError::InvalidAmount(_)
                | TipError::InvalidRecipient(_)
                | TipError::NoRecipientAddress(_)
                | TipError::PrecisionExceeded { .. }
                | TipError::BalanceUnavailable
        )
    }
}
