// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::amount::DecimalAmount;
use crate::common::{Address, Calldata, U256};
use crate::contract::erc20::transfer_calldata;
use crate::error::{Result, TipError};
use crate::feed::Post;
use crate::token::TokenDescriptor;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A transfer the user asked for. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    recipient: Address,
    token: TokenDescriptor,
    amount: DecimalAmount,
}

impl TransferRequest {
    pub fn new(recipient: Address, token: TokenDescriptor, amount: DecimalAmount) -> Self {
        Self {
            recipient,
            token,
            amount,
        }
    }

    pub fn recipient(&self) -> Address {
        self.recipient
    }

    pub fn token(&self) -> &TokenDescriptor {
        &self.token
    }

    pub fn amount(&self) -> DecimalAmount {
        self.amount
    }

    /// The single chain call moving this amount to the recipient.
    pub fn to_call(&self) -> Result<Call> {
        let raw_amount = self.amount.to_smallest_units(self.token.decimals())?;
        let call = match &self.token {
            TokenDescriptor::Native { .. } => Call {
                to: self.recipient,
                data: Calldata::new(),
                value: raw_amount,
            },
            TokenDescriptor::Erc20 { address, .. } => Call {
                to: *address,
                data: transfer_calldata(self.recipient, raw_amount),
                value: U256::ZERO,
            },
        };
        Ok(call)
    }
}

/// One call of a payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub to: Address,
    pub data: Calldata,
    pub value: U256,
}

/// A paymaster service that pays the fees of a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorService {
    pub url: String,
}

/// What gets handed to the wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Single(Call),
    /// Executed atomically, optionally with sponsored fees.
    Batch {
        calls: Vec<Call>,
        sponsor: Option<SponsorService>,
    },
}

impl Payload {
    pub fn calls(&self) -> &[Call] {
        match self {
            Payload::Single(call) => std::slice::from_ref(call),
            Payload::Batch { calls, .. } => calls,
        }
    }

    pub fn sponsor(&self) -> Option<&SponsorService> {
        match self {
            Payload::Single(_) => None,
            Payload::Batch { sponsor, .. } => sponsor.as_ref(),
        }
    }
}

/// How a transfer is submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SubmissionMode {
    /// A plain transaction signed and paid by the user.
    #[default]
    Direct,
    /// A batch of calls whose fees are paid by the given sponsor.
    Sponsored(SponsorService),
}

/// Parse a `0x` prefixed hex address. Mixed-case input must carry a valid checksum.
pub fn parse_recipient(text: &str) -> Result<Address> {
    let text = text.trim();
    let invalid = || TipError::InvalidRecipient(text.to_string());

    let hex = text.strip_prefix("0x").ok_or_else(invalid)?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let is_mixed_case = hex.chars().any(|c| c.is_ascii_uppercase())
        && hex.chars().any(|c| c.is_ascii_lowercase());
    if is_mixed_case {
        Address::parse_checksummed(text, None).map_err(|_| invalid())
    } else {
        Address::from_str(text).map_err(|_| invalid())
    }
}

/// The address tips to this post's author go to.
///
/// The author's first verified address is used. An author without one cannot be tipped.
pub fn recipient_for(post: &Post) -> Result<Address> {
    let first = post
        .author
        .verified_addresses
        .eth_addresses
        .first()
        .ok_or_else(|| TipError::NoRecipientAddress(post.author.username.clone()))?;
    parse_recipient(first)
}

/// Build the payload for a single transfer.
pub fn build(request: &TransferRequest, mode: &SubmissionMode) -> Result<Payload> {
    let call = request.to_call()?;
    debug!(
        "Built transfer of {} {} to {:?}",
        request.amount,
        request.token.symbol(),
        request.recipient
    );
    let payload = match mode {
        SubmissionMode::Direct => Payload::Single(call),
        SubmissionMode::Sponsored(sponsor) => Payload::Batch {
            calls: vec![call],
            sponsor: Some(sponsor.clone()),
        },
    };
    Ok(payload)
}

/// Build one atomic batch out of several transfers.
pub fn build_batch(
    requests: &[TransferRequest],
    sponsor: Option<SponsorService>,
) -> Result<Payload> {
    if requests.is_empty() {
        return Err(TipError::InvalidAmount(
            "a batch needs at least one transfer".to_string(),
        ));
    }
    let calls = requests
        .iter()
        .map(TransferRequest::to_call)
        .collect::<Result<Vec<_>>>()?;
    Ok(Payload::Batch { calls, sponsor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::DEFAULT_TIP_AMOUNT;
    use crate::feed::{Author, Reactions, Replies, VerifiedAddresses};
    use alloy::primitives::address;
    use assert_matches::assert_matches;

    const ALICE: Address = address!("00000000000000000000000000000000000000aa");

    fn post_with_addresses(eth_addresses: Vec<&str>) -> Post {
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

    #[test]
    fn parse_recipient_validates_syntax() -> Result<()> {
        assert_eq!(
            ALICE,
            parse_recipient("0x00000000000000000000000000000000000000aa")?
        );
        assert_eq!(
            ALICE,
            parse_recipient("0x00000000000000000000000000000000000000AA")?
        );
        // valid EIP-55 checksum
        assert_eq!(
            address!("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
            parse_recipient("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")?
        );

        for bad in [
            "",
            "0x",
            "00000000000000000000000000000000000000aa",
            "0x00000000000000000000000000000000000000a",
            "0x00000000000000000000000000000000000000zz",
            // broken checksum
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD",
        ] {
            assert_matches!(
                parse_recipient(bad),
                Err(TipError::InvalidRecipient(_)),
                "{bad:?} should be rejected"
            );
        }
        Ok(())
    }

    #[test]
    fn recipient_for_uses_first_verified_address() -> Result<()> {
        let post = post_with_addresses(vec![
            "0x00000000000000000000000000000000000000aa",
            "0x00000000000000000000000000000000000000bb",
        ]);
        assert_eq!(ALICE, recipient_for(&post)?);
        Ok(())
    }

    #[test]
    fn recipient_for_never_falls_back_to_custody_address() {
        let post = post_with_addresses(vec![]);
        assert_eq!(
            Err(TipError::NoRecipientAddress("alice".to_string())),
            recipient_for(&post)
        );
    }

    #[test]
    fn recipient_for_rejects_malformed_verified_address() {
        let post = post_with_addresses(vec!["not-an-address"]);
        assert_matches!(recipient_for(&post), Err(TipError::InvalidRecipient(_)));
    }

    #[test]
    fn native_transfer_carries_value() -> Result<()> {
        let amount = DecimalAmount::from_str("0.5")?;
        let request = TransferRequest::new(ALICE, TokenDescriptor::eth(), amount);

        let payload = build(&request, &SubmissionMode::Direct)?;
        assert_eq!(
            payload,
            Payload::Single(Call {
                to: ALICE,
                data: Calldata::new(),
                value: U256::from(500_000_000_000_000_000u64),
            })
        );
        Ok(())
    }

    #[test]
    fn token_transfer_targets_the_contract() -> Result<()> {
        let token = TokenDescriptor::usdc_base_sepolia();
        let request = TransferRequest::new(ALICE, token.clone(), DEFAULT_TIP_AMOUNT);

        let payload = build(&request, &SubmissionMode::Direct)?;
        let Payload::Single(call) = payload else {
            panic!("Expected a single call");
        };
        assert_eq!(Some(call.to), token.contract_address());
        assert_eq!(call.value, U256::ZERO);
        assert_eq!(call.data, transfer_calldata(ALICE, U256::from(10_000)));
        Ok(())
    }

    #[test]
    fn sponsored_transfer_is_a_batch() -> Result<()> {
        let sponsor = SponsorService {
            url: "https://paymaster.example.com".to_string(),
        };
        let request = TransferRequest::new(
            ALICE,
            TokenDescriptor::usdc_base_sepolia(),
            DEFAULT_TIP_AMOUNT,
        );

        let payload = build(&request, &SubmissionMode::Sponsored(sponsor.clone()))?;
        assert_eq!(payload.calls().len(), 1);
        assert_eq!(payload.sponsor(), Some(&sponsor));
        Ok(())
    }

    #[test]
    fn precision_is_checked_against_the_token() -> Result<()> {
        let request = TransferRequest::new(
            ALICE,
            TokenDescriptor::usdc_base_sepolia(),
            DecimalAmount::from_str("0.0000001")?,
        );
        assert_eq!(
            Err(TipError::PrecisionExceeded { decimals: 6 }),
            build(&request, &SubmissionMode::Direct)
        );
        Ok(())
    }

    #[test]
    fn batch_of_several_transfers() -> Result<()> {
        let bob = address!("00000000000000000000000000000000000000bb");
        let token = TokenDescriptor::usdc_base_sepolia();
        let requests = vec![
            TransferRequest::new(ALICE, token.clone(), DEFAULT_TIP_AMOUNT),
            TransferRequest::new(bob, token, DEFAULT_TIP_AMOUNT),
        ];

        let payload = build_batch(&requests, None)?;
        assert_eq!(payload.calls().len(), 2);
        assert_eq!(payload.sponsor(), None);

        assert_matches!(build_batch(&[], None), Err(TipError::InvalidAmount(_)));
        Ok(())
    }
}
