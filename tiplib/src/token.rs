// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::Address;
use alloy::primitives::address;
use std::fmt;

/// The asset a transfer moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenDescriptor {
    /// The chain's gas token.
    Native { symbol: String, decimals: u8 },
    /// An ERC-20 contract.
    Erc20 {
        address: Address,
        symbol: String,
        decimals: u8,
    },
}

pub const USDC_BASE_SEPOLIA_ADDRESS: Address =
    address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

impl TokenDescriptor {
    pub fn eth() -> Self {
        TokenDescriptor::Native {
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }

    pub fn usdc_base_sepolia() -> Self {
        TokenDescriptor::Erc20 {
            address: USDC_BASE_SEPOLIA_ADDRESS,
            symbol: "USDC".to_string(),
            decimals: 6,
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            TokenDescriptor::Native { decimals, .. } | TokenDescriptor::Erc20 { decimals, .. } => {
                *decimals
            }
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            TokenDescriptor::Native { symbol, .. } | TokenDescriptor::Erc20 { symbol, .. } => {
                symbol
            }
        }
    }

    /// The contract address, if this is not the native asset.
    pub fn contract_address(&self) -> Option<Address> {
        match self {
            TokenDescriptor::Native { .. } => None,
            TokenDescriptor::Erc20 { address, .. } => Some(*address),
        }
    }
}

impl fmt::Display for TokenDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenDescriptor::Native { symbol, .. } => write!(f, "{symbol} (native)"),
            TokenDescriptor::Erc20 {
                address, symbol, ..
            } => write!(f, "{symbol} ({address})"),
        }
    }
}
