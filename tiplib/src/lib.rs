// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

#[macro_use]
extern crate tracing;

use crate::token::TokenDescriptor;
use reqwest::Url;
use std::sync::LazyLock;

pub mod amount;
pub mod common;
pub mod contract;
pub mod error;
pub mod feed;
pub mod notification;
pub mod request;
pub mod tipper;
pub mod token;
pub mod tracker;
pub mod utils;
pub mod wallet;

pub use error::{Result, TipError};

static PUBLIC_BASE_SEPOLIA_HTTP_RPC_URL: LazyLock<Url> = LazyLock::new(|| {
    "https://sepolia.base.org"
        .parse()
        .expect("Invalid RPC URL")
});

const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;

#[derive(Clone, Debug, PartialEq)]
pub struct CustomNetwork {
    pub rpc_url_http: Url,
    pub tip_token: TokenDescriptor,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Network {
    #[default]
    BaseSepolia,
    Custom(CustomNetwork),
}

impl Network {
    pub fn identifier(&self) -> &str {
        match self {
            Network::BaseSepolia => "base-sepolia",
            Network::Custom(_) => "custom",
        }
    }

    pub fn rpc_url(&self) -> &Url {
        match self {
            Network::BaseSepolia => &PUBLIC_BASE_SEPOLIA_HTTP_RPC_URL,
            Network::Custom(custom) => &custom.rpc_url_http,
        }
    }

    /// The token tips are paid in.
    pub fn tip_token(&self) -> TokenDescriptor {
        match self {
            Network::BaseSepolia => TokenDescriptor::usdc_base_sepolia(),
            Network::Custom(custom) => custom.tip_token.clone(),
        }
    }

    /// Known chain id; a custom network's is asked from its RPC.
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Network::BaseSepolia => Some(BASE_SEPOLIA_CHAIN_ID),
            Network::Custom(_) => None,
        }
    }
}
