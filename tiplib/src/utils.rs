// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::Address;
use crate::error::{Result, TipError};
use crate::request::SponsorService;
use crate::token::TokenDescriptor;
use crate::{CustomNetwork, Network};
use alloy::network::Ethereum;
use alloy::providers::fillers::{
    BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
};
use alloy::providers::{Identity, Provider, ProviderBuilder, ReqwestProvider};
use alloy::transports::http::{Client, Http};
use reqwest::Url;
use std::env;
use std::str::FromStr;

/// environment variable selecting the network, `base-sepolia` or `custom`
pub const EVM_NETWORK: &str = "EVM_NETWORK";
/// environment variable to connect to a custom EVM network
pub const RPC_URL: &str = "RPC_URL";
const RPC_URL_BUILD_TIME_VAL: Option<&str> = option_env!("RPC_URL");
pub const TIP_TOKEN_ADDRESS: &str = "TIP_TOKEN_ADDRESS";
const TIP_TOKEN_ADDRESS_BUILD_TIME_VAL: Option<&str> = option_env!("TIP_TOKEN_ADDRESS");
pub const TIP_TOKEN_DECIMALS: &str = "TIP_TOKEN_DECIMALS";
pub const TIP_TOKEN_SYMBOL: &str = "TIP_TOKEN_SYMBOL";
pub const PAYMASTER_SERVICE_URL: &str = "PAYMASTER_SERVICE_URL";
const PAYMASTER_SERVICE_URL_BUILD_TIME_VAL: Option<&str> = option_env!("PAYMASTER_SERVICE_URL");
pub const WALLET_RPC_URL: &str = "WALLET_RPC_URL";
pub const FEED_URL: &str = "FEED_URL";
const FEED_URL_BUILD_TIME_VAL: Option<&str> = option_env!("FEED_URL");

pub const DEFAULT_FEED_URL: &str = "http://localhost:3000";
const DEFAULT_TIP_TOKEN_SYMBOL: &str = "TOKEN";

/// Runtime value first, then the value baked in at build time.
fn env_or_build_time(key: &str, build_time: Option<&str>) -> Option<String> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| build_time.map(|s| s.to_string()))
}

fn runtime_env(key: &str) -> Option<String> {
    match key {
        RPC_URL => env_or_build_time(key, RPC_URL_BUILD_TIME_VAL),
        TIP_TOKEN_ADDRESS => env_or_build_time(key, TIP_TOKEN_ADDRESS_BUILD_TIME_VAL),
        PAYMASTER_SERVICE_URL => env_or_build_time(key, PAYMASTER_SERVICE_URL_BUILD_TIME_VAL),
        FEED_URL => env_or_build_time(key, FEED_URL_BUILD_TIME_VAL),
        _ => env_or_build_time(key, None),
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value.trim()).map_err(|err| {
        error!("Invalid url in {key}: {err}");
        TipError::Configuration(format!("{key} is not a valid url: {err}"))
    })
}

/// Get the `Network` from environment variables.
pub fn get_network_from_env() -> Result<Network> {
    network_from_vars(runtime_env)
}

fn network_from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Network> {
    let network = var(EVM_NETWORK).unwrap_or_else(|| "base-sepolia".to_string());
    match network.as_str() {
        "base-sepolia" => {
            info!("Using Base Sepolia as {EVM_NETWORK} is set to 'base-sepolia' or unset");
            Ok(Network::BaseSepolia)
        }
        "custom" => {
            info!("Using custom EVM network from environment variables");
            let rpc_url = var(RPC_URL).ok_or_else(|| {
                TipError::Configuration(format!("{RPC_URL} must be set for a custom network"))
            })?;
            Ok(Network::Custom(CustomNetwork {
                rpc_url_http: parse_url(RPC_URL, &rpc_url)?,
                tip_token: tip_token_from_vars(&var)?,
            }))
        }
        other => {
            error!("Unknown {EVM_NETWORK} value: {other}");
            Err(TipError::Configuration(format!(
                "unknown network '{other}', expected 'base-sepolia' or 'custom'"
            )))
        }
    }
}

/// A custom network tips in its native asset unless a token contract is given.
fn tip_token_from_vars(var: &impl Fn(&str) -> Option<String>) -> Result<TokenDescriptor> {
    let decimals = match var(TIP_TOKEN_DECIMALS) {
        Some(decimals) => decimals.trim().parse::<u8>().map_err(|err| {
            TipError::Configuration(format!("{TIP_TOKEN_DECIMALS} is not a valid u8: {err}"))
        })?,
        None => 18,
    };

    let Some(address) = var(TIP_TOKEN_ADDRESS) else {
        return Ok(TokenDescriptor::Native {
            symbol: var(TIP_TOKEN_SYMBOL).unwrap_or_else(|| "ETH".to_string()),
            decimals,
        });
    };

    let address = Address::from_str(address.trim()).map_err(|err| {
        TipError::Configuration(format!("{TIP_TOKEN_ADDRESS} is not a valid address: {err}"))
    })?;
    Ok(TokenDescriptor::Erc20 {
        address,
        symbol: var(TIP_TOKEN_SYMBOL).unwrap_or_else(|| DEFAULT_TIP_TOKEN_SYMBOL.to_string()),
        decimals,
    })
}

/// The paymaster used for sponsored batches, if configured.
pub fn get_sponsor_from_env() -> Result<Option<SponsorService>> {
    sponsor_from_vars(runtime_env)
}

fn sponsor_from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Option<SponsorService>> {
    var(PAYMASTER_SERVICE_URL)
        .map(|url| {
            let url = parse_url(PAYMASTER_SERVICE_URL, &url)?;
            Ok(SponsorService {
                url: url.to_string(),
            })
        })
        .transpose()
}

/// The EIP-5792 capable wallet endpoint, if configured.
pub fn get_wallet_rpc_url_from_env() -> Result<Option<Url>> {
    runtime_env(WALLET_RPC_URL)
        .map(|url| parse_url(WALLET_RPC_URL, &url))
        .transpose()
}

/// Base url of the feed service.
pub fn get_feed_url_from_env() -> Result<String> {
    feed_url_from_vars(runtime_env)
}

fn feed_url_from_vars(var: impl Fn(&str) -> Option<String>) -> Result<String> {
    let url = var(FEED_URL).unwrap_or_else(|| DEFAULT_FEED_URL.to_string());
    parse_url(FEED_URL, &url)?;
    Ok(url.trim().trim_end_matches('/').to_string())
}

/// Chain id of `network`, asking its RPC when it is not a known network.
pub async fn get_chain_id(network: &Network) -> Result<u64> {
    if let Some(chain_id) = network.chain_id() {
        return Ok(chain_id);
    }
    http_provider(network.rpc_url().clone())
        .get_chain_id()
        .await
        .map_err(|err| {
            error!("Failed to get the chain id from {}: {err:?}", network.rpc_url());
            TipError::Configuration(format!("could not read the chain id: {err}"))
        })
}

#[allow(clippy::type_complexity)]
pub(crate) fn http_provider(
    rpc_url: Url,
) -> FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    ReqwestProvider,
    Http<Client>,
    Ethereum,
> {
    ProviderBuilder::new()
        .with_recommended_fillers()
        .on_http(rpc_url)
}
