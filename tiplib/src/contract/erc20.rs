// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, Amount, Calldata, U256};
use crate::contract::erc20::IERC20::IERC20Instance;
use alloy::providers::{Network, Provider};
use alloy::sol;
use alloy::sol_types::SolCall;
use alloy::transports::Transport;

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    ContractError(#[from] alloy::contract::Error),
}

/// Encode `transfer(receiver, amount)` for an ERC-20 contract.
pub fn transfer_calldata(receiver: Address, amount: Amount) -> Calldata {
    IERC20::transferCall {
        to: receiver,
        amount,
    }
    .abi_encode()
    .into()
}

pub struct Erc20Token<T: Transport + Clone, P: Provider<T, N>, N: Network> {
    pub contract: IERC20Instance<T, P, N>,
}

impl<T, P, N> Erc20Token<T, P, N>
where
    T: Transport + Clone,
    P: Provider<T, N>,
    N: Network,
{
    pub fn new(contract_address: Address, provider: P) -> Self {
        let contract = IERC20::new(contract_address, provider);
        Erc20Token { contract }
    }

    /// Get the raw token balance of an address.
    pub async fn balance_of(&self, account: Address) -> Result<U256, Error> {
        debug!("Getting token balance of account: {account:?}");
        let balance = self
            .contract
            .balanceOf(account)
            .call()
            .await
            .inspect_err(|err| error!("Error getting balance of account {account:?}: {err:?}"))?
            ._0;
        debug!("Token balance of account {account} is {balance}");
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn transfer_calldata_layout() {
        let receiver = address!("00000000000000000000000000000000000000aa");
        let calldata = transfer_calldata(receiver, Amount::from(10_000));

        assert_eq!(calldata.len(), 4 + 32 + 32);
        // transfer(address,uint256)
        assert_eq!(&calldata[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(&calldata[16..36], receiver.as_slice());
        assert_eq!(Amount::from_be_slice(&calldata[36..]), Amount::from(10_000));
    }
}
