// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::opt::Opt;
use color_eyre::eyre::Result;

pub async fn balance(opt: &Opt) -> Result<()> {
    let session = crate::actions::connect(opt).await?;
    let balance = session.refresh_balance().await?;
    println!("Wallet address: {:?}", session.owner());
    println!("Balance: {balance} {}", session.tipper.token().symbol());
    Ok(())
}
