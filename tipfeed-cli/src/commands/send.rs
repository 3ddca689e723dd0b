// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::opt::Opt;
use color_eyre::eyre::{Context, Result};

pub async fn send(opt: &Opt, to: &str, amount: &str) -> Result<()> {
    let mut session = crate::actions::connect(opt).await?;
    let handle = session
        .tipper
        .send(&session.tracker, to, amount)
        .await
        .wrap_err(format!("Failed to send {amount} to {to}"))?;
    println!("Transfer: {handle}");
    session.balance_after_transfer().await;
    Ok(())
}
