// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use color_eyre::eyre::{eyre, Context, Result};
use color_eyre::Section;
use std::env;
use std::fs;
use tiplib::wallet::Wallet;
use tiplib::Network;

const SECRET_KEY_ENV: &str = "SECRET_KEY";
const SECRET_KEY_FILE: &str = "secret_key";

/// The wallet signing tips and sends.
pub fn load_wallet(network: Network) -> Result<Wallet> {
    let secret_key = get_secret_key()?;
    Wallet::new_from_private_key(network, &secret_key)
        .wrap_err("Failed to load the wallet from the secret key")
        .with_suggestion(|| "the key must be a hex encoded secp256k1 private key, 0x prefix optional")
}

/// Hex private key taken from `SECRET_KEY`, or else from the `secret_key` file in the data dir.
pub fn get_secret_key() -> Result<String> {
    if let Some(key) = env::var(SECRET_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
    {
        debug!("Using the secret key from {SECRET_KEY_ENV}");
        return Ok(key);
    }

    let key_path = super::data_dir::get_client_data_dir_path()?.join(SECRET_KEY_FILE);
    if !key_path.is_file() {
        return Err(eyre!("No secret key found")
            .with_suggestion(|| format!("set the {SECRET_KEY_ENV} env var"))
            .with_suggestion(|| format!("or write the key to {key_path:?}")));
    }
    debug!("Using the secret key stored at {key_path:?}");
    fs::read_to_string(&key_path).wrap_err_with(|| format!("Failed to read {key_path:?}"))
}
