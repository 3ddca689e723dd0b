// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use color_eyre::{
    eyre::{eyre, Context, Result},
    Section,
};
use std::path::PathBuf;

const APP_DIR: &str = "tipfeed";
const CLIENT_DIR: &str = "client";

/// `{data_dir}/tipfeed/client`, created on first use.
pub fn get_client_data_dir_path() -> Result<PathBuf> {
    let client_dir = dirs_next::data_dir()
        .map(|data_dir| data_dir.join(APP_DIR).join(CLIENT_DIR))
        .ok_or_else(|| eyre!("Could not locate a data dir on this platform"))?;
    if !client_dir.is_dir() {
        debug!("Creating client data dir at {client_dir:?}");
        std::fs::create_dir_all(&client_dir)
            .wrap_err_with(|| format!("Failed to create {client_dir:?}"))
            .with_suggestion(|| "check the permissions of your user data directory")?;
    }
    Ok(client_dir)
}
