pub mod btc;

// std
use std::{
	fs,
	path::{Path, PathBuf},
};
// crates.io
use app_dirs2::{AppDataType, AppInfo};
use serde::{Deserialize, Serialize};
// self
use crate::prelude::*;

const APP_INFO: AppInfo = AppInfo { name: "atomicals-wallet", author: "Atomicals" };
const DEFAULT_CONF: &str = r#"[btc]
# Wallet receive/change address.
address = ""

# Network configuration.
# Possible values: "bitcoin", "testnet", "signet", "regtest".
network = "testnet"

# Mempool-compatible API endpoint (optional, derived from the network otherwise).
# endpoint = "https://mempool.space/api"

[btc.fee-conf]
# Fee strategy to use for transactions.
# Possible values (sorted from fastest to slowest): "fastest", "half-hour", "hour", "economy", "minimum".
strategy = "half-hour"

# Additional fee to add to the recommended fee rate (in satoshis per virtual byte).
extra = 0

# Force set the fee rate (in satoshis per virtual byte).
# force = 1
"#;

#[derive(Debug, Serialize, Deserialize)]
pub struct Conf {
	pub btc: btc::Conf,
}
impl Conf {
	pub fn default_path() -> Result<PathBuf> {
		Ok(app_dirs2::app_root(AppDataType::UserConfig, &APP_INFO)?.join("conf.toml"))
	}

	pub fn load_from(path: &Path) -> Result<Self> {
		if path.is_file() {
			Ok(toml::from_str(&fs::read_to_string(path)?)?)
		} else {
			tracing::info!(
				"no configuration file found, \
				writing the template to {path:?}, \
				please configure it there"
			);
			fs::write(path, DEFAULT_CONF)?;

			Ok(Self::default())
		}
	}
}
impl Default for Conf {
	fn default() -> Self {
		toml::from_str(DEFAULT_CONF).unwrap()
	}
}
#[test]
fn default_conf_should_work() {
	let c = Conf::default();

	assert_eq!(c.btc.network, bitcoin::Network::Testnet);
	assert!(c.btc.endpoint.is_none());
	assert!(c.btc.fee_conf.force.is_none());
}
