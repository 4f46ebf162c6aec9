// crates.io
use bitcoin::Network;
use serde::{Deserialize, Serialize};
// self
use crate::{api::mempool::FeeStrategy, chain::btc::types::Satoshi};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Conf {
	pub address: String,
	pub endpoint: Option<String>,
	pub fee_conf: FeeConf,
	pub network: Network,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeeConf {
	pub extra: Satoshi,
	pub force: Option<Satoshi>,
	pub strategy: FeeStrategy,
}
