// crates.io
use serde::{Deserialize, Serialize};
// self
use super::*;
use crate::chain::btc::types::{Index, Satoshi};

#[derive(Debug, Deserialize)]
pub struct Utxo {
	pub txid: String,
	pub value: Satoshi,
	pub vout: Index,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fees {
	pub economy_fee: Satoshi,
	pub fastest_fee: Satoshi,
	pub half_hour_fee: Satoshi,
	pub hour_fee: Satoshi,
	pub minimum_fee: Satoshi,
}
impl Fees {
	pub fn of(&self, strategy: FeeStrategy) -> Satoshi {
		match strategy {
			FeeStrategy::Economy => self.economy_fee,
			FeeStrategy::Fastest => self.fastest_fee,
			FeeStrategy::HalfHour => self.half_hour_fee,
			FeeStrategy::Hour => self.hour_fee,
			FeeStrategy::Minimum => self.minimum_fee,
		}
	}
}
#[test]
fn fees_should_follow_strategy() {
	let fees = Fees { economy_fee: 1, fastest_fee: 5, half_hour_fee: 3, hour_fee: 2, minimum_fee: 1 };

	assert_eq!(fees.of(FeeStrategy::Fastest), 5);
	assert_eq!(fees.of(FeeStrategy::default()), 3);
	assert_eq!(fees.of(FeeStrategy::Minimum), 1);
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeeStrategy {
	Economy,
	Fastest,
	#[default]
	HalfHour,
	Hour,
	Minimum,
}

impl<H> Api<H>
where
	H: Http,
{
	pub async fn get_utxos<S>(&self, address: S) -> Result<Vec<Utxo>>
	where
		S: AsRef<str>,
	{
		let utxos = self.get_json(&format!("address/{}/utxo", address.as_ref())).await?;

		tracing::debug!("{utxos:?}");

		Ok(utxos)
	}

	pub async fn get_recommended_fee(&self) -> Result<Fees> {
		let fees = self.get_json("v1/fees/recommended").await?;

		tracing::debug!("{fees:?}");

		Ok(fees)
	}

	pub async fn broadcast<S>(&self, tx_hex: S) -> Result<String>
	where
		S: Into<String>,
	{
		self.post_text("tx", tx_hex.into()).await
	}
}

#[cfg(test)]
struct StaticHttp;
#[cfg(test)]
impl Http for StaticHttp {
	async fn get(&self, uri: &str) -> Result<bytes::Bytes> {
		if uri.contains("/utxo") {
			Ok(bytes::Bytes::from_static(
				br#"[{"txid":"0000000000000000000000000000000000000000000000000000000000000000","vout":1,"value":20000,"status":{"confirmed":true}}]"#,
			))
		} else {
			Ok(bytes::Bytes::from_static(
				br#"{"economyFee":1,"fastestFee":5,"halfHourFee":3,"hourFee":2,"minimumFee":1}"#,
			))
		}
	}

	async fn post(&self, _: &str, _: String) -> Result<bytes::Bytes> {
		Ok(bytes::Bytes::from_static(b"feedbeef"))
	}
}
#[tokio::test]
async fn api_should_parse_mempool_payloads() {
	let api = Api { base_uri: "http://localhost".into(), http: StaticHttp };
	let utxos = api.get_utxos("tb1qexample").await.unwrap();

	assert_eq!(utxos.len(), 1);
	assert_eq!(utxos[0].value, 20_000);
	assert_eq!(utxos[0].vout, 1);

	assert_eq!(api.get_recommended_fee().await.unwrap().of(FeeStrategy::Hour), 2);
	assert_eq!(api.broadcast("02000000").await.unwrap(), "feedbeef");
}
