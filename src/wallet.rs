// crates.io
use bitcoin::{consensus, Network, Transaction};
use reqwest::Client as RClient;
// self
use crate::{
	api::Api,
	chain::btc::{types::*, TxBuilder, TxDetail},
	conf,
	http::{Client, Http},
	prelude::*,
};

/// Holder of the wallet key. Lives outside this crate; here a transaction
/// only ever meets a throwaway probe key.
pub trait Signer {
	fn sign(&self, tx: Transaction, detail: &TxDetail) -> Result<Transaction>;
}

#[derive(Debug)]
pub struct Wallet<H> {
	pub api: Api<H>,
	pub conf: conf::btc::Conf,
}
impl<H> Wallet<H>
where
	H: Http,
{
	pub async fn fee_rate(&self) -> Result<Satoshi> {
		let fee_conf = &self.conf.fee_conf;

		if let Some(force) = fee_conf.force {
			return Ok(force);
		}

		Ok(self.api.get_recommended_fee().await?.of(fee_conf.strategy) + fee_conf.extra)
	}

	/// Confirmed outputs of the wallet address, cheapest first.
	pub async fn spendables(&self) -> Result<Vec<Utxo>> {
		let mut utxos = self
			.api
			.get_utxos(&self.conf.address)
			.await?
			.into_iter()
			.map(TryInto::try_into)
			.collect::<Result<Vec<Utxo>>>()?;

		utxos.sort_by_key(|u| u.value);

		Ok(utxos)
	}

	/// Prepare a balanced transfer of `amount` sat to `recipient`.
	pub async fn transfer(&self, recipient: &str, amount: Satoshi) -> Result<TxDetail> {
		let detail = TxBuilder {
			address: &self.conf.address,
			fee_rate: self.fee_rate().await?,
			inputs: Vec::new(),
			network: self.conf.network,
			outputs: vec![Output::new(recipient, amount)],
			pool: self.spendables().await?,
		}
		.build()?;

		tracing::info!(
			"prepared a transfer of {amount} sat to {recipient} with a fee of {} sat over {} input(s)",
			detail.fee,
			detail.inputs.len()
		);

		Ok(detail)
	}

	/// [`Self::transfer`], signed by `signer` and broadcast. Returns the txid
	/// reported by the endpoint.
	pub async fn send<S>(&self, signer: &S, recipient: &str, amount: Satoshi) -> Result<String>
	where
		S: Signer,
	{
		let detail = self.transfer(recipient, amount).await?;
		let tx = signer.sign(detail.unsigned_tx()?, &detail)?;

		self.api.broadcast(array_bytes::bytes2hex("", consensus::serialize(&tx))).await
	}
}
impl TryFrom<conf::Conf> for Wallet<Client> {
	type Error = Error;

	fn try_from(conf: conf::Conf) -> Result<Self> {
		let btc = conf.btc;

		// Surface a bad address at startup instead of on the first transfer.
		AddressType::of(&btc.address, btc.network)?;

		let base_uri =
			btc.endpoint.clone().unwrap_or_else(|| default_endpoint(btc.network).into());

		Ok(Self { api: Api { base_uri, http: Client(RClient::new()) }, conf: btc })
	}
}

fn default_endpoint(network: Network) -> &'static str {
	match network {
		Network::Bitcoin => "https://mempool.space/api",
		Network::Testnet => "https://mempool.space/testnet/api",
		Network::Signet => "https://mempool.space/signet/api",
		_ => "http://localhost:3000/api",
	}
}

#[cfg(test)]
fn test_wallet(force: Option<Satoshi>, extra: Satoshi) -> (String, Wallet<StaticHttp>) {
	let (address, _) = crate::chain::btc::test_signer(AddressType::P2wpkh);
	let wallet = Wallet {
		api: Api { base_uri: "http://localhost".into(), http: StaticHttp },
		conf: conf::btc::Conf {
			address: address.clone(),
			endpoint: None,
			fee_conf: conf::btc::FeeConf { extra, force, strategy: Default::default() },
			network: crate::chain::btc::TEST_NETWORK,
		},
	};

	(address, wallet)
}
#[cfg(test)]
struct StaticHttp;
#[cfg(test)]
impl Http for StaticHttp {
	async fn get(&self, uri: &str) -> Result<bytes::Bytes> {
		if uri.contains("/utxo") {
			Ok(bytes::Bytes::from_static(
				br#"[
					{"txid":"0000000000000000000000000000000000000000000000000000000000000000","vout":1,"value":20000,"status":{"confirmed":true}},
					{"txid":"0000000000000000000000000000000000000000000000000000000000000000","vout":0,"value":5000,"status":{"confirmed":true}}
				]"#,
			))
		} else {
			Ok(bytes::Bytes::from_static(
				br#"{"economyFee":1,"fastestFee":5,"halfHourFee":3,"hourFee":2,"minimumFee":1}"#,
			))
		}
	}

	async fn post(&self, _: &str, _: String) -> Result<bytes::Bytes> {
		Ok(bytes::Bytes::from_static(b"a-txid"))
	}
}
#[cfg(test)]
struct NoopSigner;
#[cfg(test)]
impl Signer for NoopSigner {
	fn sign(&self, tx: Transaction, _: &TxDetail) -> Result<Transaction> {
		Ok(tx)
	}
}

#[tokio::test]
async fn fee_rate_should_follow_conf() {
	assert_eq!(test_wallet(Some(7), 0).1.fee_rate().await.unwrap(), 7);
	assert_eq!(test_wallet(None, 2).1.fee_rate().await.unwrap(), 5);
}

#[tokio::test]
async fn spendables_should_sort_cheapest_first() {
	let (_, wallet) = test_wallet(Some(1), 0);
	let utxos = wallet.spendables().await.unwrap();

	assert_eq!(utxos.iter().map(|u| u.value).collect::<Vec<_>>(), [5_000, 20_000]);
}

#[tokio::test]
async fn wallet_should_prepare_and_send_transfers() {
	let (_, wallet) = test_wallet(Some(1), 0);
	let recipient = crate::chain::btc::test_recipient();
	let detail = wallet.transfer(&recipient, 10_000).await.unwrap();

	assert_eq!(
		detail.inputs.iter().map(|u| u.value).sum::<u64>(),
		detail.outputs.iter().map(|o| o.value).sum::<u64>() + detail.fee
	);
	assert!(detail.outputs.iter().all(|o| o.value >= DUST_AMOUNT));

	assert_eq!(wallet.send(&NoopSigner, &recipient, 10_000).await.unwrap(), "a-txid");
}

#[test]
fn wallet_should_reject_misconfigured_address() {
	let mut conf = conf::Conf::default();

	assert!(matches!(
		Wallet::try_from(conf::Conf::default()),
		Err(Error::Chain(ChainError::AddressInvalid { .. }))
	));

	conf.btc.address = crate::chain::btc::test_signer(AddressType::P2wpkh).0;

	let wallet = Wallet::try_from(conf).unwrap();

	assert_eq!(wallet.api.base_uri, "https://mempool.space/testnet/api");
}
