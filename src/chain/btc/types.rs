// crates.io
use bitcoin::{hashes::Hash, key::Keypair, Address, CompressedPublicKey, Network, ScriptBuf, Txid};
use serde::{Deserialize, Serialize};
// self
use super::fee::SECP256K1;
use crate::prelude::*;

pub type Satoshi = u64;
pub type Index = u32;

/// Outputs below this value cost more to spend than they are worth.
pub const DUST_AMOUNT: Satoshi = 546;
/// The whole bitcoin supply in satoshi. Far beyond any real balance; used as a
/// stand-in value when probing transaction shapes, since the script shape
/// rather than the value drives the byte size.
pub const SATOSHI_MAX: Satoshi = 21_000_000 * 100_000_000;
#[test]
fn satoshi_max_should_cover_the_supply() {
	assert_eq!(SATOSHI_MAX, 21 * 10_u64.pow(14));
	assert!(u64::MAX > SATOSHI_MAX);
}

/// A spendable previous output. Supplied by the data source, never created
/// here; the ownership script is attached when known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Utxo {
	pub script: Option<ScriptBuf>,
	pub txid: Txid,
	pub value: Satoshi,
	pub vout: Index,
}
impl Utxo {
	#[cfg(test)]
	pub fn new(value: Satoshi) -> Self {
		Self { script: None, txid: Txid::all_zeros(), value, vout: 0 }
	}

	// Sized like any other input of the probed script type; the value never
	// reaches a real transaction.
	pub(super) fn size_probe() -> Self {
		Self { script: None, txid: Txid::all_zeros(), value: SATOSHI_MAX, vout: 0 }
	}
}
impl TryFrom<crate::api::mempool::Utxo> for Utxo {
	type Error = Error;

	fn try_from(value: crate::api::mempool::Utxo) -> Result<Self> {
		Ok(Self {
			script: None,
			txid: value.txid.parse().map_err(BitcoinError::HexToArray)?,
			value: value.value,
			vout: value.vout,
		})
	}
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Output {
	pub address: String,
	pub change: bool,
	pub value: Satoshi,
}
impl Output {
	pub fn new<S>(address: S, value: Satoshi) -> Self
	where
		S: Into<String>,
	{
		Self { address: address.into(), change: false, value }
	}

	pub fn change<S>(address: S, value: Satoshi) -> Self
	where
		S: Into<String>,
	{
		Self { address: address.into(), change: true, value }
	}
}

/// Script scheme of the wallet address; determines the per-input and
/// per-output byte cost of a transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AddressType {
	P2pkh,
	P2shP2wpkh,
	P2tr,
	P2wpkh,
}
impl AddressType {
	pub fn of(address: &str, network: Network) -> Result<Self> {
		let a = super::util::addr_from_str(address, network)
			.map_err(|_| ChainError::AddressInvalid { address: address.into() })?;

		match a.address_type() {
			Some(bitcoin::AddressType::P2pkh) => Ok(Self::P2pkh),
			// A bare script hash is indistinguishable from a wrapped segwit
			// one; wallet addresses are always the latter nowadays.
			Some(bitcoin::AddressType::P2sh) => Ok(Self::P2shP2wpkh),
			Some(bitcoin::AddressType::P2tr) => Ok(Self::P2tr),
			Some(bitcoin::AddressType::P2wpkh) => Ok(Self::P2wpkh),
			_ => Err(ChainError::AddressInvalid { address: address.into() })?,
		}
	}

	/// The script that locks an output to `keypair` under this scheme.
	pub fn script_pubkey(&self, keypair: &Keypair, network: Network) -> ScriptBuf {
		let pk = CompressedPublicKey(keypair.public_key());

		match self {
			Self::P2pkh => Address::p2pkh(pk.pubkey_hash(), network).script_pubkey(),
			Self::P2shP2wpkh => Address::p2shwpkh(&pk, network).script_pubkey(),
			Self::P2tr =>
				Address::p2tr(&SECP256K1, keypair.x_only_public_key().0, None, network)
					.script_pubkey(),
			Self::P2wpkh => Address::p2wpkh(&pk, network).script_pubkey(),
		}
	}
}
