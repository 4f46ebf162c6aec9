// crates.io
use bitcoin::{
	address::NetworkUnchecked,
	blockdata::{
		locktime::absolute::LockTime,
		transaction::{Transaction, Version},
	},
	Address, Amount, Network, OutPoint, TxIn, TxOut,
};
// self
use super::types::*;
use crate::prelude::*;

const LOCK_TIME: LockTime = LockTime::ZERO;
const VERSION: Version = Version::TWO;

pub(crate) fn addr_from_str(s: &str, network: Network) -> Result<Address> {
	Ok(s.parse::<Address<NetworkUnchecked>>()
		.map_err(BitcoinError::Parse)?
		.require_network(network)
		.map_err(BitcoinError::Parse)?)
}

pub(crate) fn unsigned_tx(
	inputs: &[Utxo],
	outputs: &[Output],
	network: Network,
) -> Result<Transaction> {
	Ok(Transaction {
		version: VERSION,
		lock_time: LOCK_TIME,
		input: inputs
			.iter()
			.map(|u| TxIn { previous_output: OutPoint::new(u.txid, u.vout), ..Default::default() })
			.collect(),
		output: outputs
			.iter()
			.map(|o| -> Result<_> {
				Ok(TxOut {
					script_pubkey: addr_from_str(&o.address, network)?.script_pubkey(),
					value: Amount::from_sat(o.value),
				})
			})
			.collect::<Result<Vec<_>>>()?,
	})
}
