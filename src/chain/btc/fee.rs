// crates.io
use bitcoin::{
	consensus, ecdsa,
	key::{Keypair, TapTweak},
	script::PushBytesBuf,
	secp256k1::{rand, All, Message, Secp256k1},
	sighash::{Prevouts, SighashCache},
	taproot, Amount, CompressedPublicKey, EcdsaSighashType, Network, PublicKey, Script, ScriptBuf,
	TapSighashType, Transaction, TxOut, Witness,
};
use once_cell::sync::Lazy;
// self
use super::{types::*, util};
use crate::prelude::*;

pub static SECP256K1: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

// Witness bytes count as a quarter byte in virtual-size accounting.
const WITNESS_DISCOUNT: f64 = 0.75;

/// Stand-in signer used to measure the byte shape of a signed transaction.
///
/// Its key never touches real funds; every estimate treats the inputs as if
/// they were locked to this key under the wallet's address type, signs them
/// for real, and throws the result away after measuring it.
#[derive(Debug)]
pub struct ProbeSigner {
	address_type: AddressType,
	keypair: Keypair,
	script_pubkey: ScriptBuf,
}
impl ProbeSigner {
	pub fn random(address_type: AddressType, network: Network) -> Self {
		Self::from_keypair(Keypair::new(&SECP256K1, &mut rand::thread_rng()), address_type, network)
	}

	pub fn from_keypair(keypair: Keypair, address_type: AddressType, network: Network) -> Self {
		let script_pubkey = address_type.script_pubkey(&keypair, network);

		Self { address_type, keypair, script_pubkey }
	}

	pub fn address_type(&self) -> AddressType {
		self.address_type
	}

	fn finalize(&self, tx: Transaction, values: &[Satoshi]) -> Result<Transaction> {
		let mut cache = SighashCache::new(tx);

		match self.address_type {
			AddressType::P2pkh => {
				// Only the encoded length of the signature matters on this
				// path; low R keeps it fixed at 71 bytes.
				let pk = PublicKey::new(self.keypair.public_key());
				let mut sigs = Vec::with_capacity(values.len());

				for i in 0..values.len() {
					let sighash = cache
						.legacy_signature_hash(
							i,
							&self.script_pubkey,
							EcdsaSighashType::All.to_u32(),
						)
						.map_err(BitcoinError::InputsIndex)?;
					let msg = Message::from_digest_slice(sighash.as_ref())?;
					let signature = SECP256K1.sign_ecdsa_low_r(&msg, &self.keypair.secret_key());

					sigs.push(ecdsa::Signature { signature, sighash_type: EcdsaSighashType::All });
				}

				let mut tx = cache.into_transaction();

				for (txin, sig) in tx.input.iter_mut().zip(sigs) {
					txin.script_sig =
						Script::builder().push_slice(sig.serialize()).push_key(&pk).into_script();
				}

				Ok(tx)
			},
			AddressType::P2shP2wpkh | AddressType::P2wpkh => {
				let pk = CompressedPublicKey(self.keypair.public_key());
				let wpkh_script = ScriptBuf::new_p2wpkh(&pk.wpubkey_hash());

				for (i, v) in values.iter().enumerate() {
					let sighash = cache
						.p2wpkh_signature_hash(
							i,
							&wpkh_script,
							Amount::from_sat(*v),
							EcdsaSighashType::All,
						)
						.map_err(BitcoinError::SigHashP2wpkh)?;
					let msg = Message::from_digest_slice(sighash.as_ref())?;
					let signature = SECP256K1.sign_ecdsa_low_r(&msg, &self.keypair.secret_key());

					*cache.witness_mut(i).unwrap() = Witness::p2wpkh(
						&ecdsa::Signature { signature, sighash_type: EcdsaSighashType::All },
						&self.keypair.public_key(),
					);
				}

				let mut tx = cache.into_transaction();

				if self.address_type == AddressType::P2shP2wpkh {
					let script_sig = Script::builder()
						.push_slice(PushBytesBuf::try_from(wpkh_script.into_bytes()).unwrap())
						.into_script();

					tx.input.iter_mut().for_each(|txin| txin.script_sig = script_sig.clone());
				}

				Ok(tx)
			},
			AddressType::P2tr => {
				let keypair = self.keypair.tap_tweak(&SECP256K1, None).to_inner();
				let prevouts = values
					.iter()
					.map(|v| TxOut {
						script_pubkey: self.script_pubkey.clone(),
						value: Amount::from_sat(*v),
					})
					.collect::<Vec<_>>();
				let sighash_type = TapSighashType::Default;

				for i in 0..values.len() {
					let sighash = cache
						.taproot_key_spend_signature_hash(
							i,
							&Prevouts::All(&prevouts),
							sighash_type,
						)
						.map_err(BitcoinError::SigHashTapRoot)?;
					let msg = Message::from_digest_slice(sighash.as_ref())?;
					let signature = SECP256K1.sign_schnorr(&msg, &keypair);

					*cache.witness_mut(i).unwrap() =
						Witness::p2tr_key_spend(&taproot::Signature { signature, sighash_type });
				}

				Ok(cache.into_transaction())
			},
		}
	}
}

/// Prices one exact transaction shape by building, signing, and measuring it.
#[derive(Debug)]
pub struct FeeEstimator<'a> {
	pub fee_rate: Satoshi,
	pub inputs: &'a [Utxo],
	pub network: Network,
	pub outputs: &'a [Output],
	pub signer: &'a ProbeSigner,
}
impl FeeEstimator<'_> {
	pub fn estimate(&self) -> Result<Satoshi> {
		let tx = util::unsigned_tx(self.inputs, self.outputs, self.network)?;
		let values = self.inputs.iter().map(|u| u.value).collect::<Vec<_>>();
		let tx = self.signer.finalize(tx, &values)?;
		let size = consensus::serialize(&tx).len() as f64;
		let witness = tx.input.iter().map(|i| i.witness.size()).sum::<usize>() as f64;
		let v_size = size - witness * WITNESS_DISCOUNT;
		let fee = (v_size * self.fee_rate as f64).ceil() as Satoshi;

		tracing::trace!("estimated {size} bytes ({v_size} virtual): {fee} sat");

		Ok(fee)
	}
}

#[test]
fn probe_witnesses_should_have_fixed_size() {
	let witness_of = |address_type| {
		let (_, signer) = super::test_signer(address_type);
		let tx = util::unsigned_tx(
			&[Utxo::new(10_000)],
			&[Output::new(super::test_recipient(), 9_000)],
			super::TEST_NETWORK,
		)
		.unwrap();

		signer.finalize(tx, &[10_000]).unwrap().input[0].witness.size()
	};

	// Low-R signing pins the DER encoding at 70 bytes, 71 with the sighash
	// flag; a key-spend schnorr signature is always 64.
	assert_eq!(witness_of(AddressType::P2wpkh), 107);
	assert_eq!(witness_of(AddressType::P2tr), 66);
}
