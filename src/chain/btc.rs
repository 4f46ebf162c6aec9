pub mod fee;
use fee::{FeeEstimator, ProbeSigner};
#[cfg(test)] use fee::SECP256K1;

pub mod types;
use types::*;

mod util;

// crates.io
use bitcoin::{consensus, Network, Transaction};
#[cfg(test)] use bitcoin::{key::Keypair, Address, CompressedPublicKey};
// self
use crate::prelude::*;

/// Searches for a cheapest-first input set covering the requested outputs,
/// balancing the transaction with a change output or folding the remainder
/// into the fee when change would be dust.
///
/// The pool is consumed in the order given; sorting it is the caller's
/// business.
#[derive(Debug)]
pub struct TxBuilder<'a> {
	/// Wallet address. Owns the pool and receives any change.
	pub address: &'a str,
	/// Satoshi per virtual byte.
	pub fee_rate: Satoshi,
	/// Inputs that must be spent regardless of value, e.g. the output
	/// carrying an asset. May be empty.
	pub inputs: Vec<Utxo>,
	pub network: Network,
	/// Payment outputs. Change is appended here when it survives the dust
	/// check.
	pub outputs: Vec<Output>,
	/// Spendable outputs of `address`.
	pub pool: Vec<Utxo>,
}
impl TxBuilder<'_> {
	// Small pools are cheap enough to price exactly at every step; past this
	// the per-input cost is derived once and extrapolated.
	const BATCH_THRESHOLD: usize = 2;

	pub fn build(self) -> Result<TxDetail> {
		let address_type = AddressType::of(self.address, self.network)?;

		self.build_with(&ProbeSigner::random(address_type, self.network))
	}

	/// [`Self::build`] with a caller-supplied probe key. Same key, same pool,
	/// same result.
	pub fn build_with(&self, signer: &ProbeSigner) -> Result<TxDetail> {
		// Destinations are checked before any selection work; a bad recipient
		// must not surface as an insufficiency or a parse error mid-search.
		for Output { address, .. } in &self.outputs {
			util::addr_from_str(address, self.network)
				.map_err(|_| ChainError::AddressInvalid { address: address.clone() })?;
		}

		let amount = self.outputs.iter().map(|o| o.value).sum::<Satoshi>();

		tracing::debug!(
			"building a transaction of {amount} sat from {} utxo(s) at {} sat/vB",
			self.pool.len(),
			self.fee_rate
		);

		if self.pool.len() <= Self::BATCH_THRESHOLD {
			self.scan(signer, amount)
		} else {
			self.batch(signer, amount)
		}
	}

	// Price every candidate set with a full signing probe.
	fn scan(&self, signer: &ProbeSigner, amount: Satoshi) -> Result<TxDetail> {
		let mut inputs = self.inputs.clone();
		let mut value = inputs.iter().map(|u| u.value).sum::<Satoshi>();
		let mut pool = self.pool.iter();

		loop {
			if value >= amount {
				if let Some(detail) = self.close(signer, &inputs, value, amount, || {
					let mut outputs = self.outputs.clone();

					outputs.push(Output::change(self.address, value - amount));

					FeeEstimator {
						fee_rate: self.fee_rate,
						inputs: &inputs,
						network: self.network,
						outputs: &outputs,
						signer,
					}
					.estimate()
				})? {
					return Ok(detail);
				}
			}

			let Some(utxo) = pool.next() else { break };

			value += utxo.value;

			inputs.push(utxo.clone());
		}

		Err(ChainError::InsufficientFunds { required: amount, available: value })?
	}

	// Probe one- and two-input shapes once, then extend linearly; each extra
	// input of the same script type costs the same bytes.
	fn batch(&self, signer: &ProbeSigner, amount: Satoshi) -> Result<TxDetail> {
		let base_fee = self.probe_fee(signer, 1, false)?;
		let input_cost = self.probe_fee(signer, 2, false)? - base_fee;
		let mut change_cost = None;
		let mut inputs = self.inputs.clone();
		let mut value = inputs.iter().map(|u| u.value).sum::<Satoshi>();
		let mut pool = self.pool.iter();

		loop {
			if value >= amount {
				if let Some(detail) = self.close(signer, &inputs, value, amount, || {
					let cost = match change_cost {
						Some(c) => c,
						None => self.probe_fee(signer, 1, true)? - base_fee,
					};

					change_cost = Some(cost);

					Ok(base_fee + (inputs.len() as Satoshi - 1) * input_cost + cost)
				})? {
					return Ok(detail);
				}
			}

			let Some(utxo) = pool.next() else { break };

			// Not worth spending if it cannot even pay for its own bytes.
			if utxo.value <= input_cost {
				Err(ChainError::UtxoNotWorthSpending {
					value: utxo.value,
					marginal_cost: input_cost,
				})?;
			}

			value += utxo.value;

			inputs.push(utxo.clone());
		}

		Err(ChainError::InsufficientFunds { required: amount, available: value })?
	}

	// Fee of a transaction with `count` synthetic inputs of the wallet's
	// script type, optionally carrying a change output.
	fn probe_fee(&self, signer: &ProbeSigner, count: usize, change: bool) -> Result<Satoshi> {
		let inputs = vec![Utxo::size_probe(); count];
		let mut outputs = self.outputs.clone();

		if change {
			outputs.push(Output::change(self.address, SATOSHI_MAX));
		}

		FeeEstimator {
			fee_rate: self.fee_rate,
			inputs: &inputs,
			network: self.network,
			outputs: &outputs,
			signer,
		}
		.estimate()
	}

	// Try to settle the selection at its current value.
	//
	// A remainder below the dust bound always settles; it cannot be paid back
	// as change, so it all goes to the miner. Otherwise the fee of the
	// change-carrying shape decides: if even the remainder cannot cover it,
	// the selection must keep growing; if it can but the leftover change is
	// dust, the change is dropped and the remainder becomes the fee.
	fn close<F>(
		&self,
		signer: &ProbeSigner,
		inputs: &[Utxo],
		value: Satoshi,
		amount: Satoshi,
		fee_with_change: F,
	) -> Result<Option<TxDetail>>
	where
		F: FnOnce() -> Result<Satoshi>,
	{
		let remainder = value - amount;

		if remainder < DUST_AMOUNT {
			return Ok(Some(self.detail(signer, inputs.to_vec(), self.outputs.clone(), remainder)));
		}

		let fee = fee_with_change()?;

		if fee > remainder {
			return Ok(None);
		}

		let change = remainder - fee;

		if change < DUST_AMOUNT {
			return Ok(Some(self.detail(signer, inputs.to_vec(), self.outputs.clone(), remainder)));
		}

		let mut outputs = self.outputs.clone();

		outputs.push(Output::change(self.address, change));

		Ok(Some(self.detail(signer, inputs.to_vec(), outputs, fee)))
	}

	fn detail(
		&self,
		signer: &ProbeSigner,
		inputs: Vec<Utxo>,
		outputs: Vec<Output>,
		fee: Satoshi,
	) -> TxDetail {
		TxDetail {
			address: self.address.into(),
			address_type: signer.address_type(),
			fee,
			fee_rate: self.fee_rate,
			inputs,
			network: self.network,
			outputs,
		}
	}
}

/// A balanced, ready-to-sign selection.
///
/// `Σ inputs == Σ outputs + fee` always holds, and no output is below the
/// dust bound.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TxDetail {
	pub address: String,
	pub address_type: AddressType,
	pub fee: Satoshi,
	pub fee_rate: Satoshi,
	pub inputs: Vec<Utxo>,
	pub network: Network,
	pub outputs: Vec<Output>,
}
impl TxDetail {
	pub fn unsigned_tx(&self) -> Result<Transaction> {
		util::unsigned_tx(&self.inputs, &self.outputs, self.network)
	}

	pub fn unsigned_tx_hex(&self) -> Result<String> {
		Ok(array_bytes::bytes2hex("", consensus::serialize(&self.unsigned_tx()?)))
	}
}

#[cfg(test)] pub(crate) const TEST_NETWORK: Network = Network::Testnet;
#[cfg(test)]
pub(crate) fn test_signer(address_type: AddressType) -> (String, ProbeSigner) {
	let keypair = Keypair::from_seckey_str(
		&SECP256K1,
		"0000000000000000000000000000000000000000000000000000000000000001",
	)
	.unwrap();
	let script = address_type.script_pubkey(&keypair, TEST_NETWORK);
	let address = Address::from_script(&script, TEST_NETWORK).unwrap().to_string();

	(address, ProbeSigner::from_keypair(keypair, address_type, TEST_NETWORK))
}
#[cfg(test)]
pub(crate) fn test_recipient() -> String {
	let keypair = Keypair::from_seckey_str(
		&SECP256K1,
		"0000000000000000000000000000000000000000000000000000000000000002",
	)
	.unwrap();

	Address::p2wpkh(&CompressedPublicKey(keypair.public_key()), TEST_NETWORK).to_string()
}

#[test]
fn address_type_detection_should_work() {
	for t in [AddressType::P2pkh, AddressType::P2shP2wpkh, AddressType::P2tr, AddressType::P2wpkh] {
		let (address, _) = test_signer(t);

		assert_eq!(AddressType::of(&address, TEST_NETWORK).unwrap(), t);
	}

	assert!(matches!(
		AddressType::of("not-an-address", TEST_NETWORK),
		Err(Error::Chain(ChainError::AddressInvalid { .. }))
	));
	// Right encoding, wrong network.
	assert!(matches!(
		AddressType::of(&test_signer(AddressType::P2wpkh).0, Network::Bitcoin),
		Err(Error::Chain(ChainError::AddressInvalid { .. }))
	));
}

#[test]
fn estimate_should_be_monotonic_in_fee_rate() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let inputs = [Utxo::new(100_000)];
	let outputs = [Output::new(&address, 90_000)];
	let fee_of = |fee_rate| {
		FeeEstimator {
			fee_rate,
			inputs: &inputs,
			network: TEST_NETWORK,
			outputs: &outputs,
			signer: &signer,
		}
		.estimate()
		.unwrap()
	};

	assert_eq!(fee_of(1), 111);
	assert!(fee_of(1) < fee_of(5));
	assert!(fee_of(5) < fee_of(50));
}

#[test]
fn estimate_should_discount_witness_data() {
	let inputs = [Utxo::new(100_000)];
	let fee_of = |address_type| {
		let (address, signer) = test_signer(address_type);

		FeeEstimator {
			fee_rate: 1,
			inputs: &inputs,
			network: TEST_NETWORK,
			outputs: &[Output::new(&address, 90_000)],
			signer: &signer,
		}
		.estimate()
		.unwrap()
	};

	// Same single-key shape; only the witness discount separates them.
	assert!(fee_of(AddressType::P2wpkh) < fee_of(AddressType::P2pkh));
	assert!(fee_of(AddressType::P2tr) < fee_of(AddressType::P2pkh));
}

#[test]
fn build_should_fold_sub_dust_remainder_into_fee() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let detail = TxBuilder {
		address: &address,
		fee_rate: 1,
		inputs: vec![],
		network: TEST_NETWORK,
		outputs: vec![Output::new(test_recipient(), 10_000)],
		pool: vec![Utxo::new(10_200)],
	}
	.build_with(&signer)
	.unwrap();

	assert_eq!(detail.fee, 200);
	assert_eq!(detail.outputs.len(), 1);
}

#[test]
fn exact_pool_match_should_close_without_change() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let detail = TxBuilder {
		address: &address,
		fee_rate: 1,
		inputs: vec![],
		network: TEST_NETWORK,
		outputs: vec![Output::new(test_recipient(), 10_000)],
		pool: vec![Utxo::new(4_000), Utxo::new(6_000)],
	}
	.build_with(&signer)
	.unwrap();

	assert_eq!(detail.fee, 0);
	assert_eq!(detail.inputs.len(), 2);
	assert_eq!(detail.outputs.len(), 1);
}

#[test]
fn build_should_append_change_output() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let detail = TxBuilder {
		address: &address,
		fee_rate: 1,
		inputs: vec![],
		network: TEST_NETWORK,
		outputs: vec![Output::new(test_recipient(), 10_000)],
		pool: vec![Utxo::new(12_000)],
	}
	.build_with(&signer)
	.unwrap();
	let change = &detail.outputs[1];

	assert_eq!(detail.fee, 142);
	assert!(change.change);
	assert_eq!(change.address, address);
	assert_eq!(change.value, 1_858);
	assert_eq!(12_000, 10_000 + change.value + detail.fee);
}

#[test]
fn build_should_drop_dust_change() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let detail = TxBuilder {
		address: &address,
		fee_rate: 1,
		inputs: vec![],
		network: TEST_NETWORK,
		outputs: vec![Output::new(test_recipient(), 10_000)],
		pool: vec![Utxo::new(10_650)],
	}
	.build_with(&signer)
	.unwrap();

	// The change-carrying shape would cost 142 sat, leaving 508 sat of
	// change; below the dust bound, so the whole remainder feeds the fee.
	assert_eq!(detail.fee, 650);
	assert_eq!(detail.outputs.len(), 1);
}

#[test]
fn build_should_always_spend_mandatory_inputs() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let asset_input = Utxo { vout: 7, ..Utxo::new(600) };
	let detail = TxBuilder {
		address: &address,
		fee_rate: 1,
		inputs: vec![asset_input.clone()],
		network: TEST_NETWORK,
		outputs: vec![Output::new(test_recipient(), 10_000)],
		pool: vec![Utxo::new(20_000)],
	}
	.build_with(&signer)
	.unwrap();

	assert_eq!(detail.inputs[0], asset_input);
	assert_eq!(detail.inputs.len(), 2);
	assert_eq!(20_600, 10_000 + detail.outputs[1].value + detail.fee);
}

#[test]
fn build_should_add_inputs_until_fee_is_covered() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let detail = TxBuilder {
		address: &address,
		fee_rate: 10,
		inputs: vec![],
		network: TEST_NETWORK,
		outputs: vec![Output::new(test_recipient(), 10_000)],
		pool: vec![Utxo::new(10_600), Utxo::new(5_000)],
	}
	.build_with(&signer)
	.unwrap();

	// The first utxo alone leaves 600 sat, not enough for the fee at this
	// rate; the second closes the gap.
	assert_eq!(detail.inputs.len(), 2);
	assert_eq!(detail.fee, 2_095);
	assert_eq!(detail.outputs[1].value, 3_505);
	assert_eq!(15_600, 10_000 + detail.outputs[1].value + detail.fee);
}

#[test]
fn build_should_batch_large_pools() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let detail = TxBuilder {
		address: &address,
		fee_rate: 5,
		inputs: vec![],
		network: TEST_NETWORK,
		outputs: vec![Output::new(test_recipient(), 50_000)],
		pool: vec![Utxo::new(20_000); 5],
	}
	.build_with(&signer)
	.unwrap();

	// base 554 + 2 extra inputs at 339 each + change output at 155.
	assert_eq!(detail.inputs.len(), 3);
	assert_eq!(detail.fee, 1_387);
	assert_eq!(detail.outputs[1].value, 8_613);
	assert_eq!(60_000, 50_000 + detail.outputs[1].value + detail.fee);
}

#[test]
fn build_should_fail_when_pool_is_exhausted() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let build = |pool| {
		TxBuilder {
			address: &address,
			fee_rate: 1,
			inputs: vec![],
			network: TEST_NETWORK,
			outputs: vec![Output::new(test_recipient(), 10_000)],
			pool,
		}
		.build_with(&signer)
	};

	assert!(matches!(
		build(vec![Utxo::new(1_000)]),
		Err(Error::Chain(ChainError::InsufficientFunds { required: 10_000, available: 1_000 }))
	));
	assert!(matches!(
		build(vec![Utxo::new(1_000); 3]),
		Err(Error::Chain(ChainError::InsufficientFunds { required: 10_000, available: 3_000 }))
	));
}

#[test]
fn build_should_reject_utxos_cheaper_than_their_input_cost() {
	let (address, signer) = test_signer(AddressType::P2wpkh);

	assert!(matches!(
		TxBuilder {
			address: &address,
			fee_rate: 10,
			inputs: vec![],
			network: TEST_NETWORK,
			outputs: vec![Output::new(test_recipient(), 10_000)],
			pool: vec![Utxo::new(100); 3],
		}
		.build_with(&signer),
		Err(Error::Chain(ChainError::UtxoNotWorthSpending { value: 100, .. }))
	));
}

#[test]
fn build_should_reject_invalid_address() {
	assert!(matches!(
		TxBuilder {
			address: "not-an-address",
			fee_rate: 1,
			inputs: vec![],
			network: TEST_NETWORK,
			outputs: vec![Output::new(test_recipient(), 10_000)],
			pool: vec![Utxo::new(100_000)],
		}
		.build(),
		Err(Error::Chain(ChainError::AddressInvalid { .. }))
	));
}

#[test]
fn build_should_reject_invalid_recipient_before_selection() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let build = |pool| {
		TxBuilder {
			address: &address,
			fee_rate: 1,
			inputs: vec![],
			network: TEST_NETWORK,
			outputs: vec![Output::new("not-an-address", 10_000)],
			pool,
		}
		.build_with(&signer)
	};

	assert!(matches!(
		build(vec![Utxo::new(100_000)]),
		Err(Error::Chain(ChainError::AddressInvalid { .. }))
	));
	// Even with an insufficient pool the address error wins; nothing was
	// selected yet.
	assert!(matches!(
		build(vec![Utxo::new(100)]),
		Err(Error::Chain(ChainError::AddressInvalid { .. }))
	));
}

#[test]
fn build_should_be_deterministic() {
	let (address, signer) = test_signer(AddressType::P2wpkh);
	let build = || {
		TxBuilder {
			address: &address,
			fee_rate: 3,
			inputs: vec![],
			network: TEST_NETWORK,
			outputs: vec![Output::new(test_recipient(), 30_000)],
			pool: vec![
				Utxo::new(9_000),
				Utxo::new(11_000),
				Utxo::new(13_000),
				Utxo::new(15_000),
			],
		}
		.build_with(&signer)
		.unwrap()
	};
	let a = build();
	let b = build();

	assert_eq!(a.fee, b.fee);
	assert_eq!(a.inputs, b.inputs);
	assert_eq!(a.outputs, b.outputs);
	assert_eq!(a.unsigned_tx_hex().unwrap(), b.unsigned_tx_hex().unwrap());
}
