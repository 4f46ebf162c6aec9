#[derive(Debug, thiserror::Error)]
pub enum ChainError {
	#[error("[chain] invalid recipient or change address: {address}")]
	AddressInvalid { address: String },
	#[error("[chain] insufficient funds: required {required} sat, available {available} sat")]
	InsufficientFunds { required: u64, available: u64 },
	#[error(
		"[chain] utxo of {value} sat does not cover the {marginal_cost} sat it costs to spend it"
	)]
	UtxoNotWorthSpending { value: u64, marginal_cost: u64 },
}
