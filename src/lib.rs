//! Transaction core of an Atomicals-aware bitcoin wallet.
//!
//! The heart of the crate is the input selection and fee balancing pair in
//! [`chain::btc`]: [`chain::btc::TxBuilder`] searches for a minimal input set
//! covering a payment, while [`chain::btc::fee::FeeEstimator`] prices each
//! candidate transaction shape by actually signing it with a throwaway key.
//! Key management, signing of the final transaction, and asset rendering are
//! delegated to external collaborators behind the [`wallet::Signer`] seam.

#![deny(
	// clippy::all,
	// missing_docs,
	unused_crate_dependencies,
	// warnings,
)]

pub mod api;
pub mod chain;
pub mod conf;
pub mod error;
pub mod http;
pub mod wallet;

pub mod prelude {
	//! Crate-wide error and result types.

	pub use crate::error::*;

	/// Crate-wide result type.
	pub type Result<T> = std::result::Result<T, Error>;
}
