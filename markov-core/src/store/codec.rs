use crate::error::Result;
use crate::model::chain::Chain;

impl Chain {
	/// Encodes the chain (identity, prefix length, table) as JSON.
	pub fn encode(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(self)?)
	}

	/// Decodes a chain produced by `encode`.
	///
	/// Records without a prefix length are read with the default length.
	///
	/// # Errors
	/// - `ChainError::Decode` if `bytes` are not JSON of the chain shape.
	/// - `ChainError::Malformed` if the table breaks a chain invariant.
	pub fn decode(bytes: &[u8]) -> Result<Chain> {
		let chain: Chain = serde_json::from_slice(bytes)?;
		chain.validate()?;
		Ok(chain)
	}
}
