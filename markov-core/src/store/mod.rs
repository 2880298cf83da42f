//! Chain persistence.
//!
//! Chains are encoded as self-describing JSON (`codec`) and stored by
//! identity in a key-value backend (`KvStore`). `ChainStore` ties both
//! together and owns the backend for its whole open lifetime.

use crate::error::Result;

/// `Chain::encode` / `Chain::decode`.
mod codec;

/// Front used by callers: save / load chains by identity.
pub mod chain_store;

/// File-backed key-value database guarded by a lock file.
pub mod database;

/// In-process key-value store.
pub mod memory;

/// Collection holding every persisted chain, for both reads and writes.
pub const CHAINS_COLLECTION: &str = "markov";

/// Byte-blob storage addressed by collection and key.
///
/// Collections are created implicitly by the first `put` into them.
/// Writes overwrite; there is no merge.
pub trait KvStore {
	/// Returns the bytes stored under `key`, or `None` if there are none.
	fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>>;

	/// Stores `value` under `key`, replacing any previous value.
	fn put(&mut self, collection: &str, key: &str, value: Vec<u8>) -> Result<()>;

	/// Lists the keys of `collection` in ascending order.
	fn keys(&self, collection: &str) -> Result<Vec<String>>;
}
