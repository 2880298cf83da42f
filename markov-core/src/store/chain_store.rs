use std::path::Path;
use std::time::Duration;

use log::{debug, info};

use super::database::Database;
use super::{CHAINS_COLLECTION, KvStore};
use crate::error::{ChainError, Result};
use crate::model::chain::Chain;

/// Saves and loads chains by identity.
///
/// # Responsibilities
/// - Own the key-value backend between `open` and `close` (or drop)
/// - Encode chains on save and decode them on load
/// - Refuse any access while no backend is open
///
/// Saves and loads both address `CHAINS_COLLECTION`.
#[derive(Debug)]
pub struct ChainStore<S = Database> {
	backend: Option<S>,
}

impl<S> Default for ChainStore<S> {
	fn default() -> Self {
		Self { backend: None }
	}
}

impl ChainStore<Database> {
	/// Opens the database at `path` (see `Database::open`).
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		Ok(Self::with_backend(Database::open(path)?))
	}

	pub fn open_with_timeout<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self> {
		Ok(Self::with_backend(Database::open_with_timeout(path, timeout)?))
	}
}

impl<S: KvStore> ChainStore<S> {
	/// Creates a store with no backend; every access fails until one is
	/// attached.
	pub fn unopened() -> Self {
		Self::default()
	}

	pub fn with_backend(backend: S) -> Self {
		Self { backend: Some(backend) }
	}

	pub fn is_open(&self) -> bool {
		self.backend.is_some()
	}

	/// Drops the backend, releasing whatever it holds. Calling it again is
	/// a no-op.
	pub fn close(&mut self) {
		if self.backend.take().is_some() {
			debug!("chain store closed");
		}
	}

	/// Encodes `chain` and writes it under its identity, replacing any
	/// chain saved before under the same identity.
	///
	/// # Errors
	/// - `ChainError::Precheck` if the store is not open.
	/// - Encoding or backend errors.
	pub fn save(&mut self, chain: &Chain) -> Result<()> {
		let backend = self
			.backend
			.as_mut()
			.ok_or(ChainError::Precheck("store must be opened before saving"))?;
		let bytes = chain.encode()?;
		let size = bytes.len();
		backend.put(CHAINS_COLLECTION, chain.identity(), bytes)?;
		info!("saved chain '{}' ({} prefixes, {} bytes)", chain.identity(), chain.len(), size);
		Ok(())
	}

	/// Loads the chain saved under `identity`.
	///
	/// # Errors
	/// - `ChainError::Precheck` if the store is not open.
	/// - `ChainError::NotFound` if nothing was saved under `identity`.
	/// - `ChainError::Decode` / `ChainError::Malformed` for corrupt records.
	pub fn load(&self, identity: &str) -> Result<Chain> {
		let backend = self.backend()?;
		let bytes = backend
			.get(CHAINS_COLLECTION, identity)?
			.ok_or_else(|| ChainError::NotFound(identity.to_owned()))?;
		let chain = Chain::decode(&bytes)?;
		debug!("loaded chain '{}' ({} prefixes)", identity, chain.len());
		Ok(chain)
	}

	/// Loads the chain saved under `identity`, or returns a fresh empty one
	/// if there is none.
	pub fn load_or_empty(&self, identity: &str) -> Result<Chain> {
		match self.load(identity) {
			Err(e) if e.is_not_found() => Ok(Chain::new(identity)),
			other => other,
		}
	}

	/// Lists every identity with a saved chain, in ascending order.
	pub fn identities(&self) -> Result<Vec<String>> {
		self.backend()?.keys(CHAINS_COLLECTION)
	}

	fn backend(&self) -> Result<&S> {
		self.backend.as_ref().ok_or(ChainError::Precheck("store must be opened before querying"))
	}
}
