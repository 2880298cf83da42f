use std::collections::{BTreeMap, HashMap};

use super::KvStore;
use crate::error::Result;

/// Key-value store kept in process memory.
///
/// Useful for tests and for gateways that do not need chains to outlive
/// the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
	collections: HashMap<String, BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl KvStore for MemoryStore {
	fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>> {
		Ok(self.collections.get(collection).and_then(|c| c.get(key)).cloned())
	}

	fn put(&mut self, collection: &str, key: &str, value: Vec<u8>) -> Result<()> {
		self.collections.entry(collection.to_owned()).or_default().insert(key.to_owned(), value);
		Ok(())
	}

	fn keys(&self, collection: &str) -> Result<Vec<String>> {
		Ok(self.collections.get(collection).map(|c| c.keys().cloned().collect()).unwrap_or_default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn put_overwrites_and_collections_are_separate() {
		let mut store = MemoryStore::new();
		store.put("a", "k", b"1".to_vec()).unwrap();
		store.put("a", "k", b"2".to_vec()).unwrap();
		store.put("b", "k", b"3".to_vec()).unwrap();
		assert_eq!(store.get("a", "k").unwrap().as_deref(), Some(&b"2"[..]));
		assert_eq!(store.get("b", "k").unwrap().as_deref(), Some(&b"3"[..]));
		assert_eq!(store.get("c", "k").unwrap(), None);
		assert_eq!(store.keys("a").unwrap(), ["k"]);
		assert!(store.keys("c").unwrap().is_empty());
	}
}
