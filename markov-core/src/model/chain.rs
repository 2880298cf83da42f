use std::collections::HashMap;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::prefix::Prefix;
use crate::error::{ChainError, Result};

/// Prefix length used when none is given.
pub const DEFAULT_PREFIX_LEN: NonZeroUsize = match NonZeroUsize::new(2) {
	Some(len) => len,
	None => unreachable!(),
};

/// Identity of the chain built from the whole corpus rather than one speaker.
pub const AGGREGATE_IDENTITY: &str = "all";

fn default_prefix_len() -> NonZeroUsize {
	DEFAULT_PREFIX_LEN
}

/// Word-level Markov chain owned by an identity.
///
/// Conceptually, every key of `table` is a node (a serialized `Prefix`) and
/// every entry of its successor list is an observed outgoing edge. Edges are
/// not counted: a word seen three times after a prefix is stored three
/// times, and uniform sampling over the list yields frequency weighting.
///
/// ## Responsibilities:
/// - Record (prefix, word) observations during ingestion
/// - Answer exact-match successor lookups during generation
///
/// ## Invariants
/// - Every key serializes a prefix of exactly `prefix_len` words
/// - No key maps to an empty successor list
/// - Observations are append-only; keys are never replaced or removed
///
/// Serialized field names match the records written by the first version
/// of the bot (`Nick`, `Chain`), so older databases stay readable.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Chain {
	/// Owner of the chain (speaker nickname or `AGGREGATE_IDENTITY`).
	#[serde(rename = "Nick")]
	identity: String,
	/// Number of words per prefix.
	#[serde(rename = "PrefixLen", default = "default_prefix_len")]
	prefix_len: NonZeroUsize,
	/// Mapping from a prefix key to its successors, in observation order.
	/// Example: { "the cat" => ["sat", "ran"] }
	#[serde(rename = "Chain")]
	table: HashMap<String, Vec<String>>,
}

impl Chain {
	/// Creates an empty chain with the default prefix length.
	pub fn new(identity: impl Into<String>) -> Self {
		Self::with_len(identity, DEFAULT_PREFIX_LEN)
	}

	/// Creates an empty chain whose prefixes hold `prefix_len` words.
	///
	/// # Errors
	/// Returns `ChainError::InvalidPrefixLen` if `prefix_len == 0`.
	pub fn with_prefix_len(identity: impl Into<String>, prefix_len: usize) -> Result<Self> {
		let len = NonZeroUsize::new(prefix_len).ok_or(ChainError::InvalidPrefixLen(prefix_len))?;
		Ok(Self::with_len(identity, len))
	}

	fn with_len(identity: impl Into<String>, prefix_len: NonZeroUsize) -> Self {
		Self { identity: identity.into(), prefix_len, table: HashMap::new() }
	}

	pub fn identity(&self) -> &str {
		&self.identity
	}

	pub fn prefix_len(&self) -> usize {
		self.prefix_len.get()
	}

	/// Returns the start-of-text prefix for this chain.
	pub fn start_prefix(&self) -> Prefix {
		Prefix::start(self.prefix_len)
	}

	/// Appends `word` to the successors of `prefix`.
	///
	/// # Errors
	/// Returns `ChainError::PrefixLength` if `prefix` does not have the
	/// chain's prefix length.
	pub fn add_observation(&mut self, prefix: &Prefix, word: impl Into<String>) -> Result<()> {
		if prefix.len() != self.prefix_len() {
			return Err(ChainError::PrefixLength { expected: self.prefix_len(), found: prefix.len() });
		}
		self.record(prefix, word);
		Ok(())
	}

	/// Appends without checking the prefix length.
	///
	/// Only for prefixes obtained from `start_prefix` of this chain (or of a
	/// chain made by `empty_like`), whose length always matches.
	pub(crate) fn record(&mut self, prefix: &Prefix, word: impl Into<String>) {
		debug_assert_eq!(prefix.len(), self.prefix_len());
		self.table.entry(prefix.key()).or_default().push(word.into());
	}

	/// Returns an empty chain with the same identity and prefix length.
	pub(crate) fn empty_like(&self) -> Chain {
		Self::with_len(self.identity.as_str(), self.prefix_len)
	}

	/// Returns the successors recorded for `key`, in observation order.
	///
	/// Unknown keys yield an empty slice.
	pub fn successors_of(&self, key: &str) -> &[String] {
		self.table.get(key).map(Vec::as_slice).unwrap_or_default()
	}

	/// Number of distinct prefixes.
	pub fn len(&self) -> usize {
		self.table.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}

	/// Total number of recorded observations (sum of successor list lengths).
	pub fn observations(&self) -> usize {
		self.table.values().map(Vec::len).sum()
	}

	/// Iterates over `(prefix key, successors)` in no particular order.
	pub fn prefixes(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.table.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
	}

	/// Appends every successor list of `other` after the matching list of
	/// this chain.
	///
	/// Only used to stitch together partial chains built from consecutive,
	/// independent slices of one corpus; absorbing them in slice order gives
	/// the same table as a sequential build.
	///
	/// # Errors
	/// Returns `ChainError::PrefixLength` if the prefix lengths differ.
	pub(crate) fn absorb(&mut self, other: Chain) -> Result<()> {
		if self.prefix_len != other.prefix_len {
			return Err(ChainError::PrefixLength { expected: self.prefix_len(), found: other.prefix_len() });
		}

		for (key, successors) in other.table {
			self.table.entry(key).or_default().extend(successors);
		}

		Ok(())
	}

	/// Checks the table invariants of a chain coming from outside
	/// (decoded bytes).
	pub(crate) fn validate(&self) -> Result<()> {
		let expected = self.prefix_len();
		for (key, successors) in &self.table {
			if successors.is_empty() {
				return Err(ChainError::Malformed(format!("prefix '{key}' has no successors")));
			}
			let words = key.split(' ').count();
			if words != expected {
				return Err(ChainError::Malformed(format!(
					"prefix '{key}' has {words} words, expected {expected}"
				)));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_chain_is_empty() {
		let chain = Chain::new("alice");
		assert_eq!(chain.identity(), "alice");
		assert_eq!(chain.prefix_len(), 2);
		assert!(chain.is_empty());
		assert!(chain.successors_of("  ").is_empty());
		assert!(chain.successors_of(" ").is_empty());
	}

	#[test]
	fn observations_keep_order_and_duplicates() {
		let mut chain = Chain::new("bob");
		let p = chain.start_prefix();
		chain.add_observation(&p, "hi").unwrap();
		chain.add_observation(&p, "yo").unwrap();
		chain.add_observation(&p, "hi").unwrap();
		assert_eq!(chain.successors_of(" "), ["hi", "yo", "hi"]);
		assert_eq!(chain.len(), 1);
		assert_eq!(chain.observations(), 3);
	}

	#[test]
	fn mismatched_prefix_is_rejected() {
		let mut chain = Chain::new("bob");
		let p = Prefix::new(3).unwrap();
		let err = chain.add_observation(&p, "x").unwrap_err();
		assert!(matches!(err, ChainError::PrefixLength { expected: 2, found: 3 }));
		assert!(chain.is_empty());
	}

	#[test]
	fn empty_like_keeps_identity_and_len() {
		let mut chain = Chain::with_prefix_len("carol", 3).unwrap();
		chain.build_from_str("a b c d");
		let empty = chain.empty_like();
		assert_eq!(empty.identity(), "carol");
		assert_eq!(empty.prefix_len(), 3);
		assert!(empty.is_empty());
	}

	#[test]
	fn zero_prefix_len_is_rejected() {
		assert!(matches!(Chain::with_prefix_len("x", 0), Err(ChainError::InvalidPrefixLen(0))));
	}

	#[test]
	fn absorb_appends_after_existing() {
		let mut left = Chain::new("all");
		let mut right = Chain::new("all");
		let p = left.start_prefix();
		left.add_observation(&p, "a").unwrap();
		right.add_observation(&p, "b").unwrap();
		left.absorb(right).unwrap();
		assert_eq!(left.successors_of(" "), ["a", "b"]);
	}

	#[test]
	fn absorb_rejects_other_prefix_len() {
		let mut left = Chain::new("all");
		let right = Chain::with_prefix_len("all", 3).unwrap();
		assert!(left.absorb(right).is_err());
	}

	#[test]
	fn validate_catches_broken_tables() {
		let mut chain = Chain::new("x");
		chain.table.insert("a b".to_owned(), Vec::new());
		assert!(matches!(chain.validate(), Err(ChainError::Malformed(_))));

		let mut chain = Chain::new("x");
		chain.table.insert("a b c".to_owned(), vec!["d".to_owned()]);
		assert!(matches!(chain.validate(), Err(ChainError::Malformed(_))));
	}
}
