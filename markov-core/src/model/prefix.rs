use std::fmt;
use std::num::NonZeroUsize;

use crate::error::{ChainError, Result};

/// Word window used as a transition key.
///
/// A `Prefix` always holds exactly `len` words. A fresh prefix is made of
/// empty words, which stands for "start of text" both while learning and
/// while generating.
///
/// ## Invariants
/// - The length never changes after construction
/// - `len >= 1`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Prefix {
	words: Vec<String>,
}

impl Prefix {
	/// Creates a start-of-text prefix of `len` empty words.
	///
	/// # Errors
	/// Returns `ChainError::InvalidPrefixLen` if `len == 0`.
	pub fn new(len: usize) -> Result<Self> {
		let len = NonZeroUsize::new(len).ok_or(ChainError::InvalidPrefixLen(len))?;
		Ok(Self::start(len))
	}

	pub(crate) fn start(len: NonZeroUsize) -> Self {
		Self { words: vec![String::new(); len.get()] }
	}

	/// Number of words in the window.
	pub fn len(&self) -> usize {
		self.words.len()
	}

	/// Always `false`; a prefix holds at least one word.
	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}

	pub fn words(&self) -> &[String] {
		&self.words
	}

	/// Returns the lookup key: words joined by a single space.
	///
	/// Not reversible when words contain spaces, which cannot happen with
	/// whitespace tokenized input.
	pub fn key(&self) -> String {
		self.words.join(" ")
	}

	/// Drops the oldest word and appends `word` at the end.
	pub fn shift(&mut self, word: impl Into<String>) {
		self.words.rotate_left(1);
		// Length >= 1, so the last slot always exists
		if let Some(last) = self.words.last_mut() {
			*last = word.into();
		}
	}
}

impl fmt::Display for Prefix {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.key())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_prefix_is_all_empty() {
		let p = Prefix::new(3).unwrap();
		assert_eq!(p.len(), 3);
		assert!(p.words().iter().all(String::is_empty));
		assert_eq!(p.key(), "  ");
	}

	#[test]
	fn zero_length_is_rejected() {
		assert!(matches!(Prefix::new(0), Err(ChainError::InvalidPrefixLen(0))));
	}

	#[test]
	fn shift_slides_window() {
		let mut p = Prefix::new(2).unwrap();
		p.shift("a");
		assert_eq!(p.key(), " a");
		p.shift("b");
		assert_eq!(p.key(), "a b");
		p.shift("c");
		assert_eq!(p.key(), "b c");
		assert_eq!(p.len(), 2);
	}

	#[test]
	fn shift_on_single_word_prefix_replaces_it() {
		let mut p = Prefix::new(1).unwrap();
		p.shift("x");
		assert_eq!(p.words(), ["x"]);
		p.shift("y");
		assert_eq!(p.words(), ["y"]);
		assert_eq!(p.len(), 1);
	}

	#[test]
	fn display_matches_key() {
		let mut p = Prefix::new(2).unwrap();
		p.shift("hello");
		p.shift("world");
		assert_eq!(p.to_string(), p.key());
	}
}
