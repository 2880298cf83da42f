use std::iter::FusedIterator;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::chain::Chain;
use super::prefix::Prefix;

/// Random walker over `Chain`s.
///
/// # Responsibilities
/// - Own the random source (seeded once, reused for every walk)
/// - Walk a chain from the start-of-text prefix until a prefix has no
///   successor
///
/// # Notes
/// - A walk has no length limit: a chain whose reachable graph contains a
///   cycle without exit produces an endless walk. Use `generate_bounded` or
///   `walk(..).take(n)` when the chain comes from untrusted input.
/// - Each step picks an index uniformly over the successor list; since
///   duplicates are kept, frequent successors are picked more often.
#[derive(Debug, Clone)]
pub struct Generator<R = StdRng> {
	rng: R,
}

impl Generator<StdRng> {
	/// Creates a generator seeded from the system clock.
	pub fn new() -> Self {
		Self::seeded(clock_seed())
	}

	/// Creates a generator with a fixed seed; identical seeds walk
	/// identical chains identically.
	pub fn seeded(seed: u64) -> Self {
		Self { rng: StdRng::seed_from_u64(seed) }
	}
}

impl Default for Generator<StdRng> {
	fn default() -> Self {
		Self::new()
	}
}

impl<R: Rng> Generator<R> {
	/// Wraps any random source.
	pub fn with_rng(rng: R) -> Self {
		Self { rng }
	}

	/// Starts a lazy walk over `chain`.
	pub fn walk<'c>(&mut self, chain: &'c Chain) -> Walk<'c, '_, R> {
		Walk { chain, rng: &mut self.rng, prefix: chain.start_prefix() }
	}

	/// Walks `chain` to the end and joins the words with single spaces.
	///
	/// Returns an empty string for a chain with no start-of-text successor.
	pub fn generate(&mut self, chain: &Chain) -> String {
		self.walk(chain).collect::<Vec<_>>().join(" ")
	}

	/// Same as `generate`, stopping after at most `max_words` words.
	pub fn generate_bounded(&mut self, chain: &Chain, max_words: usize) -> String {
		self.walk(chain).take(max_words).collect::<Vec<_>>().join(" ")
	}
}

/// One walk over a chain, yielding words borrowed from it.
///
/// Ends (and stays ended) once the current prefix has no successor.
#[derive(Debug)]
pub struct Walk<'c, 'r, R> {
	chain: &'c Chain,
	rng: &'r mut R,
	prefix: Prefix,
}

impl<'c, R: Rng> Iterator for Walk<'c, '_, R> {
	type Item = &'c str;

	fn next(&mut self) -> Option<Self::Item> {
		let successors = self.chain.successors_of(&self.prefix.key());
		if successors.is_empty() {
			return None;
		}

		let word = successors[self.rng.random_range(0..successors.len())].as_str();
		self.prefix.shift(word);
		Some(word)
	}
}

impl<R: Rng> FusedIterator for Walk<'_, '_, R> {}

fn clock_seed() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_nanos() as u64)
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chain_from(text: &str) -> Chain {
		let mut chain = Chain::new("all");
		chain.build_from_str(text);
		chain
	}

	#[test]
	fn empty_chain_generates_empty_string() {
		let chain = Chain::new("nobody");
		assert_eq!(Generator::new().generate(&chain), "");
		assert_eq!(Generator::seeded(7).walk(&chain).count(), 0);
	}

	#[test]
	fn linear_chain_reproduces_corpus() {
		let chain = chain_from("the quick brown fox jumps");
		assert_eq!(Generator::new().generate(&chain), "the quick brown fox jumps");
	}

	#[test]
	fn same_seed_same_output() {
		let chain = chain_from("a b c a b d a b c a b e b c d a");
		let mut generator = Generator::seeded(42);
		let first: Vec<String> = (0..10).map(|_| generator.generate_bounded(&chain, 50)).collect();
		let mut generator = Generator::seeded(42);
		let second: Vec<String> = (0..10).map(|_| generator.generate_bounded(&chain, 50)).collect();
		assert_eq!(first, second);
	}

	#[test]
	fn every_step_follows_an_observation() {
		let chain = chain_from("the cat sat the cat ran the dog sat");
		let mut generator = Generator::seeded(3);
		for _ in 0..50 {
			let mut prefix = chain.start_prefix();
			for word in generator.walk(&chain).take(100) {
				assert!(chain.successors_of(&prefix.key()).iter().any(|s| s == word));
				prefix.shift(word);
			}
		}
	}

	#[test]
	fn acyclic_chain_terminates() {
		let mut chain = Chain::new("all");
		chain.build_from_str("one two three");
		chain.build_from_str("one four five six");
		let mut generator = Generator::seeded(11);
		for _ in 0..100 {
			let out = generator.generate(&chain);
			assert!(out == "one two three" || out == "one four five six", "unexpected {out}");
		}
	}

	#[test]
	fn cyclic_chain_walk_is_bounded_by_caller() {
		// "a" -> "b" -> "a" -> ... never reaches a dead end
		let mut chain = Chain::with_prefix_len("loop", 1).unwrap();
		chain.build_from_str("a b a b");
		let mut generator = Generator::seeded(1);
		let words: Vec<&str> = generator.walk(&chain).take(1_000).collect();
		assert_eq!(words.len(), 1_000);
		assert!(words.chunks(2).all(|pair| pair[0] == "a" && pair.get(1).is_none_or(|w| *w == "b")));

		let capped = generator.generate_bounded(&chain, 5);
		assert_eq!(capped, "a b a b a");
	}

	#[test]
	fn duplicates_weight_the_choice() {
		let mut chain = Chain::with_prefix_len("w", 1).unwrap();
		for _ in 0..9 {
			chain.build_from_str("x");
		}
		chain.build_from_str("y");
		let mut generator = Generator::seeded(5);
		let xs = (0..2_000).filter(|_| generator.generate(&chain) == "x").count();
		assert!(xs > 1_600 && xs < 1_990, "x picked {xs} times");
	}
}
