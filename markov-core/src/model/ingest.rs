use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::thread;

use log::debug;

use super::chain::Chain;
use super::prefix::Prefix;
use crate::error::{ChainError, Result};
use crate::io::{open_reader, read_lines};

/// Leading whitespace-separated fields of a log line that carry metadata
/// (date, time, channel, nick) rather than message text.
pub const LOG_METADATA_FIELDS: usize = 4;

impl Chain {
	/// Records every word of `words`, sliding `prefix` after each one.
	///
	/// `prefix` must come from `start_prefix`. The trailing prefix is the
	/// caller's to drop: there is no end-of-text marker, generation stops on
	/// prefixes without successors.
	fn ingest_words<'w>(&mut self, prefix: &mut Prefix, words: impl Iterator<Item = &'w str>) {
		for word in words {
			self.record(prefix, word);
			prefix.shift(word);
		}
	}

	/// Records one sentence, starting from the start-of-text prefix.
	fn ingest_sentence<'w>(&mut self, words: impl Iterator<Item = &'w str>) {
		let mut prefix = self.start_prefix();
		self.ingest_words(&mut prefix, words);
	}

	/// Reads whitespace separated words from `reader` and records them.
	///
	/// The whole stream is one word sequence: the prefix carries over line
	/// breaks. Empty tokens produced by consecutive separators are skipped.
	///
	/// # Errors
	/// Returns `ChainError::Io` on read failure (including invalid UTF-8).
	/// Observations recorded before the failure are kept.
	pub fn build<R: Read>(&mut self, reader: R) -> Result<()> {
		let mut prefix = self.start_prefix();
		for line in BufReader::new(reader).lines() {
			let line = line?;
			self.ingest_words(&mut prefix, line.split_whitespace());
		}
		Ok(())
	}

	/// Records the words of `text`, starting from the start-of-text prefix.
	pub fn build_from_str(&mut self, text: &str) {
		self.ingest_sentence(text.split_whitespace());
	}

	/// Records the message part of every line of a structured log.
	///
	/// The first `LOG_METADATA_FIELDS` fields of each line are discarded and
	/// the rest is ingested as one sentence (see `build_from_str`). Lines
	/// without any message field contribute nothing.
	///
	/// # Errors
	/// Returns `ChainError::Io` on read failure. Lines read before the
	/// failure stay recorded.
	pub fn build_from_log<R: BufRead>(&mut self, reader: R) -> Result<()> {
		for line in reader.lines() {
			let line = line?;
			self.ingest_sentence(line.split_whitespace().skip(LOG_METADATA_FIELDS));
		}
		Ok(())
	}

	/// Builds a chain with the default prefix length from a log file.
	///
	/// See `ingest_log_file`.
	pub fn from_log_file<P: AsRef<Path>>(identity: &str, path: P) -> Result<Self> {
		Chain::new(identity).ingest_log_file(path)
	}

	/// Consumes the chain, records a whole log file into it and returns it.
	///
	/// # Errors
	/// Returns `ChainError::Corpus` if the file cannot be opened or read.
	/// The error carries the chain as built so far (unchanged when the file
	/// could not be opened), see `ChainError::into_partial`.
	pub fn ingest_log_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
		let path = path.as_ref();
		let reader = match open_reader(path) {
			Ok(reader) => reader,
			Err(source) => return Err(ChainError::Corpus { partial: Box::new(self), source }),
		};

		match self.build_from_log(reader) {
			Ok(()) => {
				debug!(
					"built chain '{}' from {}: {} prefixes, {} observations",
					self.identity(),
					path.display(),
					self.len(),
					self.observations()
				);
				Ok(self)
			}
			Err(ChainError::Io(source)) => Err(ChainError::Corpus { partial: Box::new(self), source }),
			Err(e) => Err(e),
		}
	}

	/// Builds a chain with the default prefix length from a log file,
	/// using every CPU.
	///
	/// See `ingest_log_file_parallel`.
	pub fn from_log_file_parallel<P: AsRef<Path>>(identity: &str, path: P) -> Result<Self> {
		Chain::new(identity).ingest_log_file_parallel(path)
	}

	/// Same result as `ingest_log_file`, built with worker threads.
	///
	/// # Behavior
	/// - Reads all lines into memory.
	/// - Splits them into `num_cpus * 8` consecutive chunks.
	/// - Builds one partial chain per chunk on a scoped thread.
	/// - Absorbs the partial chains in chunk order.
	///
	/// # Notes
	/// - Each log line starts from the start-of-text prefix, so chunks are
	///   independent and absorbing them in order preserves successor order.
	/// - A read failure yields `ChainError::Corpus` with the chain unchanged.
	pub fn ingest_log_file_parallel<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
		let lines = match read_lines(&path) {
			Ok(lines) => lines,
			Err(source) => return Err(ChainError::Corpus { partial: Box::new(self), source }),
		};
		if lines.is_empty() {
			return Ok(self);
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = lines.len().div_ceil(chunks);

		let partials: Vec<Chain> = thread::scope(|scope| {
			let handles: Vec<_> = lines
				.chunks(chunk_size)
				.map(|chunk| {
					let mut partial = self.empty_like();
					scope.spawn(move || {
						for line in chunk {
							partial.ingest_sentence(line.split_whitespace().skip(LOG_METADATA_FIELDS));
						}
						partial
					})
				})
				.collect();

			handles
				.into_iter()
				.map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
				.collect()
		});

		debug!("merging {} partial chains for '{}'", partials.len(), self.identity());
		for partial in partials {
			self.absorb(partial)?;
		}
		Ok(self)
	}
}
