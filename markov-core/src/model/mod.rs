//! Top-level module for the Markov chain model.
//!
//! This module provides a word-level Markov chain, including:
//! - Fixed-length word windows (`Prefix`)
//! - The identity-owned transition table (`Chain`)
//! - Corpus ingestion from streams, strings and log files
//! - A random-walk generation interface (`Generator`)

/// Fixed-length window of the most recent words.
///
/// Serialized into the lookup key of the transition table.
pub mod prefix;

/// Transition table from prefix keys to observed successor words.
///
/// Successor lists preserve insertion order and duplicates;
/// repetition is the frequency representation.
pub mod chain;

/// Corpus ingestion (token streams, strings, structured log files).
///
/// Only adds `impl Chain` blocks, nothing to export.
mod ingest;

pub use ingest::LOG_METADATA_FIELDS;

/// Random walk over a chain.
///
/// Owns the random source and exposes both a lazy token iterator
/// and whole-sentence generation.
pub mod generator;
