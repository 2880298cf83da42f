//! Word-level Markov chain text library.
//!
//! This crate provides the building blocks of a chat "markov bot":
//! - Fixed-length word prefixes used as transition keys
//! - Duplicate-preserving transition tables (`Chain`) owned by an identity
//! - Corpus ingestion from streams, strings and structured log files
//! - Random-walk generation with a controllable random source
//! - Persistence of chains by identity into a key-value database
//!
//! Network and configuration concerns live in the binaries; this crate
//! performs no network I/O.

/// Error type shared by every fallible operation of the crate.
pub mod error;

/// Core chain model: prefixes, transition tables, ingestion and generation.
pub mod model;

/// Chain encoding and persistence by identity.
///
/// Exposes the `KvStore` seam, the file-backed `Database`,
/// an in-memory store and the `ChainStore` front.
pub mod store;

/// File helpers (corpus readers, sibling paths, atomic writes).
///
/// Not exposed
pub(crate) mod io;

pub use error::{ChainError, Result};
pub use model::chain::{AGGREGATE_IDENTITY, Chain, DEFAULT_PREFIX_LEN};
pub use model::LOG_METADATA_FIELDS;
pub use model::generator::{Generator, Walk};
pub use model::prefix::Prefix;
pub use store::chain_store::ChainStore;
pub use store::database::Database;
pub use store::memory::MemoryStore;
pub use store::KvStore;
