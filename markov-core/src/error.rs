use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::model::chain::Chain;

pub type Result<T> = std::result::Result<T, ChainError>;

/// Every failure the chain model and its store can report.
///
/// Generation has no variant here: walking a chain never fails.
#[derive(Error, Debug)]
pub enum ChainError {
	/// The store was used before `open` or after `close`.
	#[error("store precheck failed: {0}")]
	Precheck(&'static str),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// A corpus file could not be opened or read to the end.
	///
	/// `partial` holds everything ingested before the failure. It is
	/// empty when the file could not be opened, but always valid.
	#[error("corpus unreadable: {source}")]
	Corpus {
		partial: Box<Chain>,
		#[source]
		source: std::io::Error,
	},

	#[error("decode error: {0}")]
	Decode(#[from] serde_json::Error),

	/// Well-formed encoding whose content breaks a chain invariant.
	#[error("malformed chain: {0}")]
	Malformed(String),

	#[error("no chain stored for identity '{0}'")]
	NotFound(String),

	#[error("database {} is locked (waited {timeout:?})", .path.display())]
	Locked { path: PathBuf, timeout: Duration },

	#[error("database error: {0}")]
	Database(#[from] postcard::Error),

	#[error("prefix length must be >= 1, got {0}")]
	InvalidPrefixLen(usize),

	#[error("prefix length mismatch: chain uses {expected}, got {found}")]
	PrefixLength { expected: usize, found: usize },
}

impl ChainError {
	/// Returns `true` for the "nothing stored under this identity" outcome,
	/// which callers are expected to handle with an empty chain.
	pub fn is_not_found(&self) -> bool {
		matches!(self, ChainError::NotFound(_))
	}

	/// Extracts the partially built chain carried by a corpus failure.
	///
	/// Returns `None` for every other variant.
	pub fn into_partial(self) -> Option<Chain> {
		match self {
			ChainError::Corpus { partial, .. } => Some(*partial),
			_ => None,
		}
	}
}
