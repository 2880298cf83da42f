use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use log::{debug, info};

use super::KvStore;
use crate::error::{ChainError, Result};
use crate::io::{sibling_path, write_atomic};

/// How long `Database::open` waits for another holder to release the lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

type Collections = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// File-backed key-value database.
///
/// The whole database is a `postcard`-encoded map collection → key → bytes,
/// loaded when opening and rewritten atomically on every `put`. Exclusive
/// ownership is enforced with an advisory lock on `<path>.lock`.
///
/// # Invariants
/// - At most one open `Database` per path across processes
/// - The lock is released exactly once, by `close` or on drop
#[derive(Debug)]
pub struct Database {
	path: PathBuf,
	lock: Option<File>,
	collections: Collections,
}

impl Database {
	/// Opens (or creates on first write) the database at `path`, waiting up
	/// to `DEFAULT_LOCK_TIMEOUT` for the lock.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		Self::open_with_timeout(path, DEFAULT_LOCK_TIMEOUT)
	}

	/// Opens the database at `path`, waiting up to `timeout` for the lock.
	///
	/// # Errors
	/// - `ChainError::Locked` if another holder keeps the lock past `timeout`.
	/// - `ChainError::Io` if the lock file or the database cannot be read.
	/// - `ChainError::Database` if the database content is not readable.
	pub fn open_with_timeout<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self> {
		let path = path.as_ref().to_path_buf();
		let lock = acquire_lock(&path, timeout)?;

		let collections = if path.exists() {
			let bytes = std::fs::read(&path)?;
			if bytes.is_empty() { Collections::new() } else { postcard::from_bytes::<Collections>(&bytes)? }
		} else {
			Collections::new()
		};

		info!("opened database {} ({} collections)", path.display(), collections.len());
		Ok(Self { path, lock: Some(lock), collections })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Releases the lock. Dropping the database does the same.
	pub fn close(mut self) {
		self.release();
	}

	fn release(&mut self) {
		if let Some(file) = self.lock.take() {
			let _ = file.unlock();
			info!("closed database {}", self.path.display());
		}
	}

	fn persist(&self) -> Result<()> {
		let bytes = postcard::to_stdvec(&self.collections)?;
		write_atomic(&self.path, &bytes)?;
		debug!("wrote {} bytes to {}", bytes.len(), self.path.display());
		Ok(())
	}
}

impl Drop for Database {
	fn drop(&mut self) {
		self.release();
	}
}

impl KvStore for Database {
	fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>> {
		Ok(self.collections.get(collection).and_then(|c| c.get(key)).cloned())
	}

	/// Stores `value` and rewrites the file. On write failure the in-memory
	/// view is rolled back so it keeps matching the file.
	fn put(&mut self, collection: &str, key: &str, value: Vec<u8>) -> Result<()> {
		let previous = self
			.collections
			.entry(collection.to_owned())
			.or_default()
			.insert(key.to_owned(), value);

		if let Err(e) = self.persist() {
			let emptied = match self.collections.get_mut(collection) {
				Some(entries) => {
					match previous {
						Some(old) => {
							entries.insert(key.to_owned(), old);
						}
						None => {
							entries.remove(key);
						}
					}
					entries.is_empty()
				}
				None => false,
			};
			// A collection created by this put must not outlive it
			if emptied {
				self.collections.remove(collection);
			}
			return Err(e);
		}
		Ok(())
	}

	fn keys(&self, collection: &str) -> Result<Vec<String>> {
		Ok(self.collections.get(collection).map(|c| c.keys().cloned().collect()).unwrap_or_default())
	}
}

/// Takes the exclusive lock on `<path>.lock`, polling until `timeout`.
fn acquire_lock(path: &Path, timeout: Duration) -> Result<File> {
	let lock_path = sibling_path(path, "lock")?;
	let file = OpenOptions::new()
		.create(true)
		.read(true)
		.write(true)
		.truncate(false)
		.open(&lock_path)?;

	let start = Instant::now();
	loop {
		match file.try_lock_exclusive() {
			Ok(()) => return Ok(file),
			Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
				if start.elapsed() >= timeout {
					return Err(ChainError::Locked { path: path.to_path_buf(), timeout });
				}
				thread::sleep(LOCK_POLL_INTERVAL);
			}
			Err(e) => return Err(e.into()),
		}
	}
}
