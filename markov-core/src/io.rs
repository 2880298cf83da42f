use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Opens a corpus file for buffered, line-oriented reading.
pub(crate) fn open_reader<P: AsRef<Path>>(filename: P) -> io::Result<BufReader<File>> {
	Ok(BufReader::new(File::open(filename)?))
}

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub(crate) fn read_lines<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds a sibling path by appending a suffix to the full file name.
///
/// Example:
/// `data/markov.db` + `"lock"` → `data/markov.db.lock`
pub(crate) fn sibling_path<P: AsRef<Path>>(path: P, suffix: &str) -> io::Result<PathBuf> {
	let path = path.as_ref();
	let file_name = path
		.file_name()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	let mut name = OsString::from(file_name);
	name.push(".");
	name.push(suffix);
	Ok(path.with_file_name(name))
}

/// Replaces the content of `path` with `bytes`.
///
/// The bytes go to a temporary sibling first, which is then renamed over
/// the target, so readers never observe a half-written file.
pub(crate) fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
	let path = path.as_ref();
	let tmp = sibling_path(path, "tmp")?;
	{
		let mut file = File::create(&tmp)?;
		file.write_all(bytes)?;
		file.sync_all()?;
	}
	fs::rename(&tmp, path)
}
