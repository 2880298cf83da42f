use std::fs;
use std::time::Duration;

use markov_core::{Chain, ChainError, ChainStore, Generator};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const LOG: &str = "\
2016-03-01 18:02:11 #golang alice the cat sat on the mat
2016-03-01 18:02:15 #golang bob the cat ran away
2016-03-01 18:03:01 #golang carol
2016-03-01 18:03:40 #golang alice on the mat the dog slept
";

fn write_log(dir: &TempDir, content: &str) -> std::path::PathBuf {
	let path = dir.path().join("history.log");
	fs::write(&path, content).unwrap();
	path
}

#[test]
fn log_file_chain_survives_store_reopen() {
	let dir = tempfile::tempdir().unwrap();
	let log = write_log(&dir, LOG);
	let db = dir.path().join("data.db");

	let chain = Chain::from_log_file("all", &log).unwrap();
	assert_eq!(chain.successors_of(" the"), ["cat", "cat"]);
	assert_eq!(chain.successors_of("the cat"), ["sat", "ran"]);

	{
		let mut store = ChainStore::open(&db).unwrap();
		store.save(&chain).unwrap();
	}

	let store = ChainStore::open(&db).unwrap();
	let loaded = store.load("all").unwrap();
	assert_eq!(loaded, chain);
	assert_eq!(store.identities().unwrap(), vec!["all".to_owned()]);
	assert!(matches!(store.load("alice"), Err(ChainError::NotFound(ref who)) if who == "alice"));
}

#[test]
fn open_store_keeps_others_out_until_closed() {
	let dir = tempfile::tempdir().unwrap();
	let db = dir.path().join("data.db");

	let mut store = ChainStore::open(&db).unwrap();
	let blocked = ChainStore::open_with_timeout(&db, Duration::from_millis(50));
	assert!(matches!(blocked, Err(ChainError::Locked { .. })));

	store.close();
	assert!(ChainStore::open_with_timeout(&db, Duration::from_millis(50)).is_ok());
}

#[test]
fn parallel_build_matches_sequential_build() {
	let dir = tempfile::tempdir().unwrap();
	let words = ["the", "cat", "sat", "on", "mat", "dog", "ran", "away", "a", "hat"];
	let mut content = String::new();
	for i in 0..2_000usize {
		let len = 3 + i % 7;
		let message: Vec<&str> = (0..len).map(|j| words[(i * 7 + j * 3) % words.len()]).collect();
		content.push_str(&format!("2016-03-01 18:{:02}:{:02} #chan nick{} {}\n", i % 60, (i * 13) % 60, i % 5, message.join(" ")));
	}
	let log = write_log(&dir, &content);

	let sequential = Chain::from_log_file("all", &log).unwrap();
	let parallel = Chain::from_log_file_parallel("all", &log).unwrap();
	assert_eq!(parallel, sequential);
	assert!(!parallel.is_empty());
}

#[test]
fn parallel_build_of_missing_file_returns_untouched_chain() {
	let dir = tempfile::tempdir().unwrap();
	let err = Chain::from_log_file_parallel("all", dir.path().join("nope.log")).unwrap_err();
	let partial = err.into_partial().unwrap();
	assert!(partial.is_empty());
}

#[test]
fn stored_chain_generates_like_the_original() {
	let dir = tempfile::tempdir().unwrap();
	let log = write_log(&dir, LOG);
	let chain = Chain::from_log_file("all", &log).unwrap();

	let mut store = ChainStore::open(dir.path().join("data.db")).unwrap();
	store.save(&chain).unwrap();
	let loaded = store.load("all").unwrap();

	let mut first = Generator::seeded(9);
	let mut second = Generator::seeded(9);
	for _ in 0..20 {
		assert_eq!(first.generate_bounded(&chain, 40), second.generate_bounded(&loaded, 40));
	}
}
