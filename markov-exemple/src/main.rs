use std::path::PathBuf;

use clap::Parser;
use log::info;
use markov_core::{AGGREGATE_IDENTITY, Chain, ChainStore, Generator};

/// Builds a chain from a chat log, stores it and generates a few lines.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	/// Structured chat log (`date time channel nick message...` per line).
	corpus: PathBuf,

	/// Identity the chain is saved under.
	#[arg(long, default_value = AGGREGATE_IDENTITY)]
	identity: String,

	/// Key-value database file.
	#[arg(long, default_value = "data.db")]
	database: PathBuf,

	/// Number of lines to generate.
	#[arg(long, default_value_t = 10)]
	count: usize,

	/// Maximum number of words per line.
	#[arg(long, default_value_t = 64)]
	max_words: usize,

	/// Fixed seed, for reproducible output.
	#[arg(long)]
	seed: Option<u64>,

	/// Build the chain with one thread per chunk of the log.
	#[arg(long)]
	parallel: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	// Build the chain from the log file. Each line drops its first four
	// fields (date, time, channel, nick) and starts a new sentence.
	let chain = if args.parallel {
		Chain::from_log_file_parallel(&args.identity, &args.corpus)?
	} else {
		Chain::from_log_file(&args.identity, &args.corpus)?
	};
	info!(
		"built '{}' from {}: {} prefixes, {} observations",
		chain.identity(),
		args.corpus.display(),
		chain.len(),
		chain.observations()
	);

	// Save it, close the store, then read it back from a fresh handle
	{
		let mut store = ChainStore::open(&args.database)?;
		store.save(&chain)?;
		info!("saved '{}' to {}", chain.identity(), args.database.display());
	}
	let store = ChainStore::open(&args.database)?;
	let chain = store.load(&args.identity)?;
	info!("reloaded '{}': {} prefixes", chain.identity(), chain.len());
	println!("Stored identities: {}", store.identities()?.join(", "));

	// Loading an identity that was never saved is a normal outcome
	match store.load("nobody") {
		Ok(_) => println!("Should not happen"),
		Err(e) if e.is_not_found() => println!("No chain for 'nobody', an empty one would be used"),
		Err(e) => return Err(e.into()),
	}

	// The walk stops on the first prefix without successor; `max_words`
	// guards against chains that loop forever
	let mut generator = match args.seed {
		Some(seed) => Generator::seeded(seed),
		None => Generator::new(),
	};
	for i in 0..args.count {
		println!("Generated line {}: {}", i + 1, generator.generate_bounded(&chain, args.max_words));
	}

	Ok(())
}
