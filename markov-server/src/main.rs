mod config;
mod routes;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use clap::Parser;
use log::{info, warn};
use markov_core::{Chain, ChainError, ChainStore};

use crate::config::Config;
use crate::routes::AppState;

/// HTTP gateway between a chat client and the Markov chain.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	/// Path of the TOML configuration file.
	#[arg(short, long, default_value = "markov.toml")]
	config: PathBuf,
}

/// Builds the live chain from the configured corpus.
///
/// An unreadable corpus is not fatal: the gateway starts with whatever was
/// read (usually nothing).
fn build_corpus(config: &Config) -> Result<Chain, ChainError> {
	let chain = Chain::with_prefix_len(config.corpus_identity.as_str(), config.prefix_len)?;
	match chain.ingest_log_file(&config.corpus) {
		Ok(chain) => Ok(chain),
		Err(e @ ChainError::Corpus { .. }) => {
			warn!("{e}, starting from {}", config.corpus);
			// Corpus errors always carry their partial chain
			Ok(e.into_partial().unwrap_or_else(|| Chain::new(config.corpus_identity.as_str())))
		}
		Err(e) => Err(e),
	}
}

/// Main entry point for the gateway.
///
/// Loads the configuration, builds the corpus chain, opens the chain store
/// (fatal if it stays locked) and serves the HTTP endpoints. The store is
/// closed once the server stops.
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = Args::parse();
	let config = Config::load(&args.config)?;

	let chain = build_corpus(&config)?;
	info!(
		"chain '{}' ready: {} prefixes, {} observations",
		chain.identity(),
		chain.len(),
		chain.observations()
	);

	let store = ChainStore::open(&config.database)?;
	let bind = config.server.clone();
	let state = web::Data::new(AppState::new(config, chain, store));

	info!("listening on {bind}");
	let server_state = state.clone();
	let served = HttpServer::new(move || {
		let cors = Cors::default()
			.allow_any_origin()
			.allowed_methods(vec!["GET", "PUT", "POST"])
			.allow_any_header();
		App::new()
			.wrap(cors)
			.app_data(server_state.clone())
			.configure(routes::configure)
	})
	.bind(bind.as_str())?
	.run()
	.await;

	if let Ok(mut store) = state.store.lock() {
		store.close();
	}
	info!("gateway stopped");

	served?;
	Ok(())
}
