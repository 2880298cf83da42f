use std::sync::{Mutex, RwLock};

use actix_web::{HttpResponse, Responder, get, post, put, web};
use log::{debug, error, info};
use markov_core::{Chain, ChainError, ChainStore, Generator};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// State shared by every worker of the gateway.
///
/// The live chain is read by every generation and written only when
/// learning is on, hence the `RwLock`.
pub struct AppState {
	pub config: Config,
	pub chain: RwLock<Chain>,
	pub generator: Mutex<Generator>,
	pub store: Mutex<ChainStore>,
}

impl AppState {
	pub fn new(config: Config, chain: Chain, store: ChainStore) -> Self {
		Self {
			config,
			chain: RwLock::new(chain),
			generator: Mutex::new(Generator::new()),
			store: Mutex::new(store),
		}
	}
}

/// An inbound chat line, as relayed by the chat client.
#[derive(Deserialize, Debug)]
pub struct InboundMessage {
	pub nick: String,
	pub text: String,
	pub channel: Option<String>,
}

/// A line the chat client should deliver.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct OutboundMessage {
	pub channel: String,
	pub nick: String,
	pub text: String,
}

#[derive(Deserialize)]
struct GenerateParams {
	identity: Option<String>,
	max_words: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Status {
	pub identity: String,
	pub prefixes: usize,
	pub observations: usize,
	pub bot_name: String,
}

/// Splits a command line into its optional identity argument.
///
/// Returns `None` when `text` is not a command. The trigger must be the
/// whole first word: with `!markov`, `"!markovian"` is not a command.
fn parse_command<'t>(text: &'t str, trigger: &str) -> Option<Option<&'t str>> {
	let rest = text.trim_start().strip_prefix(trigger)?;
	if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
		return None;
	}
	Some(rest.split_whitespace().next())
}

fn error_response(e: &ChainError) -> HttpResponse {
	match e {
		ChainError::NotFound(_) => HttpResponse::NotFound().body(e.to_string()),
		ChainError::Precheck(_) => HttpResponse::ServiceUnavailable().body(e.to_string()),
		_ => {
			error!("{e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

fn generate_live(state: &AppState, max_words: usize) -> Result<String, HttpResponse> {
	let chain = state
		.chain
		.read()
		.map_err(|_| HttpResponse::InternalServerError().body("Chain lock failed"))?;
	let mut generator = state
		.generator
		.lock()
		.map_err(|_| HttpResponse::InternalServerError().body("Generator lock failed"))?;
	Ok(generator.generate_bounded(&chain, max_words))
}

fn generate_stored(state: &AppState, identity: &str, max_words: usize) -> Result<String, HttpResponse> {
	let chain = {
		let store = state
			.store
			.lock()
			.map_err(|_| HttpResponse::InternalServerError().body("Store lock failed"))?;
		store.load_or_empty(identity).map_err(|e| error_response(&e))?
	};
	let mut generator = state
		.generator
		.lock()
		.map_err(|_| HttpResponse::InternalServerError().body("Generator lock failed"))?;
	Ok(generator.generate_bounded(&chain, max_words))
}

/// HTTP POST endpoint `/v1/message`
///
/// Receives one inbound chat line. A line starting with the trigger is
/// answered with a generated reply (from the live chain, or from the stored
/// chain of the identity given after the trigger). Other lines get
/// `204 No Content` and are learned when learning is enabled.
#[post("/v1/message")]
async fn post_message(state: web::Data<AppState>, message: web::Json<InboundMessage>) -> impl Responder {
	let message = message.into_inner();
	let max_words = state.config.max_words;

	match parse_command(&message.text, &state.config.trigger) {
		Some(target) => {
			debug!("command from {}: {}", message.nick, message.text);
			let generated = match target {
				Some(identity) => generate_stored(&state, identity, max_words),
				None => generate_live(&state, max_words),
			};
			let text = match generated {
				Ok(text) => text,
				Err(response) => return response,
			};
			HttpResponse::Ok().json(OutboundMessage {
				channel: message.channel.unwrap_or_else(|| state.config.channel.clone()),
				nick: state.config.bot_name.clone(),
				text,
			})
		}
		None => {
			if state.config.learn {
				match state.chain.write() {
					Ok(mut chain) => chain.build_from_str(&message.text),
					Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
				}
			}
			HttpResponse::NoContent().finish()
		}
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a line from the live chain, or from a stored chain when
/// `identity` is given (an unknown identity generates an empty line).
/// `max_words` may lower the configured cap, never raise it.
#[get("/v1/generate")]
async fn get_generated(state: web::Data<AppState>, query: web::Query<GenerateParams>) -> impl Responder {
	// The configured cap also bounds what a caller may ask for
	let max_words = query.max_words.map_or(state.config.max_words, |n| n.min(state.config.max_words));
	let generated = match &query.identity {
		Some(identity) => generate_stored(&state, identity, max_words),
		None => generate_live(&state, max_words),
	};
	match generated {
		Ok(text) => HttpResponse::Ok().body(text),
		Err(response) => response,
	}
}

/// HTTP PUT endpoint `/v1/chains/{identity}`
///
/// Builds a fresh chain from the plain-text body and saves it under
/// `identity`, replacing any previous one.
#[put("/v1/chains/{identity}")]
async fn put_chain(state: web::Data<AppState>, path: web::Path<String>, body: String) -> impl Responder {
	let identity = path.into_inner();
	let mut chain = match Chain::with_prefix_len(identity.as_str(), state.config.prefix_len) {
		Ok(chain) => chain,
		Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
	};
	chain.build_from_str(&body);

	let mut store = match state.store.lock() {
		Ok(store) => store,
		Err(_) => return HttpResponse::InternalServerError().body("Store lock failed"),
	};
	match store.save(&chain) {
		Ok(()) => HttpResponse::Ok().body(format!("Chain '{}' saved ({} prefixes)", identity, chain.len())),
		Err(e) => error_response(&e),
	}
}

/// HTTP GET endpoint `/v1/chains/{identity}`
///
/// Returns the stored encoding of the chain.
#[get("/v1/chains/{identity}")]
async fn get_chain(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
	let store = match state.store.lock() {
		Ok(store) => store,
		Err(_) => return HttpResponse::InternalServerError().body("Store lock failed"),
	};
	match store.load(&path).and_then(|chain| chain.encode()) {
		Ok(bytes) => HttpResponse::Ok().content_type("application/json").body(bytes),
		Err(e) => error_response(&e),
	}
}

#[get("/v1/chains")]
async fn get_chains(state: web::Data<AppState>) -> impl Responder {
	let store = match state.store.lock() {
		Ok(store) => store,
		Err(_) => return HttpResponse::InternalServerError().body("Store lock failed"),
	};
	match store.identities() {
		Ok(identities) => HttpResponse::Ok().body(identities.join("\n")),
		Err(e) => error_response(&e),
	}
}

/// HTTP PUT endpoint `/v1/snapshot`
///
/// Saves the live chain under its own identity.
#[put("/v1/snapshot")]
async fn put_snapshot(state: web::Data<AppState>) -> impl Responder {
	let chain = match state.chain.read() {
		Ok(chain) => chain.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};
	let mut store = match state.store.lock() {
		Ok(store) => store,
		Err(_) => return HttpResponse::InternalServerError().body("Store lock failed"),
	};
	match store.save(&chain) {
		Ok(()) => {
			info!("snapshot of '{}' saved", chain.identity());
			HttpResponse::Ok().body(format!("Chain '{}' saved", chain.identity()))
		}
		Err(e) => error_response(&e),
	}
}

#[get("/v1/status")]
async fn get_status(state: web::Data<AppState>) -> impl Responder {
	let chain = match state.chain.read() {
		Ok(chain) => chain,
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};
	HttpResponse::Ok().json(Status {
		identity: chain.identity().to_owned(),
		prefixes: chain.len(),
		observations: chain.observations(),
		bot_name: state.config.bot_name.clone(),
	})
}

/// Registers every gateway endpoint.
pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(post_message)
		.service(get_generated)
		.service(get_chains)
		.service(put_chain)
		.service(get_chain)
		.service(put_snapshot)
		.service(get_status);
}
