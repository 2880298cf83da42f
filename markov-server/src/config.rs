use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::info;
use markov_core::{AGGREGATE_IDENTITY, DEFAULT_PREFIX_LEN};
use serde::Deserialize;

/// Gateway settings, read from a TOML file.
///
/// Every key is optional; missing keys take the values of `Config::default`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Address the HTTP gateway binds to.
	pub server: String,
	/// Name the replies are sent as.
	pub bot_name: String,
	/// Channel replies go to when the inbound message names none.
	pub channel: String,
	/// Command token that asks for a generated line.
	pub trigger: String,
	/// Structured log ingested at startup.
	pub corpus: String,
	/// Identity of the chain built from `corpus`.
	pub corpus_identity: String,
	/// Key-value database holding saved chains.
	pub database: String,
	pub prefix_len: usize,
	/// Upper bound on the words of one reply.
	pub max_words: usize,
	/// Feed non-command inbound lines into the live chain.
	pub learn: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			server: "127.0.0.1:5000".to_owned(),
			bot_name: "markov".to_owned(),
			channel: "#markov".to_owned(),
			trigger: "!markov".to_owned(),
			corpus: "history.log".to_owned(),
			corpus_identity: AGGREGATE_IDENTITY.to_owned(),
			database: "data.db".to_owned(),
			prefix_len: DEFAULT_PREFIX_LEN.get(),
			max_words: 64,
			learn: false,
		}
	}
}

impl Config {
	/// Loads the configuration file at `path`.
	///
	/// A missing file is not an error: the defaults are returned.
	///
	/// # Errors
	/// Returns an error if the file exists but cannot be read or parsed,
	/// or if a value is out of range.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
		let path = path.as_ref();
		let config = match fs::read_to_string(path) {
			Ok(text) => Self::parse(&text)?,
			Err(e) if e.kind() == ErrorKind::NotFound => {
				info!("no configuration at {}, using defaults", path.display());
				Self::default()
			}
			Err(e) => return Err(format!("Failed to read {}: {e}", path.display()).into()),
		};
		Ok(config)
	}

	/// Parses and checks a TOML document.
	pub fn parse(text: &str) -> Result<Self, Box<dyn std::error::Error>> {
		let config: Config = toml::from_str(text)?;
		if config.prefix_len == 0 {
			return Err("prefix_len must be >= 1".into());
		}
		if config.trigger.trim().is_empty() {
			return Err("trigger cannot be empty".into());
		}
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_document_gives_defaults() {
		assert_eq!(Config::parse("").unwrap(), Config::default());
	}

	#[test]
	fn overrides_are_applied() {
		let config = Config::parse(
			r##"
			server = "0.0.0.0:6667"
			bot_name = "parrot"
			channel = "#random"
			max_words = 10
			learn = true
			"##,
		)
		.unwrap();
		assert_eq!(config.server, "0.0.0.0:6667");
		assert_eq!(config.bot_name, "parrot");
		assert_eq!(config.channel, "#random");
		assert_eq!(config.max_words, 10);
		assert!(config.learn);
		assert_eq!(config.trigger, "!markov");
	}

	#[test]
	fn invalid_values_are_rejected() {
		assert!(Config::parse("prefix_len = 0").is_err());
		assert!(Config::parse("trigger = \"  \"").is_err());
		assert!(Config::parse("unknown_key = 1").is_err());
	}

	#[test]
	fn missing_file_gives_defaults() {
		let config = Config::load("/definitely/not/markov.toml").unwrap();
		assert_eq!(config, Config::default());
	}
}
