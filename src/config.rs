use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(60_000);

/// Where the primary (frequency-defining) dictionary is loaded from.
#[derive(Debug, Clone, Default)]
pub enum MainDictSource {
	/// The dictionary bundled into the binary at a fixed logical path.
	#[default]
	Bundled,
	/// A dictionary file on disk, same line format as the bundled one.
	File(PathBuf),
}

/// Engine configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
	/// Directory scanned for `.dict` user dictionary files.
	pub user_dict_dir: PathBuf,
	pub main_dict: MainDictSource,
	/// Remote supplementary dictionary endpoint. Ignored unless it carries
	/// an `http://` or `https://` scheme.
	pub remote_url: Option<String>,
	pub connect_timeout: Duration,
	pub read_timeout: Duration,
	/// Delay before the first scheduled fetch-and-reload cycle.
	pub initial_delay: Duration,
	/// Fixed-rate period between scheduled cycles.
	pub poll_period: Duration,
}

impl EngineConfig {
	#[must_use]
	pub fn new(user_dict_dir: impl Into<PathBuf>) -> Self {
		Self {
			user_dict_dir: user_dict_dir.into(),
			main_dict: MainDictSource::Bundled,
			remote_url: None,
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
			read_timeout: DEFAULT_READ_TIMEOUT,
			initial_delay: DEFAULT_INITIAL_DELAY,
			poll_period: DEFAULT_POLL_PERIOD,
		}
	}

	/// Reads the optional properties-style configuration file. Recognized
	/// keys: `remote.ext.dic`, `remote.connectTimeout`, `remote.readTimeout`,
	/// `remote.task.delay`, `remote.task.period`. A missing file yields the
	/// all-defaults configuration; unparseable or negative numeric values
	/// silently fall back to their defaults.
	#[must_use]
	pub fn from_properties(user_dict_dir: impl Into<PathBuf>, path: &Path) -> Self {
		let mut config = Self::new(user_dict_dir);
		let Ok(text) = fs::read_to_string(path) else {
			info!("no configuration file at {:?}, using defaults", path);
			return config;
		};

		let props = parse_properties(&text);
		if let Some(url) = props.get("remote.ext.dic") {
			if !url.is_empty() {
				config.remote_url = Some((*url).to_owned());
			}
		}
		config.connect_timeout =
			parse_millis(&props, "remote.connectTimeout", DEFAULT_CONNECT_TIMEOUT);
		config.read_timeout = parse_millis(&props, "remote.readTimeout", DEFAULT_READ_TIMEOUT);
		config.initial_delay = parse_millis(&props, "remote.task.delay", DEFAULT_INITIAL_DELAY);
		config.poll_period = parse_millis(&props, "remote.task.period", DEFAULT_POLL_PERIOD);
		config
	}
}

/// `key=value` lines; blank lines and `#`/`!` comments are skipped.
fn parse_properties(text: &str) -> HashMap<&str, &str> {
	let mut props = HashMap::new();
	for line in text.lines() {
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
			continue;
		}
		if let Some((key, value)) = line.split_once('=') {
			props.insert(key.trim(), value.trim());
		}
	}
	props
}

fn parse_millis(props: &HashMap<&str, &str>, key: &str, default: Duration) -> Duration {
	props
		.get(key)
		.and_then(|v| v.parse::<u64>().ok())
		.map(Duration::from_millis)
		.unwrap_or(default)
}
