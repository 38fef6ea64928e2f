use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rust_embed::RustEmbed;
use tracing::info;

use crate::error::DictError;
use crate::trie::Trie;
use crate::{elapsed_secs, now};

/// Bundled dictionary resources.
#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

/// Logical path of the bundled main word-frequency dictionary.
pub const MAIN_DICT: &str = "dict.txt";

/// One complete, immutable generation of the dictionary: the prefix trie,
/// the word → log-probability table and the statistics derived from the
/// main-dictionary pass. Exactly one snapshot is published at any instant;
/// readers that still hold an older generation keep it alive until they
/// drop their `Arc`.
#[derive(Debug)]
pub struct DictionarySnapshot {
	trie: Trie,
	freqs: HashMap<String, f64>,
	total: f64,
	min_freq: f64,
}

impl DictionarySnapshot {
	/// Root of the prefix trie, for node-by-node traversal by the segmenter.
	#[must_use]
	pub fn trie(&self) -> &Trie {
		&self.trie
	}

	/// Natural-log probability of `word`, or the out-of-vocabulary fallback
	/// (the lowest log-probability seen during the main-dictionary pass).
	#[must_use]
	pub fn get_frequency(&self, word: &str) -> f64 {
		self.freqs.get(word).copied().unwrap_or(self.min_freq)
	}

	#[must_use]
	pub fn contains_word(&self, word: &str) -> bool {
		self.freqs.contains_key(word)
	}

	/// Sum of raw frequencies of the main dictionary, frozen per generation.
	#[must_use]
	pub fn total(&self) -> f64 {
		self.total
	}

	/// Out-of-vocabulary fallback log-probability.
	#[must_use]
	pub fn min_freq(&self) -> f64 {
		self.min_freq
	}

	#[must_use]
	pub fn word_count(&self) -> usize {
		self.freqs.len()
	}
}

/// Builds one [`DictionarySnapshot`] generation from its sources, applied
/// in order: the main dictionary first, then user dictionary files, then
/// the remote payload.
///
/// The main pass fixes `total` (the normalization denominator) and
/// `min_freq` for the generation. Later sources are normalized against the
/// frozen `total` rather than a recomputed corpus-wide sum, so added
/// entries stay on a probability scale comparable to the base corpus. The
/// merged distribution therefore no longer sums to 1; that is the contract,
/// not an oversight.
#[derive(Debug)]
pub struct SnapshotBuilder {
	trie: Trie,
	freqs: HashMap<String, f64>,
	total: f64,
	min_freq: f64,
}

impl SnapshotBuilder {
	#[must_use]
	pub fn new() -> Self {
		Self {
			trie: Trie::new(),
			freqs: HashMap::new(),
			total: 0.0,
			min_freq: f64::MAX,
		}
	}

	/// Loads the main dictionary from `text`, fixing `total` and `min_freq`
	/// for this generation. Returns the number of accepted entries.
	pub fn load_main(&mut self, text: &str) -> usize {
		let t0 = now();
		for line in text.lines() {
			let Some((word, freq)) = parse_line(line) else {
				continue;
			};
			self.total += freq;
			self.trie.insert(&word);
			self.freqs.insert(word, freq);
		}
		// Raw frequencies were staged in the table; normalize in place now
		// that the denominator is known.
		for freq in self.freqs.values_mut() {
			*freq = (*freq / self.total).ln();
			self.min_freq = self.min_freq.min(*freq);
		}
		let count = self.freqs.len();
		info!(
			"main dictionary load finished, {count} words in {:.3}s",
			elapsed_secs(&t0)
		);
		count
	}

	/// Loads the bundled main dictionary resource.
	///
	/// # Errors
	///
	/// Will return `Err` if the bundled resource is absent.
	pub fn load_main_bundled(&mut self) -> Result<usize, DictError> {
		let asset = Assets::get(MAIN_DICT).ok_or(DictError::ResourceMissing)?;
		let text = String::from_utf8_lossy(&asset.data);
		Ok(self.load_main(&text))
	}

	/// Loads the main dictionary from a file instead of the bundled resource.
	///
	/// # Errors
	///
	/// Will return `Err` if `path` cannot be read.
	pub fn load_main_file(&mut self, path: &Path) -> Result<usize, DictError> {
		let bytes = fs::read(path)?;
		Ok(self.load_main(&String::from_utf8_lossy(&bytes)))
	}

	/// Merges one user dictionary file, normalizing against the frozen
	/// `total`. Returns the number of accepted entries.
	///
	/// # Errors
	///
	/// Will return `Err` if `path` cannot be read.
	pub fn load_user_file(&mut self, path: &Path) -> Result<usize, DictError> {
		let bytes = fs::read(path).map_err(|source| DictError::FileUnreadable {
			path: path.to_path_buf(),
			source,
		})?;
		let t0 = now();
		let count = self.merge_lines(&String::from_utf8_lossy(&bytes));
		info!(
			"user dictionary {:?} load finished, {count} words in {:.3}s",
			path,
			elapsed_secs(&t0)
		);
		Ok(count)
	}

	/// Merges the remote dictionary payload, normalizing against the frozen
	/// `total`. Returns the number of accepted entries.
	pub fn merge_remote(&mut self, bytes: &[u8]) -> usize {
		let t0 = now();
		let count = self.merge_lines(&String::from_utf8_lossy(bytes));
		info!(
			"remote dictionary load finished, {count} words in {:.3}s",
			elapsed_secs(&t0)
		);
		count
	}

	/// Merge pass shared by user and remote sources: entries are stored as
	/// `ln(freq / total)` with this generation's frozen `total`, and never
	/// touch `min_freq`. A later source overwrites an earlier entry for the
	/// same word.
	fn merge_lines(&mut self, text: &str) -> usize {
		let mut count = 0;
		for line in text.lines() {
			let Some((word, freq)) = parse_line(line) else {
				continue;
			};
			self.trie.insert(&word);
			self.freqs.insert(word, (freq / self.total).ln());
			count += 1;
		}
		count
	}

	#[must_use]
	pub fn build(self) -> DictionarySnapshot {
		DictionarySnapshot {
			trie: self.trie,
			freqs: self.freqs,
			total: self.total,
			min_freq: self.min_freq,
		}
	}
}

impl Default for SnapshotBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Parses one `<word> <frequency> [ignored…]` dictionary line. The word is
/// trimmed and lower-cased; blank words, short lines, non-numeric and
/// negative frequencies yield `None` and are skipped by callers.
fn parse_line(line: &str) -> Option<(String, f64)> {
	let mut tokens = line.split_whitespace();
	let word = tokens.next()?.trim().to_lowercase();
	let freq: f64 = tokens.next()?.parse().ok()?;
	if word.is_empty() || freq < 0.0 {
		return None;
	}
	Some((word, freq))
}
