use std::sync::Arc;

use crate::config::EngineConfig;
use crate::dict::DictionarySnapshot;
use crate::reload::ReloadCoordinator;
use crate::remote::RemoteFetcher;
use crate::scheduler::{self, SchedulerHandle};

/// The dictionary engine, constructed explicitly at startup and shared by
/// handle with every consumer.
///
/// Construction performs the primary load and publishes the first
/// generation before returning, so every query after `new` sees a complete
/// snapshot. Queries read whichever generation is currently published and
/// never block on a rebuild.
#[derive(Debug, Clone)]
pub struct DictEngine {
	coordinator: Arc<ReloadCoordinator>,
	config: EngineConfig,
}

impl DictEngine {
	#[must_use]
	pub fn new(config: EngineConfig) -> Self {
		let coordinator = Arc::new(ReloadCoordinator::new(
			config.main_dict.clone(),
			config.user_dict_dir.clone(),
		));
		Self {
			coordinator,
			config,
		}
	}

	/// The currently published generation. Hold the returned `Arc` for the
	/// duration of one segmentation pass so trie traversal and frequency
	/// lookups observe a single consistent generation.
	#[must_use]
	pub fn snapshot(&self) -> Arc<DictionarySnapshot> {
		self.coordinator.snapshot()
	}

	/// Log-probability of `word` in the current generation, with the
	/// out-of-vocabulary fallback for unseen words.
	#[must_use]
	pub fn get_frequency(&self, word: &str) -> f64 {
		self.snapshot().get_frequency(word)
	}

	#[must_use]
	pub fn contains_word(&self, word: &str) -> bool {
		self.snapshot().contains_word(word)
	}

	/// The reload coordinator, for embedders that drive reloads themselves
	/// instead of (or in addition to) the scheduler.
	#[must_use]
	pub fn coordinator(&self) -> &Arc<ReloadCoordinator> {
		&self.coordinator
	}

	/// Spawns the periodic fetch-and-reload task on the current tokio
	/// runtime. Call at most once; nothing enforces it, but two schedulers
	/// would only waste fetches.
	#[must_use]
	pub fn start_scheduler(&self) -> SchedulerHandle {
		let fetcher = RemoteFetcher::new(&self.config);
		scheduler::spawn(
			Arc::clone(&self.coordinator),
			fetcher,
			self.config.initial_delay,
			self.config.poll_period,
		)
	}
}
