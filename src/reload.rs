use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use arc_swap::ArcSwap;
use tracing::{error, info, warn};

use crate::config::MainDictSource;
use crate::dict::{DictionarySnapshot, SnapshotBuilder};

/// Suffix a file must carry to count as a user dictionary.
pub const USER_DICT_SUFFIX: &str = ".dict";

/// Mutable reload-cycle state, touched only under the coordinator lock.
#[derive(Debug, Default)]
struct ReloadState {
	/// Absolute path → last-modified time of every user dictionary that
	/// went into the current generation, for change detection.
	loaded_paths: HashMap<PathBuf, SystemTime>,
	/// Last payload fetched from the remote endpoint. A rebuild triggered
	/// by a local change alone still re-merges this, so remote words
	/// survive user-dictionary edits between fetches.
	remote_payload: Option<Vec<u8>>,
}

/// Builds dictionary generations and publishes them atomically.
///
/// Readers call [`snapshot`](Self::snapshot) and never contend with a
/// rebuild: publication is a single `ArcSwap` store, and an old generation
/// stays valid for whoever still holds it. The internal mutex serializes
/// reload cycles only; in steady state it is taken by the scheduler task
/// alone.
#[derive(Debug)]
pub struct ReloadCoordinator {
	main_dict: MainDictSource,
	user_dict_dir: PathBuf,
	published: ArcSwap<DictionarySnapshot>,
	state: Mutex<ReloadState>,
	generation: AtomicU64,
}

impl ReloadCoordinator {
	/// Builds and publishes the first generation before returning, so a
	/// snapshot is always available afterwards. Source failures are logged
	/// and the partial snapshot is published anyway.
	#[must_use]
	pub fn new(main_dict: MainDictSource, user_dict_dir: impl Into<PathBuf>) -> Self {
		let user_dict_dir = user_dict_dir.into();
		let mut state = ReloadState::default();
		let snapshot = build_snapshot(&main_dict, &user_dict_dir, &mut state);
		info!(
			"initial dictionary generation published, {} words",
			snapshot.word_count()
		);
		Self {
			main_dict,
			user_dict_dir,
			published: ArcSwap::from_pointee(snapshot),
			state: Mutex::new(state),
			generation: AtomicU64::new(1),
		}
	}

	/// The currently published generation. Lock-free; the returned `Arc`
	/// stays valid across later reloads.
	#[must_use]
	pub fn snapshot(&self) -> Arc<DictionarySnapshot> {
		self.published.load_full()
	}

	/// Number of generations published so far.
	#[must_use]
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Whether the user dictionary directory differs from what the current
	/// generation was built from: a matched file is new, gone, or has a
	/// different modification time, or the matched-file count changed.
	#[must_use]
	pub fn detect_change(&self) -> bool {
		let state = self.lock_state();
		changed_since(&state.loaded_paths, &self.user_dict_dir)
	}

	/// Runs one reload cycle. When neither the user dictionaries nor the
	/// remote payload changed this is a no-op that leaves the published
	/// snapshot untouched. Otherwise a brand-new generation is built from
	/// scratch and swapped in atomically. Returns whether a new generation
	/// was published.
	pub fn reload(&self, remote_changed: bool, remote_bytes: Option<Vec<u8>>) -> bool {
		let mut state = self.lock_state();
		if !remote_changed && !changed_since(&state.loaded_paths, &self.user_dict_dir) {
			info!("user dictionaries not modified, skipping reload");
			return false;
		}
		if remote_changed {
			state.remote_payload = remote_bytes;
		}

		let snapshot = build_snapshot(&self.main_dict, &self.user_dict_dir, &mut state);
		let words = snapshot.word_count();
		self.published.store(Arc::new(snapshot));
		let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
		info!("published dictionary generation {generation}, {words} words");
		true
	}

	fn lock_state(&self) -> std::sync::MutexGuard<'_, ReloadState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

/// Files in `dir` carrying the user-dictionary suffix, sorted by file name
/// so merge order (and thus last-write-wins) is reproducible.
fn matched_files(dir: &Path) -> Vec<PathBuf> {
	let entries = match fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(err) => {
			warn!("could not scan user dictionary directory {:?}: {err}", dir);
			return Vec::new();
		}
	};
	let mut files: Vec<PathBuf> = entries
		.filter_map(Result::ok)
		.map(|entry| entry.path())
		.filter(|path| {
			path.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(|name| name.ends_with(USER_DICT_SUFFIX))
		})
		.collect();
	files.sort();
	files
}

fn changed_since(recorded: &HashMap<PathBuf, SystemTime>, dir: &Path) -> bool {
	let mut unchanged = 0;
	for path in matched_files(dir) {
		let Ok(modified) = fs::metadata(&path).and_then(|meta| meta.modified()) else {
			return true;
		};
		match recorded.get(&path) {
			Some(seen) if *seen == modified => unchanged += 1,
			_ => return true,
		}
	}
	recorded.len() != unchanged
}

/// One full rebuild: main dictionary, every matched user file in name
/// order, then the cached remote payload. Individual source failures are
/// logged and skipped; the snapshot that results is returned regardless.
fn build_snapshot(
	main_dict: &MainDictSource,
	user_dict_dir: &Path,
	state: &mut ReloadState,
) -> DictionarySnapshot {
	let mut builder = SnapshotBuilder::new();

	let loaded = match main_dict {
		MainDictSource::Bundled => builder.load_main_bundled(),
		MainDictSource::File(path) => builder.load_main_file(path),
	};
	if let Err(err) = loaded {
		// The main resource lives at a fixed location and is expected to
		// always be present; a miss is anomalous but not fatal.
		error!("main dictionary load failed: {err}");
	}

	state.loaded_paths.clear();
	for path in matched_files(user_dict_dir) {
		if let Err(err) = builder.load_user_file(&path) {
			warn!("skipping user dictionary: {err}");
		}
		// Record the file even when unreadable so its later recovery or
		// removal registers as a change.
		if let Ok(modified) = fs::metadata(&path).and_then(|meta| meta.modified()) {
			state.loaded_paths.insert(path, modified);
		}
	}

	if let Some(bytes) = &state.remote_payload {
		builder.merge_remote(bytes);
	}

	builder.build()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs::File;
	use std::io::Write;
	use tempfile::TempDir;

	fn write_main_dict(dir: &TempDir) -> PathBuf {
		let path = dir.path().join("main.txt");
		fs::write(&path, "的 3000\n中国 1000\n").unwrap();
		path
	}

	fn write_user_dict(dir: &TempDir, name: &str, content: &str) -> PathBuf {
		let path = dir.path().join(name);
		let mut file = File::create(&path).unwrap();
		file.write_all(content.as_bytes()).unwrap();
		path
	}

	fn coordinator(dir: &TempDir) -> ReloadCoordinator {
		let main = write_main_dict(dir);
		ReloadCoordinator::new(MainDictSource::File(main), dir.path())
	}

	#[test]
	fn detect_change_is_stable_without_filesystem_mutation() {
		let dir = TempDir::new().unwrap();
		write_user_dict(&dir, "extra.dict", "词语 10\n");
		let coordinator = coordinator(&dir);

		assert!(!coordinator.detect_change());
		assert!(!coordinator.detect_change());
	}

	#[test]
	fn detect_change_sees_new_removed_and_touched_files() {
		let dir = TempDir::new().unwrap();
		let coordinator = coordinator(&dir);
		assert!(!coordinator.detect_change());

		// New file.
		let path = write_user_dict(&dir, "extra.dict", "词语 10\n");
		assert!(coordinator.detect_change());
		assert!(coordinator.reload(false, None));
		assert!(!coordinator.detect_change());

		// Touched file.
		let later = SystemTime::now() + std::time::Duration::from_secs(10);
		File::options()
			.append(true)
			.open(&path)
			.unwrap()
			.set_modified(later)
			.unwrap();
		assert!(coordinator.detect_change());
		assert!(coordinator.reload(false, None));

		// Removed file.
		fs::remove_file(&path).unwrap();
		assert!(coordinator.detect_change());
	}

	#[test]
	fn unmatched_files_are_ignored() {
		let dir = TempDir::new().unwrap();
		let coordinator = coordinator(&dir);

		write_user_dict(&dir, "notes.txt", "忽略 10\n");
		assert!(!coordinator.detect_change());
		assert!(!coordinator.snapshot().contains_word("忽略"));
	}

	#[test]
	fn noop_reload_keeps_snapshot_identity() {
		let dir = TempDir::new().unwrap();
		let coordinator = coordinator(&dir);

		let before = coordinator.snapshot();
		assert!(!coordinator.reload(false, None));
		let after = coordinator.snapshot();
		assert!(Arc::ptr_eq(&before, &after));
		assert_eq!(coordinator.generation(), 1);
	}

	#[test]
	fn user_dictionary_entries_merge_against_frozen_total() {
		let dir = TempDir::new().unwrap();
		let coordinator = coordinator(&dir);

		write_user_dict(&dir, "extra.dict", "自定义词 400\n");
		assert!(coordinator.reload(false, None));

		let snapshot = coordinator.snapshot();
		// Main total is 4000; the user entry must use that denominator.
		assert_eq!(
			snapshot.get_frequency("自定义词"),
			(400.0_f64 / 4000.0).ln()
		);
		assert!(snapshot.trie().contains("自定义词"));
	}

	#[test]
	fn user_files_merge_in_name_order() {
		let dir = TempDir::new().unwrap();
		let coordinator = coordinator(&dir);

		write_user_dict(&dir, "a.dict", "同词 100\n");
		write_user_dict(&dir, "b.dict", "同词 200\n");
		assert!(coordinator.reload(false, None));

		// b.dict loads after a.dict, so its value wins.
		let snapshot = coordinator.snapshot();
		assert_eq!(snapshot.get_frequency("同词"), (200.0_f64 / 4000.0).ln());
	}

	#[test]
	fn old_snapshot_stays_valid_after_publication() {
		let dir = TempDir::new().unwrap();
		let coordinator = coordinator(&dir);
		let old = coordinator.snapshot();

		write_user_dict(&dir, "extra.dict", "新词 10\n");
		assert!(coordinator.reload(false, None));

		assert!(!old.contains_word("新词"));
		assert!(coordinator.snapshot().contains_word("新词"));
		assert_eq!(coordinator.generation(), 2);
	}

	#[test]
	fn remote_payload_is_remerged_on_local_change() {
		let dir = TempDir::new().unwrap();
		let coordinator = coordinator(&dir);

		assert!(coordinator.reload(true, Some("remote词 100\n".as_bytes().to_vec())));
		assert!(coordinator.snapshot().contains_word("remote词"));

		// A later cycle with only a local change keeps the remote words.
		write_user_dict(&dir, "extra.dict", "本地词 10\n");
		assert!(coordinator.reload(false, None));
		let snapshot = coordinator.snapshot();
		assert!(snapshot.contains_word("remote词"));
		assert!(snapshot.contains_word("本地词"));
	}

	#[test]
	fn unreadable_main_dictionary_still_publishes() {
		let dir = TempDir::new().unwrap();
		let missing = dir.path().join("nowhere.txt");
		let coordinator = ReloadCoordinator::new(MainDictSource::File(missing), dir.path());

		let snapshot = coordinator.snapshot();
		assert_eq!(snapshot.word_count(), 0);
		assert_eq!(snapshot.get_frequency("任何"), f64::MAX);
	}
}
