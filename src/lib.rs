//! Hot-reloadable word-frequency dictionary engine for Chinese word
//! segmentation.
//!
//! The engine loads a bundled main dictionary, merges user dictionary
//! files and an optional remotely fetched payload into immutable
//! per-generation snapshots, and publishes each generation with a single
//! atomic swap. A downstream segmenter walks the published trie character
//! by character and scores candidate words with
//! [`DictionarySnapshot::get_frequency`]; it never blocks on a reload.
//!
//! ```no_run
//! use segdict::{DictEngine, EngineConfig};
//!
//! # async fn run() {
//! let engine = DictEngine::new(EngineConfig::new("/etc/segdict/dic"));
//! let handle = engine.start_scheduler();
//!
//! let snapshot = engine.snapshot();
//! if snapshot.contains_word("中国") {
//!     let score = snapshot.get_frequency("中国");
//!     println!("ln P(中国) = {score}");
//! }
//! # handle.stopped().await;
//! # }
//! ```

pub mod config;
pub mod dict;
pub mod engine;
pub mod error;
pub mod reload;
pub mod remote;
pub mod scheduler;
pub mod trie;
pub mod utils;

pub use config::{EngineConfig, MainDictSource};
pub use dict::{DictionarySnapshot, SnapshotBuilder};
pub use engine::DictEngine;
pub use error::DictError;
pub use reload::ReloadCoordinator;
pub use remote::{RemoteFetcher, RemoteUpdate};
pub use scheduler::SchedulerHandle;
pub use trie::Trie;
pub use utils::*;
