use std::fs;
use std::time::Duration;

use segdict::{DictEngine, EngineConfig, MainDictSource};
use tempfile::TempDir;
use tokio::time::sleep;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn engine_serves_the_bundled_dictionary() {
	let dir = TempDir::new().unwrap();
	let engine = DictEngine::new(EngineConfig::new(dir.path()));

	assert!(engine.contains_word("中国"));
	assert!(engine.get_frequency("中国") < 0.0);

	let snapshot = engine.snapshot();
	assert_eq!(
		snapshot.get_frequency("绝对不存在的词"),
		snapshot.min_freq()
	);
}

#[test]
fn published_trie_supports_left_to_right_enumeration() {
	let dir = TempDir::new().unwrap();
	let engine = DictEngine::new(EngineConfig::new(dir.path()));
	let snapshot = engine.snapshot();

	// Enumerate every dictionary word starting at offset 0 of the classic
	// garden-path sentence, the access pattern of the path search.
	let input: Vec<char> = "南京市长江大桥".chars().collect();
	let mut node = snapshot.trie();
	let mut words = Vec::new();
	for (i, ch) in input.iter().enumerate() {
		match node.child(*ch) {
			Some(next) => {
				if next.is_word() {
					words.push(input[..=i].iter().collect::<String>());
				}
				node = next;
			}
			None => break,
		}
	}

	assert!(words.contains(&"南京".to_string()));
	assert!(words.contains(&"南京市".to_string()));
}

#[tokio::test]
async fn full_cycle_remote_fetch_then_local_edit() {
	init_tracing();
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/extra.dict"))
		.respond_with(
			ResponseTemplate::new(200)
				.insert_header("Last-Modified", "Wed, 21 Oct 2015 07:28:00 GMT")
				.set_body_string("远程新词 120\n"),
		)
		.mount(&server)
		.await;

	let dir = TempDir::new().unwrap();
	let main = dir.path().join("main.txt");
	fs::write(&main, "的 3000\n中国 1000\n").unwrap();

	let mut config = EngineConfig::new(dir.path());
	config.main_dict = MainDictSource::File(main);
	config.remote_url = Some(format!("{}/extra.dict", server.uri()));
	config.initial_delay = Duration::from_millis(10);
	config.poll_period = Duration::from_millis(40);

	let engine = DictEngine::new(config);
	let before = engine.snapshot();
	assert!(!before.contains_word("远程新词"));

	let handle = engine.start_scheduler();

	let mut remote_seen = false;
	for _ in 0..100 {
		if engine.contains_word("远程新词") {
			remote_seen = true;
			break;
		}
		sleep(Duration::from_millis(20)).await;
	}
	assert!(remote_seen, "scheduler never merged the remote dictionary");

	// Remote entries are normalized against the frozen main total (4000).
	let snapshot = engine.snapshot();
	assert_eq!(
		snapshot.get_frequency("远程新词"),
		(120.0_f64 / 4000.0).ln()
	);

	// A reader holding the old generation is unaffected.
	assert!(!before.contains_word("远程新词"));

	// Now edit a user dictionary; the next cycle picks it up and keeps the
	// cached remote payload.
	fs::write(dir.path().join("local.dict"), "本地新词 80\n").unwrap();
	let mut local_seen = false;
	for _ in 0..100 {
		if engine.contains_word("本地新词") {
			local_seen = true;
			break;
		}
		sleep(Duration::from_millis(20)).await;
	}
	assert!(local_seen, "scheduler never merged the user dictionary");
	let snapshot = engine.snapshot();
	assert!(snapshot.contains_word("远程新词"));
	assert_eq!(snapshot.get_frequency("本地新词"), (80.0_f64 / 4000.0).ln());

	handle.stopped().await;
}

#[tokio::test]
async fn engine_without_remote_url_stays_quiet() {
	init_tracing();
	let dir = TempDir::new().unwrap();
	let main = dir.path().join("main.txt");
	fs::write(&main, "的 3000\n").unwrap();

	let mut config = EngineConfig::new(dir.path());
	config.main_dict = MainDictSource::File(main);
	config.initial_delay = Duration::from_millis(5);
	config.poll_period = Duration::from_millis(20);

	let engine = DictEngine::new(config);
	let before = engine.snapshot();
	let handle = engine.start_scheduler();

	sleep(Duration::from_millis(120)).await;
	handle.stopped().await;

	// Nothing changed, so every cycle was the identity-preserving no-op.
	assert!(std::sync::Arc::ptr_eq(&before, &engine.snapshot()));
}
