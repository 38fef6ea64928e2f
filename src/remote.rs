use chrono::{DateTime, Utc};
use reqwest::header::LAST_MODIFIED;
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::error::DictError;

/// Outcome of one conditional fetch cycle.
#[derive(Debug, PartialEq, Eq)]
pub enum RemoteUpdate {
	/// Nothing new — no URL configured, the endpoint reported the same
	/// `Last-Modified` as last time, or the cycle failed and was logged.
	Unchanged,
	/// The endpoint changed; the full response body.
	Changed(Vec<u8>),
}

/// Conditional fetcher for the remote supplementary dictionary.
///
/// Freshness is decided by comparing the `Last-Modified` response header
/// against the value recorded on the previous successful download, so an
/// unchanged endpoint costs one HEAD-sized round trip and no body transfer.
/// The fetcher is owned and driven by the scheduler task alone; nothing
/// else mutates its recorded state.
#[derive(Debug)]
pub struct RemoteFetcher {
	url: Option<String>,
	client: reqwest::Client,
	last_modified: Option<DateTime<Utc>>,
}

impl RemoteFetcher {
	#[must_use]
	pub fn new(config: &EngineConfig) -> Self {
		let client = reqwest::Client::builder()
			.connect_timeout(config.connect_timeout)
			.read_timeout(config.read_timeout)
			.build()
			.unwrap_or_else(|err| {
				error!("could not build HTTP client with timeouts: {err}");
				reqwest::Client::new()
			});
		Self {
			url: config.remote_url.clone(),
			client,
			last_modified: None,
		}
	}

	/// Runs one fetch cycle. Network failures are logged and reported as
	/// [`RemoteUpdate::Unchanged`]; they never propagate to the scheduler.
	pub async fn fetch(&mut self) -> RemoteUpdate {
		let Some(url) = self.url.clone() else {
			return RemoteUpdate::Unchanged;
		};
		if !url.starts_with("http://") && !url.starts_with("https://") {
			info!("remote dictionary url is not http(s), skipping: {url}");
			return RemoteUpdate::Unchanged;
		}
		match self.fetch_conditional(&url).await {
			Ok(update) => update,
			Err(err) => {
				error!("remote dictionary fetch failed: {err}");
				RemoteUpdate::Unchanged
			}
		}
	}

	async fn fetch_conditional(&mut self, url: &str) -> Result<RemoteUpdate, DictError> {
		let response = self.client.get(url).send().await?;
		let status = response.status();
		if !status.is_success() {
			return Err(DictError::Http { status });
		}

		let Some(header) = response.headers().get(LAST_MODIFIED) else {
			info!("remote dictionary response has no Last-Modified header");
			return Ok(RemoteUpdate::Unchanged);
		};

		// An unparseable date compares as different from anything recorded,
		// biasing toward a re-download rather than silent staleness.
		let remote_modified = header
			.to_str()
			.ok()
			.and_then(|value| DateTime::parse_from_rfc2822(value).ok())
			.map(|date| date.with_timezone(&Utc));

		if remote_modified.is_some() && remote_modified == self.last_modified {
			return Ok(RemoteUpdate::Unchanged);
		}

		let bytes = response.bytes().await?;
		self.last_modified = remote_modified;
		info!(
			"remote dictionary changed, downloaded {} bytes (Last-Modified: {:?})",
			bytes.len(),
			self.last_modified
		);
		Ok(RemoteUpdate::Changed(bytes.to_vec()))
	}
}
