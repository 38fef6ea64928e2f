use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::DEFAULT_POLL_PERIOD;
use crate::reload::ReloadCoordinator;
use crate::remote::{RemoteFetcher, RemoteUpdate};

/// Handle to the background fetch-and-reload task.
///
/// [`stop`](Self::stop) (or dropping the handle) prevents future ticks; a
/// cycle already in flight runs to completion, since the stop signal is
/// only observed between cycles.
#[derive(Debug)]
pub struct SchedulerHandle {
	shutdown: watch::Sender<bool>,
	task: JoinHandle<()>,
}

impl SchedulerHandle {
	/// Signals the scheduler to stop after any in-flight cycle.
	pub fn stop(&self) {
		let _ = self.shutdown.send(true);
	}

	/// Stops the scheduler and waits for the task to finish.
	pub async fn stopped(self) {
		self.stop();
		let _ = self.task.await;
	}
}

/// Spawns the single-worker fixed-rate driver on the current runtime: each
/// tick fetches the remote dictionary, then runs one reload cycle. Ticks
/// fire `period` apart measured from the previous tick's scheduled time; a
/// cycle that overruns queues the next tick behind it rather than running
/// it concurrently.
pub(crate) fn spawn(
	coordinator: Arc<ReloadCoordinator>,
	mut fetcher: RemoteFetcher,
	initial_delay: Duration,
	period: Duration,
) -> SchedulerHandle {
	let period = if period.is_zero() {
		DEFAULT_POLL_PERIOD
	} else {
		period
	};
	let (shutdown, mut stopped) = watch::channel(false);

	let task = tokio::spawn(async move {
		let mut ticker = time::interval_at(Instant::now() + initial_delay, period);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
		info!(
			"dictionary reload scheduler started, period {}ms",
			period.as_millis()
		);
		loop {
			tokio::select! {
				_ = ticker.tick() => {}
				_ = stopped.changed() => break,
			}

			let (remote_changed, remote_bytes) = match fetcher.fetch().await {
				RemoteUpdate::Changed(bytes) => (true, Some(bytes)),
				RemoteUpdate::Unchanged => (false, None),
			};

			// Reload is file-bound work; keep it off the async workers.
			let coordinator = Arc::clone(&coordinator);
			let cycle = tokio::task::spawn_blocking(move || {
				coordinator.reload(remote_changed, remote_bytes)
			});
			match cycle.await {
				Ok(published) => debug!("reload cycle finished, published: {published}"),
				Err(err) => error!("reload cycle panicked: {err}"),
			}
		}
		info!("dictionary reload scheduler stopped");
	});

	SchedulerHandle { shutdown, task }
}
