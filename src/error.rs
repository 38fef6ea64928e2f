use std::path::PathBuf;

use thiserror::Error;

/// Recoverable failures of the dictionary engine.
///
/// Every variant is caught and logged at the boundary where it occurs; none
/// abort the reload scheduler or invalidate an already published snapshot.
/// Malformed dictionary lines are not an error value at all — they are
/// skipped line by line during parsing.
#[derive(Debug, Error)]
pub enum DictError {
	#[error("main dictionary resource is missing")]
	ResourceMissing,

	#[error("could not read user dictionary {}", path.display())]
	FileUnreadable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("remote dictionary request failed")]
	Network(#[from] reqwest::Error),

	#[error("remote dictionary endpoint returned {status}")]
	Http { status: reqwest::StatusCode },

	#[error(transparent)]
	Io(#[from] std::io::Error),
}
