//! Author-only mutation rules shared by posts and comments.

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{self, ErrorShape};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("not enough permission to {action} {kind}")]
	NotAuthor {
		kind: &'static str,
		action: &'static str,
	},
	#[error("can't edit {kind} after {}", format_window(.window))]
	EditWindowExpired {
		kind: &'static str,
		window: Duration,
	},
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		StatusCode::FORBIDDEN
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::NotAuthor { kind, action } => error::Message::new("not_author")
				.detail("kind", kind)
				.detail("action", action)
				.into_vec(),
			Self::EditWindowExpired { kind, window } => error::Message::new("edit_window_expired")
				.detail("kind", kind)
				.detail("window_seconds", window.num_seconds())
				.into_vec(),
		}
	}
}

/// Formats a window the way people say it, e.g. `24 hours` or `90 minutes`.
fn format_window(window: &Duration) -> String {
	let plural = |n: i64, unit: &str| {
		if n == 1 {
			format!("{n} {unit}")
		} else {
			format!("{n} {unit}s")
		}
	};

	if window.num_seconds() % 3600 == 0 {
		plural(window.num_hours(), "hour")
	} else if window.num_seconds() % 60 == 0 {
		plural(window.num_minutes(), "minute")
	} else {
		plural(window.num_seconds(), "second")
	}
}

pub fn ensure_author(
	kind: &'static str,
	action: &'static str,
	requester: Uuid,
	author: Uuid,
) -> Result<(), Error> {
	if requester != author {
		return Err(Error::NotAuthor { kind, action });
	}

	Ok(())
}

/// Edits are allowed up to and including `created_at + window`.
pub fn ensure_editable(
	kind: &'static str,
	created_at: DateTime<Utc>,
	now: DateTime<Utc>,
	window: Duration,
) -> Result<(), Error> {
	if created_at + window < now {
		return Err(Error::EditWindowExpired { kind, window });
	}

	Ok(())
}
