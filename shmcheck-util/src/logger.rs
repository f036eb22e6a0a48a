//! Logger

// Imports
use {
	std::{fs, io, path::Path, sync::Mutex},
	tracing::metadata::LevelFilter,
	tracing_subscriber::{fmt, prelude::*, EnvFilter},
};

/// Initializes the logger.
///
/// Logs to stderr, filtered by `RUST_LOG` (`info` by default).
/// If `log_file` is set, additionally logs to it, filtered by `RUST_LOG_FILE` (`debug` by default).
///
/// Any messages emitted through [`pre_init`] are logged right after.
///
/// # Panics
/// Panics if a global subscriber was already set.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	let term_layer = fmt::layer()
		.with_writer(io::stderr)
		.with_filter(self::env_filter("RUST_LOG", LevelFilter::INFO));

	// Note: If we can't open the log file, we still want to log to stderr,
	//       so just report it once we're initialized.
	let mut log_file_err = None;
	let file_layer = log_file.and_then(|path| match self::open_log_file(path, log_file_append) {
		Ok(file) => Some(
			fmt::layer()
				.with_ansi(false)
				.with_writer(Mutex::new(file))
				.with_filter(self::env_filter("RUST_LOG_FILE", LevelFilter::DEBUG)),
		),
		Err(err) => {
			log_file_err = Some((path.to_owned(), err));
			None
		},
	});

	tracing_subscriber::registry().with(term_layer).with(file_layer).init();

	if let Some((path, err)) = log_file_err {
		tracing::warn!(?path, ?err, "Unable to open log file");
	}
	pre_init::flush();
}

/// Creates an env filter from `var`, defaulting to `default`
fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
	EnvFilter::builder()
		.with_default_directive(default.into())
		.with_env_var(var)
		.from_env_lossy()
}

/// Opens the log file
fn open_log_file(path: &Path, append: bool) -> Result<fs::File, io::Error> {
	fs::OpenOptions::new()
		.create(true)
		.write(true)
		.append(append)
		.truncate(!append)
		.open(path)
}

/// Logging before the logger is initialized.
///
/// Messages are buffered and logged once [`init`] is called.
pub mod pre_init {
	// Imports
	use std::sync::{Mutex, PoisonError};

	/// Buffered debug messages
	static MESSAGES: Mutex<Vec<String>> = Mutex::new(Vec::new());

	/// Buffers a debug message
	pub fn debug(msg: impl Into<String>) {
		MESSAGES
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(msg.into());
	}

	/// Logs all buffered messages
	pub(super) fn flush() {
		let messages = std::mem::take(&mut *MESSAGES.lock().unwrap_or_else(PoisonError::into_inner));
		for msg in messages {
			tracing::debug!("{msg}");
		}
	}
}
