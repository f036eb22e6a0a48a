//! Shared memory region check (`shm-rw`)
//!
//! Exits with `0` if every word of the region read back as written, `1` otherwise.

// Modules
mod args;

// Imports
use {
	self::args::Args,
	clap::Parser,
	shmcheck::{region, RegionConfig, Status},
	shmcheck_util::logger,
	std::{io, process::ExitCode},
};

fn main() -> ExitCode {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	let config = RegionConfig::default();
	tracing::debug!(?config, "Running region mapper");

	let mut status = Status::new(region::STATUS_TAG, io::stdout().lock());
	match region::run(&config, &mut status) {
		Ok(verdict) if verdict.is_pass() => ExitCode::SUCCESS,
		Ok(verdict) => {
			tracing::debug!(?verdict, "Region verification failed");
			ExitCode::FAILURE
		},
		Err(err) => {
			tracing::error!("{err:?}");
			let _ = status.line(format_args!("ERROR: Failed to set up shared memory region"));
			ExitCode::FAILURE
		},
	}
}
