//! Fixed physical address check (`shm-rw-fixed-addr`)
//!
//! Exits with `0` only if both the single-word check and the sweep passed, `1` otherwise.

// Modules
mod args;

// Imports
use {
	self::args::Args,
	clap::Parser,
	shmcheck::{fixed_addr, FixedAddrConfig, Status},
	shmcheck_util::logger,
	std::{io, process::ExitCode},
};

fn main() -> ExitCode {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	let config = FixedAddrConfig::default();
	tracing::debug!(?config, "Running fixed-address mapper");

	let mut status = Status::new(fixed_addr::STATUS_TAG, io::stdout().lock());
	match fixed_addr::run(&config, &mut status) {
		Ok(outcome) if outcome.passed() => ExitCode::SUCCESS,
		Ok(outcome) => {
			tracing::debug!(?outcome, "Fixed-address verification failed");
			ExitCode::FAILURE
		},
		Err(err) => {
			tracing::error!("{err:?}");
			ExitCode::FAILURE
		},
	}
}
