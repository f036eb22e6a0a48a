//! Status output
//!
//! Line-oriented, human-readable status for the operator, each line tagged
//! with the program it comes from.

// Imports
use {
	anyhow::Context,
	std::{fmt, io},
};

/// Status writer
#[derive(Debug)]
pub struct Status<W> {
	/// Tag prefixed to every line
	tag: &'static str,

	/// Output
	out: W,
}

impl<W: io::Write> Status<W> {
	/// Creates a status writer
	pub fn new(tag: &'static str, out: W) -> Self {
		Self { tag, out }
	}

	/// Writes a status line
	pub fn line(&mut self, args: fmt::Arguments<'_>) -> Result<(), anyhow::Error> {
		writeln!(self.out, "[{}] {args}", self.tag).context("Unable to write status line")?;
		self.out.flush().context("Unable to flush status output")
	}

	/// Returns the output
	pub fn into_inner(self) -> W {
		self.out
	}
}
