//! Verification results

// Imports
use {shmcheck_util::Hex64, std::fmt};

/// Outcome of verifying a whole region
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Verdict {
	/// Every word matched
	Pass,

	/// The first mismatching word
	Fail(Mismatch),
}

impl Verdict {
	/// Returns if every word matched
	pub fn is_pass(&self) -> bool {
		matches!(self, Self::Pass)
	}
}

/// Mismatching word
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Mismatch {
	/// Word index
	pub index: usize,

	/// Expected value
	pub expected: u64,

	/// Value actually read
	pub actual: u64,
}

impl fmt::Display for Mismatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Mismatch at index {}: expected {}, got {}",
			self.index,
			Hex64(self.expected),
			Hex64(self.actual)
		)
	}
}

/// Write and read-back of a single word
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct WordCheck {
	/// Word index
	pub index: usize,

	/// Value written
	pub wrote: u64,

	/// Value read back
	pub read: u64,
}

impl WordCheck {
	/// Returns if the value read back is the one written
	pub fn passed(&self) -> bool {
		self.wrote == self.read
	}

	/// Returns the mismatch, if any
	pub fn mismatch(&self) -> Option<Mismatch> {
		(!self.passed()).then_some(Mismatch {
			index:    self.index,
			expected: self.wrote,
			actual:   self.read,
		})
	}
}
