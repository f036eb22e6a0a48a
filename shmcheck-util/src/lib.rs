//! Utilities

// Modules
pub mod logger;

// Imports
use std::{fmt, io};

/// Returns the system page size, in bytes
pub fn page_size() -> Result<u64, io::Error> {
	// SAFETY: `sysconf` has no preconditions
	let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
	match page_size {
		1.. => Ok(page_size as u64),
		_ => Err(io::Error::last_os_error()),
	}
}

/// Displays a `u64` as a zero-padded, upper-case hexadecimal word (`0x0123456789ABCDEF`)
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Hex64(pub u64);

impl fmt::Display for Hex64 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{:016X}", self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn page_size_is_power_of_two() {
		let page_size = page_size().expect("Unable to get page size");
		assert!(page_size.is_power_of_two());
		assert!(page_size >= 4096);
	}

	#[test]
	fn hex64_pads_to_a_full_word() {
		assert_eq!(Hex64(0xDEAD_BEEF_0000_0005).to_string(), "0xDEADBEEF00000005");
		assert_eq!(Hex64(0x10).to_string(), "0x0000000000000010");
	}
}
