//! Configuration
//!
//! The binaries always run with the defaults here. The paths and sizes are
//! only ever changed by tests.

// Imports
use {
	crate::view::WORD_SIZE,
	std::path::PathBuf,
};

/// Backing file of the region mapper
pub const REGION_PATH: &str = "/tmp/simbricks_shm_test";

/// Size of the region mapper's region, in bytes
pub const REGION_SIZE: usize = 1024;

/// Privileged physical memory device
pub const DEVICE_PATH: &str = "/dev/mem";

/// File used to simulate physical memory when the device is unavailable
pub const SIM_PATH: &str = "/tmp/fixed_addr_mem";

/// Physical address checked by the fixed-address mapper.
///
/// Lies at 2GiB, above the main memory of the simulated hosts.
pub const FIXED_PHYS_ADDR: u64 = 0x8000_0000;

/// Size of the window mapped at [`FIXED_PHYS_ADDR`], in bytes
pub const MAP_SIZE: usize = 4096;

/// Value written for the single-word check
pub const TEST_VALUE: u64 = 0xDEAD_BEEF_CAFE_BABE;

/// Number of words covered by the multi-location sweep
pub const SWEEP_WORDS: usize = 4;

/// Region mapper configuration
#[derive(Clone, Debug)]
pub struct RegionConfig {
	/// Backing file path
	pub path: PathBuf,

	/// Region size, in bytes
	pub size: usize,
}

impl RegionConfig {
	/// Checks that the region is a non-empty whole number of words
	pub fn validate(&self) -> Result<(), anyhow::Error> {
		anyhow::ensure!(self.size != 0, "Region size must not be zero");
		anyhow::ensure!(
			self.size % WORD_SIZE == 0,
			"Region size {} is not a multiple of the word size ({WORD_SIZE})",
			self.size
		);

		Ok(())
	}
}

impl Default for RegionConfig {
	fn default() -> Self {
		Self {
			path: PathBuf::from(REGION_PATH),
			size: REGION_SIZE,
		}
	}
}

/// Fixed-address mapper configuration
#[derive(Clone, Debug)]
pub struct FixedAddrConfig {
	/// Privileged device path
	pub device_path: PathBuf,

	/// Simulation file path
	pub sim_path: PathBuf,

	/// Target address (physical address, or offset into the simulation file)
	pub target_addr: u64,

	/// Window size, in bytes
	pub window_size: usize,

	/// Value for the single-word check
	pub test_value: u64,

	/// Words covered by the sweep
	pub sweep_words: usize,
}

impl FixedAddrConfig {
	/// Checks the target is word-aligned and the sweep fits in the window
	pub fn validate(&self) -> Result<(), anyhow::Error> {
		anyhow::ensure!(
			self.target_addr % WORD_SIZE as u64 == 0,
			"Target address {:#x} is not word-aligned",
			self.target_addr
		);
		anyhow::ensure!(
			self.window_size != 0 && self.window_size % WORD_SIZE == 0,
			"Window size {} is not a non-zero multiple of the word size ({WORD_SIZE})",
			self.window_size
		);
		anyhow::ensure!(self.sweep_words != 0, "Sweep must cover at least one word");
		anyhow::ensure!(
			u32::try_from(self.sweep_words).is_ok(),
			"Sweep of {} words would overflow the pattern index",
			self.sweep_words
		);
		anyhow::ensure!(
			self.sweep_words <= self.window_size / WORD_SIZE,
			"Sweep of {} words doesn't fit in a {} byte window",
			self.sweep_words,
			self.window_size
		);
		anyhow::ensure!(
			self.target_addr.checked_add(self.window_size as u64).is_some(),
			"Window at {:#x} overflows the address space",
			self.target_addr
		);

		Ok(())
	}
}

impl Default for FixedAddrConfig {
	fn default() -> Self {
		Self {
			device_path: PathBuf::from(DEVICE_PATH),
			sim_path:    PathBuf::from(SIM_PATH),
			target_addr: FIXED_PHYS_ADDR,
			window_size: MAP_SIZE,
			test_value:  TEST_VALUE,
			sweep_words: SWEEP_WORDS,
		}
	}
}
