//! Fixed-address mapper
//!
//! Maps a fixed physical address through the privileged memory device, falling
//! back to a file simulating physical memory, then checks a single word and a
//! small sweep of words there. Every word touched is restored afterwards.

// Imports
use {
	crate::{
		backing::{self, BackingFile},
		config::FixedAddrConfig,
		pattern,
		status::Status,
		verdict::WordCheck,
		view::{self, RawView},
	},
	anyhow::Context,
	shmcheck_util::Hex64,
	std::{fmt, fs, io},
};

/// Tag of the fixed-address mapper's status lines
pub const STATUS_TAG: &str = "shm_rw_fixed_addr";

/// Resource backing the mapping
#[derive(Debug)]
pub enum MappingSource {
	/// Privileged physical memory device
	Privileged {
		/// Device handle
		device: fs::File,
	},

	/// File simulating physical memory, removed when dropped
	Simulated {
		/// Simulation file
		backing: BackingFile,
	},
}

impl MappingSource {
	/// Returns if this is the privileged device
	pub fn is_privileged(&self) -> bool {
		matches!(self, Self::Privileged { .. })
	}
}

impl fmt::Display for MappingSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Privileged { .. } => write!(f, "direct mapping"),
			Self::Simulated { backing } => write!(f, "simulation file {:?}", backing.path()),
		}
	}
}

/// Mapping of the target address
#[derive(Debug)]
pub struct FixedMapping {
	/// View starting exactly at the target address
	// Note: Declared before `source` so we unmap before closing the source.
	view: RawView,

	/// Source
	source: MappingSource,

	/// Target address
	target_addr: u64,
}

impl FixedMapping {
	/// Returns the view, starting at the target address
	pub fn view(&self) -> &RawView {
		&self.view
	}

	/// Returns the view, starting at the target address, mutably
	pub fn view_mut(&mut self) -> &mut RawView {
		&mut self.view
	}

	/// Returns the source
	pub fn source(&self) -> &MappingSource {
		&self.source
	}

	/// Returns the target address
	pub fn target_addr(&self) -> u64 {
		self.target_addr
	}
}

/// Maps the target address.
///
/// Tries the privileged device first. If it can't be opened or mapped,
/// falls back to mapping the simulation file at the target address as an offset.
/// Failures on the fallback path are returned.
pub fn establish<W: io::Write>(config: &FixedAddrConfig, status: &mut Status<W>) -> Result<FixedMapping, anyhow::Error> {
	config.validate().context("Invalid fixed-address configuration")?;

	match self::map_privileged(config, status)? {
		Some((device, view)) => Ok(FixedMapping {
			view,
			source: MappingSource::Privileged { device },
			target_addr: config.target_addr,
		}),
		None => {
			status.line(format_args!("Using file-based approach"))?;
			let (backing, view) = self::map_simulated(config)?;
			Ok(FixedMapping {
				view,
				source: MappingSource::Simulated { backing },
				target_addr: config.target_addr,
			})
		},
	}
}

/// Tries to map the target address through the privileged device.
///
/// Returns `None` if the device couldn't be opened or mapped.
fn map_privileged<W: io::Write>(
	config: &FixedAddrConfig,
	status: &mut Status<W>,
) -> Result<Option<(fs::File, RawView)>, anyhow::Error> {
	let device_path = &config.device_path;
	let device = match backing::open_device(device_path) {
		Ok(device) => device,
		Err(err) => {
			tracing::warn!(?device_path, ?err, "Unable to open device, falling back to simulation file");
			status.line(format_args!(
				"{} not available ({}), using file-based approach",
				device_path.display(),
				err.root_cause()
			))?;
			return Ok(None);
		},
	};
	status.line(format_args!(
		"{} opened successfully, attempting direct mapping",
		device_path.display()
	))?;

	match backing::map_window(&device, config.target_addr, config.window_size) {
		Ok(view) => {
			let page_size = shmcheck_util::page_size().context("Unable to get page size")?;
			status.line(format_args!(
				"Successfully mapped {} at aligned address {:#X}",
				device_path.display(),
				config.target_addr & !(page_size - 1)
			))?;
			Ok(Some((device, view)))
		},
		Err(err) => {
			tracing::warn!(?device_path, ?err, "Unable to map device, falling back to simulation file");
			status.line(format_args!(
				"{} mmap failed: {}, falling back to file-based approach",
				device_path.display(),
				err.root_cause()
			))?;
			Ok(None)
		},
	}
}

/// Maps the target address as an offset into the simulation file
fn map_simulated(config: &FixedAddrConfig) -> Result<(BackingFile, RawView), anyhow::Error> {
	let backing = BackingFile::create(&config.sim_path).context("Unable to create simulation file")?;

	// Note: `validate` ensures this doesn't overflow.
	let sim_len = config.target_addr + config.window_size as u64;
	backing.set_len(sim_len).context("Unable to size simulation file")?;

	let view = backing::map_window(backing.file(), config.target_addr, config.window_size)
		.context("Unable to map simulation file")?;
	tracing::debug!(path = ?config.sim_path, sim_len, "Mapped simulation file");

	Ok((backing, view))
}

/// Outcome of the fixed-address checks
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Outcome {
	/// Values found before the first write, by word index
	pub originals: Vec<u64>,

	/// Single-word check
	pub single: WordCheck,

	/// Sweep checks, by word index
	pub sweep: Vec<WordCheck>,
}

impl Outcome {
	/// Returns if every location in the sweep passed
	pub fn sweep_passed(&self) -> bool {
		self.sweep.iter().all(WordCheck::passed)
	}

	/// Returns if both the single-word check and the sweep passed
	pub fn passed(&self) -> bool {
		self.single.passed() && self.sweep_passed()
	}
}

/// Runs the checks on a mapped view.
///
/// Every word touched is restored to its original value afterwards, regardless of the outcome.
pub fn exercise<W: io::Write>(
	view: &mut RawView,
	config: &FixedAddrConfig,
	status: &mut Status<W>,
) -> Result<Outcome, anyhow::Error> {
	config.validate().context("Invalid fixed-address configuration")?;
	anyhow::ensure!(
		config.sweep_words <= view.words(),
		"Sweep of {} words doesn't fit in view of {} words",
		config.sweep_words,
		view.words()
	);
	status.line(format_args!("Running simple test..."))?;

	// Note: The sweep covers the single-word check's word too, so these are all words we write.
	view::fence();
	let originals = (0..config.sweep_words).map(|idx| view.read(idx)).collect::<Vec<_>>();

	let res = self::check(view, config, &originals, status);

	// Then restore what was there, even if we failed midway
	let restore_res = status.line(format_args!("Restoring original values"));
	view::fence();
	for (idx, &value) in originals.iter().enumerate().rev() {
		view.write(idx, value);
	}
	view::fence();
	tracing::debug!(?originals, "Restored original values");

	let (single, sweep) = res?;
	restore_res?;

	Ok(Outcome {
		originals,
		single,
		sweep,
	})
}

/// Runs the single-word check and the sweep
fn check<W: io::Write>(
	view: &mut RawView,
	config: &FixedAddrConfig,
	originals: &[u64],
	status: &mut Status<W>,
) -> Result<(WordCheck, Vec<WordCheck>), anyhow::Error> {
	status.line(format_args!(
		"Original value at {:#X}: {}",
		config.target_addr,
		Hex64(originals[0])
	))?;

	// Single word
	status.line(format_args!("Writing test value {}", Hex64(config.test_value)))?;
	view::fence();
	view.write(0, config.test_value);
	view::fence();

	view::fence();
	let single = WordCheck {
		index: 0,
		wrote: config.test_value,
		read:  view.read(0),
	};
	status.line(format_args!("Read back value: {}", Hex64(single.read)))?;
	match single.passed() {
		true => status.line(format_args!("PASS: Read back matches written value"))?,
		false => status.line(format_args!("FAIL: Read back does not match written value"))?,
	}

	// Sweep
	status.line(format_args!("Testing multiple memory locations..."))?;
	let mut sweep = Vec::with_capacity(config.sweep_words);
	for idx in 0..config.sweep_words {
		let value = pattern::tagged(idx);
		view.write(idx, value);
		view::fence();

		view::fence();
		let location = WordCheck {
			index: idx,
			wrote: value,
			read:  view.read(idx),
		};
		status.line(format_args!(
			"Location [{idx}]: wrote {}, read {}",
			Hex64(location.wrote),
			Hex64(location.read)
		))?;
		if !location.passed() {
			status.line(format_args!("FAIL at offset {idx}: mismatch detected"))?;
		}

		sweep.push(location);
	}

	match sweep.iter().all(WordCheck::passed) {
		true => status.line(format_args!("PASS: All test locations match"))?,
		false => status.line(format_args!("FAIL: Some locations had mismatches"))?,
	}

	Ok((single, sweep))
}

/// Runs the fixed-address mapper.
///
/// The mapping is torn down and any simulation file removed before returning.
pub fn run<W: io::Write>(config: &FixedAddrConfig, status: &mut Status<W>) -> Result<Outcome, anyhow::Error> {
	status.line(format_args!(
		"Accessing fixed physical address {:#X}",
		config.target_addr
	))?;

	let mut mapping = self::establish(config, status).context("Unable to map target address")?;
	tracing::debug!(source = %mapping.source(), ptr = ?mapping.view().as_ptr(), "Mapped target address");
	status.line(format_args!(
		"Successfully mapped address {:#X} to virtual address {:p} ({})",
		mapping.target_addr(),
		mapping.view().as_ptr(),
		mapping.source()
	))?;

	let outcome = self::exercise(mapping.view_mut(), config, status)?;

	drop(mapping);
	status.line(format_args!(
		"Test completed: {}",
		match outcome.passed() {
			true => "PASS",
			false => "FAIL",
		}
	))?;

	Ok(outcome)
}
