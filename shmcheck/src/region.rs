//! Region mapper
//!
//! Maps a file-backed shared region, writes [`pattern::tagged`] over every
//! word of it and verifies every word reads back.

// Imports
use {
	crate::{
		backing::{self, BackingFile},
		config::RegionConfig,
		pattern,
		status::Status,
		verdict::{Mismatch, Verdict},
		view::{self, RawView},
	},
	anyhow::Context,
	std::{io, path::Path},
};

/// Tag of the region mapper's status lines
pub const STATUS_TAG: &str = "shm_rw_syscall";

/// Mapped region
#[derive(Debug)]
pub struct Region {
	/// View over the whole region
	// Note: Declared before `backing` so we unmap before closing and removing the file.
	view: RawView,

	/// Backing file
	backing: BackingFile,
}

impl Region {
	/// Creates the backing file, sizes it and maps it
	pub fn create(config: &RegionConfig) -> Result<Self, anyhow::Error> {
		config.validate().context("Invalid region configuration")?;

		let backing = BackingFile::create(&config.path)?;
		backing.set_len(config.size as u64)?;
		let view = backing::map_window(backing.file(), 0, config.size).context("Unable to map backing file")?;
		tracing::debug!(path = ?config.path, size = config.size, ptr = ?view.as_ptr(), "Mapped region");

		Ok(Self { view, backing })
	}

	/// Returns the view over the region
	pub fn view(&self) -> &RawView {
		&self.view
	}

	/// Returns the view over the region, mutably
	pub fn view_mut(&mut self) -> &mut RawView {
		&mut self.view
	}

	/// Returns the backing file's path
	pub fn path(&self) -> &Path {
		self.backing.path()
	}

	/// Zeroes the region
	pub fn zero(&mut self) {
		self.view.zero();
	}

	/// Writes the pattern over every word, then fences
	pub fn write_pattern(&mut self) {
		for idx in 0..self.view.words() {
			self.view.write(idx, pattern::tagged(idx));
		}
		view::fence();
	}

	/// Fences, then reads every word back in order, stopping at the first mismatch
	pub fn verify_pattern(&self) -> Verdict {
		view::fence();
		let mismatch = (0..self.view.words()).find_map(|idx| {
			let expected = pattern::tagged(idx);
			let actual = self.view.read(idx);
			(actual != expected).then_some(Mismatch {
				index: idx,
				expected,
				actual,
			})
		});

		match mismatch {
			Some(mismatch) => Verdict::Fail(mismatch),
			None => Verdict::Pass,
		}
	}
}

/// Runs the region mapper
///
/// The backing file is removed before returning, on every path.
pub fn run<W: io::Write>(config: &RegionConfig, status: &mut Status<W>) -> Result<Verdict, anyhow::Error> {
	status.line(format_args!(
		"Creating shared memory region using file-based approach..."
	))?;
	let mut region = Region::create(config).context("Unable to create shared memory region")?;
	status.line(format_args!(
		"Successfully mapped shared memory to virtual address {:p}",
		region.view().as_ptr()
	))?;

	status.line(format_args!("Initializing memory with test pattern..."))?;
	region.zero();

	status.line(format_args!("Writing test pattern..."))?;
	region.write_pattern();

	status.line(format_args!("Reading back and verifying..."))?;
	let verdict = region.verify_pattern();
	match verdict {
		Verdict::Pass => status.line(format_args!("PASS: all {} bytes match", region.view().byte_len()))?,
		Verdict::Fail(mismatch) => {
			status.line(format_args!("{mismatch}"))?;
			status.line(format_args!("FAIL: data mismatch"))?;
		},
	}

	drop(region);
	tracing::debug!(path = ?config.path, "Cleaned up region");

	Ok(verdict)
}

#[cfg(test)]
mod tests {
	use {super::*, std::path::PathBuf};

	fn config(dir: &tempfile::TempDir) -> RegionConfig {
		RegionConfig {
			path: dir.path().join("shm"),
			size: 1024,
		}
	}

	#[test]
	fn pattern_round_trips() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let mut region = Region::create(&config(&dir)).expect("Unable to create region");
		assert_eq!(region.view().words(), 128);

		region.zero();
		region.write_pattern();
		assert_eq!(region.verify_pattern(), Verdict::Pass);
		assert_eq!(region.view().read(5), 0xDEAD_BEEF_0000_0005);
	}

	#[test]
	fn zeroed_region_fails_at_first_word() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let mut region = Region::create(&config(&dir)).expect("Unable to create region");
		region.zero();

		assert_eq!(
			region.verify_pattern(),
			Verdict::Fail(Mismatch {
				index:    0,
				expected: 0xDEAD_BEEF_0000_0000,
				actual:   0,
			})
		);
	}

	#[test]
	fn run_passes_and_cleans_up() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let config = config(&dir);

		let mut status = Status::new(STATUS_TAG, vec![]);
		let verdict = run(&config, &mut status).expect("Unable to run region mapper");
		assert_eq!(verdict, Verdict::Pass);
		assert!(!config.path.exists());

		let output = String::from_utf8(status.into_inner()).expect("Output wasn't utf-8");
		assert_eq!(
			output.lines().last(),
			Some("[shm_rw_syscall] PASS: all 1024 bytes match")
		);
	}

	#[test]
	fn run_reuses_a_stale_backing_file() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let config = config(&dir);
		std::fs::write(&config.path, vec![0xff; 4096]).expect("Unable to write stale file");

		let mut status = Status::new(STATUS_TAG, vec![]);
		let verdict = run(&config, &mut status).expect("Unable to run region mapper");
		assert_eq!(verdict, Verdict::Pass);
		assert!(!config.path.exists());
	}

	#[test]
	fn run_rejects_partial_words() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let config = RegionConfig {
			size: 1001,
			..config(&dir)
		};

		let mut status = Status::new(STATUS_TAG, vec![]);
		assert!(run(&config, &mut status).is_err());
		assert!(!config.path.exists());
	}

	#[test]
	fn run_fails_on_unopenable_path() {
		let config = RegionConfig {
			path: PathBuf::from("/nonexistent-shmcheck-dir/shm"),
			size: 1024,
		};

		let mut status = Status::new(STATUS_TAG, vec![]);
		let err = run(&config, &mut status).expect_err("Created region in missing directory");
		assert!(format!("{err:?}").contains("Unable to open backing file"));
	}
}
