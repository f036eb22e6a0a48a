//! Backing resources

// Imports
use {
	crate::view::RawView,
	anyhow::Context,
	memmap2::MmapOptions,
	std::{
		fs,
		io,
		os::unix::fs::OpenOptionsExt,
		path::{Path, PathBuf},
	},
};

/// Backing file.
///
/// Removed from the filesystem when dropped.
#[derive(Debug)]
pub struct BackingFile {
	/// File
	file: fs::File,

	/// Path
	path: PathBuf,
}

impl BackingFile {
	/// Opens the backing file at `path`, creating it if it doesn't exist
	pub fn create(path: &Path) -> Result<Self, anyhow::Error> {
		let file = fs::OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.mode(0o666)
			.open(path)
			.with_context(|| format!("Unable to open backing file {path:?}"))?;
		tracing::debug!(?path, "Opened backing file");

		Ok(Self {
			file,
			path: path.to_owned(),
		})
	}

	/// Sets the length of the backing file
	pub fn set_len(&self, len: u64) -> Result<(), anyhow::Error> {
		self.file
			.set_len(len)
			.with_context(|| format!("Unable to resize backing file {:?} to {len:#x} bytes", self.path))
	}

	/// Returns the file
	pub fn file(&self) -> &fs::File {
		&self.file
	}

	/// Returns the path
	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl Drop for BackingFile {
	fn drop(&mut self) {
		match fs::remove_file(&self.path) {
			Ok(()) => tracing::debug!(path = ?self.path, "Removed backing file"),
			Err(err) if err.kind() == io::ErrorKind::NotFound => (),
			Err(err) => tracing::warn!(path = ?self.path, ?err, "Unable to remove backing file"),
		}
	}
}

/// Opens a privileged memory device for synchronous read-write access
pub fn open_device(path: &Path) -> Result<fs::File, anyhow::Error> {
	fs::OpenOptions::new()
		.read(true)
		.write(true)
		.custom_flags(libc::O_SYNC)
		.open(path)
		.with_context(|| format!("Unable to open device {path:?}"))
}

/// Maps a shared read-write window of `len` bytes at `addr` within `file`.
///
/// The mapping itself starts at the page containing `addr`, the returned
/// view starts exactly at `addr`.
pub fn map_window(file: &fs::File, addr: u64, len: usize) -> Result<RawView, anyhow::Error> {
	let page_size = shmcheck_util::page_size().context("Unable to get page size")?;
	let aligned_addr = addr & !(page_size - 1);
	let page_offset = usize::try_from(addr - aligned_addr).context("Page offset didn't fit")?;
	let map_len = len.checked_add(page_offset).context("Mapping length overflowed")?;
	tracing::trace!(addr, aligned_addr, page_offset, map_len, "Mapping window");

	// SAFETY: The mapping is only accessed through `RawView`, with volatile accesses,
	//         so changes made through other mappings of the same file are never assumed
	//         away. Accesses past the end of `file` are the caller's responsibility to size.
	let map = unsafe { MmapOptions::new().offset(aligned_addr).len(map_len).map_mut(file) }
		.with_context(|| format!("Unable to map {map_len:#x} bytes at {aligned_addr:#x}"))?;

	RawView::new(map, page_offset, len).context("Unable to create view over mapping")
}
