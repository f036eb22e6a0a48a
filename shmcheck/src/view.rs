//! Raw memory view

// Imports
use {
	anyhow::Context,
	memmap2::MmapMut,
	std::{
		mem,
		ptr,
		sync::atomic::{self, Ordering},
	},
};

/// Size of the words the view is accessed in
pub const WORD_SIZE: usize = mem::size_of::<u64>();

/// Issues a full memory fence.
///
/// Neither the compiler nor the cpu may move memory accesses across it.
pub fn fence() {
	atomic::fence(Ordering::SeqCst);
}

/// Raw view over a mapped region.
///
/// Owns the mapping, which is unmapped when dropped.
/// All accesses are volatile word accesses, so none are elided, merged or cached.
#[derive(Debug)]
pub struct RawView {
	/// Mapping
	map: MmapMut,

	/// Offset of the first word within the mapping, in bytes
	offset: usize,

	/// Length of the view, in bytes
	len: usize,
}

impl RawView {
	/// Creates a view over `len` bytes of `map`, starting at byte `offset`.
	///
	/// # Errors
	/// Returns an error if the start isn't word-aligned, if `len` isn't a
	/// non-zero multiple of the word size or if the range exceeds the mapping.
	pub fn new(map: MmapMut, offset: usize, len: usize) -> Result<Self, anyhow::Error> {
		anyhow::ensure!(
			len != 0 && len % WORD_SIZE == 0,
			"View length {len} is not a non-zero multiple of the word size ({WORD_SIZE})"
		);

		let end = offset.checked_add(len).context("View range overflowed")?;
		anyhow::ensure!(
			end <= map.len(),
			"View range {offset:#x}..{end:#x} exceeds mapping of {:#x} bytes",
			map.len()
		);

		let start_addr = map.as_ptr() as usize + offset;
		anyhow::ensure!(
			start_addr % mem::align_of::<u64>() == 0,
			"View start {start_addr:#x} is not word-aligned"
		);

		Ok(Self { map, offset, len })
	}

	/// Returns the number of words in this view
	pub fn words(&self) -> usize {
		self.len / WORD_SIZE
	}

	/// Returns the length of this view, in bytes
	pub fn byte_len(&self) -> usize {
		self.len
	}

	/// Returns the virtual address of the first word
	pub fn as_ptr(&self) -> *const u64 {
		self.map[self.offset..].as_ptr().cast()
	}

	/// Reads word `idx`.
	///
	/// # Panics
	/// Panics if `idx` is out of bounds.
	pub fn read(&self, idx: usize) -> u64 {
		self.assert_in_bounds(idx);

		// SAFETY: `idx` is within the view, which lies within the mapping and is word-aligned.
		unsafe { ptr::read_volatile(self.as_ptr().add(idx)) }
	}

	/// Writes `value` to word `idx`.
	///
	/// # Panics
	/// Panics if `idx` is out of bounds.
	pub fn write(&mut self, idx: usize, value: u64) {
		self.assert_in_bounds(idx);

		// SAFETY: `idx` is within the view, which lies within the mapping and is word-aligned.
		unsafe {
			let start = self.map[self.offset..].as_mut_ptr().cast::<u64>();
			ptr::write_volatile(start.add(idx), value);
		}
	}

	/// Zeroes every word
	pub fn zero(&mut self) {
		for idx in 0..self.words() {
			self.write(idx, 0);
		}
	}

	fn assert_in_bounds(&self, idx: usize) {
		assert!(
			idx < self.words(),
			"Word index {idx} out of bounds for view of {} words",
			self.words()
		);
	}
}
