//! Test pattern

/// Tag shared by every pattern word.
///
/// The low 32 bits are clear, so tagged words are distinct for any index below `2^32`.
pub const TAG: u64 = 0xDEAD_BEEF_0000_0000;

/// Returns the expected pattern word for word index `idx`
pub const fn tagged(idx: usize) -> u64 {
	TAG | idx as u64
}
