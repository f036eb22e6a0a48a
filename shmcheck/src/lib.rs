//! Shared memory mapping checks (`shmcheck`)
//!
//! Two single-shot checks of memory-mapping behavior:
//! - [`region`]: maps a file-backed shared region, writes a pattern over it and verifies it.
//! - [`fixed_addr`]: maps a fixed physical address (or a file simulating it), checks
//!   reads and writes are reflected and restores what was there.

// Modules
pub mod backing;
pub mod config;
pub mod fixed_addr;
pub mod pattern;
pub mod region;
pub mod status;
pub mod verdict;
pub mod view;

// Exports
pub use self::{
	backing::BackingFile,
	config::{FixedAddrConfig, RegionConfig},
	fixed_addr::{FixedMapping, MappingSource},
	region::Region,
	status::Status,
	verdict::{Mismatch, Verdict, WordCheck},
	view::RawView,
};
