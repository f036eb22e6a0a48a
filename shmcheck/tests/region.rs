//! Region mapper tests

// Imports
use {
	byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt},
	rand::Rng,
	shmcheck::{config, region, Mismatch, Region, RegionConfig, Status, Verdict},
	std::{
		fs,
		io::{Seek, SeekFrom},
		path::Path,
		process::Command,
	},
};

fn region_config(dir: &tempfile::TempDir) -> RegionConfig {
	RegionConfig {
		path: dir.path().join("shm"),
		size: config::REGION_SIZE,
	}
}

#[test]
fn every_word_round_trips() {
	let dir = tempfile::tempdir().expect("Unable to create temporary directory");
	let mut region = Region::create(&region_config(&dir)).expect("Unable to create region");
	region.zero();
	region.write_pattern();

	let view = region.view();
	assert_eq!(view.words(), 128);
	for idx in 0..view.words() {
		assert_eq!(view.read(idx), shmcheck::pattern::tagged(idx));
	}
}

#[test]
fn pattern_is_visible_in_backing_file() {
	let dir = tempfile::tempdir().expect("Unable to create temporary directory");
	let config = region_config(&dir);
	let mut region = Region::create(&config).expect("Unable to create region");
	region.zero();
	region.write_pattern();

	let mut file = fs::File::open(&config.path).expect("Unable to open backing file");
	file.seek(SeekFrom::Start(5 * 8)).expect("Unable to seek");
	let value = file.read_u64::<NativeEndian>().expect("Unable to read word");
	assert_eq!(value, 0xDEAD_BEEF_0000_0005);
}

#[test]
fn corrupted_word_is_detected() {
	let dir = tempfile::tempdir().expect("Unable to create temporary directory");
	let config = region_config(&dir);
	let mut region = Region::create(&config).expect("Unable to create region");
	region.zero();
	region.write_pattern();

	// Corrupt a word through the file, outside of the mapping
	let corrupt_idx = rand::thread_rng().gen_range(0..region.view().words());
	{
		let mut file = fs::OpenOptions::new()
			.write(true)
			.open(&config.path)
			.expect("Unable to open backing file");
		file.seek(SeekFrom::Start(corrupt_idx as u64 * 8))
			.expect("Unable to seek");
		file.write_u64::<NativeEndian>(0x0BAD_0BAD_0BAD_0BAD)
			.expect("Unable to write word");
	}

	assert_eq!(
		region.verify_pattern(),
		Verdict::Fail(Mismatch {
			index:    corrupt_idx,
			expected: shmcheck::pattern::tagged(corrupt_idx),
			actual:   0x0BAD_0BAD_0BAD_0BAD,
		})
	);
}

#[test]
fn first_of_several_corruptions_is_reported() {
	let dir = tempfile::tempdir().expect("Unable to create temporary directory");
	let mut region = Region::create(&region_config(&dir)).expect("Unable to create region");
	region.zero();
	region.write_pattern();

	region.view_mut().write(100, 0);
	region.view_mut().write(7, 0);

	match region.verify_pattern() {
		Verdict::Fail(mismatch) => assert_eq!(mismatch.index, 7),
		Verdict::Pass => panic!("Corruption wasn't detected"),
	}
}

#[test]
fn status_reports_each_step() {
	let dir = tempfile::tempdir().expect("Unable to create temporary directory");
	let mut status = Status::new(region::STATUS_TAG, vec![]);
	region::run(&region_config(&dir), &mut status).expect("Unable to run region mapper");

	let output = String::from_utf8(status.into_inner()).expect("Output wasn't utf-8");
	let lines = output.lines().collect::<Vec<_>>();
	assert!(lines.iter().all(|line| line.starts_with("[shm_rw_syscall] ")));
	assert!(lines.contains(&"[shm_rw_syscall] Writing test pattern..."));
	assert!(lines.contains(&"[shm_rw_syscall] Reading back and verifying..."));
	assert_eq!(lines.last(), Some(&"[shm_rw_syscall] PASS: all 1024 bytes match"));
}

#[test]
fn binary_passes_twice_and_cleans_up() {
	for _ in 0..2 {
		let output = Command::new(env!("CARGO_BIN_EXE_shm-rw"))
			.output()
			.expect("Unable to run shm-rw");

		let stdout = String::from_utf8_lossy(&output.stdout);
		assert!(output.status.success(), "shm-rw failed: {stdout}");
		assert_eq!(
			stdout.lines().last(),
			Some("[shm_rw_syscall] PASS: all 1024 bytes match")
		);
		assert!(!Path::new(config::REGION_PATH).exists());
	}
}
