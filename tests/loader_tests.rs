//! Firmware Loader Tests
//!
//! Chunking of firmware images into HOST_LOAD frames.
//! Run with: cargo test --features mock --test loader_tests

use si46xx::config::{HOST_LOAD_CHUNK_SIZE, LOAD_FINISH_DELAY_MS};
use si46xx::drivers::loader::{FirmwareArtifact, FirmwareDir, FirmwareStore};
use si46xx::error::{Error, ImageError};
use si46xx::mock::{BusEvent, MockTransport};
use si46xx::{MemoryFirmware, Si46xx};

const LOAD_INIT: u8 = 0x06;
const HOST_LOAD: u8 = 0x04;

fn radio() -> Si46xx<MockTransport> {
    Si46xx::new(MockTransport::new())
}

fn image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

// ============================================================================
// Chunking Tests
// ============================================================================

#[test]
fn test_image_split_into_padded_chunks() {
    let mut radio = radio();
    let data = image(5000);

    let summary = radio.load_image_from_slice(&data).unwrap();
    assert_eq!(summary.chunks, 3);
    assert_eq!(summary.bytes, 5000);

    let commands = radio.transport().commands();
    assert_eq!(commands.len(), 4);
    assert_eq!(commands[0], vec![LOAD_INIT, 0x00]);

    let sizes: Vec<usize> = commands[1..].iter().map(|c| c.len() - 4).collect();
    assert_eq!(sizes, vec![2048, 2048, 904]);

    let mut reassembled = Vec::new();
    for chunk in &commands[1..] {
        assert_eq!(&chunk[..4], &[HOST_LOAD, 0, 0, 0]);
        reassembled.extend_from_slice(&chunk[4..]);
    }
    assert_eq!(reassembled, data);
}

#[test]
fn test_status_read_ends_transfer() {
    let mut radio = radio();
    radio.load_image_from_slice(&image(100)).unwrap();

    let frames = radio.transport().frames();
    let last = frames.last().unwrap();
    assert!(last.is_read());
    assert_eq!(last.read.len(), 4);

    let events = radio.transport().events();
    assert_eq!(events.last(), Some(&BusEvent::Delay(LOAD_FINISH_DELAY_MS)));
}

#[test]
fn test_exact_chunk_size_sends_one_chunk() {
    let mut radio = radio();
    let summary = radio
        .load_image_from_slice(&image(HOST_LOAD_CHUNK_SIZE))
        .unwrap();
    assert_eq!(summary.chunks, 1);
    assert_eq!(radio.transport().opcodes(), vec![LOAD_INIT, HOST_LOAD]);
}

#[test]
fn test_empty_image_sends_no_chunks() {
    let mut radio = radio();
    let summary = radio.load_image_from_slice(&[]).unwrap();
    assert_eq!(summary.chunks, 0);
    assert_eq!(radio.transport().opcodes(), vec![LOAD_INIT]);
}

#[test]
fn test_chunk_pacing_delays() {
    let mut radio = radio();
    radio.load_image_from_slice(&image(3 * HOST_LOAD_CHUNK_SIZE)).unwrap();

    // load_init 1 + 3 chunks x 1 + finish 4 + 4, plus the 1 ms read settle on each side
    assert_eq!(radio.transport().total_delay_ms(), 1 + 3 + 4 + 4 + 2);
}

// ============================================================================
// Image Source Tests
// ============================================================================

#[test]
fn test_short_source_is_image_error() {
    let mut radio = radio();
    let data = image(3000);
    let mut source = &data[..];

    let err = radio.load_image(&mut source, 5000).unwrap_err();
    assert_eq!(
        err,
        Error::Image(ImageError::Truncated {
            expected: 5000,
            received: 3000,
        })
    );
    assert!(err.is_io());

    // The first full chunk went out before the source ran dry
    assert_eq!(radio.transport().opcodes(), vec![LOAD_INIT, HOST_LOAD]);
}

#[test]
fn test_memory_store_selects_images() {
    let patch = image(10);
    let fmhd = image(20);
    let dab = image(30);
    let mut store = MemoryFirmware {
        patch: &patch,
        fmhd: &fmhd,
        dab: &dab,
    };

    let (_, len) = store.open(FirmwareArtifact::Patch).unwrap();
    assert_eq!(len, 10);
    let (_, len) = store.open(FirmwareArtifact::FmHd).unwrap();
    assert_eq!(len, 20);
    let (_, len) = store.open(FirmwareArtifact::Dab).unwrap();
    assert_eq!(len, 30);
}

#[test]
fn test_artifact_file_names() {
    assert_eq!(FirmwareArtifact::Patch.file_name(), "rom00_patch.016.bin");
    assert_eq!(FirmwareArtifact::FmHd.file_name(), "fmhd_radio_3_0_19.bif");
    assert_eq!(FirmwareArtifact::Dab.file_name(), "dab_radio_3_2_7.bif");
}

#[test]
fn test_missing_firmware_file() {
    let mut store = FirmwareDir::new("/nonexistent/si46xx-firmware");
    let err = store.open(FirmwareArtifact::Dab).unwrap_err();
    assert_eq!(err, ImageError::Io(embedded_io::ErrorKind::NotFound));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = image(2100);
    std::fs::write(dir.path().join(FirmwareArtifact::Patch.file_name()), &data).unwrap();

    let mut radio = radio();
    let mut store = FirmwareDir::new(dir.path());
    let summary = radio
        .load_artifact(&mut store, FirmwareArtifact::Patch)
        .unwrap();
    assert_eq!(summary.chunks, 2);
    assert_eq!(summary.bytes, 2100);

    let mut from_slice = self::radio();
    from_slice.load_image_from_slice(&data).unwrap();
    assert_eq!(radio.transport().events(), from_slice.transport().events());

    let mut from_path = self::radio();
    from_path
        .load_image_from_file(store.path(FirmwareArtifact::Patch))
        .unwrap();
    assert_eq!(from_path.transport().events(), from_slice.transport().events());
}
