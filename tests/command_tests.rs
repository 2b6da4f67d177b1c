//! Command Set Tests
//!
//! Argument layouts sent by the driver and decoding of fixed replies.
//! Run with: cargo test --features mock --test command_tests

use si46xx::config::{Config, MAX_FREQUENCY_LIST};
use si46xx::error::{ArgumentError, Error};
use si46xx::mock::MockTransport;
use si46xx::protocol::reply::{ActiveImage, PowerUpState};
use si46xx::{ServiceList, Si46xx};

fn radio() -> Si46xx<MockTransport> {
    Si46xx::new(MockTransport::new())
}

fn reply20(fill: impl FnOnce(&mut [u8; 20])) -> [u8; 20] {
    let mut r = [0u8; 20];
    r[0] = 0x80;
    fill(&mut r);
    r
}

// ============================================================================
// Property and Tuning Tests
// ============================================================================

#[test]
fn test_set_property_layout() {
    let mut radio = radio();
    radio.set_property(0x1710, 0x0102).unwrap();
    assert_eq!(
        radio.transport().commands(),
        vec![vec![0x13, 0x00, 0x10, 0x17, 0x02, 0x01]]
    );
}

#[test]
fn test_fm_tune_frequency_in_10khz_units() {
    let mut radio = radio();
    radio.fm_tune_frequency(93_000, 0).unwrap();
    // 9300 = 0x2454
    assert_eq!(
        radio.transport().commands(),
        vec![vec![0x30, 0x00, 0x54, 0x24, 0x00, 0x00]]
    );
}

#[test]
fn test_fm_tune_frequency_antenna_cap() {
    let mut radio = radio();
    radio.fm_tune_frequency(87_500, 0x0123).unwrap();
    assert_eq!(
        radio.transport().commands(),
        vec![vec![0x30, 0x00, 0x2E, 0x22, 0x23, 0x01]]
    );
}

#[test]
fn test_fm_tune_frequency_out_of_range() {
    let mut radio = radio();
    let err = radio.fm_tune_frequency(700_000, 0).unwrap_err();
    assert_eq!(
        err,
        Error::InvalidArgument(ArgumentError::FrequencyOutOfRange { khz: 700_000 })
    );
    assert!(radio.transport().events().is_empty());
}

#[test]
fn test_dab_tune_frequency_layout() {
    let mut radio = radio();
    radio.dab_tune_frequency(5, 0).unwrap();
    assert_eq!(
        radio.transport().commands(),
        vec![vec![0xB0, 0x00, 0x05, 0x00, 0x00, 0x00]]
    );
}

#[test]
fn test_err_cmd_is_reported_not_raised() {
    let mut radio = radio();
    radio.transport_mut().queue_reply(&[0xC0, 0x00, 0x00, 0xC0]);

    let status = radio.dab_tune_frequency(1, 0).unwrap();
    assert!(status.err_cmd);
    assert!(status.cts);
    assert_eq!(status.pup_state, PowerUpState::Application);
}

// ============================================================================
// Frequency List Tests
// ============================================================================

#[test]
fn test_frequency_list_single_entry() {
    let mut radio = radio();
    radio.dab_set_frequency_list(&[225_648]).unwrap();
    // 225648 = 0x00037170
    assert_eq!(
        radio.transport().commands(),
        vec![vec![0xB8, 0x01, 0x00, 0x00, 0x70, 0x71, 0x03, 0x00]]
    );
}

#[test]
fn test_frequency_list_lengths() {
    for n in 1..=MAX_FREQUENCY_LIST {
        let mut radio = radio();
        let freqs: Vec<u32> = (0..n as u32).map(|i| 174_928 + i * 1_712).collect();
        radio.dab_set_frequency_list(&freqs).unwrap();

        let commands = radio.transport().commands();
        assert_eq!(commands.len(), 1);
        let frame = &commands[0];
        assert_eq!(frame.len(), 1 + 3 + 4 * n, "list of {n}");
        assert_eq!(frame[1] as usize, n);
        let entries: Vec<u8> = freqs.iter().flat_map(|f| f.to_le_bytes()).collect();
        assert_eq!(&frame[4..], &entries[..], "list of {n}");
    }
}

#[test]
fn test_frequency_list_rejects_empty() {
    let mut radio = radio();
    let err = radio.dab_set_frequency_list(&[]).unwrap_err();
    assert_eq!(
        err,
        Error::InvalidArgument(ArgumentError::FrequencyListLength(0))
    );
    assert!(radio.transport().events().is_empty());
}

#[test]
fn test_frequency_list_rejects_49_entries() {
    let mut radio = radio();
    let freqs = [225_648u32; 49];
    let err = radio.dab_set_frequency_list(&freqs).unwrap_err();
    assert_eq!(
        err,
        Error::InvalidArgument(ArgumentError::FrequencyListLength(49))
    );
    assert!(radio.transport().events().is_empty());
    assert_eq!(
        err.to_string(),
        "Invalid argument: frequency list must hold 1 to 48 entries, got 49"
    );
}

// ============================================================================
// Service Command Tests
// ============================================================================

#[test]
fn test_start_digital_service_layout() {
    let mut radio = radio();
    radio.dab_start_digital_service(0x1234_5678, 0x0000_0009).unwrap();
    assert_eq!(
        radio.transport().commands(),
        vec![vec![
            0x81, 0x00, 0x00, 0x00, 0x78, 0x56, 0x34, 0x12, 0x09, 0x00, 0x00, 0x00
        ]]
    );
    let frames = radio.transport().frames();
    assert_eq!(frames.last().unwrap().read.len(), 5);
}

#[test]
fn test_start_service_index_out_of_range() {
    let mut radio = radio();
    let list = ServiceList::default();
    let err = radio.dab_start_service_index(&list, 0).unwrap_err();
    assert_eq!(
        err,
        Error::InvalidArgument(ArgumentError::ServiceIndex { index: 0, len: 0 })
    );
    assert!(radio.transport().events().is_empty());
}

#[test]
fn test_service_linking_info_layout() {
    let mut radio = radio();
    let reply = radio.dab_service_linking_info(0xE1C2_38F4).unwrap();
    assert_eq!(reply.len(), 24);
    assert_eq!(
        radio.transport().commands(),
        vec![vec![0xB7, 0x00, 0x00, 0x00, 0xF4, 0x38, 0xC2, 0xE1]]
    );
}

// ============================================================================
// Status Reply Tests
// ============================================================================

#[test]
fn test_digrad_status_acknowledges_interrupts() {
    let mut radio = radio();
    let mut reply = [0u8; 22];
    reply[0] = 0x81;
    reply[5] = 0x05;
    reply[6] = 0xF6; // -10 dBuV
    reply[7] = 12;
    reply[8] = 100;
    reply[9] = 20;
    reply[17] = 0xFE;
    reply[18] = 0x34;
    reply[19] = 0x12;
    radio.transport_mut().queue_reply(&reply);

    let status = radio.dab_digrad_status().unwrap();
    assert_eq!(radio.transport().commands(), vec![vec![0xB2, 0x09]]);
    assert!(status.acquired);
    assert!(status.valid);
    assert_eq!(status.rssi, -10);
    assert_eq!(status.snr, 12);
    assert_eq!(status.fic_quality, 100);
    assert_eq!(status.cnr, 20);
    assert_eq!(status.fft_offset, -2);
    assert_eq!(status.antenna_cap, 0x1234);
    assert!(status.status.stc_int);
}

#[test]
fn test_fm_rsq_status_decode() {
    let mut radio = radio();
    radio.transport_mut().queue_reply(&reply20(|r| {
        r[8] = 0xFD; // -3
        r[9] = 45;
        r[10] = 22;
        r[12] = 0x2C;
        r[13] = 0x01;
    }));

    let rsq = radio.fm_rsq_status().unwrap();
    assert_eq!(radio.transport().commands(), vec![vec![0x32, 0x00]]);
    assert_eq!(rsq.snr_db, 22);
    assert_eq!(rsq.rssi_dbuv, 45);
    assert_eq!(rsq.freq_offset, -6);
    assert_eq!(rsq.read_antenna_cap, 300);
    assert_eq!(
        rsq.to_string(),
        "SNR: 22 dB, RSSI: 45 dBuV, FREQOFF: -6, READANTCAP: 300"
    );
}

#[test]
fn test_fm_rds_status_sync_bit() {
    let mut radio = radio();
    radio.transport_mut().queue_reply(&reply20(|r| r[5] = 0x02));
    assert!(radio.fm_rds_status().unwrap().rds_sync);

    radio.transport_mut().queue_reply(&reply20(|r| r[5] = 0xFD));
    assert!(!radio.fm_rds_status().unwrap().rds_sync);
}

#[test]
fn test_system_state_and_part_info() {
    let mut radio = radio();
    radio.transport_mut().queue_reply(&[0x80, 0, 0, 0xC0, 0x02, 0]);
    let mut info = [0u8; 22];
    info[0] = 0x80;
    info[4] = 2;
    info[5] = 1;
    info[8] = 0x4C; // 4684 = 0x124C
    info[9] = 0x12;
    radio.transport_mut().queue_reply(&info);

    let state = radio.get_system_state().unwrap();
    assert_eq!(state.image, ActiveImage::Dab);

    let part = radio.get_part_info().unwrap();
    assert_eq!(part.part_number, 4684);
    assert_eq!(part.to_string(), "Si4684 rev 2 rom 1");
}

#[test]
fn test_poll_status_reads_without_command() {
    let mut radio = radio();
    radio.transport_mut().queue_reply(&[0x81, 0, 0, 0]);

    let status = radio.poll_status().unwrap();
    assert!(status.stc_int);
    assert!(radio.transport().commands().is_empty());
}

#[test]
fn test_power_up_sends_configured_vector() {
    let mut radio = Si46xx::with_config(MockTransport::new(), Config::default());
    radio.power_up().unwrap();
    assert_eq!(
        radio.transport().commands(),
        vec![vec![
            0x01, 0x80, 0x17, 0x48, 0x00, 0xF9, 0x24, 0x01, 0x1F, 0x10, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00
        ]]
    );
}
