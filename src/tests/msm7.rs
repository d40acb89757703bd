use rstest::*;

use crate::{
    constants::SPEED_OF_LIGHT_M_S,
    error::Error,
    prelude::{Message, Msm7, Msm7Cell, Msm7Header, Msm7Satellite, RawMessage, SignalType},
    rtcm::{framer::encode_frame, msm7::minimum_lock_time_ms, msm7::MSM7_GPS},
    tests::{encode_msm7, init_logger, BitWriter},
};

fn cell(signal: SignalType, fine_pseudo_range: i32, fine_phase_range: i32) -> Msm7Cell {
    Msm7Cell {
        signal,
        fine_pseudo_range,
        fine_phase_range,
        lock_time_indicator: 500,
        half_cycle_ambiguity: false,
        cnr_dbhz: 42.5,
        fine_range_rate: -1234,
    }
}

/// PRN 3 and 7, both tracked on L1C and L2W
fn two_satellites() -> Msm7 {
    Msm7 {
        header: Msm7Header {
            station_id: 2003,
            tow_ms: 345_600_000,
            iods: 5,
            ..Default::default()
        },
        satellites: vec![
            Msm7Satellite {
                prn: 3,
                rough_range_ms: 70,
                extended_info: 0,
                rough_range_mod_ms: 512,
                rough_range_rate: -250,
                cells: vec![
                    cell(SignalType::L1C, 1000, 4000),
                    cell(SignalType::L2W, -1000, -4000),
                ],
            },
            Msm7Satellite {
                prn: 7,
                rough_range_ms: 75,
                extended_info: 0,
                rough_range_mod_ms: 1,
                rough_range_rate: 410,
                cells: vec![
                    cell(SignalType::L1C, 0, 0),
                    cell(SignalType::L2W, 262_143, 8_388_607),
                ],
            },
        ],
    }
}

#[test]
fn header_and_masks() {
    init_logger();
    let msm = two_satellites();
    let decoded = Msm7::decode_payload(&encode_msm7(&msm)).unwrap();

    assert_eq!(decoded, msm);
    assert_eq!(decoded.header.station_id, 2003);
    assert_eq!(decoded.header.tow(), 345_600.0);
    assert!(!decoded.header.multiple_message);
    assert_eq!(
        decoded.satellites.iter().map(|s| s.prn).collect::<Vec<_>>(),
        vec![3, 7]
    );
}

#[test]
fn pseudo_range_formula() {
    let msm = Msm7::decode_payload(&encode_msm7(&two_satellites())).unwrap();
    let range_ms = SPEED_OF_LIGHT_M_S / 1000.0;

    let sat = &msm.satellites[0];
    let l1 = &sat.cells[0];

    let expected = range_ms * ((70.0 + 512.0 / 1024.0) + 1000.0 / 536_870_912.0);
    assert_eq!(sat.pseudo_range_m(l1), Some(expected));

    let expected = range_ms * ((70.0 + 512.0 / 1024.0) + 4000.0 / 2_147_483_648.0);
    assert_eq!(sat.phase_range_m(l1), Some(expected));

    let l2 = &sat.cells[1];
    let expected = range_ms * ((70.0 + 512.0 / 1024.0) - 1000.0 / 536_870_912.0);
    assert_eq!(sat.pseudo_range_m(l2), Some(expected));

    let rate = sat.range_rate_m_s(l1).unwrap();
    assert!((rate - (-250.0 - 0.1234)).abs() < 1.0E-9);
}

#[test]
fn cell_content() {
    let msm = Msm7::decode_payload(&encode_msm7(&two_satellites())).unwrap();
    for sat in msm.satellites.iter() {
        assert_eq!(sat.cells.len(), 2);
        assert_eq!(sat.cells[0].signal, SignalType::L1C);
        assert_eq!(sat.cells[1].signal, SignalType::L2W);
        for cell in sat.cells.iter() {
            assert_eq!(cell.cnr_dbhz, 42.5);
            assert_eq!(cell.lock_time_indicator, 500);
        }
    }
    assert_eq!(msm.satellites[1].cells[1].fine_pseudo_range, 262_143);
    assert_eq!(msm.satellites[1].cells[1].fine_phase_range, 8_388_607);
}

#[test]
fn sparse_cell_mask() {
    let mut msm = two_satellites();
    // PRN 7 only tracked on L2W
    msm.satellites[1].cells.remove(0);

    let decoded = Msm7::decode_payload(&encode_msm7(&msm)).unwrap();
    assert_eq!(decoded, msm);
    assert_eq!(decoded.satellites[1].cells.len(), 1);
    assert_eq!(decoded.satellites[1].cells[0].signal, SignalType::L2W);

    let sets = decoded.observation_sets();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[1].signals, vec![SignalType::L2W]);
}

#[test]
fn invalid_markers() {
    let mut msm = two_satellites();
    msm.satellites[0].cells[1].fine_pseudo_range = -(1 << 19);
    msm.satellites[0].cells[0].fine_phase_range = -(1 << 23);
    msm.satellites[1].rough_range_ms = 255;

    let decoded = Msm7::decode_payload(&encode_msm7(&msm)).unwrap();

    let sat = &decoded.satellites[0];
    assert!(sat.pseudo_range_m(&sat.cells[0]).is_some());
    assert!(sat.phase_range_m(&sat.cells[0]).is_none());
    assert!(sat.pseudo_range_m(&sat.cells[1]).is_none());

    let sat = &decoded.satellites[1];
    assert!(!sat.is_valid());
    assert!(sat.pseudo_range_m(&sat.cells[0]).is_none());

    // invalid cells and satellites do not make it to the observations
    let sets = decoded.observation_sets();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].prn, 3);
    assert_eq!(sets[0].signals, vec![SignalType::L1C]);
    assert_eq!(sets[0].phase_ranges, vec![None]);
}

#[test]
fn observation_sets() {
    let msm = Msm7::decode_payload(&encode_msm7(&two_satellites())).unwrap();
    let sets = msm.observation_sets();

    assert_eq!(sets.len(), 2);
    for set in sets.iter() {
        assert!(set.is_valid());
        assert_eq!(set.tow, 345_600.0);
        assert_eq!(set.signals, vec![SignalType::L1C, SignalType::L2W]);
        assert_eq!(set.cnrs, vec![42.5, 42.5]);
        assert_eq!(set.lock_times, vec![minimum_lock_time_ms(500) as f64; 2]);
    }
}

#[rstest]
#[case(0, 0)]
#[case(63, 63)]
#[case(64, 64)]
#[case(96, 128)]
#[case(128, 256)]
#[case(704, 67_108_864)]
#[case(705, 0)]
fn lock_time_indicator(#[case] indicator: u16, #[case] expected: u64) {
    assert_eq!(minimum_lock_time_ms(indicator), expected);
}

#[test]
fn truncated_payload() {
    init_logger();
    let payload = encode_msm7(&two_satellites());

    for size in [5, 9, 17, 22, payload.len() - 3] {
        match Msm7::decode_payload(&payload[..size]) {
            Err(Error::NotEnoughBits) => {},
            other => panic!("size={}: unexpected result {:?}", size, other),
        }
    }
}

#[test]
fn oversized_cell_mask() {
    init_logger();
    let mut w = BitWriter::new();
    w.unsigned(12, MSM7_GPS as u64)
        .unsigned(12, 1)
        .unsigned(30, 1000)
        .unsigned(19, 0)
        // 12 satellites x 6 signals > 64 cells
        .unsigned(64, 0xFFF0_0000_0000_0000)
        .unsigned(32, 0x7E00_0000);
    w.unsigned(64, 0).unsigned(64, 0);

    match Msm7::decode_payload(&w.bytes()) {
        Err(Error::CellMaskMismatch(12, 6)) => {},
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn unexpected_message() {
    let mut payload = encode_msm7(&two_satellites());
    // 1077 -> 1076
    payload[1] = (payload[1] & 0x0f) | 0x40;

    let raw = RawMessage {
        msg_type: 1076,
        payload,
        crc_valid: true,
    };

    match Msm7::decode(&raw) {
        Err(Error::UnexpectedMessage(1076)) => {},
        other => panic!("unexpected result {:?}", other),
    }

    match raw.decode() {
        Ok(Message::Unsupported(1076)) => {},
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn framed_message() {
    let frame = encode_frame(&encode_msm7(&two_satellites()));
    let messages = crate::prelude::FrameSync::default().feed(&frame);
    assert_eq!(messages.len(), 1);
    match messages[0].decode() {
        Ok(Message::Msm7(msm)) => assert_eq!(msm, two_satellites()),
        other => panic!("unexpected result {:?}", other),
    }
}
