use std::{sync::Arc, thread};

use crate::{
    prelude::{
        Ephemeris, EphemerisSource, EphemerisStore, MemoryStore, ObservationSet,
        ObservationStore, SignalType,
    },
    tests::init_logger,
};

fn ephemeris(prn: u8, toc: f64, iode: u8) -> Ephemeris {
    Ephemeris {
        prn,
        toc,
        toe: toc,
        iode,
        ..Default::default()
    }
}

fn observation(prn: u8, tow: f64, pr: f64) -> ObservationSet {
    ObservationSet::new(prn, tow).with_signal(SignalType::L1C, pr, None, 45.0)
}

#[test]
fn ephemeris_identity() {
    init_logger();
    let store = MemoryStore::default();

    assert!(store.upsert_ephemeris(ephemeris(1, 345_600.0, 10)));
    assert!(store.upsert_ephemeris(ephemeris(1, 352_800.0, 11)));
    assert!(store.upsert_ephemeris(ephemeris(2, 345_600.0, 10)));

    // same (prn, toc): kept as is
    assert!(!store.upsert_ephemeris(ephemeris(1, 345_600.0, 99)));
    assert_eq!(store.ephemeris_count(), 3);

    let eph = store.nearest_ephemeris(1, 346_000.0, 7200.0).unwrap();
    assert_eq!(eph.iode, 10);
}

#[test]
fn nearest_within_window() {
    let store = MemoryStore::new(3600.0);
    store.upsert_ephemeris(ephemeris(5, 338_400.0, 1));
    store.upsert_ephemeris(ephemeris(5, 345_600.0, 2));

    assert_eq!(store.ephemerides_within(5, 342_000.0, 3600.0).len(), 2);
    assert_eq!(store.ephemerides_within(5, 342_000.0, 1000.0).len(), 0);
    assert_eq!(store.ephemerides_within(6, 342_000.0, 3600.0).len(), 0);

    assert_eq!(store.nearest_ephemeris(5, 344_000.0, 3600.0).unwrap().iode, 2);
    assert_eq!(store.nearest_ephemeris(5, 339_000.0, 3600.0).unwrap().iode, 1);

    // pairing window of the store
    assert_eq!(store.ephemeris_data(5, 349_000.0).unwrap().iode, 2);
    assert!(store.ephemeris_data(5, 350_000.0).is_none());
}

#[test]
fn observations() {
    let store = MemoryStore::default();

    store.insert_observations(&[
        observation(3, 11.0, 1.0),
        observation(1, 11.0, 2.0),
        observation(2, 10.0, 3.0),
    ]);
    store.insert_observation(observation(1, 12.5, 4.0));

    // identical (prn, tow): replaced
    store.insert_observation(observation(3, 11.0, 5.0));

    assert_eq!(store.observation_count(), 4);
    assert_eq!(store.distinct_tows(), vec![10.0, 11.0, 12.5]);

    let at = store.observations_at(11.0);
    assert_eq!(at.len(), 2);
    assert_eq!(at[0].prn, 1);
    assert_eq!(at[1].prn, 3);
    assert_eq!(at[1].pseudo_ranges, vec![5.0]);

    assert!(store.observations_at(13.0).is_empty());
}

#[test]
fn concurrent_access() {
    init_logger();
    let store = Arc::new(MemoryStore::default());

    let writers = (0..4u8)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50u8 {
                    let prn = 1 + (i % 32);
                    let toc = 16.0 * (w as f64 * 100.0 + i as f64);
                    store.upsert_ephemeris(ephemeris(prn, toc, i));
                    store.insert_observation(observation(prn, w as f64, i as f64));
                }
            })
        })
        .collect::<Vec<_>>();

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..100 {
                let _ = store.distinct_tows();
                let _ = store.ephemeris_data(1, 0.0);
            }
        })
    };

    for handle in writers {
        handle.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(store.ephemeris_count(), 200);
    assert_eq!(store.observation_count(), 4 * 32);
    assert_eq!(store.distinct_tows(), vec![0.0, 1.0, 2.0, 3.0]);
}
