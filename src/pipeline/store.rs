//! Ephemeris and observation storage
use std::{
    collections::{BTreeMap, HashMap},
    sync::{PoisonError, RwLock},
};

use log::debug;

use crate::{
    constants::EPHEMERIS_VALIDITY_S,
    ephemeris::{select_nearest, Ephemeris, EphemerisSource},
    observation::ObservationSet,
};

/// Time of week (s) to storage key (ms)
fn tow_key(tow: f64) -> i64 {
    (tow * 1000.0).round() as i64
}

/// [Ephemeris] storage. Identity is the (prn, toc) pair.
pub trait EphemerisStore {
    /// Stores this [Ephemeris], unless one with identical (prn, toc)
    /// already exists. Returns true if it was inserted.
    fn upsert_ephemeris(&self, ephemeris: Ephemeris) -> bool;

    /// All [Ephemeris] of this PRN, whose toc lies within +/- window (s)
    /// of this time of week.
    fn ephemerides_within(&self, prn: u8, tow: f64, window: f64) -> Vec<Ephemeris>;

    /// [Ephemeris] of this PRN whose toc is the closest to this time
    /// of week, within +/- window (s).
    fn nearest_ephemeris(&self, prn: u8, tow: f64, window: f64) -> Option<Ephemeris> {
        select_nearest(
            self.ephemerides_within(prn, tow, window).iter(),
            prn,
            tow,
            window,
        )
    }
}

/// [ObservationSet] storage, keyed by (prn, tow)
pub trait ObservationStore {
    /// Stores this [ObservationSet], replacing the one with identical key
    fn insert_observation(&self, observation: ObservationSet);

    /// Stores all these [ObservationSet]s at once
    fn insert_observations(&self, observations: &[ObservationSet]) {
        for observation in observations {
            self.insert_observation(observation.clone());
        }
    }

    /// Lists all distinct times of week (s), in chronological order
    fn distinct_tows(&self) -> Vec<f64>;

    /// All [ObservationSet]s recorded at this time of week
    fn observations_at(&self, tow: f64) -> Vec<ObservationSet>;
}

/// In memory [EphemerisStore] and [ObservationStore].
/// Read mostly: any number of concurrent readers, writers are exclusive.
#[derive(Debug)]
pub struct MemoryStore {
    window: f64,
    ephemerides: RwLock<HashMap<(u8, i64), Ephemeris>>,
    observations: RwLock<BTreeMap<(i64, u8), ObservationSet>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(EPHEMERIS_VALIDITY_S)
    }
}

impl MemoryStore {
    /// Creates a new [MemoryStore], pairing ephemerides within +/- window (s)
    pub fn new(window: f64) -> Self {
        Self {
            window,
            ephemerides: Default::default(),
            observations: Default::default(),
        }
    }

    /// Number of stored [Ephemeris]
    pub fn ephemeris_count(&self) -> usize {
        self.ephemerides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of stored [ObservationSet]s
    pub fn observation_count(&self) -> usize {
        self.observations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Holds the ephemeris table for writing: every reader stalls until released
    pub(crate) fn lock_ephemerides(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<(u8, i64), Ephemeris>> {
        self.ephemerides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl EphemerisStore for MemoryStore {
    fn upsert_ephemeris(&self, ephemeris: Ephemeris) -> bool {
        let key = (ephemeris.prn, tow_key(ephemeris.toc));
        let mut ephemerides = self
            .ephemerides
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if ephemerides.contains_key(&key) {
            return false;
        }

        debug!(
            "store: new ephemeris G{:02} toc={} iode={}",
            ephemeris.prn, ephemeris.toc, ephemeris.iode
        );
        ephemerides.insert(key, ephemeris);
        true
    }

    fn ephemerides_within(&self, prn: u8, tow: f64, window: f64) -> Vec<Ephemeris> {
        self.ephemerides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|eph| eph.prn == prn && eph.is_valid(tow, window))
            .copied()
            .collect()
    }
}

impl EphemerisSource for MemoryStore {
    fn ephemeris_data(&self, prn: u8, tow: f64) -> Option<Ephemeris> {
        self.nearest_ephemeris(prn, tow, self.window)
    }
}

impl ObservationStore for MemoryStore {
    fn insert_observation(&self, observation: ObservationSet) {
        let key = (tow_key(observation.tow), observation.prn);
        self.observations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, observation);
    }

    fn insert_observations(&self, observations: &[ObservationSet]) {
        let mut store = self
            .observations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for observation in observations {
            store.insert(
                (tow_key(observation.tow), observation.prn),
                observation.clone(),
            );
        }
    }

    fn distinct_tows(&self) -> Vec<f64> {
        let store = self
            .observations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut tows = store.keys().map(|(tow, _)| *tow).collect::<Vec<_>>();
        tows.dedup();
        tows.into_iter().map(|tow| tow as f64 / 1000.0).collect()
    }

    fn observations_at(&self, tow: f64) -> Vec<ObservationSet> {
        let key = tow_key(tow);
        self.observations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .range((key, u8::MIN)..=(key, u8::MAX))
            .map(|(_, observation)| observation.clone())
            .collect()
    }
}
