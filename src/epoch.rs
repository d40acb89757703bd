//! Solver inputs: ephemeris pairing, epoch grouping and MSM7 continuation
use itertools::Itertools;
use log::{debug, warn};

use crate::{
    ephemeris::{Ephemeris, EphemerisSource},
    error::Error,
    observation::ObservationSet,
    rtcm::msm7::Msm7,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Observations of one satellite, paired with the [Ephemeris]
/// that describes it at that time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteDatum {
    /// Satellite PRN number
    pub prn: u8,
    /// Observations
    pub observations: ObservationSet,
    /// Paired ephemeris
    pub ephemeris: Ephemeris,
}

impl SatelliteDatum {
    /// GPS time of week (s) of the observation
    pub fn tow(&self) -> f64 {
        self.observations.tow
    }
}

/// Pairs this [ObservationSet] with the [Ephemeris] the source provides for it
pub fn pair_one<E: EphemerisSource + ?Sized>(
    observation: &ObservationSet,
    source: &E,
) -> Result<SatelliteDatum, Error> {
    let ephemeris = source
        .ephemeris_data(observation.prn, observation.tow)
        .ok_or(Error::MissingEphemeris {
            prn: observation.prn,
            tow: observation.tow,
        })?;

    Ok(SatelliteDatum {
        prn: observation.prn,
        observations: observation.clone(),
        ephemeris,
    })
}

/// Pairs each [ObservationSet] with the [Ephemeris] the source provides
/// for it. Satellites we cannot pair are excluded (not an error).
pub fn pair<E: EphemerisSource + ?Sized>(
    observations: &[ObservationSet],
    source: &E,
) -> Vec<SatelliteDatum> {
    observations
        .iter()
        .filter(|obs| obs.is_valid())
        .filter_map(|obs| match pair_one(obs, source) {
            Ok(datum) => Some(datum),
            Err(e) => {
                debug!("{}", e);
                None
            },
        })
        .collect()
}

/// All satellites observed at one instant: the unit of work of both solvers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpochData {
    /// GPS time of week (s)
    pub tow: f64,
    /// Paired satellites, sorted by PRN
    pub satellites: Vec<SatelliteDatum>,
}

impl EpochData {
    /// Builds a new [EpochData]
    pub fn new(tow: f64, mut satellites: Vec<SatelliteDatum>) -> Self {
        satellites.sort_by_key(|sat| sat.prn);
        Self { tow, satellites }
    }

    /// PRN of every satellite in this epoch
    pub fn prns(&self) -> Vec<u8> {
        self.satellites.iter().map(|sat| sat.prn).collect()
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }
}

/// Groups [SatelliteDatum] by identical time of week,
/// returning [EpochData] in chronological order.
pub fn group(mut data: Vec<SatelliteDatum>) -> Vec<EpochData> {
    data.sort_by(|a, b| a.tow().total_cmp(&b.tow()).then(a.prn.cmp(&b.prn)));
    data.into_iter()
        .chunk_by(|sat| sat.tow())
        .into_iter()
        .map(|(tow, chunk)| EpochData::new(tow, chunk.collect()))
        .collect()
}

/// Merges MSM7 continuation messages: a message with the
/// multiple message bit asserted is held until the final message of that
/// epoch arrives.
#[derive(Debug, Default)]
pub struct ContinuationMerger {
    pending: Option<(u32, Vec<ObservationSet>)>,
}

impl ContinuationMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a partial epoch is held
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feeds one decoded [Msm7]. Returns the complete epoch, in the time of
    /// week of its first message, once the chain is terminated.
    /// A chain that is never terminated is dropped when the next epoch starts.
    pub fn feed(&mut self, msm: &Msm7) -> Option<Vec<ObservationSet>> {
        let tow_ms = msm.header.tow_ms;

        let mut merged = match self.pending.take() {
            Some((pending_tow_ms, pending)) if pending_tow_ms == tow_ms => pending,
            Some((pending_tow_ms, pending)) => {
                warn!(
                    "tow={:.3} - dropping incomplete msm7 chain ({} satellites)",
                    pending_tow_ms as f64 * 1.0E-3,
                    pending.len()
                );
                Vec::new()
            },
            None => Vec::new(),
        };

        for set in msm.observation_sets() {
            match merged.iter_mut().find(|s| s.prn == set.prn) {
                Some(existing) => existing.merge(&set),
                None => merged.push(set),
            }
        }

        if msm.header.multiple_message {
            debug!(
                "tow={:.3} - msm7 continuation pending ({} satellites)",
                msm.header.tow(),
                merged.len()
            );
            self.pending = Some((tow_ms, merged));
            None
        } else {
            Some(merged)
        }
    }
}
