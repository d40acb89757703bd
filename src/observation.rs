//! Per satellite observations and ionosphere free combinations
use log::trace;

use crate::{
    constants::SPEED_OF_LIGHT_M_S,
    prelude::SignalType,
    rtcm::msm7::{minimum_lock_time_ms, Msm7},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dual frequency pairs we may combine, by order of preference
pub const IF_PAIRS: [(SignalType, SignalType); 4] = [
    (SignalType::L1C, SignalType::L2L),
    (SignalType::L1W, SignalType::L2W),
    (SignalType::L1C, SignalType::L2W),
    (SignalType::L1C, SignalType::L2C),
];

/// Ionosphere free combination of two observables o1, o2
/// sampled on frequencies f1, f2 (Hz)
pub fn if_combination(f1: f64, f2: f64, o1: f64, o2: f64) -> f64 {
    let (f1_2, f2_2) = (f1.powi(2), f2.powi(2));
    (f1_2 * o1 - f2_2 * o2) / (f1_2 - f2_2)
}

/// Effective wavelength (m) of the ionosphere free combination of f1 and f2 (Hz)
pub fn if_wavelength(f1: f64, f2: f64) -> f64 {
    SPEED_OF_LIGHT_M_S * (f1.powi(2) - f2.powi(2)) / (f1.powi(3) - f2.powi(3))
}

/// Observable formed from an [ObservationSet]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Combination {
    /// Value in meters
    pub value: f64,
    /// Signals that were combined, None when we fell back
    /// to a single frequency observable
    pub pair: Option<(SignalType, SignalType)>,
}

impl Combination {
    /// True if this is a dual frequency (ionosphere free) observable
    pub fn is_dual_frequency(&self) -> bool {
        self.pair.is_some()
    }
}

/// Observations of one satellite, at one epoch. All vectors
/// are indexed by signal and always share the same length.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationSet {
    /// Satellite PRN number
    pub prn: u8,
    /// GPS time of week, in seconds
    pub tow: f64,
    /// Tracked signals
    pub signals: Vec<SignalType>,
    /// Pseudo ranges (m)
    pub pseudo_ranges: Vec<f64>,
    /// Phase ranges (m), when valid
    pub phase_ranges: Vec<Option<f64>>,
    /// Carrier to noise ratios (dB.Hz)
    pub cnrs: Vec<f64>,
    /// Minimal lock times (ms)
    pub lock_times: Vec<f64>,
    /// Half cycle ambiguity flags
    pub half_cycle_ambiguities: Vec<bool>,
}

impl ObservationSet {
    /// Creates an empty [ObservationSet]
    pub fn new(prn: u8, tow: f64) -> Self {
        Self {
            prn,
            tow,
            ..Default::default()
        }
    }

    /// Adds one signal observation
    pub fn with_signal(
        mut self,
        signal: SignalType,
        pseudo_range: f64,
        phase_range: Option<f64>,
        cnr: f64,
    ) -> Self {
        self.push(signal, pseudo_range, phase_range, cnr, 0.0, false);
        self
    }

    pub(crate) fn push(
        &mut self,
        signal: SignalType,
        pseudo_range: f64,
        phase_range: Option<f64>,
        cnr: f64,
        lock_time: f64,
        half_cycle: bool,
    ) {
        self.signals.push(signal);
        self.pseudo_ranges.push(pseudo_range);
        self.phase_ranges.push(phase_range);
        self.cnrs.push(cnr);
        self.lock_times.push(lock_time);
        self.half_cycle_ambiguities.push(half_cycle);
    }

    /// True if this set may be used
    pub fn is_valid(&self) -> bool {
        let n = self.signals.len();
        n > 0
            && self.pseudo_ranges.len() == n
            && self.phase_ranges.len() == n
            && self.cnrs.len() == n
            && self.lock_times.len() == n
            && self.half_cycle_ambiguities.len() == n
    }

    fn index(&self, signal: SignalType) -> Option<usize> {
        self.signals.iter().position(|s| *s == signal)
    }

    /// Pseudo range (m) of given signal
    pub fn pseudo_range(&self, signal: SignalType) -> Option<f64> {
        self.index(signal).map(|i| self.pseudo_ranges[i])
    }

    /// Phase range (m) of given signal
    pub fn phase_range(&self, signal: SignalType) -> Option<f64> {
        self.index(signal).and_then(|i| self.phase_ranges[i])
    }

    /// Carrier to noise ratio of the first signal
    pub fn cnr(&self) -> Option<f64> {
        self.cnrs.first().copied()
    }

    /// Preferred dual frequency pair, if any
    pub fn best_pair(&self) -> Option<(SignalType, SignalType)> {
        IF_PAIRS
            .iter()
            .find(|(s1, s2)| self.index(*s1).is_some() && self.index(*s2).is_some())
            .copied()
    }

    fn frequencies(pair: (SignalType, SignalType)) -> Option<(f64, f64)> {
        let f1 = pair.0.carrier()?.frequency();
        let f2 = pair.1.carrier()?.frequency();
        Some((f1, f2))
    }

    /// Ionosphere free pseudo range. Falls back to the first
    /// pseudo range when no known pair was tracked.
    pub fn if_pseudo_range(&self) -> Option<Combination> {
        if let Some(pair) = self.best_pair() {
            let (f1, f2) = Self::frequencies(pair)?;
            let o1 = self.pseudo_range(pair.0)?;
            let o2 = self.pseudo_range(pair.1)?;
            return Some(Combination {
                value: if_combination(f1, f2, o1, o2),
                pair: Some(pair),
            });
        }
        trace!("G{:02} - no dual frequency pair", self.prn);
        self.pseudo_ranges.first().map(|value| Combination {
            value: *value,
            pair: None,
        })
    }

    /// Ionosphere free phase range. Falls back to the first
    /// phase range when no known pair was tracked.
    pub fn if_phase_range(&self) -> Option<Combination> {
        if let Some(pair) = self.best_pair() {
            let (f1, f2) = Self::frequencies(pair)?;
            let o1 = self.phase_range(pair.0)?;
            let o2 = self.phase_range(pair.1)?;
            return Some(Combination {
                value: if_combination(f1, f2, o1, o2),
                pair: Some(pair),
            });
        }
        self.phase_ranges
            .first()
            .copied()
            .flatten()
            .map(|value| Combination { value, pair: None })
    }

    /// Wavelength (m) that applies to [Self::if_phase_range]
    pub fn if_wavelength(&self) -> Option<f64> {
        match self.best_pair() {
            Some(pair) => {
                let (f1, f2) = Self::frequencies(pair)?;
                Some(if_wavelength(f1, f2))
            },
            None => {
                let carrier = self.signals.first()?.carrier()?;
                Some(carrier.wavelength())
            },
        }
    }

    /// Merges signals of another set of this satellite (same epoch).
    /// Signals we already hold are not replaced.
    pub fn merge(&mut self, rhs: &Self) {
        for i in 0..rhs.signals.len() {
            if self.index(rhs.signals[i]).is_none() {
                self.push(
                    rhs.signals[i],
                    rhs.pseudo_ranges[i],
                    rhs.phase_ranges[i],
                    rhs.cnrs[i],
                    rhs.lock_times[i],
                    rhs.half_cycle_ambiguities[i],
                );
            }
        }
    }
}

impl Msm7 {
    /// Converts this [Msm7] to one [ObservationSet] per satellite.
    /// Cells without valid pseudo range are dropped, and so are
    /// satellites left without any cell.
    pub fn observation_sets(&self) -> Vec<ObservationSet> {
        let tow = self.header.tow();
        self.satellites
            .iter()
            .filter_map(|sat| {
                let mut set = ObservationSet::new(sat.prn, tow);
                for cell in sat.cells.iter() {
                    let pseudo_range = match sat.pseudo_range_m(cell) {
                        Some(pr) => pr,
                        None => continue,
                    };
                    set.push(
                        cell.signal,
                        pseudo_range,
                        sat.phase_range_m(cell),
                        cell.cnr_dbhz,
                        minimum_lock_time_ms(cell.lock_time_indicator) as f64,
                        cell.half_cycle_ambiguity,
                    );
                }
                if set.is_valid() {
                    Some(set)
                } else {
                    None
                }
            })
            .collect()
    }
}
