use crate::{
    constants::{EPHEMERIS_VALIDITY_S, HALF_WEEK_S, WEEK_S},
    prelude::{Constellation, Epoch, TimeScale, SV},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod orbit;
pub use orbit::SatelliteState;

/// GPS broadcast [Ephemeris] (IS-GPS-200 LNAV parameters).
/// Angles are expressed in radians, angular rates in radians/s.
/// Identity of an [Ephemeris] is the (prn, toc) pair.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ephemeris {
    /// Satellite PRN number
    pub prn: u8,
    /// Full GPS week number
    pub week: u16,
    /// Time of clock, in seconds of week
    pub toc: f64,
    /// Time of ephemeris, in seconds of week
    pub toe: f64,
    /// Square root of the semi major axis (m^1/2)
    pub sqrt_a: f64,
    /// Eccentricity
    pub e: f64,
    /// Inclination at reference time
    pub i0: f64,
    /// Longitude of ascending node at weekly epoch
    pub omega0: f64,
    /// Argument of perigee
    pub omega: f64,
    /// Mean anomaly at reference time
    pub m0: f64,
    /// Mean motion difference
    pub delta_n: f64,
    /// Rate of inclination
    pub idot: f64,
    /// Rate of right ascension
    pub omega_dot: f64,
    pub cuc: f64,
    pub cus: f64,
    pub crc: f64,
    pub crs: f64,
    pub cic: f64,
    pub cis: f64,
    /// Group delay differential (s)
    pub tgd: f64,
    /// Clock bias (s)
    pub af0: f64,
    /// Clock drift (s.s⁻¹)
    pub af1: f64,
    /// Clock drift rate (s.s⁻²)
    pub af2: f64,
    /// Issue of data, ephemeris
    pub iode: u8,
    /// Issue of data, clock
    pub iodc: u16,
    /// SV accuracy (URA index)
    pub sv_accuracy: u8,
    /// Code on L2
    pub code_on_l2: u8,
    /// SV health (0: healthy)
    pub health: u8,
    /// L2 P data flag
    pub l2p_flag: bool,
    /// Fit interval flag
    pub fit_interval: bool,
}

/// Any [Ephemeris] provider should implement [EphemerisSource]
/// to contribute to the pairing process.
pub trait EphemerisSource {
    /// Provide the [Ephemeris] of this PRN, whose toc is the closest
    /// to this time of week, within the pairing window.
    fn ephemeris_data(&self, prn: u8, tow: f64) -> Option<Ephemeris>;
}

/// Selects, among these [Ephemeris], the one of this PRN whose toc is the
/// closest to this time of week, within +/- window seconds.
pub fn select_nearest<'a>(
    ephemerides: impl IntoIterator<Item = &'a Ephemeris>,
    prn: u8,
    tow: f64,
    window: f64,
) -> Option<Ephemeris> {
    ephemerides
        .into_iter()
        .filter(|eph| eph.prn == prn && eph.is_valid(tow, window))
        .min_by(|a, b| {
            let da = wrap_week(tow - a.toc).abs();
            let db = wrap_week(tow - b.toc).abs();
            da.total_cmp(&db)
        })
        .copied()
}

impl EphemerisSource for Vec<Ephemeris> {
    fn ephemeris_data(&self, prn: u8, tow: f64) -> Option<Ephemeris> {
        select_nearest(self.iter(), prn, tow, EPHEMERIS_VALIDITY_S)
    }
}

/// Wraps a time difference into [-half week, +half week]
pub(crate) fn wrap_week(dt: f64) -> f64 {
    if dt > HALF_WEEK_S {
        dt - WEEK_S
    } else if dt < -HALF_WEEK_S {
        dt + WEEK_S
    } else {
        dt
    }
}

impl Ephemeris {
    /// [SV] described by this [Ephemeris]
    pub fn sv(&self) -> SV {
        SV::new(Constellation::GPS, self.prn)
    }

    /// Time of clock as GPST [Epoch]
    pub fn toc_epoch(&self) -> Epoch {
        Epoch::from_time_of_week(
            self.week as u32,
            (self.toc * 1.0E9).round() as u64,
            TimeScale::GPST,
        )
    }

    /// True if this [Ephemeris] may be used at this time of week
    pub fn is_valid(&self, tow: f64, max_dtoc: f64) -> bool {
        wrap_week(tow - self.toc).abs() <= max_dtoc
    }

    /// Semi major axis (m)
    pub fn semi_major_axis_m(&self) -> f64 {
        self.sqrt_a.powi(2)
    }

    /// Clock polynomial af0 + af1·dt + af2·dt², dt being the time
    /// elapsed since toc. Group delay is not included.
    pub fn clock_offset(&self, dt: f64) -> f64 {
        self.af0 + self.af1 * dt + self.af2 * dt.powi(2)
    }

    /// Satellite clock bias (s) that applies to an observable.
    /// The broadcast clock refers to the L1/L2 ionosphere free combination,
    /// so the group delay only applies to single frequency (L1) observables.
    pub fn clock_bias_for(&self, sat_clock_s: f64, dual_frequency: bool) -> f64 {
        if dual_frequency {
            sat_clock_s
        } else {
            sat_clock_s - self.tgd
        }
    }
}
