use nalgebra::Vector3;

use crate::{
    constants::SPEED_OF_LIGHT_M_S,
    coords::elevation_deg,
    epoch::SatelliteDatum,
    prelude::{Epoch, TimeScale},
};

pub(crate) mod matrix;
pub(crate) mod navigator;
pub(crate) mod ppp;
pub(crate) mod solutions;
pub(crate) mod spp;

pub use matrix::Matrix;
pub use navigator::Navigator;
pub use ppp::{KalmanState, PPPEstimator};
pub use solutions::{PositionResult, Solution};
pub use spp::SPPSolver;

/// GPST [Epoch] from week number and time of week (s)
pub(crate) fn gpst_epoch(week: u16, tow: f64) -> Epoch {
    Epoch::from_time_of_week(
        week as u32,
        (tow.max(0.0) * 1.0E9).round() as u64,
        TimeScale::GPST,
    )
}

/// Receiver to satellite geometry, linearized at one receiver state
#[derive(Debug, Clone, Copy)]
pub(crate) struct SatelliteGeometry {
    /// Ionosphere free pseudo range (m), or single frequency fallback
    pub pseudo_range_m: f64,
    /// Satellite position (m ECEF)
    pub position: Vector3<f64>,
    /// Geometric range (m)
    pub range_m: f64,
    /// Range partial derivatives, with respect to receiver position
    pub los: Vector3<f64>,
    /// Elevation (degrees)
    pub elevation_deg: f64,
    /// Satellite clock bias, in meters
    pub sat_clock_m: f64,
}

impl SatelliteGeometry {
    /// Resolves the [SatelliteGeometry] of this satellite observed at this
    /// time of week, from receiver position (m ECEF) and clock bias (m).
    pub fn resolve(
        sat: &SatelliteDatum,
        tow: f64,
        rx: &Vector3<f64>,
        clock_bias_m: f64,
    ) -> Option<Self> {
        let pseudo_range = sat.observations.if_pseudo_range()?;

        let observation_time = tow - clock_bias_m / SPEED_OF_LIGHT_M_S;

        let state = sat
            .ephemeris
            .satellite_state(observation_time, pseudo_range.value);

        let sat_clock = sat
            .ephemeris
            .clock_bias_for(state.clock_bias, pseudo_range.is_dual_frequency());

        let delta = rx - state.position;
        let range_m = delta.norm();
        if !range_m.is_normal() {
            return None;
        }

        Some(Self {
            pseudo_range_m: pseudo_range.value,
            position: state.position,
            range_m,
            los: delta / range_m,
            elevation_deg: elevation_deg(rx, &state.position),
            sat_clock_m: sat_clock * SPEED_OF_LIGHT_M_S,
        })
    }
}
