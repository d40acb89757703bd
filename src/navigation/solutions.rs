//! Position solutions
use nalgebra::Vector3;

use crate::{coords::ecef_to_geodetic, prelude::Epoch};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position solution, formed at one epoch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Solution {
    /// GPST [Epoch] of this solution
    pub epoch: Epoch,
    /// GPS time of week (s)
    pub tow: f64,
    /// Position in meters ECEF
    pub pos_m: (f64, f64, f64),
    /// Receiver clock bias, expressed in meters
    pub clock_bias_m: f64,
    /// Possible accuracy indication (m): 3D standard deviation
    /// when the estimator provides one
    pub accuracy_m: Option<f64>,
    /// Zenith troposphere delay (m), when estimated
    pub zenith_tropo_m: Option<f64>,
    /// False when the solver ran out of iterations prior converging.
    /// The last estimate is still reported.
    pub converged: bool,
    /// Number of iterations
    pub iterations: usize,
    /// Satellites (PRN) that contributed
    pub satellites: Vec<u8>,
}

impl Solution {
    /// Position as ECEF vector
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.pos_m.0, self.pos_m.1, self.pos_m.2)
    }

    /// Receiver clock bias, in seconds
    pub fn clock_bias_s(&self) -> f64 {
        self.clock_bias_m / crate::constants::SPEED_OF_LIGHT_M_S
    }

    /// WGS84 latitude (rad), longitude (rad) and height (m)
    pub fn geodetic(&self) -> (f64, f64, f64) {
        ecef_to_geodetic(&self.position())
    }
}

/// Outcome of one epoch resolution
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PositionResult {
    Success(Solution),
    Error {
        /// GPS time of week (s) of the epoch we failed to resolve
        tow: f64,
        message: String,
    },
}

impl PositionResult {
    /// Creates a [PositionResult::Error]
    pub fn error(tow: f64, message: impl std::fmt::Display) -> Self {
        Self::Error {
            tow,
            message: message.to_string(),
        }
    }

    /// Returns [Solution] if this is a success
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            Self::Success(solution) => Some(solution),
            Self::Error { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Time of week of this result
    pub fn tow(&self) -> f64 {
        match self {
            Self::Success(solution) => solution.tow,
            Self::Error { tow, .. } => *tow,
        }
    }
}
