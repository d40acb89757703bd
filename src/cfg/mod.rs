#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{bias::Meteo, constants::EPHEMERIS_VALIDITY_S, rtcm::framer::DEFAULT_BUFFER_SIZE};

mod method;
pub use method::Method;

const fn default_max_iterations() -> usize {
    20
}

const fn default_convergence_m() -> f64 {
    1.0E-4
}

const fn default_min_sv_elev() -> f64 {
    15.0
}

const fn default_min_cnr() -> f64 {
    36.0
}

const fn default_mask_after() -> usize {
    3
}

const fn default_min_sv() -> usize {
    4
}

/// Least squares (SPP) solver options
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverOpts {
    /// Maximal number of iterations
    #[cfg_attr(feature = "serde", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,
    /// Iteration stops once the state correction norm gets below this value (m)
    #[cfg_attr(feature = "serde", serde(default = "default_convergence_m"))]
    pub convergence_m: f64,
    /// Minimal elevation (degrees) for a satellite to contribute
    #[cfg_attr(feature = "serde", serde(default = "default_min_sv_elev"))]
    pub min_sv_elev_deg: f64,
    /// Minimal carrier to noise ratio (dB.Hz) for a satellite to contribute
    #[cfg_attr(feature = "serde", serde(default = "default_min_cnr"))]
    pub min_cnr_dbhz: f64,
    /// Elevation and CNR masks only apply past this many iterations,
    /// the initial position guess being too coarse for elevation to make sense
    #[cfg_attr(feature = "serde", serde(default = "default_mask_after"))]
    pub mask_after_iterations: usize,
    /// Minimal number of satellites
    #[cfg_attr(feature = "serde", serde(default = "default_min_sv"))]
    pub min_sv: usize,
}

impl Default for SolverOpts {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            convergence_m: default_convergence_m(),
            min_sv_elev_deg: default_min_sv_elev(),
            min_cnr_dbhz: default_min_cnr(),
            mask_after_iterations: default_mask_after(),
            min_sv: default_min_sv(),
        }
    }
}

const fn default_initial_tropo() -> f64 {
    2.3
}

/// Kalman filter (PPP) options. Variances are expressed in squared
/// state units: m² for position, clock and troposphere, cycles² for ambiguities.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterOpts {
    /// Initial zenith troposphere delay (m)
    pub initial_tropo_m: f64,
    /// Initial position variance
    pub initial_position_var: f64,
    /// Initial clock variance
    pub initial_clock_var: f64,
    /// Initial troposphere variance
    pub initial_tropo_var: f64,
    /// Initial ambiguity variance
    pub initial_ambiguity_var: f64,
    /// Position process noise, per epoch
    pub position_noise: f64,
    /// Clock process noise, per epoch
    pub clock_noise: f64,
    /// Troposphere process noise, per epoch
    pub tropo_noise: f64,
    /// Ambiguity process noise, per epoch
    pub ambiguity_noise: f64,
    /// Pseudo range (IF) measurement standard deviation (m)
    pub code_sigma_m: f64,
    /// Phase range (IF) measurement standard deviation (m)
    pub phase_sigma_m: f64,
    /// Minimal elevation (degrees) for a satellite to be tracked by the filter
    pub min_sv_elev_deg: f64,
}

impl Default for FilterOpts {
    fn default() -> Self {
        Self {
            initial_tropo_m: default_initial_tropo(),
            initial_position_var: 100.0,
            initial_clock_var: 1.0E4,
            initial_tropo_var: 0.25,
            initial_ambiguity_var: 1.0E4,
            position_noise: 1.0E-6,
            clock_noise: 1.0E4,
            tropo_noise: 1.0E-6,
            ambiguity_noise: 0.0,
            code_sigma_m: 3.0,
            phase_sigma_m: 0.03,
            min_sv_elev_deg: default_min_sv_elev(),
        }
    }
}

const fn default_replay_capacity() -> usize {
    300
}

const fn default_extra_capacity() -> usize {
    50
}

const fn default_framer_buffer() -> usize {
    DEFAULT_BUFFER_SIZE
}

const fn default_pairing_window() -> f64 {
    EPHEMERIS_VALIDITY_S
}

/// Stream processing options
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineOpts {
    /// Number of most recent items every broadcast channel retains
    #[cfg_attr(feature = "serde", serde(default = "default_replay_capacity"))]
    pub replay_capacity: usize,
    /// Additional room before oldest items get dropped
    #[cfg_attr(feature = "serde", serde(default = "default_extra_capacity"))]
    pub extra_capacity: usize,
    /// Frame synchronizer buffer size (bytes)
    #[cfg_attr(feature = "serde", serde(default = "default_framer_buffer"))]
    pub framer_buffer: usize,
    /// Maximal |tow - toc| for an ephemeris to be paired (s)
    #[cfg_attr(feature = "serde", serde(default = "default_pairing_window"))]
    pub pairing_window_s: f64,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            replay_capacity: default_replay_capacity(),
            extra_capacity: default_extra_capacity(),
            framer_buffer: default_framer_buffer(),
            pairing_window_s: default_pairing_window(),
        }
    }
}

impl PipelineOpts {
    /// Total broadcast capacity
    pub fn capacity(&self) -> usize {
        self.replay_capacity + self.extra_capacity
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Solver method (strategy) used.
    #[cfg_attr(feature = "serde", serde(default))]
    pub method: Method,
    /// Least squares options
    #[cfg_attr(feature = "serde", serde(default))]
    pub solver: SolverOpts,
    /// Kalman filter options, only used by [Method::PPP]
    #[cfg_attr(feature = "serde", serde(default))]
    pub filter: FilterOpts,
    /// Meteorological conditions for the troposphere model
    #[cfg_attr(feature = "serde", serde(default))]
    pub meteo: Meteo,
    /// Stream processing options
    #[cfg_attr(feature = "serde", serde(default))]
    pub pipeline: PipelineOpts,
    /// Possible a-priori receiver position, in meters ECEF.
    /// Speeds up SPP convergence when known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub apriori_ecef_m: Option<(f64, f64, f64)>,
}

impl Config {
    /// Returns [Config] for static PPP positioning.
    /// You can then customize [Self] as you will.
    pub fn static_ppp_preset() -> Self {
        let mut s = Self::default();
        s.method = Method::PPP;
        s
    }

    /// Copies and returns [Config] with desired [Method]
    pub fn with_method(&self, method: Method) -> Self {
        let mut s = self.clone();
        s.method = method;
        s
    }

    /// Copies and returns [Config] with a-priori position (m ECEF)
    pub fn with_apriori_ecef_m(&self, apriori: (f64, f64, f64)) -> Self {
        let mut s = self.clone();
        s.apriori_ecef_m = Some(apriori);
        s
    }
}
