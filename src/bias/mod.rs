pub(crate) mod tropo;
pub use tropo::{gmf_mapping, saastamoinen_delay_m};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn default_pressure() -> f64 {
    1013.25
}

fn default_temperature() -> f64 {
    291.15
}

fn default_humidity() -> f64 {
    50.0
}

/// Surface meteorological conditions at the receiver site,
/// that the troposphere model relies on.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Meteo {
    /// Total pressure (hPa)
    #[cfg_attr(feature = "serde", serde(default = "default_pressure"))]
    pub pressure_hpa: f64,
    /// Temperature (K)
    #[cfg_attr(feature = "serde", serde(default = "default_temperature"))]
    pub temperature_k: f64,
    /// Relative humidity (%)
    #[cfg_attr(feature = "serde", serde(default = "default_humidity"))]
    pub humidity_percent: f64,
    /// Site height (m)
    #[cfg_attr(feature = "serde", serde(default))]
    pub height_m: f64,
}

impl Default for Meteo {
    fn default() -> Self {
        Self {
            pressure_hpa: default_pressure(),
            temperature_k: default_temperature(),
            humidity_percent: default_humidity(),
            height_m: 0.0,
        }
    }
}
