use crate::constants::SPEED_OF_LIGHT_M_S;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// GPS carrier frequencies
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Carrier {
    /// L1 (GPS/QZSS/SBAS)
    #[default]
    L1,
    /// L2 (GPS/QZSS)
    L2,
    /// L5 (GPS/QZSS/SBAS)
    L5,
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::L1 => write!(f, "L1"),
            Self::L2 => write!(f, "L2"),
            Self::L5 => write!(f, "L5"),
        }
    }
}

impl Carrier {
    /// Carrier frequency in Hz
    pub fn frequency(&self) -> f64 {
        match self {
            Self::L1 => 1575.42E6_f64,
            Self::L2 => 1227.60E6_f64,
            Self::L5 => 1176.45E6_f64,
        }
    }

    /// Carrier wavelength in meters
    pub fn wavelength(&self) -> f64 {
        SPEED_OF_LIGHT_M_S / self.frequency()
    }
}
