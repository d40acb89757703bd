//! GPS signal (tracking mode) identification
use crate::prelude::Carrier;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// GPS signal, as identified by the MSM signal mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SignalType {
    /// L1 C/A
    L1C,
    /// L1 P
    L1P,
    /// L1 Z-tracking
    L1W,
    /// L2 C/A
    L2C,
    /// L2 P
    L2P,
    /// L2 Z-tracking
    L2W,
    /// L2C (M)
    L2S,
    /// L2C (L)
    L2L,
    /// L2C (M+L)
    L2X,
    /// L5 I
    L5I,
    /// L5 Q
    L5Q,
    /// L5 I+Q
    L5X,
    /// L1C-D
    L1S,
    /// L1C-P
    L1L,
    /// L1C-D+P
    L1X,
    /// Reserved or undefined slot
    #[default]
    Unknown,
}

impl SignalType {
    /// Builds [SignalType] from 1-based RTCM signal mask slot
    pub fn from_rtcm_slot(slot: usize) -> Self {
        match slot {
            2 => Self::L1C,
            3 => Self::L1P,
            4 => Self::L1W,
            8 => Self::L2C,
            9 => Self::L2P,
            10 => Self::L2W,
            15 => Self::L2S,
            16 => Self::L2L,
            17 => Self::L2X,
            22 => Self::L5I,
            23 => Self::L5Q,
            24 => Self::L5X,
            30 => Self::L1S,
            31 => Self::L1L,
            32 => Self::L1X,
            _ => Self::Unknown,
        }
    }

    /// Returns 1-based RTCM signal mask slot, if this signal is defined
    pub fn rtcm_slot(&self) -> Option<usize> {
        match self {
            Self::L1C => Some(2),
            Self::L1P => Some(3),
            Self::L1W => Some(4),
            Self::L2C => Some(8),
            Self::L2P => Some(9),
            Self::L2W => Some(10),
            Self::L2S => Some(15),
            Self::L2L => Some(16),
            Self::L2X => Some(17),
            Self::L5I => Some(22),
            Self::L5Q => Some(23),
            Self::L5X => Some(24),
            Self::L1S => Some(30),
            Self::L1L => Some(31),
            Self::L1X => Some(32),
            Self::Unknown => None,
        }
    }

    /// [Carrier] this signal is modulated on
    pub fn carrier(&self) -> Option<Carrier> {
        match self {
            Self::L1C | Self::L1P | Self::L1W | Self::L1S | Self::L1L | Self::L1X => {
                Some(Carrier::L1)
            },
            Self::L2C | Self::L2P | Self::L2W | Self::L2S | Self::L2L | Self::L2X => {
                Some(Carrier::L2)
            },
            Self::L5I | Self::L5Q | Self::L5X => Some(Carrier::L5),
            Self::Unknown => None,
        }
    }

    /// Carrier wavelength in meters, zero for [SignalType::Unknown]
    pub fn wavelength(&self) -> f64 {
        self.carrier().map(|c| c.wavelength()).unwrap_or_default()
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            s => write!(f, "{:?}", s),
        }
    }
}
