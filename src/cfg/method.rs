use crate::error::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Solving method
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Method {
    /// Single Point Positioning is a code based navigation technique.
    /// Each epoch is resolved independently by iterative least squares,
    /// using the ionosphere free pseudo range whenever a dual
    /// frequency pair was tracked. Expect metric accuracy.
    #[default]
    SPP,

    /// Precise Point Positioning, uses both dual frequency code and phase.
    /// Epochs are resolved sequentially by a Kalman filter that estimates
    /// the zenith troposphere delay and one float ambiguity per satellite,
    /// seeded by [Method::SPP]. Accuracy improves as the filter converges.
    PPP,
}

impl std::fmt::Display for Method {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::SPP => write!(fmt, "SPP"),
            Self::PPP => write!(fmt, "PPP"),
        }
    }
}

impl std::str::FromStr for Method {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spp" => Ok(Self::SPP),
            "ppp" => Ok(Self::PPP),
            _ => Err(Error::UnknownNavigationMethod),
        }
    }
}
