#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod bias;
mod carrier;
mod cfg;
mod constants;
mod coords;
mod ephemeris;
mod epoch;
mod error;
mod navigation;
mod observation;
mod signal;

pub mod pipeline;
pub mod rtcm;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::bias::{gmf_mapping, saastamoinen_delay_m, Meteo};
    pub use crate::carrier::Carrier;
    pub use crate::cfg::{Config, FilterOpts, Method, PipelineOpts, SolverOpts};
    pub use crate::coords::{azimuth_deg, ecef_to_geodetic, elevation_deg, enu, geodetic_to_ecef};
    pub use crate::ephemeris::{select_nearest, Ephemeris, EphemerisSource, SatelliteState};
    pub use crate::epoch::{group, pair, pair_one, ContinuationMerger, EpochData, SatelliteDatum};
    pub use crate::navigation::{
        KalmanState, Matrix, Navigator, PPPEstimator, PositionResult, SPPSolver, Solution,
    };
    pub use crate::observation::{if_combination, if_wavelength, Combination, ObservationSet};
    pub use crate::pipeline::{
        Broadcast, BufferSource, ByteSource, EphemerisStore, MemoryStore, NtripClient,
        ObservationStore, Pipeline, Processor, Subscriber,
    };
    pub use crate::rtcm::{
        bits::BitReader,
        framer::{FrameSync, FramerStats},
        msm7::{Msm7, Msm7Cell, Msm7Header, Msm7Satellite},
        station::StationCoordinates,
        Message, RawMessage,
    };
    pub use crate::signal::SignalType;
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
    pub use nalgebra::Vector3;
}

// pub export
pub use error::Error;
