//! Float PPP: extended Kalman filter over position, clock,
//! zenith troposphere delay and one ambiguity per satellite.
use log::{debug, info, warn};
use nalgebra::Vector3;

use crate::{
    bias::gmf_mapping,
    cfg::{Config, FilterOpts},
    epoch::EpochData,
    error::Error,
    navigation::{matrix::Matrix, SatelliteGeometry, Solution},
    prelude::PositionResult,
};

/// Position, clock and troposphere states
const BASE_STATES: usize = 5;

/// Minimal number of tracked satellites
const MIN_SV: usize = 4;

/// Filter state: estimate and covariance
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanState {
    /// [X, Y, Z, clock (m), zenith tropo (m), N1 .. Nk (cycles)]
    pub x: Matrix,
    /// Covariance
    pub p: Matrix,
    /// PRN of the satellite each ambiguity state refers to
    pub prns: Vec<u8>,
}

impl KalmanState {
    /// Number of states
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver position estimate (m ECEF)
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x[(0, 0)], self.x[(1, 0)], self.x[(2, 0)])
    }

    /// Receiver clock bias estimate (m)
    pub fn clock_bias_m(&self) -> f64 {
        self.x[(3, 0)]
    }

    /// Zenith troposphere delay estimate (m)
    pub fn zenith_tropo_m(&self) -> f64 {
        self.x[(4, 0)]
    }

    /// Ambiguity estimate (cycles) of this satellite
    pub fn ambiguity(&self, prn: u8) -> Option<f64> {
        let index = self.prns.iter().position(|p| *p == prn)?;
        Some(self.x[(BASE_STATES + index, 0)])
    }

    /// 3D position standard deviation (m)
    pub fn position_sigma_m(&self) -> f64 {
        (self.p[(0, 0)] + self.p[(1, 1)] + self.p[(2, 2)]).sqrt()
    }
}

/// Satellite contribution to one filter update
struct Measurement {
    geometry: SatelliteGeometry,
    phase_range_m: f64,
    wavelength_m: f64,
    mapping: f64,
}

/// Precise point position estimator. The estimator is static: state
/// transition is identity, process noise is added at every prediction.
/// Whenever the set of usable satellites changes, the filter is reset
/// and seeded again from the SPP solution of that epoch.
#[derive(Debug, Clone)]
pub struct PPPEstimator {
    opts: FilterOpts,
    state: Option<KalmanState>,
}

impl PPPEstimator {
    /// Builds a new (uninitialized) [PPPEstimator]
    pub fn new(cfg: &Config) -> Self {
        Self {
            opts: cfg.filter,
            state: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Current [KalmanState], once initialized
    pub fn state(&self) -> Option<&KalmanState> {
        self.state.as_ref()
    }

    /// Satellites currently tracked by the filter
    pub fn tracked(&self) -> &[u8] {
        self.state
            .as_ref()
            .map(|state| state.prns.as_slice())
            .unwrap_or_default()
    }

    /// Resets this filter. Next epoch will initialize it again.
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Gathers satellites that may contribute, linearized at this position.
    /// Satellites without phase, or below the elevation mask, are dismissed.
    fn measurements(
        &self,
        epoch: &EpochData,
        rx: &Vector3<f64>,
        clock_bias_m: f64,
    ) -> Vec<(u8, Measurement)> {
        epoch
            .satellites
            .iter()
            .filter_map(|sat| {
                let geometry = SatelliteGeometry::resolve(sat, epoch.tow, rx, clock_bias_m)?;

                if geometry.elevation_deg < self.opts.min_sv_elev_deg {
                    debug!(
                        "tow={:.3} G{:02} - ppp: below elevation mask ({:.1}°)",
                        epoch.tow, sat.prn, geometry.elevation_deg
                    );
                    return None;
                }

                let phase = sat.observations.if_phase_range();
                let wavelength = sat.observations.if_wavelength();

                match (phase, wavelength) {
                    (Some(phase), Some(wavelength_m)) => {
                        let (mapping, _) = gmf_mapping(geometry.elevation_deg);
                        Some((
                            sat.prn,
                            Measurement {
                                geometry,
                                phase_range_m: phase.value,
                                wavelength_m,
                                mapping,
                            },
                        ))
                    },
                    _ => {
                        debug!("tow={:.3} G{:02} - ppp: no phase range", epoch.tow, sat.prn);
                        None
                    },
                }
            })
            .collect()
    }

    /// Initializes the filter from this SPP [Solution]. Each ambiguity
    /// is seeded from the difference between phase and modeled range.
    pub fn initialize(&mut self, epoch: &EpochData, spp: &Solution) -> Result<(), Error> {
        let measurements = self.measurements(epoch, &spp.position(), spp.clock_bias_m);
        self.initialize_with(epoch.tow, spp, &measurements)
    }

    /// Initializes the filter from these measurements, linearized at the SPP position
    fn initialize_with(
        &mut self,
        tow: f64,
        spp: &Solution,
        measurements: &[(u8, Measurement)],
    ) -> Result<(), Error> {
        let rx = spp.position();

        if measurements.len() < MIN_SV {
            return Err(Error::NotEnoughSatellites(measurements.len()));
        }

        let mut x = vec![
            rx[0],
            rx[1],
            rx[2],
            spp.clock_bias_m,
            self.opts.initial_tropo_m,
        ];

        let mut diagonal = vec![
            self.opts.initial_position_var,
            self.opts.initial_position_var,
            self.opts.initial_position_var,
            self.opts.initial_clock_var,
            self.opts.initial_tropo_var,
        ];

        let mut prns = Vec::with_capacity(measurements.len());

        for (prn, meas) in measurements.iter() {
            let ambiguity = (meas.phase_range_m - meas.geometry.range_m - spp.clock_bias_m
                + meas.geometry.sat_clock_m)
                / meas.wavelength_m;

            debug!(
                "tow={:.3} G{:02} - ppp: initial ambiguity {:.3} cycles",
                tow, prn, ambiguity
            );

            x.push(ambiguity);
            diagonal.push(self.opts.initial_ambiguity_var);
            prns.push(*prn);
        }

        info!(
            "tow={:.3} - ppp: filter initialized with {} satellites",
            tow,
            prns.len()
        );

        self.state = Some(KalmanState {
            x: Matrix::column(&x),
            p: Matrix::from_diagonal(&diagonal),
            prns,
        });

        Ok(())
    }

    /// Prediction step: x is unchanged (static model), P = P + Q
    pub fn predict(&mut self) -> Result<(), Error> {
        let state = self.state.as_mut().ok_or(Error::UninitializedFilter)?;

        let mut noise = vec![
            self.opts.position_noise,
            self.opts.position_noise,
            self.opts.position_noise,
            self.opts.clock_noise,
            self.opts.tropo_noise,
        ];

        noise.resize(state.len(), self.opts.ambiguity_noise);

        state.p = state.p.add(&Matrix::from_diagonal(&noise))?;
        Ok(())
    }

    /// Measurement update with this epoch's code and phase observations,
    /// linearized at the current state.
    pub fn update(&mut self, epoch: &EpochData) -> Result<(), Error> {
        let state = self.state.as_ref().ok_or(Error::UninitializedFilter)?;
        let measurements = self.measurements(epoch, &state.position(), state.clock_bias_m());
        self.update_with(&measurements)
    }

    /// Measurement update, from measurements linearized at the current state
    fn update_with(&mut self, measurements: &[(u8, Measurement)]) -> Result<(), Error> {
        let state = self.state.as_ref().ok_or(Error::UninitializedFilter)?;

        let clock_bias_m = state.clock_bias_m();
        let ztd = state.zenith_tropo_m();
        let n = state.len();

        let mut rows = Vec::<Vec<f64>>::with_capacity(2 * state.prns.len());
        let mut innovations = Vec::<f64>::with_capacity(2 * state.prns.len());
        let mut variances = Vec::<f64>::with_capacity(2 * state.prns.len());

        for (index, prn) in state.prns.iter().enumerate() {
            let meas = match measurements.iter().find(|(p, _)| p == prn) {
                Some((_, meas)) => meas,
                None => return Err(Error::PhaseRangeCombination),
            };

            let geometry = &meas.geometry;
            let ambiguity = state.x[(BASE_STATES + index, 0)];

            let modeled =
                geometry.range_m + clock_bias_m - geometry.sat_clock_m + ztd * meas.mapping;

            // code
            let mut row = vec![0.0; n];
            row[0] = geometry.los[0];
            row[1] = geometry.los[1];
            row[2] = geometry.los[2];
            row[3] = 1.0;
            row[4] = meas.mapping;

            innovations.push(geometry.pseudo_range_m - modeled);
            variances.push(self.opts.code_sigma_m.powi(2));
            rows.push(row.clone());

            // phase
            row[BASE_STATES + index] = meas.wavelength_m;

            innovations.push(meas.phase_range_m - (modeled + ambiguity * meas.wavelength_m));
            variances.push(self.opts.phase_sigma_m.powi(2));
            rows.push(row);
        }

        let h = Matrix::from_rows(&rows)?;
        let y = Matrix::column(&innovations);
        let r = Matrix::from_diagonal(&variances);

        let ht = h.transpose();
        let p_ht = state.p.mul(&ht)?;

        let s = h.mul(&p_ht)?.add(&r)?;
        let k = p_ht.mul(&s.inverse()?)?;

        let x = state.x.add(&k.mul(&y)?)?;
        let p = Matrix::identity(n).sub(&k.mul(&h)?)?.mul(&state.p)?;

        if !x.is_finite() {
            return Err(Error::MatrixInversion);
        }

        let prns = state.prns.clone();
        self.state = Some(KalmanState { x, p, prns });
        Ok(())
    }

    /// Runs the filter on this epoch, using this SPP [Solution]
    /// for initialization and reinitialization.
    pub fn run(&mut self, epoch: &EpochData, spp: &Solution) -> PositionResult {
        match self.try_run(epoch, spp) {
            Ok(solution) => PositionResult::Success(solution),
            Err(e) => {
                warn!("tow={:.3} - ppp failure: {}", epoch.tow, e);
                self.reset();
                PositionResult::error(epoch.tow, e)
            },
        }
    }

    fn try_run(&mut self, epoch: &EpochData, spp: &Solution) -> Result<Solution, Error> {
        // usable satellites are selected from the very measurements
        // the update runs on: linearized at the filter state when there is one
        let mut measurements = match &self.state {
            Some(state) => self.measurements(epoch, &state.position(), state.clock_bias_m()),
            None => self.measurements(epoch, &spp.position(), spp.clock_bias_m),
        };

        let usable = measurements.iter().map(|(prn, _)| *prn).collect::<Vec<_>>();

        match &self.state {
            Some(state) if state.prns == usable => {
                self.predict()?;
            },
            Some(state) => {
                info!(
                    "tow={:.3} - ppp: satellite set changed {:?} -> {:?}, reset",
                    epoch.tow, state.prns, usable
                );
                measurements = self.measurements(epoch, &spp.position(), spp.clock_bias_m);
                self.initialize_with(epoch.tow, spp, &measurements)?;
            },
            None => {
                self.initialize_with(epoch.tow, spp, &measurements)?;
            },
        }

        self.update_with(&measurements)?;

        let state = self.state.as_ref().ok_or(Error::UninitializedFilter)?;
        let position = state.position();

        debug!(
            "tow={:.3} - ppp x={:.3} y={:.3} z={:.3} ztd={:.3} sigma={:.3}",
            epoch.tow,
            position[0],
            position[1],
            position[2],
            state.zenith_tropo_m(),
            state.position_sigma_m()
        );

        Ok(Solution {
            epoch: spp.epoch,
            tow: epoch.tow,
            pos_m: (position[0], position[1], position[2]),
            clock_bias_m: state.clock_bias_m(),
            accuracy_m: Some(state.position_sigma_m()),
            zenith_tropo_m: Some(state.zenith_tropo_m()),
            converged: spp.converged,
            iterations: 1,
            satellites: state.prns.clone(),
        })
    }
}
