//! Single point positioning: iterative least squares
use log::{debug, info, warn};
use nalgebra::Vector3;

use crate::{
    bias::saastamoinen_delay_m,
    cfg::Config,
    epoch::EpochData,
    error::Error,
    navigation::{gpst_epoch, matrix::Matrix, SatelliteGeometry, Solution},
    prelude::PositionResult,
};

/// Elevation (degrees) the troposphere model is evaluated at, while
/// the receiver position is still too coarse for elevation to make sense.
const COARSE_ELEVATION_DEG: f64 = 15.0;

/// Single point position solver, using the ionosphere free
/// pseudo range of each satellite.
#[derive(Debug, Clone)]
pub struct SPPSolver {
    cfg: Config,
}

impl SPPSolver {
    /// Builds a new [SPPSolver]
    pub fn new(cfg: &Config) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Resolves this [EpochData]. Never panics: failures
    /// are reported as [PositionResult::Error].
    pub fn resolve(&self, epoch: &EpochData) -> PositionResult {
        match self.solve(epoch) {
            Ok(solution) => PositionResult::Success(solution),
            Err(e) => {
                warn!("tow={:.3} - spp failure: {}", epoch.tow, e);
                PositionResult::error(epoch.tow, e)
            },
        }
    }

    /// Resolves this [EpochData], returning [Solution] or [Error].
    pub fn solve(&self, epoch: &EpochData) -> Result<Solution, Error> {
        let opts = &self.cfg.solver;

        if epoch.len() < opts.min_sv {
            return Err(Error::NotEnoughSatellites(epoch.len()));
        }

        let (x0, y0, z0) = self.cfg.apriori_ecef_m.unwrap_or((1.0, 1.0, 1.0));
        let mut state = [x0, y0, z0, 0.0];

        let mut converged = false;
        let mut iterations = 0;
        let mut satellites = Vec::<u8>::with_capacity(epoch.len());

        for iteration in 1..=opts.max_iterations {
            iterations = iteration;
            let apply_masks = iteration > opts.mask_after_iterations;

            let rx = Vector3::new(state[0], state[1], state[2]);
            let clock_m = state[3];

            let mut rows = Vec::<Vec<f64>>::with_capacity(epoch.len());
            let mut residuals = Vec::<f64>::with_capacity(epoch.len());
            satellites.clear();

            for sat in epoch.satellites.iter() {
                let geometry = match SatelliteGeometry::resolve(sat, epoch.tow, &rx, clock_m) {
                    Some(geometry) => geometry,
                    None => {
                        debug!("tow={:.3} G{:02} - no pseudo range", epoch.tow, sat.prn);
                        continue;
                    },
                };

                let elevation = if apply_masks {
                    let cnr = sat.observations.cnr().unwrap_or_default();
                    if geometry.elevation_deg < opts.min_sv_elev_deg {
                        debug!(
                            "tow={:.3} G{:02} - below elevation mask ({:.1}°)",
                            epoch.tow, sat.prn, geometry.elevation_deg
                        );
                        continue;
                    }
                    if cnr < opts.min_cnr_dbhz {
                        debug!(
                            "tow={:.3} G{:02} - below cnr mask ({:.1} dB.Hz)",
                            epoch.tow, sat.prn, cnr
                        );
                        continue;
                    }
                    geometry.elevation_deg
                } else {
                    COARSE_ELEVATION_DEG
                };

                let tropo = saastamoinen_delay_m(elevation, &self.cfg.meteo);

                let predicted = geometry.range_m + clock_m - geometry.sat_clock_m + tropo;

                rows.push(vec![
                    geometry.los[0],
                    geometry.los[1],
                    geometry.los[2],
                    1.0,
                ]);
                residuals.push(geometry.pseudo_range_m - predicted);
                satellites.push(sat.prn);
            }

            if rows.len() < opts.min_sv {
                return Err(Error::NotEnoughSatellites(rows.len()));
            }

            // unweighted normal equations
            let a = Matrix::from_rows(&rows)?;
            let l = Matrix::column(&residuals);
            let at = a.transpose();
            let n_inv = at.mul(&a)?.cholesky_inverse()?;
            let dx = n_inv.mul(&at.mul(&l)?)?;

            for (i, value) in state.iter_mut().enumerate() {
                *value += dx[(i, 0)];
            }

            let norm = dx.norm();
            debug!(
                "tow={:.3} - iter={} nsat={} |dx|={:.6E}",
                epoch.tow,
                iteration,
                satellites.len(),
                norm
            );

            if !norm.is_finite() {
                return Err(Error::MatrixInversion);
            }

            // a fix is only accepted once masks did apply
            if apply_masks && norm < opts.convergence_m {
                converged = true;
                break;
            }
        }

        if converged {
            info!(
                "tow={:.3} - spp x={:.3} y={:.3} z={:.3} clk={:.3}m ({} iter)",
                epoch.tow, state[0], state[1], state[2], state[3], iterations
            );
        } else {
            warn!(
                "tow={:.3} - spp did not converge within {} iterations",
                epoch.tow, opts.max_iterations
            );
        }

        let week = epoch
            .satellites
            .first()
            .map(|sat| sat.ephemeris.week)
            .unwrap_or_default();

        Ok(Solution {
            epoch: gpst_epoch(week, epoch.tow),
            tow: epoch.tow,
            pos_m: (state[0], state[1], state[2]),
            clock_bias_m: state[3],
            accuracy_m: None,
            zenith_tropo_m: None,
            converged,
            iterations,
            satellites,
        })
    }
}
