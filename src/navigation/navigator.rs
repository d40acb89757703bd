//! Epoch resolution: ephemeris pairing, then SPP and optional PPP
use log::debug;

use crate::{
    cfg::{Config, Method},
    ephemeris::EphemerisSource,
    epoch::{pair, EpochData},
    navigation::{PPPEstimator, PositionResult, SPPSolver},
    observation::ObservationSet,
};

/// [Navigator] resolves one position per epoch of observations,
/// using the navigation [Method] defined in [Config].
#[derive(Debug, Clone)]
pub struct Navigator {
    cfg: Config,
    spp: SPPSolver,
    ppp: Option<PPPEstimator>,
}

impl Navigator {
    /// Builds a new [Navigator]
    pub fn new(cfg: &Config) -> Self {
        Self {
            cfg: cfg.clone(),
            spp: SPPSolver::new(cfg),
            ppp: match cfg.method {
                Method::PPP => Some(PPPEstimator::new(cfg)),
                Method::SPP => None,
            },
        }
    }

    /// [Config] currently in use
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Defines the a-priori position (m ECEF) the least squares
    /// iteration starts from. Filter state is preserved.
    pub fn set_apriori_ecef_m(&mut self, apriori: (f64, f64, f64)) {
        self.cfg = self.cfg.with_apriori_ecef_m(apriori);
        self.spp = SPPSolver::new(&self.cfg);
    }

    /// [PPPEstimator], when using [Method::PPP]
    pub fn ppp(&self) -> Option<&PPPEstimator> {
        self.ppp.as_ref()
    }

    /// Pairs these observations (sharing the same time of week) with the
    /// ephemeris source, then resolves the epoch.
    pub fn resolve_observations<E: EphemerisSource + ?Sized>(
        &mut self,
        tow: f64,
        observations: &[ObservationSet],
        source: &E,
    ) -> PositionResult {
        let satellites = pair(observations, source);
        debug!(
            "tow={:.3} - paired {}/{} satellites",
            tow,
            satellites.len(),
            observations.len()
        );
        self.resolve(&EpochData::new(tow, satellites))
    }

    /// Resolves this [EpochData]. SPP always runs, and seeds the
    /// filter when navigating with [Method::PPP].
    pub fn resolve(&mut self, epoch: &EpochData) -> PositionResult {
        let spp = self.spp.resolve(epoch);
        match (&mut self.ppp, &spp) {
            (Some(ppp), PositionResult::Success(solution)) => ppp.run(epoch, solution),
            _ => spp,
        }
    }
}
