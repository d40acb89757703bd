use crate::{
    error::Error,
    navigation::SatelliteGeometry,
    prelude::{Config, EpochData, Navigator, PPPEstimator, PositionResult, SPPSolver, Vector3},
    tests::{
        init_logger, paired_epoch, ppp_observations, reference_constellation, reference_position,
        REFERENCE_TOW,
    },
};

const ZENITH_DELAY_M: f64 = 2.4;

const AMBIGUITY_CYCLES: f64 = 1234.0;

/// PPP epoch, `dt` seconds past the reference time
fn ppp_epoch(dt: f64, num_sv: usize) -> EpochData {
    let tow = REFERENCE_TOW + dt;
    let rx = reference_position();
    let ephemerides = reference_constellation(REFERENCE_TOW)
        .into_iter()
        .take(num_sv)
        .collect::<Vec<_>>();
    let observations = ppp_observations(&ephemerides, &rx, tow, ZENITH_DELAY_M, AMBIGUITY_CYCLES);
    paired_epoch(tow, &ephemerides, observations)
}

fn position_error(result: &PositionResult) -> f64 {
    let solution = result.solution().unwrap();
    (solution.position() - reference_position()).norm()
}

#[test]
fn filter_initialization() {
    init_logger();
    let cfg = Config::static_ppp_preset();
    let epoch = ppp_epoch(0.0, 6);

    let spp = SPPSolver::new(&cfg).solve(&epoch).unwrap();

    let mut ppp = PPPEstimator::new(&cfg);
    assert!(!ppp.is_initialized());
    assert!(matches!(ppp.predict(), Err(Error::UninitializedFilter)));
    assert!(matches!(ppp.update(&epoch), Err(Error::UninitializedFilter)));

    ppp.initialize(&epoch, &spp).unwrap();

    let state = ppp.state().unwrap();
    assert_eq!(state.len(), 5 + 6);
    assert_eq!(state.prns, vec![1, 3, 7, 11, 17, 24]);
    assert_eq!(ppp.tracked(), &[1, 3, 7, 11, 17, 24]);
    assert_eq!(state.zenith_tropo_m(), cfg.filter.initial_tropo_m);
    assert_eq!(state.position(), spp.position());

    // initial ambiguities absorb the slant troposphere delay (up to 40 cycles)
    for prn in state.prns.iter() {
        let expected = AMBIGUITY_CYCLES + *prn as f64;
        let ambiguity = state.ambiguity(*prn).unwrap();
        assert!(
            (ambiguity - expected).abs() < 60.0,
            "G{:02} ambiguity={} expected={}",
            prn,
            ambiguity,
            expected
        );
    }
    assert!(state.ambiguity(2).is_none());

    let sigma = (3.0 * cfg.filter.initial_position_var).sqrt();
    assert!((state.position_sigma_m() - sigma).abs() < 1.0E-9);
}

#[test]
fn prediction_inflates_covariance() {
    init_logger();
    let cfg = Config::static_ppp_preset();
    let epoch = ppp_epoch(0.0, 6);
    let spp = SPPSolver::new(&cfg).solve(&epoch).unwrap();

    let mut ppp = PPPEstimator::new(&cfg);
    ppp.initialize(&epoch, &spp).unwrap();

    let before = ppp.state().unwrap().clone();
    ppp.predict().unwrap();
    let after = ppp.state().unwrap();

    assert_eq!(after.x, before.x);
    let (p0, p1) = (before.p.diagonal(), after.p.diagonal());
    assert!((p1[0] - p0[0] - cfg.filter.position_noise).abs() < 1.0E-12);
    assert!((p1[3] - p0[3] - cfg.filter.clock_noise).abs() < 1.0E-9);
    assert!((p1[4] - p0[4] - cfg.filter.tropo_noise).abs() < 1.0E-12);
    assert!((p1[5] - p0[5] - cfg.filter.ambiguity_noise).abs() < 1.0E-12);
}

#[test]
fn update_reduces_uncertainty() {
    init_logger();
    let cfg = Config::static_ppp_preset();
    let epoch = ppp_epoch(0.0, 6);
    let spp = SPPSolver::new(&cfg).solve(&epoch).unwrap();

    let mut ppp = PPPEstimator::new(&cfg);
    ppp.initialize(&epoch, &spp).unwrap();
    let sigma = ppp.state().unwrap().position_sigma_m();

    ppp.update(&epoch).unwrap();
    let state = ppp.state().unwrap();

    assert!(state.position_sigma_m() < sigma);
    assert!(state.x.is_finite());
}

#[test]
fn static_convergence() {
    init_logger();
    let cfg = Config::static_ppp_preset();
    let mut navigator = Navigator::new(&cfg);

    let mut results = Vec::new();
    for i in 0..20 {
        results.push(navigator.resolve(&ppp_epoch(i as f64, 6)));
    }

    for result in results.iter() {
        let solution = result.solution().unwrap();
        assert_eq!(solution.satellites.len(), 6);
        assert!(solution.accuracy_m.is_some());
        assert!(solution.zenith_tropo_m.is_some());
        assert_eq!(solution.iterations, 1);
    }

    let last = results.last().unwrap();
    let error = position_error(last);
    assert!(error < 1.0, "3d error={}m", error);

    let solution = last.solution().unwrap();
    let ztd = solution.zenith_tropo_m.unwrap();
    assert!((ztd - ZENITH_DELAY_M).abs() < 0.5, "ztd={}", ztd);

    // formal accuracy keeps decreasing
    let first = results[0].solution().unwrap().accuracy_m.unwrap();
    let last = solution.accuracy_m.unwrap();
    assert!(last < first, "sigma: {} -> {}", first, last);

    let state = navigator.ppp().unwrap().state().unwrap();
    assert_eq!(state.len(), 11);
}

#[test]
fn satellite_set_change() {
    init_logger();
    let cfg = Config::static_ppp_preset();
    let mut navigator = Navigator::new(&cfg);

    for i in 0..3 {
        assert!(navigator.resolve(&ppp_epoch(i as f64, 6)).is_success());
    }
    assert_eq!(navigator.ppp().unwrap().tracked(), &[1, 3, 7, 11, 17, 24]);

    // G24 is lost: the filter starts over with 5 satellites
    let result = navigator.resolve(&ppp_epoch(3.0, 5));
    assert!(result.is_success());

    let state = navigator.ppp().unwrap().state().unwrap();
    assert_eq!(state.prns, vec![1, 3, 7, 11, 17]);
    assert_eq!(state.len(), 10);
    assert!(state.ambiguity(24).is_none());
}

#[test]
fn missing_phase() {
    init_logger();
    let cfg = Config::static_ppp_preset();
    let mut epoch = ppp_epoch(0.0, 6);

    // G24 loses phase tracking: excluded from the filter
    for phase in epoch.satellites[5].observations.phase_ranges.iter_mut() {
        *phase = None;
    }

    let mut navigator = Navigator::new(&cfg);
    let result = navigator.resolve(&epoch);
    assert!(result.is_success());
    assert_eq!(navigator.ppp().unwrap().tracked(), &[1, 3, 7, 11, 17]);
}

#[test]
fn not_enough_satellites() {
    init_logger();
    let cfg = Config::static_ppp_preset();
    let mut navigator = Navigator::new(&cfg);

    match navigator.resolve(&ppp_epoch(0.0, 3)) {
        PositionResult::Error { message, .. } => {
            assert_eq!(message, "insufficient satellites: 3");
        },
        PositionResult::Success(_) => panic!("should have failed"),
    }
    assert!(!navigator.ppp().unwrap().is_initialized());

    // 4 satellites with code, but only 3 with phase
    let mut epoch = ppp_epoch(0.0, 4);
    for phase in epoch.satellites[0].observations.phase_ranges.iter_mut() {
        *phase = None;
    }

    let spp = SPPSolver::new(&cfg).solve(&epoch).unwrap();
    let mut ppp = PPPEstimator::new(&cfg);
    assert!(matches!(
        ppp.initialize(&epoch, &spp),
        Err(Error::NotEnoughSatellites(3))
    ));

    match ppp.run(&epoch, &spp) {
        PositionResult::Error { tow, .. } => assert_eq!(tow, REFERENCE_TOW),
        PositionResult::Success(_) => panic!("should have failed"),
    }
    assert!(!ppp.is_initialized());
}

#[test]
fn reset() {
    init_logger();
    let cfg = Config::static_ppp_preset();
    let epoch = ppp_epoch(0.0, 6);
    let spp = SPPSolver::new(&cfg).solve(&epoch).unwrap();

    let mut ppp = PPPEstimator::new(&cfg);
    assert!(ppp.run(&epoch, &spp).is_success());
    assert!(ppp.is_initialized());

    ppp.reset();
    assert!(!ppp.is_initialized());
    assert!(ppp.tracked().is_empty());

    let result = ppp.run(&epoch, &spp);
    let solution = result.solution().unwrap();
    assert_eq!(solution.tow, REFERENCE_TOW);
    assert_eq!(solution.epoch, spp.epoch);
    assert!((solution.position() - Vector3::new(0.0, 0.0, 0.0)).norm() > 6.0E6);
}

/// Elevation (degrees) of this satellite, seen from this position
fn elevation_from(epoch: &EpochData, prn: u8, rx: &Vector3<f64>) -> f64 {
    let sat = epoch.satellites.iter().find(|sat| sat.prn == prn).unwrap();
    SatelliteGeometry::resolve(sat, epoch.tow, rx, 0.0)
        .unwrap()
        .elevation_deg
}

fn visible_from(epoch: &EpochData, rx: &Vector3<f64>, mask_deg: f64) -> Vec<u8> {
    epoch
        .prns()
        .into_iter()
        .filter(|prn| elevation_from(epoch, *prn, rx) >= mask_deg)
        .collect()
}

#[test]
fn tracked_set_follows_filter_position() {
    init_logger();
    let truth = reference_position();
    let epoch = ppp_epoch(0.0, 6);

    // 100 km away, towards G03: G03 rises above the mask there only
    let g03 = epoch.satellites.iter().find(|sat| sat.prn == 3).unwrap();
    let towards = SatelliteGeometry::resolve(g03, epoch.tow, &truth, 0.0)
        .unwrap()
        .position
        - truth;
    let up = truth.normalize();
    let horizontal = (towards - up * towards.dot(&up)).normalize();
    let shifted = truth + horizontal * 100.0E3;

    let mut cfg = Config::static_ppp_preset();
    cfg.filter.min_sv_elev_deg =
        (elevation_from(&epoch, 3, &truth) + elevation_from(&epoch, 3, &shifted)) / 2.0;

    // uninformative priors: the first update moves the filter onto the code solution
    cfg.filter.initial_position_var = 1.0E12;
    cfg.filter.initial_clock_var = 1.0E12;
    cfg.filter.initial_ambiguity_var = 1.0E14;

    let mask = cfg.filter.min_sv_elev_deg;
    let from_shifted = visible_from(&epoch, &shifted, mask);
    assert!(from_shifted.contains(&3));
    assert!(from_shifted.len() >= 4, "{:?}", from_shifted);
    assert!(!visible_from(&epoch, &truth, mask).contains(&3));

    let mut spp = SPPSolver::new(&Config::default()).solve(&epoch).unwrap();
    spp.pos_m = (shifted[0], shifted[1], shifted[2]);

    let mut ppp = PPPEstimator::new(&cfg);
    assert!(ppp.run(&epoch, &spp).is_success());
    assert_eq!(ppp.tracked(), from_shifted.as_slice());

    let filter = ppp.state().unwrap().position();
    assert!((filter - truth).norm() < 5.0E3, "filter error={}m", (filter - truth).norm());
    assert!(!visible_from(&epoch, &filter, mask).contains(&3));

    // G03 sank below the mask at the filter position: the filter is
    // seeded again, rather than failing on a satellite it can no longer use
    let next = ppp_epoch(1.0, 6);
    let result = ppp.run(&next, &spp);
    assert!(result.is_success(), "{:?}", result);
    assert_eq!(ppp.tracked(), from_shifted.as_slice());
}
