use log::trace;
use nalgebra::{Rotation3, Vector3};

use crate::{
    constants::{
        EARTH_ANGULAR_VEL_RAD, EARTH_GRAVITATION_MU_M3_S2, RELATIVISTIC_F, SPEED_OF_LIGHT_M_S,
    },
    ephemeris::{wrap_week, Ephemeris},
};

/// Number of clock / transmission time refinements
const CLOCK_ITERATIONS: usize = 3;

/// Number of Kepler fixed point iterations
const KEPLER_ITERATIONS: usize = 5;

/// Satellite state at transmission time, resolved from [Ephemeris]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteState {
    /// Position in meters ECEF, expressed in the ECEF frame at reception time
    pub position: Vector3<f64>,
    /// Satellite clock bias (s), including the relativistic term
    pub clock_bias: f64,
    /// Signal transmission time, in seconds of week
    pub transmit_time: f64,
}

impl Ephemeris {
    /// Resolves [SatelliteState] for a signal received at this time of week
    /// (seconds, receiver clock corrected) with given pseudo range estimate (m).
    pub fn satellite_state(&self, receiver_tow: f64, pseudo_range_m: f64) -> SatelliteState {
        let travel = pseudo_range_m / SPEED_OF_LIGHT_M_S;
        let mut transmit_time = receiver_tow - travel;

        let mut clock_bias = 0.0;
        for _ in 0..CLOCK_ITERATIONS {
            clock_bias = self.clock_offset(wrap_week(transmit_time - self.toc));
            transmit_time = receiver_tow - travel - clock_bias;
        }

        let (position, e_k) = self.kepler_position(transmit_time);

        let relativistic = RELATIVISTIC_F * self.e * self.sqrt_a * e_k.sin();
        let clock_bias = clock_bias + relativistic;

        // earth rotation during signal flight
        let theta = EARTH_ANGULAR_VEL_RAD * (travel + clock_bias);
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), -theta);
        let position = rotation * position;

        trace!(
            "G{:02} - tx={:.6} dts={:.12} x={:.3} y={:.3} z={:.3}",
            self.prn,
            transmit_time,
            clock_bias,
            position[0],
            position[1],
            position[2]
        );

        SatelliteState {
            position,
            clock_bias,
            transmit_time,
        }
    }

    /// Keplerian position (m ECEF, at transmission time) and eccentric anomaly
    pub(crate) fn kepler_position(&self, t: f64) -> (Vector3<f64>, f64) {
        let a = self.semi_major_axis_m();
        let e = self.e;

        let t_k = wrap_week(t - self.toe);

        let n0 = (EARTH_GRAVITATION_MU_M3_S2 / a.powi(3)).sqrt();
        let n = n0 + self.delta_n;
        let m_k = self.m0 + n * t_k;

        let mut e_k = m_k;
        for _ in 0..KEPLER_ITERATIONS {
            e_k = m_k + e * e_k.sin();
        }

        let (sin_e_k, cos_e_k) = e_k.sin_cos();
        let v_k = ((1.0 - e.powi(2)).sqrt() * sin_e_k).atan2(cos_e_k - e);

        let phi = v_k + self.omega;
        let (sin_2phi, cos_2phi) = (2.0 * phi).sin_cos();

        let u_k = phi + self.cuc * cos_2phi + self.cus * sin_2phi;
        let r_k = a * (1.0 - e * cos_e_k) + self.crc * cos_2phi + self.crs * sin_2phi;
        let i_k = self.i0 + self.idot * t_k + self.cic * cos_2phi + self.cis * sin_2phi;
        let omega_k = self.omega0 + (self.omega_dot - EARTH_ANGULAR_VEL_RAD) * t_k
            - EARTH_ANGULAR_VEL_RAD * self.toe;

        let orbital = Vector3::new(r_k * u_k.cos(), r_k * u_k.sin(), 0.0);

        // orbital plane to ECEF
        let rot_x = Rotation3::from_axis_angle(&Vector3::x_axis(), i_k);
        let rot_z = Rotation3::from_axis_angle(&Vector3::z_axis(), omega_k);

        (rot_z * rot_x * orbital, e_k)
    }
}
